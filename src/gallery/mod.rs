pub mod queue;
pub mod tracker;
pub mod worker;

use std::{io, ops::Range, sync::Arc, time::Duration};

use tracing::{debug, info};

use crate::{
    config::GalleryConfig,
    error::GalleryError,
    index::EntryIndex,
    view::{EntryView, WindowView},
    window::Geometry,
};

use self::{
    queue::{ConversionTask, TaskQueue},
    tracker::CompletionTracker,
    worker::{Converter, WorkerPool},
};

/// What a scheduling pass over a window did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Tasks this pass put on the queue.
    pub enqueued: usize,
    /// Entries the caller's tracker is waiting on, including ones claimed by
    /// other requests.
    pub awaited: usize,
}

/// Owns the entry arena, the conversion queue and the workers draining it.
pub struct Gallery {
    entries: Arc<EntryIndex>,
    geometry: Geometry,
    wait_timeout: Duration,
    queue: TaskQueue,
    pool: WorkerPool,
}

impl Gallery {
    pub fn start(
        entries: Arc<EntryIndex>,
        config: &GalleryConfig,
        converter: Arc<dyn Converter>,
    ) -> io::Result<Self> {
        let (queue, rx) = TaskQueue::bounded(config.geometry.queue_capacity());
        let pool = WorkerPool::spawn(config.worker_count, rx, Arc::clone(&entries), converter)?;
        info!(
            "started {} thumbnail workers (queue capacity {})",
            pool.len(),
            config.geometry.queue_capacity()
        );
        Ok(Self {
            entries,
            geometry: config.geometry,
            wait_timeout: config.wait_timeout,
            queue,
            pool,
        })
    }

    pub fn entries(&self) -> &EntryIndex {
        &self.entries
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Enqueues a conversion for every entry in `range` that nobody has
    /// claimed yet and, if `tracker` is given, subscribes it to every entry in
    /// the range that is not finished.
    pub fn schedule(
        &self,
        range: Range<usize>,
        tracker: Option<&Arc<CompletionTracker>>,
    ) -> Result<ScheduleReport, GalleryError> {
        let mut report = ScheduleReport::default();
        for entry in range.filter_map(|idx| self.entries.get(idx)) {
            // Subscribe before claiming so a fast worker cannot finish the
            // entry between the two steps unnoticed.
            if let Some(tracker) = tracker {
                if entry.subscribe(tracker) {
                    report.awaited += 1;
                }
            }
            if entry.try_claim() {
                self.queue.enqueue(ConversionTask {
                    entry: entry.index(),
                })?;
                report.enqueued += 1;
            }
        }
        Ok(report)
    }

    /// Queues the conversion window around `first_row` without waiting for it.
    pub fn prefetch(&self, first_row: usize) -> Result<ScheduleReport, GalleryError> {
        let range = self.geometry.conversion_range(first_row, self.entries.len());
        self.schedule(range, None)
    }

    /// Makes sure every thumbnail of the conversion window around `first_row`
    /// is finished, then returns the masked view for that row.
    pub fn request_window(&self, first_row: usize) -> Result<WindowView, GalleryError> {
        let range = self.geometry.conversion_range(first_row, self.entries.len());
        let tracker = Arc::new(CompletionTracker::new());
        let report = self.schedule(range.clone(), Some(&tracker))?;
        debug!(
            "row {first_row}: window {range:?}, {} enqueued, {} awaited",
            report.enqueued, report.awaited
        );
        if report.awaited > 0 {
            tracker.wait(self.wait_timeout)?;
        }
        Ok(self.masked_view(first_row))
    }

    /// Full-length entry list with only the display window filled in.
    pub fn masked_view(&self, first_row: usize) -> WindowView {
        let total = self.entries.len();
        let display = self.geometry.display_range(first_row, total);
        let cells = (0..total)
            .map(|idx| {
                if display.contains(&idx) {
                    self.entries.get(idx).map(EntryView::from_entry)
                } else {
                    None
                }
            })
            .collect();
        WindowView {
            first_row,
            geometry: self.geometry,
            cells,
            debounce_rows: self.geometry.debounce_rows(),
        }
    }

    /// Stops the workers once their current conversion is written. Queued
    /// tasks are finished as failed instead of converted.
    pub fn shutdown(&self) {
        self.pool.stop();
    }
}
