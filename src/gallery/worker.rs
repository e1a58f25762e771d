use std::{
    io,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, info};

use super::queue::TaskReceiver;
use crate::{
    error::GalleryError,
    index::{ConversionState, EntryIndex, GalleryEntry},
};

/// Turns one entry's source image into a thumbnail and returns the
/// thumbnail's serving path.
pub trait Converter: Send + Sync + 'static {
    fn convert(&self, entry: &GalleryEntry) -> Result<String, GalleryError>;
}

pub struct WorkerPool {
    handles: Mutex<Vec<JoinHandle<()>>>,
    /// Dropped to tell the workers to stop.
    stop: Mutex<Option<Sender<()>>>,
}

impl WorkerPool {
    pub fn spawn(
        count: usize,
        rx: TaskReceiver,
        entries: Arc<EntryIndex>,
        converter: Arc<dyn Converter>,
    ) -> io::Result<Self> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let mut handles = Vec::with_capacity(count);
        for worker_idx in 0..count.max(1) {
            let rx = rx.clone();
            let stop_rx = stop_rx.clone();
            let entries = Arc::clone(&entries);
            let converter = Arc::clone(&converter);
            let handle = thread::Builder::new()
                .name(format!("thumb-worker-{worker_idx}"))
                .spawn(move || Self::run(rx, stop_rx, &entries, converter.as_ref()))?;
            handles.push(handle);
        }
        Ok(Self {
            handles: Mutex::new(handles),
            stop: Mutex::new(Some(stop_tx)),
        })
    }

    pub fn len(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .len()
    }

    fn run(
        rx: TaskReceiver,
        stop: Receiver<()>,
        entries: &EntryIndex,
        converter: &dyn Converter,
    ) {
        while let Some(task) = rx.dequeue_until(&stop) {
            let Some(entry) = entries.get(task.entry) else {
                error!("conversion task for unknown entry {}", task.entry);
                continue;
            };
            // A panicking decoder must still release the entry's waiters.
            let result = panic::catch_unwind(AssertUnwindSafe(|| converter.convert(entry)))
                .unwrap_or_else(|_| {
                    Err(GalleryError::conversion(
                        entry.source_path(),
                        "converter panicked",
                    ))
                });
            if let Err(err) = &result {
                error!("{err}");
            }
            if entry.finish(result) == ConversionState::Done {
                debug!("entry {} ready", entry.index());
            }
        }

        // Tasks still queued are never converted; finishing them as failed
        // keeps their waiters from blocking until timeout.
        while let Some(task) = rx.try_dequeue() {
            if let Some(entry) = entries.get(task.entry) {
                entry.finish(Err(GalleryError::conversion(
                    entry.source_path(),
                    "gallery is shutting down",
                )));
            }
        }
    }

    /// Stops every worker after its current conversion and waits for it.
    /// No thumbnail is written once this returns.
    pub fn stop(&self) {
        drop(
            self.stop
                .lock()
                .unwrap_or_else(|poison| poison.into_inner())
                .take(),
        );
        let handles = std::mem::take(
            &mut *self
                .handles
                .lock()
                .unwrap_or_else(|poison| poison.into_inner()),
        );
        info!("stopping {} thumbnail workers", handles.len());
        for handle in handles {
            if handle.join().is_err() {
                error!("thumbnail worker panicked");
            }
        }
    }
}
