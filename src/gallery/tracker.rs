use std::{
    sync::{Condvar, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use crate::error::GalleryError;

/// Counting barrier owned by a single window request.
///
/// The request registers one unit per entry it depends on; whichever worker
/// finishes that entry calls [`CompletionTracker::complete`]. Trackers are
/// never shared between requests, so one request's progress cannot release
/// another request's wait.
#[derive(Debug, Default)]
pub struct CompletionTracker {
    outstanding: Mutex<usize>,
    zero: Condvar,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, n: usize) {
        *self.lock() += n;
    }

    pub fn complete(&self) {
        let mut outstanding = self.lock();
        *outstanding = outstanding.saturating_sub(1);
        if *outstanding == 0 {
            self.zero.notify_all();
        }
    }

    pub fn outstanding(&self) -> usize {
        *self.lock()
    }

    /// Blocks until every registered unit has completed or `timeout` elapses.
    /// A timeout too large to represent as a deadline waits indefinitely.
    pub fn wait(&self, timeout: Duration) -> Result<(), GalleryError> {
        let deadline = Instant::now().checked_add(timeout);
        let mut outstanding = self.lock();
        while *outstanding > 0 {
            outstanding = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(GalleryError::WindowTimeout {
                            outstanding: *outstanding,
                        });
                    }
                    match self.zero.wait_timeout(outstanding, remaining) {
                        Ok((guard, _)) => guard,
                        Err(poison) => poison.into_inner().0,
                    }
                }
                None => self
                    .zero
                    .wait(outstanding)
                    .unwrap_or_else(|poison| poison.into_inner()),
            };
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.outstanding
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}
