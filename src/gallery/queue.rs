use crossbeam_channel::{bounded, select, Receiver, Sender};

use crate::error::GalleryError;

/// Request to produce the thumbnail of one entry, addressed by its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionTask {
    pub entry: usize,
}

/// Producer side of the bounded conversion queue.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    tx: Sender<ConversionTask>,
}

/// Consumer side, cloned once per worker.
#[derive(Debug, Clone)]
pub struct TaskReceiver {
    rx: Receiver<ConversionTask>,
}

impl TaskQueue {
    pub fn bounded(capacity: usize) -> (TaskQueue, TaskReceiver) {
        let (tx, rx) = bounded(capacity.max(1));
        (TaskQueue { tx }, TaskReceiver { rx })
    }

    /// Blocks while the queue is full; tasks are never dropped.
    pub fn enqueue(&self, task: ConversionTask) -> Result<(), GalleryError> {
        self.tx.send(task).map_err(|_| GalleryError::QueueClosed)
    }
}

impl TaskReceiver {
    /// Blocks while the queue is empty. `None` once every producer is gone
    /// or `stop` is disconnected.
    pub fn dequeue_until(&self, stop: &Receiver<()>) -> Option<ConversionTask> {
        select! {
            recv(self.rx) -> task => task.ok(),
            recv(stop) -> _ => None,
        }
    }

    pub fn try_dequeue(&self) -> Option<ConversionTask> {
        self.rx.try_recv().ok()
    }
}
