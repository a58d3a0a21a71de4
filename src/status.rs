//! The only path from worker threads back to the queue.
//!
//! Workers hold a [`StatusSender`] and report by queue index. The owning
//! thread drains the [`StatusReporter`] and applies the updates itself, so
//! the item list is never touched from a worker.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::model::DownloadStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub index: usize,
    pub status: DownloadStatus,
}

#[derive(Debug, Clone)]
pub struct StatusSender {
    tx: UnboundedSender<StatusUpdate>,
}

impl StatusSender {
    /// Reports a transition. A closed channel means the queue is gone, so
    /// the update is dropped.
    pub fn send(&self, index: usize, status: DownloadStatus) {
        let _ = self.tx.send(StatusUpdate { index, status });
    }
}

#[derive(Debug)]
pub struct StatusReporter {
    rx: UnboundedReceiver<StatusUpdate>,
}

impl StatusReporter {
    /// Updates received so far, in the order they were sent.
    pub fn drain(&mut self) -> Vec<StatusUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = self.rx.try_recv() {
            updates.push(update);
        }
        updates
    }
}

pub fn status_channel() -> (StatusSender, StatusReporter) {
    let (tx, rx) = unbounded_channel();
    (StatusSender { tx }, StatusReporter { rx })
}
