//! Background writer for `.gren/*.dat` stores.
//!
//! Writes are queued from build tasks and performed by one background task
//! in queue order, so readers of the stores never race a build's own
//! writes. [`Writeback::flush`] joins the writer; a build returns only
//! after its stores are on disk.

use gren_cache::write_atomic;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, trace};

/// Handle to the background writer of one build invocation.
#[derive(Debug)]
pub struct Writeback {
    queue: mpsc::UnboundedSender<Job>,
    worker: JoinHandle<()>,
}

#[derive(Debug)]
struct Job {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl Writeback {
    /// Start the writer task.
    #[must_use]
    pub fn spawn() -> Self {
        let (queue, mut jobs) = mpsc::unbounded_channel::<Job>();
        let worker = tokio::spawn(async move {
            while let Some(job) = jobs.recv().await {
                trace!(path = %job.path.display(), bytes = job.bytes.len(), "writeback");
                if let Err(err) = write_atomic(&job.path, &job.bytes) {
                    error!(path = %job.path.display(), %err, "writeback failed");
                }
            }
        });
        Self { queue, worker }
    }

    /// Queue one store write.
    pub fn queue(&self, path: PathBuf, bytes: Vec<u8>) {
        // The receiver lives until flush; a send can only fail after flush,
        // which would be a caller bug worth surfacing in logs.
        if self.queue.send(Job { path, bytes }).is_err() {
            error!("writeback queued after flush");
        }
    }

    /// Close the queue and wait for every queued write to land.
    pub async fn flush(self) {
        drop(self.queue);
        if self.worker.await.is_err() {
            error!("writeback worker panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_land_in_queue_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.dat");

        let writeback = Writeback::spawn();
        writeback.queue(path.clone(), b"first".to_vec());
        writeback.queue(path.clone(), b"second".to_vec());
        writeback.flush().await;

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn flush_with_nothing_queued_returns() {
        Writeback::spawn().flush().await;
    }
}
