//! Single-worker write queue.
//!
//! Every read-merge-write sequence against the shared store is pushed here
//! as one job. Jobs run strictly one at a time, end to end, in admission
//! order; a job's result (or failure) goes back only to its own caller.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};

use crate::types::{IndexError, IndexResult};

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Serializes async write jobs on one worker task.
///
/// Must be created inside a tokio runtime. Dropping the queue lets the
/// worker finish the jobs already admitted, then exit.
pub struct WriteQueue {
    tx: mpsc::UnboundedSender<Job>,
    pending: Arc<AtomicUsize>,
}

impl WriteQueue {
    /// Spawn the worker and return its handle.
    pub fn new() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker_pending = Arc::clone(&pending);

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                if AssertUnwindSafe(job).catch_unwind().await.is_err() {
                    log::error!("write queue job panicked");
                }
                worker_pending.fetch_sub(1, Ordering::SeqCst);
            }
            log::debug!("write queue worker stopped");
        });

        Self { tx, pending }
    }

    /// Admit `job` and wait for its result.
    ///
    /// Admission happens when `push` is called, not when the returned future
    /// is first polled, so call order is run order.
    pub fn push<F, Fut, T>(&self, job: F) -> impl Future<Output = IndexResult<T>> + Send
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = IndexResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let task: Job = Box::pin(async move {
            let result = job().await;
            // The caller may have stopped waiting; the job still ran.
            let _ = reply_tx.send(result);
        });

        self.pending.fetch_add(1, Ordering::SeqCst);
        let admitted = self.tx.send(task).is_ok();
        if !admitted {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        } else {
            log::debug!("write queue depth {}", self.pending());
        }

        async move {
            if !admitted {
                return Err(IndexError::QueueClosed);
            }
            reply_rx.await.map_err(|_| IndexError::JobAborted)?
        }
    }

    /// Jobs admitted but not yet finished.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

impl Default for WriteQueue {
    fn default() -> Self {
        Self::new()
    }
}
