//! The sequence queue: global FIFO, one job in flight at a time.

use std::future::Future;

use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// The queue worker has shut down and can no longer accept or answer jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sequence queue worker is gone")]
pub struct QueueClosed;

/// A FIFO scheduler that runs asynchronous jobs strictly one at a time.
///
/// For any two jobs A submitted before B, A's entire body (including every
/// await point inside it) completes before B's body begins. A failing job
/// delivers its error to its own caller and never poisons the queue.
///
/// The queue is unbounded and has no job timeout: a hung job blocks all
/// subsequent jobs indefinitely. That trade-off is deliberate; see the
/// concurrency notes in the crate docs.
///
/// Clones share the same worker. The worker task exits once every clone has
/// been dropped and the remaining jobs have drained.
#[derive(Clone)]
pub struct SequenceQueue {
    jobs: mpsc::UnboundedSender<Job>,
}

impl SequenceQueue {
    /// Creates a queue and spawns its worker task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        let (jobs, mut next) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            while let Some(job) = next.recv().await {
                job().await;
            }
        });
        Self { jobs }
    }

    /// Submits a job, returning a future tied 1:1 to its result.
    ///
    /// The job is enqueued before this returns, so submission order is
    /// execution order even if the returned futures are polled later or out
    /// of order. The future resolves with whatever the job produced, or with
    /// [`QueueClosed`] if the worker is gone.
    pub fn run<T, F, Fut>(&self, job: F) -> impl Future<Output = Result<T, QueueClosed>>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (done, result) = oneshot::channel();
        let wrapped: Job = Box::new(move || {
            Box::pin(async move {
                let _ = done.send(job().await);
            })
        });
        let submitted = self.jobs.send(wrapped).is_ok();
        async move {
            if !submitted {
                return Err(QueueClosed);
            }
            result.await.map_err(|_| QueueClosed)
        }
    }
}

impl Default for SequenceQueue {
    fn default() -> Self {
        Self::new()
    }
}
