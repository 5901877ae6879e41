//! Bounded FIFO task throttling
//!
//! The extraction driver schedules one asynchronous write per file entry,
//! but only a fixed number of them may execute at a time. The throttler is
//! a small worker pool fed from an ordered queue: admission order is the
//! order of [`Throttler::queue`] calls, and a job body only runs once a
//! worker reaches it. After the cancellation token fires, jobs that have
//! not started yet never start and their futures settle as cancelled.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// FIFO task queue executing at most `concurrency` job bodies at a time
pub(crate) struct Throttler {
    jobs: mpsc::UnboundedSender<Job>,
}

impl Throttler {
    /// Spawn the worker pool
    ///
    /// Workers stop once `cancel` fires or the throttler is dropped and the
    /// queue has drained.
    pub(crate) fn new(concurrency: usize, cancel: CancellationToken) -> Self {
        let (jobs, job_rx) = mpsc::unbounded_channel::<Job>();
        let job_rx = Arc::new(Mutex::new(job_rx));

        for _ in 0..concurrency.max(1) {
            let job_rx = Arc::clone(&job_rx);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                loop {
                    let job = {
                        let mut queue = job_rx.lock().await;
                        tokio::select! {
                            _ = cancel.cancelled() => None,
                            job = queue.recv() => job,
                        }
                    };
                    let Some(job) = job else { break };
                    // a job dequeued in the same instant the token fired
                    // must not start
                    if cancel.is_cancelled() {
                        break;
                    }
                    job().await;
                }
            });
        }

        Self { jobs }
    }

    /// Enqueue a task, returning a future for its outcome
    ///
    /// The task is admitted to the queue immediately (in call order) and
    /// executed once a worker reaches it. The returned future resolves with
    /// the task's output, or with [`Error::Cancelled`] if the throttler was
    /// cancelled before the task got to run.
    pub(crate) fn queue<T, F>(&self, task: F) -> BoxFuture<'static, Result<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            Box::pin(async move {
                let _ = done_tx.send(task.await);
            })
        });
        let admitted = self.jobs.send(job).is_ok();

        Box::pin(async move {
            if !admitted {
                return Err(Error::Cancelled);
            }
            done_rx.await.map_err(|_| Error::Cancelled)
        })
    }
}
