//! Bounded-concurrency task scheduler.
//!
//! Runs a list of independent tasks with at most N in flight. Tasks are
//! admitted in input order as permits free up and may complete in any
//! order. The first failure cancels everything still running.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Completion count reported after each successful task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerProgress {
    /// Tasks finished so far, counting 1, 2, ... without gaps.
    pub completed: usize,
    pub total: usize,
}

/// Why a scheduler run stopped early.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError<E> {
    /// A task failed; this is the first failure observed.
    #[error("{0}")]
    Task(E),

    #[error("cancelled")]
    Cancelled,

    /// A task panicked or was aborted from outside.
    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Runs tasks with a fixed concurrency limit.
pub struct Scheduler {
    limit: NonZeroUsize,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(limit: NonZeroUsize, cancel: CancellationToken) -> Self {
        Self { limit, cancel }
    }

    pub fn limit(&self) -> usize {
        self.limit.get()
    }

    /// Runs `work` over every task and returns results in completion order.
    ///
    /// A permit is taken before each task is spawned and held until the
    /// task ends, so no more than `limit` tasks are ever in flight.
    /// `on_complete` is called from this loop once per successful task.
    ///
    /// The cancellation token is checked after a permit is acquired and
    /// before the task is dispatched, and raced against every wait. On
    /// cancellation or on the first failure all running tasks are aborted.
    pub async fn run<T, R, E, F, Fut, C>(
        &self,
        tasks: Vec<T>,
        work: F,
        mut on_complete: C,
    ) -> Result<Vec<R>, SchedulerError<E>>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        C: FnMut(&R, SchedulerProgress),
    {
        let total = tasks.len();
        let permits = Arc::new(Semaphore::new(self.limit.get()));
        let mut backlog = tasks.into_iter().peekable();
        let mut running: JoinSet<Result<R, E>> = JoinSet::new();
        let mut results = Vec::with_capacity(total);

        loop {
            while let Ok(permit) = Arc::clone(&permits).try_acquire_owned() {
                if backlog.peek().is_none() {
                    break;
                }
                if self.cancel.is_cancelled() {
                    running.abort_all();
                    return Err(SchedulerError::Cancelled);
                }
                let Some(task) = backlog.next() else {
                    break;
                };
                let fut = work(task);
                running.spawn(async move {
                    let _permit = permit;
                    fut.await
                });
            }

            if running.is_empty() {
                break;
            }

            let joined = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    debug!(in_flight = running.len(), "cancelled, aborting tasks");
                    running.abort_all();
                    return Err(SchedulerError::Cancelled);
                }
                joined = running.join_next() => joined,
            };
            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok(Ok(result)) => {
                    let progress = SchedulerProgress {
                        completed: results.len() + 1,
                        total,
                    };
                    on_complete(&result, progress);
                    results.push(result);
                }
                Ok(Err(e)) => {
                    debug!(in_flight = running.len(), "task failed, aborting the rest");
                    running.abort_all();
                    return Err(SchedulerError::Task(e));
                }
                Err(e) => {
                    running.abort_all();
                    return Err(SchedulerError::Panicked(e.to_string()));
                }
            }
        }

        Ok(results)
    }
}
