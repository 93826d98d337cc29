//! Bounded task scheduler.
//!
//! Runs independent async lookups with at most `limit` in flight. Every task
//! runs to completion; one failure never cancels its siblings. Results come
//! back in submission order.

use std::future::Future;
use std::time::Duration;

use futures::{stream, StreamExt};

/// Concurrency limit observed for provider lookups
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Why a scheduled task produced no value
#[derive(Debug, thiserror::Error)]
pub enum TaskError<E> {
    #[error("{0}")]
    Failed(E),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

/// Per-task result, at the task's original index
pub type TaskOutcome<T, E> = Result<T, TaskError<E>>;

#[derive(Debug, Clone, Copy)]
pub struct BoundedScheduler {
    limit: usize,
    timeout: Option<Duration>,
}

impl Default for BoundedScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl BoundedScheduler {
    /// A limit of zero is raised to one.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            timeout: None,
        }
    }

    /// Fail any single task that has not finished after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run every task and return their outcomes in input order.
    ///
    /// A task is only started (its thunk invoked) once a slot is free.
    pub async fn run<F, Fut, T, E>(&self, tasks: Vec<F>) -> Vec<TaskOutcome<T, E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let timeout = self.timeout;

        let mut finished: Vec<(usize, TaskOutcome<T, E>)> =
            stream::iter(tasks.into_iter().enumerate())
                .map(|(index, task)| async move {
                    let future = task();
                    let outcome = match timeout {
                        Some(limit) => match tokio::time::timeout(limit, future).await {
                            Ok(result) => result.map_err(TaskError::Failed),
                            Err(_) => Err(TaskError::TimedOut(limit)),
                        },
                        None => future.await.map_err(TaskError::Failed),
                    };
                    (index, outcome)
                })
                .buffer_unordered(self.limit)
                .collect()
                .await;

        // Slots free up as tasks finish, so completion order is arbitrary.
        finished.sort_by_key(|(index, _)| *index);
        finished.into_iter().map(|(_, outcome)| outcome).collect()
    }
}
