//! Bounded worker pool shared by fetching and extraction
//!
//! Jobs are spawned as tokio tasks gated by a semaphore. Every handle is
//! awaited before [`fan_out`] returns, so no task outlives the batch call.

use crate::config::CrawlerConfig;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinError;

/// Sizing rules for a worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolPolicy {
    /// Batches of at most this many items run sequentially
    pub sequential_threshold: usize,
    pub workers_per_cpu: usize,
    pub max_workers: usize,
}

impl PoolPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            sequential_threshold: config.sequential_threshold,
            workers_per_cpu: config.workers_per_cpu,
            max_workers: config.max_workers,
        }
    }

    /// Returns true if a batch of `len` items should skip the pool
    pub fn is_sequential(&self, len: usize) -> bool {
        len <= self.sequential_threshold
    }

    /// Number of workers for a batch of `len` items
    pub fn worker_count(&self, len: usize) -> usize {
        if self.is_sequential(len) {
            return 1;
        }

        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        (cpus * self.workers_per_cpu)
            .min(self.max_workers)
            .min(len)
            .max(1)
    }
}

impl Default for PoolPolicy {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Runs `task` for every job with at most `workers` running at once
///
/// Results come back paired with their job, in job order. A task that
/// panics yields a `JoinError` for its own job only.
pub async fn fan_out<K, R, F, Fut>(jobs: Vec<K>, workers: usize, task: F) -> Vec<(K, Result<R, JoinError>)>
where
    K: Clone + Send + 'static,
    R: Send + 'static,
    F: Fn(K) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));

    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let semaphore = Arc::clone(&semaphore);
            let work = task(job.clone());
            let handle = tokio::spawn(async move {
                // The semaphore is never closed, so a permit always arrives
                let _permit = semaphore.acquire_owned().await.ok();
                work.await
            });
            (job, handle)
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (job, handle) in handles {
        results.push((job, handle.await));
    }
    results
}
