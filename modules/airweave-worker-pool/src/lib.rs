//! Semaphore-bounded task scheduler (spec §4.5). Default concurrency is
//! 100, per-job overridable. The pool never aborts on a single task's
//! failure — failures are surfaced in the result list returned by
//! `wait_for_batch`/`wait_for_completion`, and it is the caller's job (the
//! orchestrator) to decide what to do with them.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use airweave_common::AirweaveError;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_MAX_WORKERS: usize = 100;

pub struct AsyncWorkerPool {
    semaphore: Arc<Semaphore>,
    max_workers: usize,
    pending: JoinSet<Result<(), AirweaveError>>,
}

impl AsyncWorkerPool {
    pub fn new(max_workers: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            pending: JoinSet::new(),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Record `task` in the pending set; it starts running once a permit is
    /// available. Mirrors the teacher-independent Python pool's `submit`:
    /// the caller does not block here waiting for the permit, only the
    /// spawned task does.
    pub fn submit<F>(&mut self, task: F)
    where
        F: Future<Output = Result<(), AirweaveError>> + Send + 'static,
    {
        let semaphore = self.semaphore.clone();
        self.pending.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("worker pool semaphore should never be closed");
            task.await
        });
    }

    /// Wait for at least one pending task to complete, or until `timeout`
    /// elapses, whichever is first. Returns every task that finished in
    /// that window (zero or more).
    pub async fn wait_for_batch(&mut self, timeout: Duration) -> Vec<Result<(), AirweaveError>> {
        if self.pending.is_empty() {
            return Vec::new();
        }

        let mut done = Vec::new();
        tokio::select! {
            joined = self.pending.join_next() => {
                if let Some(result) = joined {
                    done.push(Self::flatten(result));
                }
            }
            _ = tokio::time::sleep(timeout) => {}
        }

        while let Some(result) = self.pending.try_join_next() {
            done.push(Self::flatten(result));
        }
        done
    }

    /// Block until every pending task has finished.
    pub async fn wait_for_completion(&mut self) -> Vec<Result<(), AirweaveError>> {
        let mut results = Vec::new();
        while let Some(result) = self.pending.join_next().await {
            results.push(Self::flatten(result));
        }
        results
    }

    fn flatten(result: Result<Result<(), AirweaveError>, tokio::task::JoinError>) -> Result<(), AirweaveError> {
        match result {
            Ok(inner) => inner,
            Err(join_err) if join_err.is_cancelled() => {
                Err(AirweaveError::Cancelled("worker task cancelled".into()))
            }
            Err(join_err) => Err(AirweaveError::Anyhow(join_err.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn wait_for_completion_collects_all_results() {
        let mut pool = AsyncWorkerPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let counter = counter.clone();
            pool.submit(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        let results = pool.wait_for_completion().await;
        assert_eq!(results.len(), 10);
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn semaphore_caps_concurrency() {
        let mut pool = AsyncWorkerPool::new(2);
        let concurrent = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        for _ in 0..6 {
            let concurrent = concurrent.clone();
            let max_seen = max_seen.clone();
            pool.submit(async move {
                let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                concurrent.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            });
        }
        pool.wait_for_completion().await;
        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn task_failure_does_not_abort_other_tasks() {
        let mut pool = AsyncWorkerPool::new(4);
        pool.submit(async { Err(AirweaveError::PerItemBadData { entity_id: "x".into(), message: "bad".into() }) });
        pool.submit(async { Ok(()) });
        let results = pool.wait_for_completion().await;
        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    }

    #[tokio::test]
    async fn wait_for_batch_returns_without_blocking_when_empty() {
        let mut pool = AsyncWorkerPool::new(4);
        let results = pool.wait_for_batch(Duration::from_millis(10)).await;
        assert!(results.is_empty());
    }
}
