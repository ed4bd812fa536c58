//! Bounded worker pool with a join barrier.
//!
//! [`WorkerPool::run_all`] spawns one task per job but lets at most
//! `limit` of them run at once. It returns only after every task has
//! settled, with outcomes in submission order, so callers can pair each
//! result with its input without sharing any mutable state.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinError;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl WorkerPool {
    /// A limit of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub async fn run_all<I, F, T>(&self, jobs: I) -> Vec<Result<T, JoinError>>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let permits = self.permits.clone();
                tokio::spawn(async move {
                    // 信號量從不關閉，取得失敗時照樣執行
                    let _permit = permits.acquire_owned().await.ok();
                    job.await
                })
            })
            .collect();

        // 屏障：等所有任務結束（成功或失敗）
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_keep_submission_order() {
        let pool = WorkerPool::new(3);
        let jobs = (0..10u64).map(|i| async move {
            // 反向延遲，讓後送出的任務先完成
            tokio::time::sleep(Duration::from_millis(20 - i * 2)).await;
            i
        });

        let results: Vec<u64> = pool
            .run_all(jobs)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(results, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_never_exceeds_limit() {
        let pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs: Vec<_> = (0..12)
            .map(|_| {
                let running = running.clone();
                let peak = peak.clone();
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .collect();

        let results = pool.run_all(jobs).await;

        assert_eq!(results.len(), 12);
        assert!(results.iter().all(|r| r.is_ok()));
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(running.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panicking_job_does_not_abort_siblings() {
        let pool = WorkerPool::new(2);
        let jobs: Vec<std::pin::Pin<Box<dyn Future<Output = u32> + Send>>> = vec![
            Box::pin(async { 1 }),
            Box::pin(async {
                if true {
                    panic!("boom");
                }
                2
            }),
            Box::pin(async { 3 }),
        ];

        let results = pool.run_all(jobs).await;

        assert_eq!(results.len(), 3);
        assert_eq!(*results[0].as_ref().unwrap(), 1);
        assert!(results[1].is_err());
        assert_eq!(*results[2].as_ref().unwrap(), 3);
    }

    #[test]
    fn test_zero_limit_is_one() {
        assert_eq!(WorkerPool::new(0).limit(), 1);
    }
}
