use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::config::TaskPoolConfig;
use crate::error::PoolError;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Point-in-time counters of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub live_workers: usize,
    pub queued: usize,
    pub completed: u64,
    pub rejected: u64,
}

/// Future resolving to the output of a submitted task.
///
/// Dropping the handle does not cancel the task.
#[must_use = "the task result is only observable through the handle"]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, PoolError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.map_err(|_| PoolError::TaskLost))
    }
}

/// Bounded worker pool. Cheap to clone; clones share the same workers.
#[derive(Clone)]
pub struct TaskPool {
    inner: Arc<Inner>,
}

/// Owned by pool handles only. Dropping the last handle stops the workers.
struct Inner {
    tx: mpsc::Sender<Job>,
    shared: Arc<Shared>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

/// State the workers need; never holds the queue sender.
struct Shared {
    config: TaskPoolConfig,
    runtime: tokio::runtime::Handle,
    rx: Mutex<mpsc::Receiver<Job>>,
    cancel: CancellationToken,
    live_workers: AtomicUsize,
    next_worker_id: AtomicUsize,
    completed: AtomicU64,
    rejected: AtomicU64,
}

impl TaskPool {
    /// Validate `config` and start the core workers on the current Tokio runtime.
    pub fn new(config: TaskPoolConfig) -> Result<Self, PoolError> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| PoolError::NoRuntime)?;

        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let shared = Arc::new(Shared {
            rx: Mutex::new(rx),
            cancel: CancellationToken::new(),
            live_workers: AtomicUsize::new(0),
            next_worker_id: AtomicUsize::new(1),
            completed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            config,
            runtime,
        });

        for _ in 0..shared.config.core_workers {
            shared.live_workers.fetch_add(1, Ordering::SeqCst);
            let span = shared.worker_span();
            shared
                .runtime
                .spawn(run_core_worker(shared.clone()).instrument(span));
        }

        info!(
            core_workers = shared.config.core_workers,
            max_workers = shared.config.max_workers,
            queue_capacity = shared.config.queue_capacity,
            prefix = %shared.config.thread_name_prefix,
            "Task pool started"
        );

        Ok(Self {
            inner: Arc::new(Inner { tx, shared }),
        })
    }

    pub fn config(&self) -> &TaskPoolConfig {
        &self.inner.shared.config
    }

    /// Submit a task. Never blocks: the task is queued, handed to a new
    /// overflow worker, or rejected with [`PoolError::Saturated`].
    ///
    /// Callable from any thread; workers always run on the runtime the pool
    /// was created on.
    pub fn submit<F, T>(&self, task: F) -> Result<TaskHandle<T>, PoolError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let shared = &self.inner.shared;
        if shared.cancel.is_cancelled() {
            return Err(PoolError::Shutdown);
        }

        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            match AssertUnwindSafe(task).catch_unwind().await {
                Ok(output) => {
                    let _ = result_tx.send(output);
                }
                Err(_) => warn!("Pooled task panicked, result dropped"),
            }
        });

        match self.inner.tx.try_send(job) {
            Ok(()) => Ok(TaskHandle { rx: result_rx }),
            Err(TrySendError::Full(job)) => {
                if !shared.try_reserve_worker() {
                    shared.rejected.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        queue_capacity = shared.config.queue_capacity,
                        max_workers = shared.config.max_workers,
                        "Task rejected, pool saturated"
                    );
                    return Err(PoolError::Saturated {
                        queue_capacity: shared.config.queue_capacity,
                        max_workers: shared.config.max_workers,
                    });
                }
                let span = shared.worker_span();
                debug!("Queue full, starting overflow worker");
                shared
                    .runtime
                    .spawn(run_overflow_worker(shared.clone(), job).instrument(span));
                Ok(TaskHandle { rx: result_rx })
            }
            Err(TrySendError::Closed(_)) => Err(PoolError::Shutdown),
        }
    }

    pub fn stats(&self) -> PoolStats {
        let shared = &self.inner.shared;
        PoolStats {
            live_workers: shared.live_workers.load(Ordering::SeqCst),
            queued: shared
                .config
                .queue_capacity
                .saturating_sub(self.inner.tx.capacity()),
            completed: shared.completed.load(Ordering::Relaxed),
            rejected: shared.rejected.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting work. Workers finish their current task and exit;
    /// queued tasks are dropped and their handles resolve to `TaskLost`.
    pub async fn shutdown(&self) {
        let shared = &self.inner.shared;
        shared.cancel.cancel();

        let mut rx = shared.rx.lock().await;
        rx.close();
        let mut dropped = 0usize;
        while rx.try_recv().is_ok() {
            dropped += 1;
        }
        info!(dropped, "Task pool shut down");
    }
}

impl Shared {
    fn worker_span(&self) -> tracing::Span {
        let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}{}", self.config.thread_name_prefix, id);
        tracing::debug_span!("pool_worker", worker = %name)
    }

    fn try_reserve_worker(&self) -> bool {
        self.live_workers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.config.max_workers).then_some(n + 1)
            })
            .is_ok()
    }

    async fn next_job(&self) -> Option<Job> {
        self.rx.lock().await.recv().await
    }

    fn try_next_job(&self) -> Option<Job> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }

    async fn run(&self, job: Job) {
        job.await;
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
}

async fn run_core_worker(shared: Arc<Shared>) {
    loop {
        let job = tokio::select! {
            _ = shared.cancel.cancelled() => break,
            job = shared.next_job() => job,
        };
        match job {
            Some(job) => shared.run(job).await,
            None => break,
        }
    }
    shared.live_workers.fetch_sub(1, Ordering::SeqCst);
    debug!("Core worker stopped");
}

// Runs the job it was started for, then helps drain the queue and exits as
// soon as the queue is empty or contended by an idle core worker.
async fn run_overflow_worker(shared: Arc<Shared>, first: Job) {
    shared.run(first).await;
    while !shared.cancel.is_cancelled() {
        match shared.try_next_job() {
            Some(job) => shared.run(job).await,
            None => break,
        }
    }
    shared.live_workers.fetch_sub(1, Ordering::SeqCst);
    debug!("Overflow worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(core: usize, max: usize, queue: usize) -> TaskPoolConfig {
        TaskPoolConfig {
            core_workers: core,
            max_workers: max,
            queue_capacity: queue,
            thread_name_prefix: "test-".to_string(),
        }
    }

    #[test]
    fn new_outside_runtime_fails() {
        let result = TaskPool::new(small(1, 1, 1));
        assert!(matches!(result, Err(PoolError::NoRuntime)));
    }

    #[tokio::test]
    async fn core_workers_are_live_after_start() {
        let pool = TaskPool::new(small(3, 5, 4)).unwrap();
        let stats = pool.stats();
        assert_eq!(stats.live_workers, 3);
        assert_eq!(stats.queued, 0);
        assert_eq!(stats.completed, 0);
    }

    #[tokio::test]
    async fn worker_reservation_respects_ceiling() {
        let pool = TaskPool::new(small(1, 2, 1)).unwrap();
        let shared = &pool.inner.shared;
        assert!(shared.try_reserve_worker());
        assert!(!shared.try_reserve_worker());
        assert_eq!(shared.live_workers.load(Ordering::SeqCst), 2);
    }
}
