//! Task pool for fire-and-forget background work
//!
//! Runs a fixed number of workers over a shared bounded queue, with blocking
//! backpressure on submit and a draining, idempotent shutdown.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, OnceCell};
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use super::stats::{PoolStats, PoolStatsSnapshot};

/// Queue capacity per worker
pub const QUEUE_CAPACITY_MULTIPLIER: usize = 4;

/// Upper bound on workers; larger requests are clamped
pub const MAX_CONCURRENCY: usize = 1024;

/// Outcome of a single task. Discarded by the pool apart from logging and stats.
pub type TaskResult = anyhow::Result<()>;

type Task = Box<dyn FnOnce() -> BoxFuture<'static, TaskResult> + Send + 'static>;

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<Task>>>;

tokio::task_local! {
    static WORKER_ID: usize;
}

/// Index of the pool worker running the current task, if any
pub fn current_worker() -> Option<usize> {
    WORKER_ID.try_with(|id| *id).ok()
}

/// Task pool lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    /// Constructed, no workers yet. Submissions are queued.
    Created,
    /// Workers are running and accepting tasks
    Running,
    /// Intake closed, workers finishing queued tasks
    Draining,
    /// All workers have exited
    Stopped,
}

/// Task pool errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Submission attempted after shutdown began
    #[error("task pool is closed")]
    Closed,
}

/// Bounded task pool
///
/// Shared by reference (`Arc<TaskPool>`) between every component that
/// schedules side effects; the process creates exactly one.
///
/// # Example
///
/// ```ignore
/// use cats_worker::TaskPool;
///
/// let pool = Arc::new(TaskPool::new(config.worker_concurrency));
/// pool.start();
///
/// if let Err(e) = pool.submit(move || async move { notify(cat_id).await }).await {
///     tracing::warn!(error = %e, "Side effect not scheduled");
/// }
///
/// pool.shutdown().await;
/// ```
pub struct TaskPool {
    concurrency: usize,
    capacity: usize,
    status: Mutex<PoolStatus>,
    closed: AtomicBool,
    sender: RwLock<Option<mpsc::Sender<Task>>>,
    receiver: SharedReceiver,
    tracker: TaskTracker,
    drained: OnceCell<()>,
    stats: Arc<PoolStats>,
}

impl TaskPool {
    /// Create a pool with `concurrency` workers, clamped to
    /// `1..=MAX_CONCURRENCY`.
    ///
    /// The queue holds `QUEUE_CAPACITY_MULTIPLIER * concurrency` pending tasks.
    /// No workers run until [`TaskPool::start`].
    pub fn new(concurrency: usize) -> Self {
        let concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        let capacity = concurrency.saturating_mul(QUEUE_CAPACITY_MULTIPLIER);
        let (sender, receiver) = mpsc::channel(capacity);

        Self {
            concurrency,
            capacity,
            status: Mutex::new(PoolStatus::Created),
            closed: AtomicBool::new(false),
            sender: RwLock::new(Some(sender)),
            receiver: Arc::new(tokio::sync::Mutex::new(receiver)),
            tracker: TaskTracker::new(),
            drained: OnceCell::new(),
            stats: Arc::new(PoolStats::new()),
        }
    }

    /// Spawn the workers.
    ///
    /// Only the first call on a `Created` pool has any effect; later calls,
    /// and calls after shutdown began, are no-ops.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&self) {
        let mut status = self.status.lock();
        if *status != PoolStatus::Created {
            debug!(status = ?*status, "Task pool start ignored");
            return;
        }

        for worker_id in 0..self.concurrency {
            self.spawn_worker(worker_id);
        }
        *status = PoolStatus::Running;

        info!(
            concurrency = self.concurrency,
            capacity = self.capacity,
            "Task pool started"
        );
    }

    /// Queue a task for execution.
    ///
    /// Waits while the queue is full. Fails only with [`PoolError::Closed`]
    /// once shutdown has begun; the task is then dropped without running.
    /// Returning `Ok` means the task was handed off, not that it ran.
    ///
    /// A task must not submit to the same pool and wait on it: with a full
    /// queue that deadlocks the worker.
    pub async fn submit<F, Fut>(&self, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            self.stats.task_rejected();
            return Err(PoolError::Closed);
        }

        let sender = self.sender.read().clone();
        let Some(sender) = sender else {
            self.stats.task_rejected();
            return Err(PoolError::Closed);
        };

        let task: Task = Box::new(move || task().boxed());
        if sender.send(task).await.is_err() {
            self.stats.task_rejected();
            return Err(PoolError::Closed);
        }

        self.stats.task_submitted();
        Ok(())
    }

    /// Close intake and wait until every accepted task has run.
    ///
    /// Safe to call any number of times from any number of tasks: the drain
    /// happens once and every caller returns only after it completes. If a
    /// caller is cancelled mid-drain, the next call keeps waiting on the
    /// same drain.
    pub async fn shutdown(&self) {
        self.drained.get_or_init(|| self.drain()).await;
    }

    async fn drain(&self) {
        {
            let mut status = self.status.lock();
            if *status == PoolStatus::Created {
                // Never started: one worker so queued tasks still run
                self.spawn_worker(0);
            }
            if *status != PoolStatus::Stopped {
                *status = PoolStatus::Draining;
            }
        }

        self.closed.store(true, Ordering::Release);
        // Blocked submitters hold their own sender clone, so their tasks are
        // still accepted and drained before the workers see the queue close.
        drop(self.sender.write().take());
        self.tracker.close();

        info!(
            queued = self.stats.snapshot().queued(),
            "Task pool draining"
        );

        self.tracker.wait().await;
        *self.status.lock() = PoolStatus::Stopped;

        let stats = self.stats.snapshot();
        info!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            panicked = stats.panicked,
            "Task pool stopped"
        );
    }

    fn spawn_worker(&self, worker_id: usize) {
        let receiver = Arc::clone(&self.receiver);
        let stats = Arc::clone(&self.stats);
        self.tracker.spawn(run_worker(worker_id, receiver, stats));
    }

    /// Current lifecycle status
    pub fn status(&self) -> PoolStatus {
        *self.status.lock()
    }

    /// Number of workers (fixed at construction)
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Queue capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of worker tasks currently alive
    pub fn worker_count(&self) -> usize {
        self.tracker.len()
    }

    /// Whether submissions are refused
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Snapshot of task outcome counters
    pub fn stats(&self) -> PoolStatsSnapshot {
        self.stats.snapshot()
    }
}

impl std::fmt::Debug for TaskPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPool")
            .field("concurrency", &self.concurrency)
            .field("capacity", &self.capacity)
            .field("status", &self.status())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Worker loop: take the next task, run it, record the outcome.
/// Exits once the queue is closed and empty.
async fn run_worker(worker_id: usize, receiver: SharedReceiver, stats: Arc<PoolStats>) {
    debug!(worker_id, "Worker started");

    loop {
        let next = { receiver.lock().await.recv().await };
        let Some(task) = next else {
            break;
        };

        stats.task_started();
        let outcome = WORKER_ID
            .scope(
                worker_id,
                AssertUnwindSafe(async move { task().await }).catch_unwind(),
            )
            .await;

        match outcome {
            Ok(Ok(())) => stats.task_succeeded(),
            Ok(Err(e)) => {
                stats.task_failed();
                warn!(worker_id, error = %e, "Task failed");
            }
            Err(payload) => {
                stats.task_panicked();
                error!(worker_id, panic = %panic_message(&payload), "Task panicked");
            }
        }
    }

    debug!(worker_id, "Worker exited");
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_concurrency_is_at_least_one() {
        let pool = TaskPool::new(0);
        assert_eq!(pool.concurrency(), 1);
        assert_eq!(pool.capacity(), QUEUE_CAPACITY_MULTIPLIER);
    }

    #[test]
    fn test_huge_concurrency_is_clamped() {
        for n in [MAX_CONCURRENCY + 1, 1 << 60, usize::MAX / 2, usize::MAX] {
            let pool = TaskPool::new(n);
            assert_eq!(pool.concurrency(), MAX_CONCURRENCY);
            assert_eq!(pool.capacity(), MAX_CONCURRENCY * QUEUE_CAPACITY_MULTIPLIER);
            assert_eq!(pool.status(), PoolStatus::Created);
        }
    }

    #[test]
    fn test_capacity_scales_with_concurrency() {
        for n in [1usize, 2, 3, 8] {
            let pool = TaskPool::new(n);
            assert_eq!(pool.concurrency(), n);
            assert_eq!(pool.capacity(), 4 * n);
        }
    }

    #[test]
    fn test_new_pool_is_created_and_idle() {
        let pool = TaskPool::new(2);
        assert_eq!(pool.status(), PoolStatus::Created);
        assert_eq!(pool.worker_count(), 0);
        assert!(!pool.is_closed());
    }

    #[tokio::test]
    async fn test_start_spawns_concurrency_workers() {
        let pool = TaskPool::new(3);
        pool.start();
        assert_eq!(pool.status(), PoolStatus::Running);
        assert_eq!(pool.worker_count(), 3);

        pool.start();
        assert_eq!(pool.worker_count(), 3);

        pool.shutdown().await;
        assert_eq!(pool.worker_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_rejected() {
        let pool = TaskPool::new(1);
        pool.start();
        pool.shutdown().await;

        let result = tokio::time::timeout(
            Duration::from_secs(1),
            pool.submit(|| async { Ok(()) }),
        )
        .await
        .expect("submit must not block on a closed pool");

        assert_eq!(result, Err(PoolError::Closed));
        assert!(pool.is_closed());
        assert_eq!(pool.stats().rejected, 1);
    }

    #[tokio::test]
    async fn test_start_after_shutdown_is_noop() {
        let pool = TaskPool::new(2);
        pool.shutdown().await;
        assert_eq!(pool.status(), PoolStatus::Stopped);

        pool.start();
        assert_eq!(pool.status(), PoolStatus::Stopped);
        assert_eq!(pool.worker_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_drains_unstarted_pool() {
        let pool = TaskPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..pool.capacity() {
            let counter = Arc::clone(&counter);
            pool.submit(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();
        }

        pool.shutdown().await;
        assert_eq!(counter.load(Ordering::SeqCst), pool.capacity());
        assert_eq!(pool.status(), PoolStatus::Stopped);
    }

    #[tokio::test]
    async fn test_current_worker_outside_pool() {
        assert_eq!(current_worker(), None);
    }

    #[tokio::test]
    async fn test_current_worker_inside_task() {
        let pool = TaskPool::new(1);
        pool.start();

        let (tx, rx) = tokio::sync::oneshot::channel();
        pool.submit(move || async move {
            let _ = tx.send(current_worker());
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(rx.await.unwrap(), Some(0));
        pool.shutdown().await;
    }

    #[test]
    fn test_panic_message_extracts_strings() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(&payload), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(&payload), "owned message");

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(&payload), "unknown panic");
    }

    #[test]
    fn test_pool_error_display() {
        assert_eq!(PoolError::Closed.to_string(), "task pool is closed");
    }
}
