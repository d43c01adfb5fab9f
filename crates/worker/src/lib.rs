//! Bounded background task pool
//!
//! This crate provides:
//! - [`TaskPool`] - Fixed set of workers draining a bounded FIFO queue
//! - [`PoolStats`] - Lock-free outcome counters for the pool
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        TaskPool                          │
//! │                                                          │
//! │  submit() ──► [ bounded queue, capacity 4 x N ] ──┐      │
//! │  (blocks while full)                              │      │
//! │                                                   ▼      │
//! │          ┌──────────┐  ┌──────────┐      ┌──────────┐    │
//! │          │ worker 0 │  │ worker 1 │ ...  │ worker N │    │
//! │          └──────────┘  └──────────┘      └──────────┘    │
//! │                 outcomes ──► PoolStats (discarded)       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use cats_worker::TaskPool;
//!
//! let pool = Arc::new(TaskPool::new(4));
//! pool.start();
//!
//! pool.submit(|| async move {
//!     render_thumbnail().await?;
//!     Ok(())
//! })
//! .await?;
//!
//! // Closes intake and waits for queued tasks
//! pool.shutdown().await;
//! ```

mod pool;
mod stats;

pub use pool::{
    current_worker, PoolError, PoolStatus, TaskPool, TaskResult, MAX_CONCURRENCY,
    QUEUE_CAPACITY_MULTIPLIER,
};
pub use stats::{PoolStats, PoolStatsSnapshot};
