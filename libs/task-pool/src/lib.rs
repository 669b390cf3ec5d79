//! Bounded worker pool for running async work off the caller's task.
//!
//! The pool keeps a fixed set of long-lived workers fed from a bounded queue.
//! When the queue is full it grows with transient overflow workers up to
//! `max_workers`; past that point submissions are rejected immediately with
//! [`PoolError::Saturated`] instead of blocking the caller.
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), task_pool::PoolError> {
//! use task_pool::{TaskPool, TaskPoolConfig};
//!
//! let pool = TaskPool::new(TaskPoolConfig::default())?;
//! let handle = pool.submit(async { 40 + 2 })?;
//! assert_eq!(handle.await?, 42);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod pool;

pub use config::TaskPoolConfig;
pub use error::PoolError;
pub use pool::{PoolStats, TaskHandle, TaskPool};
