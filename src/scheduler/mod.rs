//! Execution plumbing for tool dispatch.
//!
//! - [`WorkerPool`] — bounded threads that run dispatched turns off the
//!   session scheduler.
//! - [`SchedulerBridge`] — lets a worker run async work on the scheduler and
//!   block until it completes.

pub mod executor_bridge;
pub mod worker_pool;

pub use executor_bridge::SchedulerBridge;
pub use worker_pool::{JobHandle, WorkerPool};
