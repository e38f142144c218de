//! Bounded pool of worker threads for tool dispatch.
//!
//! Jobs are plain closures pulled from a shared crossbeam channel. A job that
//! needs async work hands it to the session scheduler through a
//! [`SchedulerBridge`](super::SchedulerBridge) and blocks its worker, never
//! the scheduler.

use crate::error::{Result, SessionError};
use crossbeam_channel::{Receiver, Sender};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::JoinHandle;
use tokio::sync::oneshot;
use tracing::{Span, debug, error};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Completion handle for a submitted job.
#[derive(Debug)]
pub struct JobHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> JobHandle<T> {
    /// Wait for the job from async code.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WorkerPool`] if the job panicked or the pool
    /// was torn down before running it.
    pub async fn join(self) -> Result<T> {
        self.rx
            .await
            .map_err(|_| SessionError::WorkerPool("job dropped before completion".into()))
    }
}

/// Fixed-size worker pool.
pub struct WorkerPool {
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    span: Span,
}

impl WorkerPool {
    /// Start `threads` workers (at least one).
    ///
    /// # Errors
    ///
    /// Returns an error if a worker thread cannot be spawned.
    pub fn new(threads: usize, span: Span) -> Result<Self> {
        let threads = threads.max(1);
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let rx = rx.clone();
            let worker_span = span.clone();
            let handle = std::thread::Builder::new()
                .name(format!("parley-worker-{index}"))
                .spawn(move || worker_loop(index, &rx, &worker_span))
                .map_err(|e| SessionError::WorkerPool(format!("spawn worker {index}: {e}")))?;
            workers.push(handle);
        }
        debug!(parent: &span, threads, "worker pool started");
        Ok(Self {
            tx: Some(tx),
            workers,
            span,
        })
    }

    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Queue `job` and return its completion handle without waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool has been shut down.
    pub fn submit<F, T>(&self, job: F) -> Result<JobHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| SessionError::WorkerPool("pool is shut down".into()))?;
        let (done_tx, done_rx) = oneshot::channel();
        let wrapped: Job = Box::new(move || {
            let _ = done_tx.send(job());
        });
        tx.send(wrapped)
            .map_err(|_| SessionError::WorkerPool("pool is shut down".into()))?;
        Ok(JobHandle { rx: done_rx })
    }

    /// Stop accepting work, let queued jobs finish and join every worker.
    pub fn shutdown(mut self) {
        self.tx.take();
        let span = self.span.clone();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!(parent: &span, "worker thread exited abnormally");
            }
        }
        debug!(parent: &span, "worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Workers exit once the queue drains; they are not joined here.
        self.tx.take();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.workers.len())
            .field("open", &self.tx.is_some())
            .finish()
    }
}

fn worker_loop(index: usize, rx: &Receiver<Job>, span: &Span) {
    for job in rx.iter() {
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!(parent: span, worker = index, "job panicked");
        }
    }
}
