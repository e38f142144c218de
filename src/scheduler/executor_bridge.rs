//! Worker thread → session scheduler bridge.
//!
//! Provides [`SchedulerBridge`], the synchronous hand-off a worker thread uses
//! to run async work on the session's cooperative scheduler and block until
//! it finishes.

use crate::error::{Result, SessionError};
use std::future::Future;
use tokio::runtime::Handle;
use tokio::task::JoinError;

/// Submit-and-block bridge into a tokio runtime.
///
/// The runtime may be single-threaded: while the scheduler thread is driving
/// `Runtime::block_on`, work submitted here runs on it and the calling worker
/// thread parks until the result is ready.
#[derive(Debug, Clone)]
pub struct SchedulerBridge {
    handle: Handle,
}

impl SchedulerBridge {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Bridge into the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a tokio runtime.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| SessionError::Scheduler(e.to_string()))
    }

    /// Schedule `fut` onto the session scheduler and block until it completes.
    ///
    /// Must be called from a thread that is not itself running async tasks.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Scheduler`] when called from inside a runtime,
    /// when the scheduled work panics (carrying the panic message) or when
    /// the runtime shuts down before it completes.
    pub fn run_blocking<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if Handle::try_current().is_ok() {
            return Err(SessionError::Scheduler(
                "cannot block on the scheduler from inside an async context".into(),
            ));
        }
        let join = self.handle.spawn(fut);
        self.handle.block_on(join).map_err(describe_join_error)
    }
}

fn describe_join_error(e: JoinError) -> SessionError {
    if e.is_panic() {
        let payload = e.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_owned());
        SessionError::Scheduler(format!("scheduled work panicked: {message}"))
    } else {
        SessionError::Scheduler("scheduled work was cancelled".into())
    }
}
