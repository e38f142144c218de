//! Error types for turn resolution.

/// Top-level error type for a voice session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Intent classifier invocation error.
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Tool lookup or execution error.
    #[error("tool error: {0}")]
    Tool(String),

    /// Work scheduled onto the session scheduler failed or was dropped.
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// Worker pool is shut down or a job was lost.
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    /// The session does not expose a stop operation.
    #[error("stop operation unavailable")]
    StopUnavailable,

    /// The stop operation ran but failed.
    #[error("stop failed: {0}")]
    Stop(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encode/decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SessionError>;
