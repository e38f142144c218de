//! Core tool types.
//!
//! Defines the [`Tool`] trait every registered capability implements and the
//! [`ActionOutcome`] a tool produces for each invocation.

use crate::error::Result;
use crate::session::SessionContext;
use async_trait::async_trait;

/// What the caller should do with a tool's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Speak the text to the user directly.
    Respond(Option<String>),
    /// Record the result and ask the model to phrase a reply from it.
    RequestFollowupFromModel(String),
    /// The requested capability or entity was not found.
    NotFound(Option<String>),
    /// The tool failed; the text is safe to speak.
    Error(Option<String>),
    /// No specific action. Whatever text is present is spoken, except for
    /// tools that manage their own speech.
    NoAction {
        response: Option<String>,
        result: Option<String>,
    },
}

impl ActionOutcome {
    pub fn respond(text: impl Into<String>) -> Self {
        Self::Respond(Some(text.into()))
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Error(Some(text.into()))
    }

    pub fn not_found(text: impl Into<String>) -> Self {
        Self::NotFound(Some(text.into()))
    }

    /// Short variant name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Respond(_) => "respond",
            Self::RequestFollowupFromModel(_) => "request_followup",
            Self::NotFound(_) => "not_found",
            Self::Error(_) => "error",
            Self::NoAction { .. } => "none",
        }
    }
}

/// Whether callers should wait for a tool before replying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchMode {
    /// The reply depends on the tool's result.
    #[default]
    Wait,
    /// The tool replies on its own; callers need not wait.
    Detached,
}

/// A capability the intent classifier can call by name.
///
/// Tools run on the session scheduler, so `invoke` must not block the thread;
/// bound external calls with a timeout and report failures as outcomes.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Registered name (e.g. "get_latest_heart_rate").
    fn name(&self) -> &str;

    /// Natural-language description shown to the classifier.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments.
    fn schema(&self) -> serde_json::Value;

    fn dispatch_mode(&self) -> DispatchMode {
        DispatchMode::Wait
    }

    /// Execute with decoded JSON arguments.
    ///
    /// Long-running tools should check [`SessionContext::is_aborted`] and give
    /// up early once the user has asked to stop.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid arguments or unexpected failures; the
    /// dispatcher turns it into an [`ActionOutcome::Error`].
    async fn invoke(
        &self,
        session: &SessionContext,
        args: serde_json::Value,
    ) -> Result<ActionOutcome>;
}
