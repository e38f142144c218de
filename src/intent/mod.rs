//! Intent classification.
//!
//! An [`IntentClassifier`] turns free text plus dialogue history into a
//! [`ClassifierSignal`]; the [`ClassifierBridge`] converts that signal into an
//! [`IntentResult`] the resolver acts on.
//!
//! - [`bridge`] — runs the classifier for a turn, handles stop signals and failures
//! - [`payload`] — parses structured `function_call` payloads
//! - [`llm`] — classifier backed by an OpenAI-compatible chat endpoint

pub mod bridge;
pub mod llm;
pub mod payload;

pub use bridge::ClassifierBridge;
pub use llm::LlmIntentClassifier;
pub use payload::{FunctionCall, normalize_arguments, parse_intent_payload};

use crate::dialogue::DialogueEntry;
use crate::error::Result;
use async_trait::async_trait;

/// Raw answer of an intent classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierSignal {
    /// Plain conversation; no tool needed.
    Continue,
    /// The user asked the assistant to stop talking.
    StopCommand,
    /// Structured payload to parse (usually a `function_call` object).
    Payload(String),
}

/// Resolved intent for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentResult {
    /// Fall through to ordinary chat.
    Continuation,
    /// Invoke a registered tool.
    ToolCall(FunctionCall),
    /// A stop was recognised and already carried out.
    StopAlreadyHandled,
    /// The classifier answered with something that is not a valid intent.
    Unparseable,
}

/// External intent classification capability.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classify `text` in the context of `history`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be reached or answers garbage;
    /// callers degrade to ordinary chat.
    async fn detect(&self, history: &[DialogueEntry], text: &str) -> Result<ClassifierSignal>;

    /// Phrase a tool result as a natural reply to `original_text`.
    ///
    /// Returns `None` when no rendering is available.
    async fn render(&self, tool_result: &str, original_text: &str) -> Option<String>;
}
