//! Runs the intent classifier for a turn.

use crate::config::{IntentConfig, IntentMode};
use crate::intent::payload::parse_intent_payload;
use crate::intent::{ClassifierSignal, IntentClassifier, IntentResult};
use crate::session::SessionContext;
use std::sync::Arc;
use tracing::{Span, debug, error, info, warn};

/// Bridges a turn into the external classifier and back.
///
/// Failures never surface to the user: a classifier error, an unavailable
/// classifier or a failed stop all degrade to ordinary chat.
pub struct ClassifierBridge {
    classifier: Option<Arc<dyn IntentClassifier>>,
    mode: IntentMode,
    continue_sentinel: String,
    span: Span,
}

impl ClassifierBridge {
    pub fn new(
        classifier: Option<Arc<dyn IntentClassifier>>,
        config: &IntentConfig,
        span: Span,
    ) -> Self {
        Self {
            classifier,
            mode: config.mode,
            continue_sentinel: config.continue_sentinel.clone(),
            span,
        }
    }

    /// Classify `text` against the session's dialogue history.
    pub async fn analyze(&self, session: &SessionContext, text: &str) -> IntentResult {
        if self.mode == IntentMode::FunctionCall {
            debug!(parent: &self.span, "function-call mode, skipping intent pass");
            return IntentResult::Continuation;
        }
        let Some(classifier) = &self.classifier else {
            warn!(parent: &self.span, "intent classifier not configured");
            return IntentResult::Continuation;
        };

        let history = session.dialogue().snapshot();
        match classifier.detect(&history, text).await {
            Ok(ClassifierSignal::Continue) => IntentResult::Continuation,
            Ok(ClassifierSignal::StopCommand) => {
                info!(parent: &self.span, "classifier recognised a stop command");
                match session.stop_answering() {
                    Ok(()) => IntentResult::StopAlreadyHandled,
                    Err(e) => {
                        error!(parent: &self.span, error = %e, "stop command could not be handled");
                        IntentResult::Continuation
                    }
                }
            }
            Ok(ClassifierSignal::Payload(payload)) => {
                let result = parse_intent_payload(&payload, &self.continue_sentinel);
                if result == IntentResult::Unparseable {
                    warn!(parent: &self.span, "unparseable intent payload: {payload}");
                }
                result
            }
            Err(e) => {
                error!(parent: &self.span, error = %e, "intent classification failed");
                IntentResult::Continuation
            }
        }
    }
}
