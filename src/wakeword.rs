//! Wake-word gate.
//!
//! Consumes utterances that are nothing but a wake phrase ("你好小智") so they
//! never reach classification. The assistant answers with a short greeting.

use crate::config::WakeupConfig;
use crate::emitter::ResponseEmitter;
use crate::session::{SessionContext, new_token};
use crate::utterance::strip_punctuation;
use async_trait::async_trait;
use tracing::{Span, info};

/// Decides whether a filtered utterance is fully consumed as a wake event.
#[async_trait]
pub trait WakeGate: Send + Sync {
    async fn check(&self, session: &SessionContext, filtered: &str) -> bool;
}

/// Gate that never consumes anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWakeGate;

#[async_trait]
impl WakeGate for NoWakeGate {
    async fn check(&self, _session: &SessionContext, _filtered: &str) -> bool {
        false
    }
}

/// Exact-match wake phrase gate with a spoken greeting.
#[derive(Debug, Clone)]
pub struct PhraseWakeGate {
    words: Vec<String>,
    reply: String,
    emitter: ResponseEmitter,
    span: Span,
}

impl PhraseWakeGate {
    pub fn new(config: &WakeupConfig, emitter: ResponseEmitter, span: Span) -> Self {
        let words = if config.enabled {
            config
                .words
                .iter()
                .map(|w| strip_punctuation(w).to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        } else {
            Vec::new()
        };
        Self {
            words,
            reply: config.reply.clone(),
            emitter,
            span,
        }
    }

    /// Whether `filtered` is exactly one of the wake phrases (case-insensitive).
    pub fn is_wake_phrase(&self, filtered: &str) -> bool {
        let lower = filtered.to_lowercase();
        self.words.iter().any(|w| *w == lower)
    }
}

#[async_trait]
impl WakeGate for PhraseWakeGate {
    async fn check(&self, session: &SessionContext, filtered: &str) -> bool {
        if !self.is_wake_phrase(filtered) {
            return false;
        }
        info!(parent: &self.span, "wake phrase: {filtered}");
        session.echo(filtered);
        // The greeting never supersedes a tool reply still in flight.
        self.emitter.announce(session, &new_token(), &self.reply);
        true
    }
}
