//! Utterance preprocessing: structured envelope extraction and phrase filtering.

use crate::session::SessionContext;
use serde::Deserialize;
use tracing::debug;

/// `{"content": "...", "speaker": "..."}` wrapper some clients send.
#[derive(Debug, Deserialize)]
struct Envelope {
    content: String,
    #[serde(default)]
    speaker: Option<String>,
}

/// A user utterance after envelope extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Text used for all downstream analysis.
    pub text: String,
    /// Speaker named by the envelope, if any.
    pub speaker: Option<String>,
    /// Whether `text` came out of a structured envelope.
    pub from_envelope: bool,
}

impl Utterance {
    /// Parse raw input. Malformed envelopes fall back to the raw text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with('{') && trimmed.ends_with('}') {
            match serde_json::from_str::<Envelope>(trimmed) {
                Ok(envelope) => {
                    return Self {
                        text: envelope.content,
                        speaker: envelope.speaker,
                        from_envelope: true,
                    };
                }
                Err(e) => debug!("utterance looks structured but is not an envelope: {e}"),
            }
        }
        Self {
            text: raw.to_owned(),
            speaker: None,
            from_envelope: false,
        }
    }
}

/// Parse `raw`, record the envelope speaker on the session and return the
/// normalized text.
pub fn preprocess(session: &SessionContext, raw: &str) -> String {
    let utterance = Utterance::parse(raw);
    if utterance.from_envelope {
        debug!(parent: session.span(), speaker = ?utterance.speaker, "envelope speaker");
        session.set_speaker(utterance.speaker);
    }
    utterance.text
}

/// Strip punctuation (ASCII and CJK) and collapse whitespace so phrase
/// matching is resilient to transcription formatting.
/// For example, "停止回答！" → "停止回答", "stop,  talking." → "stop talking".
pub fn strip_punctuation(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
