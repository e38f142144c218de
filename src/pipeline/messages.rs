//! Message types passed between resolution stages and the synthesis consumer.

use serde::{Deserialize, Serialize};

/// Where a segment sits inside a grouped reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentencePosition {
    /// Opens a reply group.
    First,
    /// Body of a reply group.
    Middle,
    /// Closes a reply group.
    Last,
}

/// What a segment carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentKind {
    /// Framing marker with no text.
    Action,
    /// Text to synthesize.
    Text,
}

/// One unit of work for the speech synthesis consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechSegment {
    /// Turn this segment belongs to. Stale turns are discarded after a stop.
    pub turn_id: String,
    /// Position inside the reply group.
    pub position: SentencePosition,
    /// Marker or text.
    pub kind: ContentKind,
    /// Text for `Text` segments.
    pub content: Option<String>,
}

impl SpeechSegment {
    /// Opening action marker.
    pub fn first(turn_id: &str) -> Self {
        Self {
            turn_id: turn_id.to_owned(),
            position: SentencePosition::First,
            kind: ContentKind::Action,
            content: None,
        }
    }

    /// Text body.
    pub fn text(turn_id: &str, content: impl Into<String>) -> Self {
        Self {
            turn_id: turn_id.to_owned(),
            position: SentencePosition::Middle,
            kind: ContentKind::Text,
            content: Some(content.into()),
        }
    }

    /// Closing action marker.
    pub fn last(turn_id: &str) -> Self {
        Self {
            turn_id: turn_id.to_owned(),
            position: SentencePosition::Last,
            kind: ContentKind::Action,
            content: None,
        }
    }

    /// The FIRST → TEXT → LAST framing used for every tool-originated reply.
    pub fn reply_triple(turn_id: &str, content: &str) -> [Self; 3] {
        [
            Self::first(turn_id),
            Self::text(turn_id, content),
            Self::last(turn_id),
        ]
    }
}

/// Per-turn resolution stage.
///
/// `Idle → Preprocessed → InterruptChecked → Classifying → Dispatching →
/// Emitting → Idle`; a turn that is handled early goes straight back to `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TurnStage {
    #[default]
    Idle,
    Preprocessed,
    InterruptChecked,
    Classifying,
    Dispatching,
    Emitting,
}
