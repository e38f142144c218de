//! Response emitter: turns tool outcomes into speech segments and dialogue.
//!
//! Spoken replies are framed as FIRST(action) → TEXT → LAST(action), tagged
//! with the turn id, followed by an `assistant` dialogue entry. A reply whose
//! turn went stale (the user stopped the assistant while the tool ran) is
//! dropped before it reaches the queue.

use crate::dialogue::Role;
use crate::pipeline::messages::SpeechSegment;
use crate::session::SessionContext;
use crate::tools::ActionOutcome;
use tracing::{Span, debug, info};

/// What the emitter did with an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// The text was queued for synthesis.
    Spoken(String),
    /// The turn was stopped or superseded; nothing was queued.
    Suppressed,
    /// The outcome carried nothing to say.
    Silent,
}

/// Maps [`ActionOutcome`]s to speech and dialogue effects.
#[derive(Debug, Clone)]
pub struct ResponseEmitter {
    music_tool: String,
    span: Span,
}

impl ResponseEmitter {
    /// `music_tool` names the playback tool that manages its own speech.
    pub fn new(music_tool: impl Into<String>, span: Span) -> Self {
        Self {
            music_tool: music_tool.into(),
            span,
        }
    }

    /// Queue a system announcement (stop acknowledgement, wake greeting).
    ///
    /// Not subject to the stale-turn check and not added to the dialogue.
    pub fn announce(&self, session: &SessionContext, turn_id: &str, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        session
            .speech()
            .push_group(SpeechSegment::reply_triple(turn_id, text));
        debug!(parent: &self.span, %turn_id, "announced: {text}");
    }

    /// Speak `text` for `turn_id` and record it as an assistant reply.
    ///
    /// Nothing is queued when `turn_id` is no longer the session's current
    /// turn or the abort flag is raised.
    pub fn speak(&self, session: &SessionContext, turn_id: &str, text: &str) -> Emission {
        if text.trim().is_empty() {
            return Emission::Silent;
        }
        // The dialogue entry is written under the queue lock so a stop either
        // drops both the segments and the entry or neither.
        let queued = session.speech().push_group_if(
            SpeechSegment::reply_triple(turn_id, text),
            || {
                if !Self::deliverable(session, turn_id) {
                    return false;
                }
                session.dialogue().put(Role::Assistant, text);
                true
            },
        );
        if !queued {
            info!(parent: &self.span, %turn_id, "reply suppressed after stop");
            return Emission::Suppressed;
        }
        debug!(parent: &self.span, %turn_id, "spoke: {text}");
        Emission::Spoken(text.to_owned())
    }

    /// Apply the effect of a tool outcome.
    ///
    /// `render(tool_result, original_text)` phrases a follow-up reply; it is
    /// only called for [`ActionOutcome::RequestFollowupFromModel`] and only
    /// while the turn is still live.
    pub fn emit_outcome<R>(
        &self,
        session: &SessionContext,
        turn_id: &str,
        tool_name: &str,
        original_text: &str,
        outcome: ActionOutcome,
        render: R,
    ) -> Emission
    where
        R: FnOnce(&str, &str) -> Option<String>,
    {
        debug!(parent: &self.span, tool = %tool_name, outcome = outcome.kind(), "emitting outcome");
        match outcome {
            ActionOutcome::Respond(text)
            | ActionOutcome::NotFound(text)
            | ActionOutcome::Error(text) => match text {
                Some(text) => self.speak(session, turn_id, &text),
                None => Emission::Silent,
            },
            ActionOutcome::RequestFollowupFromModel(result) => {
                session.dialogue().put(Role::Tool, result.as_str());
                if !Self::deliverable(session, turn_id) {
                    info!(parent: &self.span, %turn_id, "follow-up skipped after stop");
                    return Emission::Suppressed;
                }
                let reply = render(&result, original_text)
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or(result);
                self.speak(session, turn_id, &reply)
            }
            ActionOutcome::NoAction { response, result } => {
                if tool_name == self.music_tool {
                    return Emission::Silent;
                }
                match response.or(result) {
                    Some(text) => self.speak(session, turn_id, &text),
                    None => Emission::Silent,
                }
            }
        }
    }

    fn deliverable(session: &SessionContext, turn_id: &str) -> bool {
        session.is_current_turn(turn_id) && !session.is_aborted()
    }
}
