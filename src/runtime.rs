//! Session events emitted for transports and UIs.
//!
//! This is intentionally lightweight (no heavy payloads) so resolution can
//! emit events without blocking.

use crate::error::Result;
use crate::session::SessionControl;
use tokio::sync::broadcast;

/// Events describing what the session is doing "right now".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Transcript echo of what the user said (or an acknowledgement).
    Transcript(String),
    /// In-flight speech was cancelled.
    SpeechStopped,
    /// The session asked its connection to close.
    CloseRequested,
}

/// [`SessionControl`] that publishes every hook as a [`SessionEvent`].
///
/// Sending never fails the hook: with no subscribers the event is simply lost.
#[derive(Debug, Clone)]
pub struct ChannelSessionControl {
    tx: broadcast::Sender<SessionEvent>,
}

impl ChannelSessionControl {
    /// Create a control with its own channel of the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}

impl SessionControl for ChannelSessionControl {
    fn echo_transcript(&self, text: &str) {
        self.emit(SessionEvent::Transcript(text.to_owned()));
    }

    fn stop_speech(&self) -> Result<()> {
        self.emit(SessionEvent::SpeechStopped);
        Ok(())
    }

    fn request_close(&self) {
        self.emit(SessionEvent::CloseRequested);
    }
}
