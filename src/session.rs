//! Per-connection session state shared by the scheduler and worker threads.
//!
//! A [`SessionContext`] lives as long as its connection. Every field that is
//! touched from more than one execution context is guarded: the dialogue and
//! the speech queue by their own mutexes, the turn id and speaker by small
//! mutexes, the abort flag by an atomic.

use crate::config::SessionConfig;
use crate::dialogue::Dialogue;
use crate::error::{Result, SessionError};
use crate::interrupt::InterruptDetector;
use crate::pipeline::messages::TurnStage;
use crate::pipeline::speech_queue::SpeechQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{Span, debug, info, info_span, warn};

/// Hooks the owning connection exposes to turn resolution.
pub trait SessionControl: Send + Sync {
    /// Record what the system believes the user said.
    fn echo_transcript(&self, text: &str);

    /// Cancel in-flight speech synthesis and playback.
    ///
    /// Must be idempotent and succeed when nothing is playing. The default
    /// reports the operation as unavailable.
    fn stop_speech(&self) -> Result<()> {
        Err(SessionError::StopUnavailable)
    }

    /// Ask the connection to close.
    fn request_close(&self);
}

/// Generate a fresh hex token for turn and invocation ids.
pub fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Mutable state of one voice session.
pub struct SessionContext {
    session_id: String,
    interrupt: InterruptDetector,
    dialogue: Dialogue,
    speech: SpeechQueue,
    turn_id: Mutex<Option<String>>,
    client_abort: AtomicBool,
    speaker: Mutex<Option<String>>,
    stage: Mutex<TurnStage>,
    control: Arc<dyn SessionControl>,
    span: Span,
}

impl SessionContext {
    /// Create a session with a fresh id and its own `session` span.
    ///
    /// Stop keywords and exit phrases are taken from `config` and stay fixed
    /// for the life of the session.
    pub fn new(config: &SessionConfig, control: Arc<dyn SessionControl>) -> Self {
        let session_id = new_token();
        let span = info_span!("session", session_id = %session_id);
        Self {
            session_id,
            interrupt: InterruptDetector::new(&config.interrupt),
            dialogue: Dialogue::new(),
            speech: SpeechQueue::new(),
            turn_id: Mutex::new(None),
            client_abort: AtomicBool::new(false),
            speaker: Mutex::new(None),
            stage: Mutex::new(TurnStage::Idle),
            control,
            span,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Stop and exit phrases of this session.
    pub fn interrupts(&self) -> &InterruptDetector {
        &self.interrupt
    }

    pub fn dialogue(&self) -> &Dialogue {
        &self.dialogue
    }

    pub fn speech(&self) -> &SpeechQueue {
        &self.speech
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Last speaker named by a structured utterance envelope.
    pub fn speaker(&self) -> Option<String> {
        self.speaker.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_speaker(&self, speaker: Option<String>) {
        *self.speaker.lock().unwrap_or_else(|e| e.into_inner()) = speaker;
    }

    /// Start a new turn and return its id. Any previous turn becomes stale.
    pub fn begin_turn(&self) -> String {
        let id = new_token();
        *self.turn_id.lock().unwrap_or_else(|e| e.into_inner()) = Some(id.clone());
        debug!(parent: &self.span, turn_id = %id, "turn started");
        id
    }

    pub fn current_turn_id(&self) -> Option<String> {
        self.turn_id.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Whether `turn_id` is still the active turn.
    pub fn is_current_turn(&self, turn_id: &str) -> bool {
        self.turn_id
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_deref()
            == Some(turn_id)
    }

    /// Abort flag tools consult to abandon long-running work.
    pub fn is_aborted(&self) -> bool {
        self.client_abort.load(Ordering::SeqCst)
    }

    pub fn set_aborted(&self, aborted: bool) {
        self.client_abort.store(aborted, Ordering::SeqCst);
    }

    pub fn stage(&self) -> TurnStage {
        *self.stage.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_stage(&self, stage: TurnStage) {
        let mut current = self.stage.lock().unwrap_or_else(|e| e.into_inner());
        if *current != stage {
            debug!(parent: &self.span, from = ?*current, to = ?stage, "turn stage");
            *current = stage;
        }
    }

    pub fn echo(&self, text: &str) {
        self.control.echo_transcript(text);
    }

    pub fn request_close(&self) {
        info!(parent: &self.span, "session close requested");
        self.control.request_close();
    }

    /// Stop answering now.
    ///
    /// Cancels in-flight speech through the connection, raises the abort
    /// flag, forgets the current turn and drops every pending segment so
    /// nothing stale is synthesized once emission resumes. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the connection's error when its stop hook is unavailable or fails;
    /// session state is left untouched in that case.
    pub fn stop_answering(&self) -> Result<()> {
        if let Err(e) = self.control.stop_speech() {
            warn!(parent: &self.span, error = %e, "stop speech failed");
            return Err(e);
        }
        self.set_aborted(true);
        let stale = self.turn_id.lock().unwrap_or_else(|e| e.into_inner()).take();
        let dropped = self.speech.clear();
        info!(
            parent: &self.span,
            stale_turn = stale.as_deref().unwrap_or("-"),
            dropped,
            "stopped answering"
        );
        Ok(())
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("session_id", &self.session_id)
            .field("turn_id", &self.current_turn_id())
            .field("aborted", &self.is_aborted())
            .field("stage", &self.stage())
            .finish_non_exhaustive()
    }
}
