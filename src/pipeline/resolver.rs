//! Turn resolver: wires every stage of one user utterance together.
//!
//! Preprocess → interrupt check → wake gate → intent classification → tool
//! dispatch. Each stage may finish the turn early. The resolver runs on the
//! session scheduler and only suspends while the classifier is working; tool
//! execution happens on the worker pool.

use crate::config::SessionConfig;
use crate::dispatch::{Dispatch, ToolDispatcher};
use crate::emitter::ResponseEmitter;
use crate::intent::{ClassifierBridge, IntentClassifier, IntentResult};
use crate::interrupt::InterruptOutcome;
use crate::pipeline::messages::TurnStage;
use crate::scheduler::{SchedulerBridge, WorkerPool};
use crate::session::SessionContext;
use crate::tools::ToolRegistry;
use crate::utterance::{preprocess, strip_punctuation};
use crate::wakeword::{PhraseWakeGate, WakeGate};
use std::sync::Arc;
use tracing::{Span, debug, error, info};

/// How a turn was resolved.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Ordinary chat; the caller hands the text to the conversational model.
    NotHandled,
    /// A stop command was carried out and acknowledged.
    Stopped,
    /// An exit command closed the session.
    Closed,
    /// The utterance was only a wake phrase.
    WakeWord,
    /// The classifier recognised a stop and it was carried out.
    StopAlreadyHandled,
    /// A tool call was submitted; its reply arrives asynchronously.
    Dispatched(Dispatch),
}

impl TurnOutcome {
    /// Whether the turn is finished and must not reach the chat model.
    pub fn handled(&self) -> bool {
        !matches!(self, Self::NotHandled)
    }
}

/// Resolves user utterances for the sessions of one process.
pub struct TurnResolver {
    wake: Arc<dyn WakeGate>,
    intent: ClassifierBridge,
    dispatcher: ToolDispatcher,
    emitter: ResponseEmitter,
    config: Arc<SessionConfig>,
    registry: Arc<ToolRegistry>,
    pool: Arc<WorkerPool>,
    bridge: SchedulerBridge,
    span: Span,
}

impl TurnResolver {
    /// Build a resolver without a classifier (every turn degrades to chat)
    /// and with the configured wake phrases.
    pub fn new(
        config: Arc<SessionConfig>,
        registry: Arc<ToolRegistry>,
        pool: Arc<WorkerPool>,
        bridge: SchedulerBridge,
        span: Span,
    ) -> Self {
        let emitter = ResponseEmitter::new(
            config.intent.music_tool.clone(),
            tracing::debug_span!(parent: &span, "emitter"),
        );
        let wake = Arc::new(PhraseWakeGate::new(
            &config.wakeup,
            emitter.clone(),
            span.clone(),
        ));
        let intent = ClassifierBridge::new(None, &config.intent, span.clone());
        let dispatcher = ToolDispatcher::new(
            Arc::clone(&registry),
            None,
            emitter.clone(),
            Arc::clone(&pool),
            bridge.clone(),
            tracing::debug_span!(parent: &span, "dispatch"),
        );
        Self {
            wake,
            intent,
            dispatcher,
            emitter,
            config,
            registry,
            pool,
            bridge,
            span,
        }
    }

    /// Use `classifier` for intent detection and follow-up rendering.
    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.intent = ClassifierBridge::new(
            Some(Arc::clone(&classifier)),
            &self.config.intent,
            self.span.clone(),
        );
        self.dispatcher = ToolDispatcher::new(
            Arc::clone(&self.registry),
            Some(classifier),
            self.emitter.clone(),
            Arc::clone(&self.pool),
            self.bridge.clone(),
            tracing::debug_span!(parent: &self.span, "dispatch"),
        );
        self
    }

    /// Replace the wake-word gate.
    pub fn with_wake_gate(mut self, wake: Arc<dyn WakeGate>) -> Self {
        self.wake = wake;
        self
    }

    /// Resolve one raw utterance.
    ///
    /// Returns as soon as the turn is classified; a dispatched tool keeps
    /// running on the worker pool and its reply lands in the session's speech
    /// queue.
    pub async fn handle_user_intent(&self, session: &Arc<SessionContext>, raw: &str) -> TurnOutcome {
        let text = preprocess(session, raw);
        session.set_stage(TurnStage::Preprocessed);
        let filtered = strip_punctuation(&text);

        let interrupt = session.interrupts().handle(session, &self.emitter, &filtered);
        session.set_stage(TurnStage::InterruptChecked);
        match interrupt {
            InterruptOutcome::Stopped => return finish(session, TurnOutcome::Stopped),
            InterruptOutcome::Closed => return finish(session, TurnOutcome::Closed),
            InterruptOutcome::StopFailed | InterruptOutcome::NotInterrupt => {}
        }

        if self.wake.check(session, &filtered).await {
            return finish(session, TurnOutcome::WakeWord);
        }

        session.set_stage(TurnStage::Classifying);
        let call = match self.intent.analyze(session, &text).await {
            IntentResult::ToolCall(call) => call,
            IntentResult::StopAlreadyHandled => {
                return finish(session, TurnOutcome::StopAlreadyHandled);
            }
            IntentResult::Continuation | IntentResult::Unparseable => {
                debug!(parent: &self.span, "no tool intent, falling through to chat");
                return finish(session, TurnOutcome::NotHandled);
            }
        };

        let turn_id = session.begin_turn();
        info!(parent: &self.span, tool = %call.name, %turn_id, "tool intent resolved");
        match self.dispatcher.dispatch(session, turn_id, call, &text) {
            Ok(dispatch) => TurnOutcome::Dispatched(dispatch),
            Err(e) => {
                error!(parent: &self.span, error = %e, "tool dispatch failed");
                finish(session, TurnOutcome::NotHandled)
            }
        }
    }
}

fn finish(session: &SessionContext, outcome: TurnOutcome) -> TurnOutcome {
    session.set_stage(TurnStage::Idle);
    outcome
}

impl std::fmt::Debug for TurnResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnResolver")
            .field("tools", &self.registry.names())
            .field("workers", &self.pool.threads())
            .finish_non_exhaustive()
    }
}
