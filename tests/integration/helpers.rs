//! Shared helpers for integration tests.
//!
//! Recording session control, a scripted intent classifier, fake tools and a
//! harness that wires them into a [`TurnResolver`] on the test runtime.

use async_trait::async_trait;
use parley::dialogue::DialogueEntry;
use parley::intent::{ClassifierSignal, IntentClassifier};
use parley::pipeline::messages::{ContentKind, SpeechSegment};
use parley::scheduler::{SchedulerBridge, WorkerPool};
use parley::tools::{ActionOutcome, Tool, ToolRegistry};
use parley::{SessionConfig, SessionContext, SessionControl, SessionError, TurnResolver};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::Span;

/// Session control that records every hook call.
#[derive(Default)]
pub(crate) struct RecordingControl {
    echoes: Mutex<Vec<String>>,
    stops: AtomicUsize,
    closes: AtomicUsize,
    fail_stop: bool,
}

impl RecordingControl {
    pub(crate) fn failing_stop() -> Self {
        Self {
            fail_stop: true,
            ..Self::default()
        }
    }

    pub(crate) fn echoes(&self) -> Vec<String> {
        self.echoes.lock().unwrap().clone()
    }

    pub(crate) fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl SessionControl for RecordingControl {
    fn echo_transcript(&self, text: &str) {
        self.echoes.lock().unwrap().push(text.to_owned());
    }

    fn stop_speech(&self) -> parley::Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            Err(SessionError::Stop("synthesizer unreachable".into()))
        } else {
            Ok(())
        }
    }

    fn request_close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// One scripted classifier answer.
pub(crate) enum Scripted {
    Signal(ClassifierSignal),
    Fail,
}

impl Scripted {
    pub(crate) fn payload(json: &str) -> Self {
        Self::Signal(ClassifierSignal::Payload(json.to_owned()))
    }
}

/// Classifier that replays scripted answers (then `Continue`) and records
/// what it was asked.
#[derive(Default)]
pub(crate) struct ScriptedClassifier {
    script: Mutex<VecDeque<Scripted>>,
    rendering: Option<String>,
    detected: Mutex<Vec<String>>,
    renders: Mutex<Vec<(String, String)>>,
}

impl ScriptedClassifier {
    pub(crate) fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub(crate) fn with_rendering(mut self, reply: &str) -> Self {
        self.rendering = Some(reply.to_owned());
        self
    }

    pub(crate) fn detected(&self) -> Vec<String> {
        self.detected.lock().unwrap().clone()
    }

    pub(crate) fn renders(&self) -> Vec<(String, String)> {
        self.renders.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntentClassifier for ScriptedClassifier {
    async fn detect(
        &self,
        _history: &[DialogueEntry],
        text: &str,
    ) -> parley::Result<ClassifierSignal> {
        self.detected.lock().unwrap().push(text.to_owned());
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Signal(signal)) => Ok(signal),
            Some(Scripted::Fail) => Err(SessionError::Classifier("backend down".into())),
            None => Ok(ClassifierSignal::Continue),
        }
    }

    async fn render(&self, tool_result: &str, original_text: &str) -> Option<String> {
        self.renders
            .lock()
            .unwrap()
            .push((tool_result.to_owned(), original_text.to_owned()));
        self.rendering.clone()
    }
}

/// Tool returning a fixed outcome.
pub(crate) struct StaticTool {
    pub(crate) name: &'static str,
    pub(crate) outcome: ActionOutcome,
}

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        "returns a fixed outcome"
    }
    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }
    async fn invoke(
        &self,
        _session: &SessionContext,
        _args: serde_json::Value,
    ) -> parley::Result<ActionOutcome> {
        Ok(self.outcome.clone())
    }
}

/// Tool that records the decoded arguments it was invoked with.
#[derive(Default)]
pub(crate) struct CaptureTool {
    pub(crate) seen: Mutex<Vec<serde_json::Value>>,
}

#[async_trait]
impl Tool for CaptureTool {
    fn name(&self) -> &str {
        "capture"
    }
    fn description(&self) -> &str {
        "records its arguments"
    }
    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }
    async fn invoke(
        &self,
        _session: &SessionContext,
        args: serde_json::Value,
    ) -> parley::Result<ActionOutcome> {
        self.seen.lock().unwrap().push(args);
        Ok(ActionOutcome::respond("captured"))
    }
}

/// Tool that blocks until released, then answers.
#[derive(Default)]
pub(crate) struct GatedTool {
    pub(crate) release: Notify,
}

#[async_trait]
impl Tool for GatedTool {
    fn name(&self) -> &str {
        "gated"
    }
    fn description(&self) -> &str {
        "waits for a release signal"
    }
    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }
    async fn invoke(
        &self,
        _session: &SessionContext,
        _args: serde_json::Value,
    ) -> parley::Result<ActionOutcome> {
        self.release.notified().await;
        Ok(ActionOutcome::respond("这是一段很长的回答"))
    }
}

/// Tool that fails or panics.
pub(crate) struct BrokenTool {
    pub(crate) panic: bool,
}

#[async_trait]
impl Tool for BrokenTool {
    fn name(&self) -> &str {
        "broken"
    }
    fn description(&self) -> &str {
        "always fails"
    }
    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }
    async fn invoke(
        &self,
        _session: &SessionContext,
        _args: serde_json::Value,
    ) -> parley::Result<ActionOutcome> {
        if self.panic {
            panic!("sensor offline");
        }
        Err(SessionError::Tool("sensor offline".into()))
    }
}

/// Resolver, session and test doubles wired together.
pub(crate) struct Harness {
    pub(crate) resolver: TurnResolver,
    pub(crate) session: Arc<SessionContext>,
    pub(crate) control: Arc<RecordingControl>,
    pub(crate) classifier: Option<Arc<ScriptedClassifier>>,
}

impl Harness {
    /// Must be called from inside the test runtime.
    pub(crate) fn new(
        config: SessionConfig,
        control: RecordingControl,
        tools: Vec<Arc<dyn Tool>>,
        classifier: Option<ScriptedClassifier>,
    ) -> Self {
        let session_config = config.clone();
        Self::with_session_config(config, &session_config, control, tools, classifier)
    }

    /// Like [`Harness::new`], but the session gets its own `session_config`.
    pub(crate) fn with_session_config(
        config: SessionConfig,
        session_config: &SessionConfig,
        control: RecordingControl,
        tools: Vec<Arc<dyn Tool>>,
        classifier: Option<ScriptedClassifier>,
    ) -> Self {
        let config = Arc::new(config);
        let control = Arc::new(control);
        let session = Arc::new(SessionContext::new(session_config, control.clone()));

        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(tool);
        }
        let pool = WorkerPool::new(2, Span::none()).expect("worker pool");
        let bridge = SchedulerBridge::current().expect("inside runtime");
        let mut resolver = TurnResolver::new(
            config,
            Arc::new(registry),
            Arc::new(pool),
            bridge,
            Span::none(),
        );

        let classifier = classifier.map(Arc::new);
        if let Some(c) = &classifier {
            resolver = resolver.with_classifier(c.clone());
        }
        Self {
            resolver,
            session,
            control,
            classifier,
        }
    }

    /// Default config, recording control, the given tools and script.
    pub(crate) fn scripted(tools: Vec<Arc<dyn Tool>>, script: Vec<Scripted>) -> Self {
        Self::new(
            SessionConfig::default(),
            RecordingControl::default(),
            tools,
            Some(ScriptedClassifier::new(script)),
        )
    }

    pub(crate) fn classifier(&self) -> &ScriptedClassifier {
        self.classifier.as_deref().expect("classifier configured")
    }
}

/// Text of every TEXT segment in `segments`, in order.
pub(crate) fn spoken(segments: &[SpeechSegment]) -> Vec<String> {
    segments
        .iter()
        .filter(|s| s.kind == ContentKind::Text)
        .filter_map(|s| s.content.clone())
        .collect()
}

/// A `function_call` payload naming `name` with `arguments`.
pub(crate) fn call_payload(name: &str, arguments: serde_json::Value) -> Scripted {
    Scripted::payload(
        &serde_json::json!({"function_call": {"name": name, "arguments": arguments}}).to_string(),
    )
}
