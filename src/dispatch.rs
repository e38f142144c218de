//! Tool dispatch bridge.
//!
//! A resolved tool call is handed to the [`WorkerPool`]. The worker records
//! the user turn, runs the tool on the session scheduler through the
//! [`SchedulerBridge`] (blocking only itself), then emits the outcome.
//! [`ToolDispatcher::dispatch`] returns as soon as the job is queued.

use crate::dialogue::Role;
use crate::emitter::{Emission, ResponseEmitter};
use crate::error::{Result, SessionError};
use crate::intent::{FunctionCall, IntentClassifier};
use crate::pipeline::messages::TurnStage;
use crate::scheduler::{JobHandle, SchedulerBridge, WorkerPool};
use crate::session::SessionContext;
use crate::tools::{ActionOutcome, DispatchMode, ToolRegistry};
use std::sync::Arc;
use tracing::{Span, debug, error, info, warn};

/// A submitted tool invocation.
#[derive(Debug)]
pub struct Dispatch {
    /// Turn every segment of the reply is tagged with.
    pub turn_id: String,
    /// Invocation id of the function call.
    pub call_id: String,
    pub tool_name: String,
    /// Whether the caller should wait for `job` before replying itself.
    pub mode: DispatchMode,
    /// Resolves once the reply has been emitted (or suppressed).
    pub job: JobHandle<Emission>,
}

/// Submits tool calls to the worker pool.
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    classifier: Option<Arc<dyn IntentClassifier>>,
    emitter: ResponseEmitter,
    pool: Arc<WorkerPool>,
    bridge: SchedulerBridge,
    span: Span,
}

impl ToolDispatcher {
    /// `classifier` renders follow-up replies; without one the raw tool
    /// result is spoken.
    pub fn new(
        registry: Arc<ToolRegistry>,
        classifier: Option<Arc<dyn IntentClassifier>>,
        emitter: ResponseEmitter,
        pool: Arc<WorkerPool>,
        bridge: SchedulerBridge,
        span: Span,
    ) -> Self {
        Self {
            registry,
            classifier,
            emitter,
            pool,
            bridge,
            span,
        }
    }

    /// Submit `call` for `turn_id` and return without waiting for the tool.
    ///
    /// Echoes `original_text` to the transcript and clears the abort flag
    /// before the job is queued.
    ///
    /// # Errors
    ///
    /// Returns an error only if the worker pool no longer accepts jobs.
    pub fn dispatch(
        &self,
        session: &Arc<SessionContext>,
        turn_id: String,
        call: FunctionCall,
        original_text: &str,
    ) -> Result<Dispatch> {
        let mode = self
            .registry
            .dispatch_mode(&call.name)
            .unwrap_or_default();
        info!(
            parent: &self.span,
            tool = %call.name,
            call_id = %call.id,
            %turn_id,
            arguments = %call.arguments,
            "dispatching tool call"
        );

        session.echo(original_text);
        session.set_aborted(false);
        session.set_stage(TurnStage::Dispatching);

        let call_id = call.id.clone();
        let tool_name = call.name.clone();
        let job = ToolJob {
            session: Arc::clone(session),
            registry: Arc::clone(&self.registry),
            classifier: self.classifier.clone(),
            emitter: self.emitter.clone(),
            bridge: self.bridge.clone(),
            span: self.span.clone(),
            turn_id: turn_id.clone(),
            call,
            original_text: original_text.to_owned(),
        };

        let handle = self.pool.submit(move || job.run()).inspect_err(|e| {
            error!(parent: &self.span, error = %e, "tool job rejected");
            session.set_stage(TurnStage::Idle);
        })?;

        Ok(Dispatch {
            turn_id,
            call_id,
            tool_name,
            mode,
            job: handle,
        })
    }
}

/// Everything a worker needs to run one tool call.
struct ToolJob {
    session: Arc<SessionContext>,
    registry: Arc<ToolRegistry>,
    classifier: Option<Arc<dyn IntentClassifier>>,
    emitter: ResponseEmitter,
    bridge: SchedulerBridge,
    span: Span,
    turn_id: String,
    call: FunctionCall,
    original_text: String,
}

impl ToolJob {
    fn run(self) -> Emission {
        self.session
            .dialogue()
            .put(Role::User, self.original_text.as_str());

        let outcome = self.invoke();
        debug!(parent: &self.span, tool = %self.call.name, outcome = outcome.kind(), "tool finished");

        self.session.set_stage(TurnStage::Emitting);
        let emission = self.emitter.emit_outcome(
            &self.session,
            &self.turn_id,
            &self.call.name,
            &self.original_text,
            outcome,
            |result, original| self.render(result, original),
        );
        self.session.set_stage(TurnStage::Idle);
        emission
    }

    /// Run the tool on the scheduler. Errors and panics become an `Error` outcome.
    fn invoke(&self) -> ActionOutcome {
        let session = Arc::clone(&self.session);
        let registry = Arc::clone(&self.registry);
        let call = self.call.clone();
        let result = self
            .bridge
            .run_blocking(async move { registry.handle_function_call(&session, &call).await })
            .and_then(|r| r);
        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(parent: &self.span, tool = %self.call.name, error = %e, "tool invocation failed");
                ActionOutcome::error(failure_message(&e))
            }
        }
    }

    fn render(&self, result: &str, original: &str) -> Option<String> {
        let classifier = Arc::clone(self.classifier.as_ref()?);
        let (result, original) = (result.to_owned(), original.to_owned());
        match self
            .bridge
            .run_blocking(async move { classifier.render(&result, &original).await })
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(parent: &self.span, error = %e, "follow-up rendering failed");
                None
            }
        }
    }
}

/// Spoken reply for a failed invocation. Only the reason a tool reports
/// itself reaches the user; anything else stays in the log.
fn failure_message(e: &SessionError) -> String {
    match e {
        SessionError::Tool(reason) if !reason.trim().is_empty() => {
            format!("抱歉，操作没有完成：{}", reason.trim())
        }
        _ => "抱歉，操作没有完成，请稍后再试。".to_owned(),
    }
}
