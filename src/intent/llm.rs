//! Intent classifier backed by an OpenAI-compatible chat completions endpoint.
//!
//! The model sees the registered tool schemas, the recent dialogue and the
//! current utterance, and must answer with exactly one of:
//!
//! - a `{"function_call": {"name": ..., "arguments": {...}}}` object,
//! - the stop sentinel when the user wants the assistant to stop talking,
//! - `{"function_call": {"name": "continue_chat"}}` for ordinary chat.

use crate::config::LlmConfig;
use crate::dialogue::DialogueEntry;
use crate::error::{Result, SessionError};
use crate::intent::{ClassifierSignal, IntentClassifier};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Answer the model gives for "stop talking" requests.
pub const STOP_SENTINEL: &str = "STOP_ANSWER_COMMAND";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// LLM-driven [`IntentClassifier`].
pub struct LlmIntentClassifier {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    history_window: usize,
    system_prompt: String,
}

impl LlmIntentClassifier {
    /// Create a classifier that offers `tool_schemas` (as exported by
    /// [`ToolRegistry::schemas_for_api`](crate::tools::ToolRegistry::schemas_for_api)).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: &LlmConfig,
        tool_schemas: &[serde_json::Value],
        continue_sentinel: &str,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            history_window: config.history_window,
            system_prompt: build_system_prompt(tool_schemas, continue_sentinel),
        })
    }

    async fn complete(&self, messages: Vec<serde_json::Value>) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.0,
            "stream": false,
        });

        let mut req = self.client.post(&url).json(&body);
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }
        let resp = req.send().await?.error_for_status()?;
        let parsed: ChatResponse = resp.json().await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| SessionError::Classifier("empty completion".into()))
    }
}

fn build_system_prompt(tool_schemas: &[serde_json::Value], continue_sentinel: &str) -> String {
    let tools = serde_json::to_string_pretty(tool_schemas).unwrap_or_else(|_| "[]".into());
    format!(
        "You are the intent router of a voice assistant. Decide whether the user's \
         latest utterance needs one of the tools below.\n\n\
         Tools:\n{tools}\n\n\
         Answer with JSON only, no prose:\n\
         - to call a tool: {{\"function_call\": {{\"name\": \"<tool>\", \"arguments\": {{...}}}}}}\n\
         - for ordinary conversation: {{\"function_call\": {{\"name\": \"{continue_sentinel}\"}}}}\n\
         If the user asks you to stop talking or be quiet, answer exactly {STOP_SENTINEL}."
    )
}

fn format_history(history: &[DialogueEntry]) -> String {
    history
        .iter()
        .map(|e| format!("{}: {}", e.role.as_str(), e.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Interpret the model's raw answer.
fn interpret(answer: &str) -> ClassifierSignal {
    if answer.contains(STOP_SENTINEL) {
        ClassifierSignal::StopCommand
    } else if answer.contains('{') {
        ClassifierSignal::Payload(answer.to_owned())
    } else {
        ClassifierSignal::Continue
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn detect(&self, history: &[DialogueEntry], text: &str) -> Result<ClassifierSignal> {
        let start = history.len().saturating_sub(self.history_window);
        let mut user = String::new();
        if start < history.len() {
            user.push_str("Conversation so far:\n");
            user.push_str(&format_history(&history[start..]));
            user.push_str("\n\n");
        }
        user.push_str("Latest utterance: ");
        user.push_str(text);

        let answer = self
            .complete(vec![
                serde_json::json!({"role": "system", "content": self.system_prompt}),
                serde_json::json!({"role": "user", "content": user}),
            ])
            .await
            .map_err(|e| SessionError::Classifier(e.to_string()))?;
        debug!("intent answer: {answer}");
        Ok(interpret(&answer))
    }

    async fn render(&self, tool_result: &str, original_text: &str) -> Option<String> {
        let messages = vec![
            serde_json::json!({
                "role": "system",
                "content": "Turn the tool result into one short, natural spoken reply to the \
                            user's request, in the user's language. No markdown.",
            }),
            serde_json::json!({
                "role": "user",
                "content": format!("Request: {original_text}\nTool result: {tool_result}"),
            }),
        ];
        match self.complete(messages).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!("tool result rendering failed: {e}");
                None
            }
        }
    }
}
