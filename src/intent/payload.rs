//! Structured intent payload parsing.
//!
//! The classifier answers with `{"function_call": {"name": ..., "arguments": ...}}`,
//! sometimes wrapped in markdown fences or prose. Arguments are normalized to
//! a JSON string for transport to the tool.

use crate::error::Result;
use crate::intent::IntentResult;
use crate::session::new_token;
use serde::Deserialize;
use tracing::debug;

/// A resolved tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    /// Registered tool name.
    pub name: String,
    /// Fresh invocation id.
    pub id: String,
    /// Arguments in transport form (a JSON document).
    pub arguments: String,
}

impl FunctionCall {
    /// Build an invocation with a fresh id and normalized arguments.
    pub fn new(name: impl Into<String>, arguments: Option<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            id: new_token(),
            arguments: normalize_arguments(arguments),
        }
    }

    /// Decode the transport-form arguments. Blank arguments decode to `{}`.
    ///
    /// # Errors
    ///
    /// Returns a JSON error when the arguments are not a valid JSON document.
    pub fn arguments_value(&self) -> Result<serde_json::Value> {
        if self.arguments.trim().is_empty() {
            return Ok(serde_json::Value::Object(serde_json::Map::new()));
        }
        Ok(serde_json::from_str(&self.arguments)?)
    }
}

/// Object/array arguments are serialized, strings pass through unchanged and
/// absent or `null` arguments become `{}`.
pub fn normalize_arguments(arguments: Option<serde_json::Value>) -> String {
    match arguments {
        None | Some(serde_json::Value::Null) => "{}".to_owned(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct RawIntent {
    #[serde(default)]
    function_call: Option<RawFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct RawFunctionCall {
    name: String,
    #[serde(default)]
    arguments: Option<serde_json::Value>,
}

/// Parse a classifier payload into an [`IntentResult`].
///
/// A payload that is not valid JSON yields `Unparseable`; a payload without
/// a function call, or one naming `continue_sentinel`, yields `Continuation`.
pub fn parse_intent_payload(payload: &str, continue_sentinel: &str) -> IntentResult {
    let unfenced = strip_markdown_fences(payload);
    let Some(json) = extract_json_object(&unfenced) else {
        debug!("intent payload has no JSON object");
        return IntentResult::Unparseable;
    };
    let raw: RawIntent = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("intent payload is not a valid intent: {e}");
            return IntentResult::Unparseable;
        }
    };
    match raw.function_call {
        None => IntentResult::Continuation,
        Some(call) if call.name == continue_sentinel => IntentResult::Continuation,
        Some(call) => IntentResult::ToolCall(FunctionCall::new(call.name, call.arguments)),
    }
}

/// Strip markdown code fences from text. Removes leading/trailing
/// ` ```json ` / ` ``` ` markers that models sometimes wrap JSON in.
pub(crate) fn strip_markdown_fences(text: &str) -> String {
    let mut s = text.to_owned();
    if let Some(start) = s.find("```") {
        let fence_end = s[start + 3..]
            .find('\n')
            .map(|i| start + 3 + i + 1)
            .unwrap_or(start + 3);
        s.replace_range(start..fence_end, "");
    }
    if let Some(end) = s.rfind("```") {
        s.replace_range(end..end + 3, "");
    }
    s
}

/// Extract the outermost `{...}` JSON object from `text`, accounting
/// for nested braces and quoted strings. Returns the slice if balanced
/// braces are found, `None` otherwise.
pub(crate) fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
