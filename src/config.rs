//! Configuration types for a voice session.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for a voice session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Intent classification settings.
    pub intent: IntentConfig,
    /// Stop / exit command settings.
    pub interrupt: InterruptConfig,
    /// Wake phrase settings.
    pub wakeup: WakeupConfig,
    /// Tool worker pool settings.
    pub workers: WorkerConfig,
    /// OpenAI-compatible classifier endpoint.
    pub llm: LlmConfig,
    /// Heart-rate telemetry tool settings.
    pub heart_rate: HeartRateConfig,
}

/// How user turns are routed before reaching the conversational model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentMode {
    /// Run a separate intent classification pass on every turn.
    #[default]
    IntentLlm,
    /// The chat model calls functions itself; no intent pass.
    FunctionCall,
}

/// Intent classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    /// Routing mode.
    pub mode: IntentMode,
    /// Tool name the classifier uses to defer to ordinary chat.
    pub continue_sentinel: String,
    /// Tool that manages its own speech and is exempt from the generic reply path.
    pub music_tool: String,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            mode: IntentMode::IntentLlm,
            continue_sentinel: "continue_chat".to_owned(),
            music_tool: "play_music".to_owned(),
        }
    }
}

/// Stop keywords and exit commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterruptConfig {
    /// Case-insensitive substrings meaning "stop speaking now".
    pub stop_keywords: Vec<String>,
    /// Exact phrases that close the session.
    pub exit_commands: Vec<String>,
    /// Spoken after a successful stop.
    pub stop_acknowledgement: String,
}

impl Default for InterruptConfig {
    fn default() -> Self {
        Self {
            stop_keywords: [
                "停止回答",
                "别说了",
                "闭嘴",
                "停止",
                "停",
                "够了",
                "stop",
                "stop talking",
                "shut up",
                "enough",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            exit_commands: vec!["退出".to_owned(), "关闭".to_owned()],
            stop_acknowledgement: "好的，我已经停止回答了".to_owned(),
        }
    }
}

/// Wake phrase configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WakeupConfig {
    /// Whether utterances consisting only of a wake phrase are consumed.
    pub enabled: bool,
    /// Exact wake phrases (compared after punctuation filtering).
    pub words: Vec<String>,
    /// Greeting spoken when a wake phrase is consumed.
    pub reply: String,
}

impl Default for WakeupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            words: vec![
                "你好小智".to_owned(),
                "嘿你好呀".to_owned(),
                "hi parley".to_owned(),
            ],
            reply: "我在呢，请说。".to_owned(),
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of worker threads executing tool calls (minimum 1).
    pub threads: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { threads: 4 }
    }
}

/// OpenAI-compatible endpoint used by the LLM intent classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL including the API version (e.g. `https://api.openai.com/v1`).
    pub base_url: String,
    /// Bearer token. Empty means no `Authorization` header.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Number of most recent dialogue entries sent with each classification.
    pub history_window: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_owned(),
            api_key: String::new(),
            model: "qwen2.5:7b".to_owned(),
            timeout_secs: 15,
            history_window: 10,
        }
    }
}

/// Heart-rate telemetry service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartRateConfig {
    /// Base URL of the local device service.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HeartRateConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8950".to_owned(),
            timeout_secs: 5,
        }
    }
}

impl SessionConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::SessionError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SessionError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/parley/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| std::env::temp_dir().join("parley-config"))
            .join("parley")
            .join("config.toml")
    }
}
