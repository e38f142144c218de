//! Synchronous stop / exit command detection.
//!
//! Runs before any asynchronous classification. Stop keywords match as
//! case-insensitive substrings; exit commands must match the filtered text
//! exactly so a phrase merely mentioning "exit" never closes the session.

use crate::config::InterruptConfig;
use crate::emitter::ResponseEmitter;
use crate::session::{SessionContext, new_token};
use crate::utterance::strip_punctuation;
use tracing::{error, info};

/// What the detector recognised in a filtered utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterruptKind {
    /// Contains a stop keyword.
    Stop {
        /// The keyword that matched.
        keyword: String,
    },
    /// Exactly equals an exit command.
    Exit,
}

/// Result of running the interrupt stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// Not an interrupt; continue resolving the turn.
    NotInterrupt,
    /// Speech stopped and acknowledged.
    Stopped,
    /// A stop was requested but the session could not stop.
    StopFailed,
    /// Session close requested.
    Closed,
}

impl InterruptOutcome {
    /// Whether the turn is finished.
    pub fn handled(self) -> bool {
        matches!(self, Self::Stopped | Self::Closed)
    }
}

/// Recognises stop and exit commands.
#[derive(Debug, Clone)]
pub struct InterruptDetector {
    stop_keywords: Vec<String>,
    exit_commands: Vec<String>,
    acknowledgement: String,
}

impl InterruptDetector {
    pub fn new(config: &InterruptConfig) -> Self {
        Self {
            stop_keywords: config
                .stop_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            exit_commands: config
                .exit_commands
                .iter()
                .map(|c| strip_punctuation(c))
                .filter(|c| !c.is_empty())
                .collect(),
            acknowledgement: config.stop_acknowledgement.clone(),
        }
    }

    /// Whether `text` contains a stop keyword (case-insensitive).
    pub fn stop_keyword<'a>(&'a self, text: &str) -> Option<&'a str> {
        let lower = text.to_lowercase();
        self.stop_keywords
            .iter()
            .find(|k| lower.contains(k.as_str()))
            .map(String::as_str)
    }

    /// Classify a filtered utterance. Stop keywords take priority over exit commands.
    pub fn detect(&self, filtered: &str) -> Option<InterruptKind> {
        if let Some(keyword) = self.stop_keyword(filtered) {
            return Some(InterruptKind::Stop {
                keyword: keyword.to_owned(),
            });
        }
        if self.exit_commands.iter().any(|c| c == filtered) {
            return Some(InterruptKind::Exit);
        }
        None
    }

    /// Detect and act on an interrupt.
    ///
    /// A stop echoes the transcript, runs the session stop operation and, on
    /// success, speaks the acknowledgement under a fresh turn. An exit echoes
    /// the transcript and requests the session close.
    pub fn handle(
        &self,
        session: &SessionContext,
        emitter: &ResponseEmitter,
        filtered: &str,
    ) -> InterruptOutcome {
        match self.detect(filtered) {
            Some(InterruptKind::Stop { keyword }) => {
                info!(parent: session.span(), %keyword, "stop command: {filtered}");
                session.echo(filtered);
                match session.stop_answering() {
                    Ok(()) => {
                        session.echo(&self.acknowledgement);
                        emitter.announce(session, &new_token(), &self.acknowledgement);
                        InterruptOutcome::Stopped
                    }
                    Err(e) => {
                        error!(parent: session.span(), error = %e, "stop command could not be handled");
                        InterruptOutcome::StopFailed
                    }
                }
            }
            Some(InterruptKind::Exit) => {
                info!(parent: session.span(), "exit command: {filtered}");
                session.echo(filtered);
                session.request_close();
                InterruptOutcome::Closed
            }
            None => InterruptOutcome::NotInterrupt,
        }
    }
}
