//! Parley: turn resolution core for a conversational voice assistant.
//!
//! Each user utterance is resolved into a stop/exit command, a wake event,
//! a tool invocation or an ordinary chat turn:
//! Utterance → Interrupt check → Wake gate → Intent classifier → Tool dispatch → Speech queue
//!
//! # Architecture
//!
//! - **Session** ([`session::SessionContext`]): per-connection state shared by
//!   the scheduler and worker threads
//! - **Resolver** ([`pipeline::resolver::TurnResolver`]): runs the stages on
//!   the single-threaded session scheduler
//! - **Dispatch** ([`dispatch::ToolDispatcher`]): runs tools from a worker
//!   pool, bridging back into the scheduler for async work
//! - **Emitter** ([`emitter::ResponseEmitter`]): FIRST/TEXT/LAST speech
//!   framing plus dialogue history

pub mod config;
pub mod dialogue;
pub mod dispatch;
pub mod emitter;
pub mod error;
pub mod intent;
pub mod interrupt;
pub mod pipeline;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod tools;
pub mod utterance;
pub mod wakeword;

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use pipeline::resolver::{TurnOutcome, TurnResolver};
pub use runtime::{ChannelSessionControl, SessionEvent};
pub use session::{SessionContext, SessionControl};
