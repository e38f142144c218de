//! Tool system.
//!
//! Tools are registered by name in a [`ToolRegistry`] at startup and invoked
//! with JSON arguments produced by the intent classifier.
//!
//! # Tools
//!
//! - **get_latest_heart_rate** — latest reading of a telemetry device

pub mod heart_rate;
pub mod registry;
pub mod types;

pub use heart_rate::HeartRateTool;
pub use registry::ToolRegistry;
pub use types::{ActionOutcome, DispatchMode, Tool};
