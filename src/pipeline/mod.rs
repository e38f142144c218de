//! Turn resolution pipeline.
//!
//! - [`messages`] — speech segments and turn stages
//! - [`speech_queue`] — ordered queue feeding the synthesis consumer
//! - [`resolver`] — runs one utterance through every stage

pub mod messages;
pub mod resolver;
pub mod speech_queue;
