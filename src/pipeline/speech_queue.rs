//! Ordered speech segment queue shared by the scheduler and worker threads.

use crate::pipeline::messages::SpeechSegment;
use std::collections::VecDeque;
use std::sync::Mutex;

/// FIFO of speech segments waiting for synthesis.
///
/// Producers push from any thread; a reply triple is inserted under a single
/// lock so segments of concurrent replies never interleave.
#[derive(Debug, Default)]
pub struct SpeechQueue {
    pending: Mutex<VecDeque<SpeechSegment>>,
}

impl SpeechQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one segment.
    pub fn push(&self, segment: SpeechSegment) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.push_back(segment);
    }

    /// Append several segments contiguously.
    pub fn push_group(&self, segments: impl IntoIterator<Item = SpeechSegment>) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.extend(segments);
    }

    /// Append several segments contiguously, but only if `admit` holds.
    ///
    /// `admit` is evaluated with the queue locked, so a concurrent
    /// [`clear`](Self::clear) lands either before the check or after the push.
    pub fn push_group_if(
        &self,
        segments: impl IntoIterator<Item = SpeechSegment>,
        admit: impl FnOnce() -> bool,
    ) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if !admit() {
            return false;
        }
        pending.extend(segments);
        true
    }

    /// Pop the oldest segment without waiting.
    pub fn try_pop(&self) -> Option<SpeechSegment> {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }

    /// Remove and return everything queued, oldest first.
    pub fn drain(&self) -> Vec<SpeechSegment> {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect()
    }

    /// Drop every pending segment. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let dropped = pending.len();
        pending.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
