//! Snapshot stack
//!
//! Serialized collection payloads, consumed last-in-first-out by rollback.
//! An optional cap bounds the depth; pushing past it evicts the oldest entry.

use std::collections::VecDeque;

/// Bounded LIFO stack of serialized collection states
#[derive(Debug, Clone, Default)]
pub struct SnapshotStack {
    entries: VecDeque<String>,
    max_depth: Option<usize>,
}

impl SnapshotStack {
    /// Create an empty stack, optionally capped at `max_depth` entries
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            max_depth,
        }
    }

    /// Maximum depth, if capped
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Change the cap, evicting the oldest entries if the stack is now too deep
    pub fn set_max_depth(&mut self, max_depth: Option<usize>) {
        self.max_depth = max_depth;
        self.enforce_cap();
    }

    /// Push a payload on top of the stack
    pub fn push(&mut self, payload: String) {
        self.entries.push_back(payload);
        self.enforce_cap();
    }

    /// Most recent payload
    pub fn peek(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    /// Remove and return the most recent payload
    pub fn pop(&mut self) -> Option<String> {
        self.entries.pop_back()
    }

    /// Number of stored payloads
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no payload is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every payload
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn enforce_cap(&mut self) {
        let Some(max) = self.max_depth else {
            return;
        };
        let mut evicted = 0usize;
        while self.entries.len() > max {
            self.entries.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            tracing::warn!(
                target: "trellis::snapshot",
                evicted,
                max_depth = max,
                "Snapshot stack full, evicted oldest snapshots"
            );
        }
    }
}
