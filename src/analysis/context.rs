//! Per-path exploration context.

use super::state::LockState;
use std::collections::HashMap;

/// Everything one in-flight path owns. Cloned by value at every split so
/// sibling explorations cannot interfere.
#[derive(Debug, Clone)]
pub struct ExplorationContext {
    /// Lock counters, mutated in place along the path.
    pub state: LockState,
    /// True inside positions whose execution count is indeterminate; a
    /// classified call while set ends the path with a forbidden outcome.
    pub forbidden: bool,
    /// Target label of an in-flight forward goto. While set, regular
    /// processing is suspended; only the matching label clears it. C labels
    /// are function-scoped and unique, so the name identifies the node.
    pub ignore_until: Option<String>,
    /// Branch taken per condition key on first encounter. Entries are never
    /// removed within an exploration; siblings inherit the memo as it stood
    /// at the split.
    pub cond_memo: HashMap<String, bool>,
}

impl ExplorationContext {
    pub fn new(families: usize) -> Self {
        Self {
            state: LockState::new(families),
            forbidden: false,
            ignore_until: None,
            cond_memo: HashMap::new(),
        }
    }

    /// True while skipping forward to a goto target.
    pub fn ignoring(&self) -> bool {
        self.ignore_until.is_some()
    }
}
