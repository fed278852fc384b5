//! Per-path lock counters.
//!
//! A [`LockState`] is a vector of signed counters in catalog order, one per
//! family. [`LockState::update`] is the single entry point for every
//! mutation; it is fed exclusively by classified call sites, so a state can
//! only drift where a configured acquire or release function is called.
//! Counters may go negative: an over-released path is unbalanced and must
//! stay detectable.

use super::catalog::{LockCatalog, LockOp, OpKind};
use serde::Serialize;
use std::fmt;

/// What a call site did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Acquired,
    Released,
    /// The callee is not in the catalog; the state is untouched.
    Noop,
}

/// Counter vector, index-aligned with the catalog's family order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockState {
    counters: Vec<i32>,
}

impl LockState {
    /// Fresh state for a catalog of `families` families, all counters zero.
    pub fn new(families: usize) -> Self {
        Self {
            counters: vec![0; families],
        }
    }

    /// Apply a classified call site. `None` (an unclassified callee) is a
    /// no-op.
    pub fn update(&mut self, op: Option<LockOp>) -> UpdateKind {
        match op {
            Some(LockOp { family, kind }) => match kind {
                OpKind::Acquire => {
                    self.counters[family] += 1;
                    UpdateKind::Acquired
                }
                OpKind::Release => {
                    self.counters[family] -= 1;
                    UpdateKind::Released
                }
            },
            None => UpdateKind::Noop,
        }
    }

    /// True iff every counter is zero.
    pub fn balanced(&self) -> bool {
        self.counters.iter().all(|&c| c == 0)
    }

    pub fn counter(&self, family: usize) -> i32 {
        self.counters[family]
    }

    /// Immutable snapshot pairing family names with their counters.
    pub fn snapshot(&self, catalog: &LockCatalog) -> StateSnapshot {
        StateSnapshot {
            entries: catalog
                .families()
                .iter()
                .zip(&self.counters)
                .map(|(family, &count)| SnapshotEntry {
                    family: family.name.clone(),
                    count,
                })
                .collect(),
        }
    }
}

/// One family's counter at the moment a diagnostic was raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotEntry {
    pub family: String,
    pub count: i32,
}

/// End-state snapshot carried by a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    entries: Vec<SnapshotEntry>,
}

impl StateSnapshot {
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn count_of(&self, family: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|e| e.family == family)
            .map(|e| e.count)
    }

    pub fn is_balanced(&self) -> bool {
        self.entries.iter().all(|e| e.count == 0)
    }
}

impl fmt::Display for StateSnapshot {
    /// Non-zero counters as `name=count`, space-separated; `balanced` when
    /// everything is zero.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        for entry in &self.entries {
            if entry.count == 0 {
                continue;
            }
            if wrote {
                write!(f, " ")?;
            }
            write!(f, "{}={}", entry.family, entry.count)?;
            wrote = true;
        }
        if !wrote {
            write!(f, "balanced")?;
        }
        Ok(())
    }
}
