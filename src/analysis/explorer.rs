//! Branch exploration machinery.
//!
//! Exploration is a tree: every split clones the path context and the
//! siblings evolve independently from the state at the split point. A
//! [`PathSet`] holds the in-flight siblings of one walk plus the paths that
//! already raised a non-local outcome; [`PathSet::then`] sequences the next
//! step over every live sibling, which is all the interpreter needs to walk
//! a statement list while paths keep forking and dying underneath it.
//!
//! The exploration is serial and deterministic; the per-function result is
//! the union of every path's terminal outcome.

use super::context::ExplorationContext;

/// Non-local outcome that ended one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathEnd {
    /// Definitively correct: balanced return, panic, endless loop body, or
    /// backward goto.
    NoError,
    /// `return` with unbalanced counters.
    Return,
    /// `break` in flight; consumed by the innermost loop or switch.
    Break,
    /// `continue` in flight; consumed by the innermost loop.
    Continue,
    /// Lock operation in a position with indeterminate execution count.
    Forbidden { reason: String },
    /// Malformed input or an internal invariant violation; never a crash.
    Internal { reason: String },
}

/// One path of a [`PathSet`]: still walking, or terminated.
#[derive(Debug)]
pub enum PathState {
    Live(ExplorationContext),
    Ended {
        end: PathEnd,
        ctx: ExplorationContext,
    },
}

/// The sibling explorations spawned under one subtree walk.
#[derive(Debug, Default)]
pub struct PathSet {
    paths: Vec<PathState>,
}

impl PathSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A set holding one live path.
    pub fn single(ctx: ExplorationContext) -> Self {
        Self {
            paths: vec![PathState::Live(ctx)],
        }
    }

    /// A set holding one terminated path.
    pub fn ended(end: PathEnd, ctx: ExplorationContext) -> Self {
        Self {
            paths: vec![PathState::Ended { end, ctx }],
        }
    }

    pub fn push_live(&mut self, ctx: ExplorationContext) {
        self.paths.push(PathState::Live(ctx));
    }

    pub fn merge(&mut self, other: PathSet) {
        self.paths.extend(other.paths);
    }

    /// Sequence the next walk step: apply `f` to every live path and union
    /// the results. Terminated paths pass through untouched, which is what
    /// carries a raised outcome past the rest of a statement list.
    pub fn then(self, mut f: impl FnMut(ExplorationContext) -> PathSet) -> PathSet {
        let mut out = PathSet::empty();
        for path in self.paths {
            match path {
                PathState::Live(ctx) => out.merge(f(ctx)),
                ended => out.paths.push(ended),
            }
        }
        out
    }

    /// Catch loop-exit outcomes at a loop boundary. As in C, a caught
    /// `break` hands control to just after the loop: the path goes back to
    /// live and keeps walking with the state it held at the exit. A caught
    /// `continue` does the same through the re-tested condition, except in
    /// an endless loop, which it can never escape; that exploration ends
    /// clean.
    pub fn catch_loop_exits(self, endless: bool) -> PathSet {
        let paths = self
            .paths
            .into_iter()
            .map(|path| match path {
                PathState::Ended {
                    end: PathEnd::Break,
                    ctx,
                } => PathState::Live(ctx),
                PathState::Ended {
                    end: PathEnd::Continue,
                    ctx,
                } => {
                    if endless {
                        PathState::Ended {
                            end: PathEnd::NoError,
                            ctx,
                        }
                    } else {
                        PathState::Live(ctx)
                    }
                }
                other => other,
            })
            .collect();
        PathSet { paths }
    }

    /// Catch `break` at a switch boundary: the path resumes just after the
    /// switch. `continue` belongs to the enclosing loop and keeps
    /// propagating.
    pub fn catch_breaks(self) -> PathSet {
        let paths = self
            .paths
            .into_iter()
            .map(|path| match path {
                PathState::Ended {
                    end: PathEnd::Break,
                    ctx,
                } => PathState::Live(ctx),
                other => other,
            })
            .collect();
        PathSet { paths }
    }

    pub fn into_paths(self) -> Vec<PathState> {
        self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    #[cfg(test)]
    pub fn live_count(&self) -> usize {
        self.paths
            .iter()
            .filter(|p| matches!(p, PathState::Live(_)))
            .count()
    }
}
