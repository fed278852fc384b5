//! The core analysis: catalog, per-path state, branch exploration, the
//! path interpreter, and the per-function checker.
//!
//! Layering, leaves first:
//!
//! - `catalog.rs`: lock families and call-site classification
//! - `state.rs`: per-family counters, the only mutable analysis state
//! - `context.rs`: everything one exploration path owns
//! - `explorer.rs`: sibling-path bookkeeping and outcome plumbing
//! - `interpreter.rs`: the path-sensitive AST walk
//! - `checker.rs`: per-function driver producing diagnostics

mod catalog;
mod checker;
mod context;
mod explorer;
mod interpreter;
mod state;

pub use catalog::{CatalogError, LockCatalog, LockFamily, LockOp, OpKind};
pub use checker::FunctionChecker;
pub use context::ExplorationContext;
pub use explorer::{PathEnd, PathSet, PathState};
pub use interpreter::PathInterpreter;
pub use state::{LockState, SnapshotEntry, StateSnapshot, UpdateKind};
