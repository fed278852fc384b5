//! # lockbal
//!
//! **Static lock-balance checker for C** — verifies that every execution
//! path of every function acquires and releases its locks in balance.
//!
//! For each function body the checker tracks one counter per configured
//! lock family, incremented on calls to the family's acquire function and
//! decremented on its release function. A diagnostic is emitted whenever a
//! function can exit (return, fall-through, escaping loop exit) with a
//! non-zero counter, or performs a lock operation in a position whose
//! execution count is indeterminate (loop header, switch selector).
//!
//! ## Lock Families
//!
//! | Family | Acquire | Release |
//! |--------|---------|---------|
//! | `spl`  | `splraise` | `spllower` |
//! | `mpl`  | `__mp_lock` | `__mp_unlock` |
//! | `mtx`  | `mtx_enter` | `mtx_leave` |
//!
//! Try-acquire variants (`mtx_enter_try`) are deliberately not modeled:
//! the analysis has no notion of conditional acquisition.
//!
//! ## How It Works
//!
//! The core is a path-sensitive, branch-splitting AST interpreter. At every
//! control divergence (`if`, ternary, `switch` case, loop entry) the
//! exploration forks with an independent copy of the path context; the
//! per-function result is the union of every path's outcome. Loops are not
//! iterated: bodies are walked once, `while (1)`/`for (;;)` absorb their
//! fall-through, a backward `goto` ends its path, and a condition memo
//! keeps a re-encountered `if` on the branch it took before. This is a
//! lint, not a verifier — balance that depends on iteration counts or
//! pointer-aliased lock calls is out of reach by design.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs)                                              │
//! │    lockbal file.c --lock mtx --format json                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Front-end (parse/)                                         │
//! │    pre-filter, tree-sitter-c, lowering to the checker AST   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Core analysis (analysis/)                                  │
//! │    LockCatalog, LockState, PathInterpreter, FunctionChecker │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Output (output/)                                           │
//! │    Diagnostic records, text / JSON rendering                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Check preprocessed sources with the default families
//! lockbal kern/subr_foo.i
//!
//! # Only the mutex family, machine-readable output
//! lockbal --lock mtx --format json kern/*.i
//! ```
//!
//! The input must already be preprocessed (`cc -E`); the front-end strips
//! the compiler extensions the grammar cannot digest but performs no macro
//! expansion of its own.
//!
//! ## Modules
//!
//! - [`ast`] - C syntax tree and the canonical condition printer
//! - [`parse`] - pre-filter and tree-sitter lowering
//! - [`analysis`] - catalog, state, branch explorer, interpreter, checker
//! - [`output`] - diagnostic records and rendering
//! - [`testing`] - expectation-comment framework for C fixtures

pub mod analysis;
pub mod ast;
pub mod output;
pub mod parse;
pub mod testing;

pub use analysis::{FunctionChecker, LockCatalog, LockFamily, LockState};
pub use output::{Diagnostic, DiagnosticKind, OutputFormat};
pub use parse::{parse_file, parse_source};
