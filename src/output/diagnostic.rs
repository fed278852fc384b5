//! The structured diagnostic record.

use crate::analysis::StateSnapshot;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// How a path went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// Implicit fall-through off the end of the function with locks held.
    EndOfFunction,
    /// Explicit return with unbalanced counters.
    Return,
    /// A break that no loop or switch caught: malformed input.
    Break,
    /// A continue that no loop caught: malformed input.
    Continue,
    /// Lock operation in a position with indeterminate execution count.
    Forbidden,
    /// Malformed input or an analyzer invariant violation.
    Internal,
}

impl DiagnosticKind {
    /// Parse a kind name as written by [`DiagnosticKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "end-of-function" => Some(DiagnosticKind::EndOfFunction),
            "return" => Some(DiagnosticKind::Return),
            "break" => Some(DiagnosticKind::Break),
            "continue" => Some(DiagnosticKind::Continue),
            "forbidden" => Some(DiagnosticKind::Forbidden),
            "internal" => Some(DiagnosticKind::Internal),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticKind::EndOfFunction => "end-of-function",
            DiagnosticKind::Return => "return",
            DiagnosticKind::Break => "break",
            DiagnosticKind::Continue => "continue",
            DiagnosticKind::Forbidden => "forbidden",
            DiagnosticKind::Internal => "internal",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One finding, attributed to a file and function, carrying the lock state
/// at the moment the path terminated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub function: String,
    pub kind: DiagnosticKind,
    pub reason: String,
    pub state: StateSnapshot,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}: {} [{}]",
            self.file.display(),
            self.function,
            self.kind,
            self.reason,
            self.state
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{LockCatalog, LockState};

    #[test]
    fn test_display_line() {
        let catalog = LockCatalog::openbsd_defaults();
        let mut state = LockState::new(catalog.len());
        state.update(catalog.classify("splraise"));
        let diagnostic = Diagnostic {
            file: PathBuf::from("kern/subr_foo.c"),
            function: "foo_intr".into(),
            kind: DiagnosticKind::Return,
            reason: "return with unbalanced lock state".into(),
            state: state.snapshot(&catalog),
        };
        assert_eq!(
            diagnostic.to_string(),
            "kern/subr_foo.c: foo_intr: return: return with unbalanced lock state [spl=1]"
        );
    }

    #[test]
    fn test_kind_names_are_kebab_case() {
        assert_eq!(DiagnosticKind::EndOfFunction.name(), "end-of-function");
        assert_eq!(DiagnosticKind::Forbidden.name(), "forbidden");
    }
}
