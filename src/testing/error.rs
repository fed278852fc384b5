//! Result and error types for fixture verification.

use super::expectation::ExpectationParseError;
use crate::output::Diagnostic;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// One way a fixture function failed its expectations.
#[derive(Debug, Clone)]
pub enum ExpectationFailure {
    /// An expected diagnostic was never produced.
    Missing { line: u32, raw: String },
    /// A produced diagnostic matched no expectation.
    Unexpected { diagnostic: Diagnostic },
}

impl fmt::Display for ExpectationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectationFailure::Missing { line, raw } => {
                write!(f, "line {}: expected '{}', not produced", line, raw)
            }
            ExpectationFailure::Unexpected { diagnostic } => {
                write!(
                    f,
                    "unexpected {}: {} [{}]",
                    diagnostic.kind, diagnostic.reason, diagnostic.state
                )
            }
        }
    }
}

/// Result of checking a single fixture function.
#[derive(Debug)]
pub struct FnTestResult {
    pub name: String,
    pub failures: Vec<ExpectationFailure>,
}

impl FnTestResult {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of running all functions of one fixture file.
#[derive(Debug)]
pub struct FileTestResult {
    pub path: PathBuf,
    pub functions: Vec<FnTestResult>,
}

impl FileTestResult {
    pub fn passed(&self) -> bool {
        self.functions.iter().all(|f| f.passed())
    }

    pub fn pass_count(&self) -> usize {
        self.functions.iter().filter(|f| f.passed()).count()
    }

    pub fn fail_count(&self) -> usize {
        self.functions.iter().filter(|f| !f.passed()).count()
    }

    pub fn total(&self) -> usize {
        self.functions.len()
    }
}

/// Error during fixture verification.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("failed to read fixture: {0}")]
    Io(#[from] std::io::Error),

    #[error("fixture does not parse: {0}")]
    Parse(#[from] crate::parse::ParseError),

    #[error("bad expectation comments: {}", format_parse_errors(.0))]
    Expectations(Vec<ExpectationParseError>),

    #[error("expectations not met in {}", .0.path.display())]
    TestFailures(FileTestResult),
}

fn format_parse_errors(errors: &[ExpectationParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
