//! Expectation parsing for checker fixture tests.
//!
//! Fixture C files carry `//~` comments that state which diagnostic a
//! function must produce:
//!
//! ```text
//! //~ kind                       // diagnostic with a balanced snapshot
//! //~ kind: spl=1                // listed families must match, others 0
//! //~ kind: spl=1, mtx=-1        // several families
//! ```
//!
//! Kind names are the diagnostic kind names: `end-of-function`, `return`,
//! `break`, `continue`, `forbidden`, `internal`.

use crate::output::DiagnosticKind;
use thiserror::Error;

/// A single expectation parsed from a `//~` comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Expectation {
    pub kind: DiagnosticKind,
    /// Expected per-family counters; families not listed must be zero.
    pub counts: Vec<(String, i32)>,
    /// 1-indexed source line of the comment.
    pub line: u32,
    /// Original comment text, for failure messages.
    pub raw: String,
}

/// Error while parsing an expectation comment.
#[derive(Debug, Clone, Error)]
pub enum ExpectationParseError {
    #[error("line {line}: unknown diagnostic kind '{kind}'")]
    UnknownKind { line: u32, kind: String },

    #[error("line {line}: malformed counter '{text}' (want family=count)")]
    MalformedCount { line: u32, text: String },

    #[error("line {line}: empty expectation")]
    Empty { line: u32 },
}

/// All expectations of one fixture file.
#[derive(Debug, Default)]
pub struct ExpectationSet {
    pub expectations: Vec<Expectation>,
}

impl ExpectationSet {
    /// Scan `//~` comments out of the source. Returns the set and any
    /// parse errors encountered.
    pub fn parse(source: &str) -> (Self, Vec<ExpectationParseError>) {
        let mut set = ExpectationSet::default();
        let mut errors = Vec::new();

        for (idx, text) in source.lines().enumerate() {
            let line = idx as u32 + 1;
            let Some(pos) = text.find("//~") else {
                continue;
            };
            let raw = text[pos + 3..].trim().to_string();
            match parse_one(&raw, line) {
                Ok(expectation) => set.expectations.push(expectation),
                Err(e) => errors.push(e),
            }
        }

        (set, errors)
    }

    /// Expectations whose comment sits within the line range (inclusive).
    pub fn in_range(&self, start: u32, end: u32) -> Vec<Expectation> {
        self.expectations
            .iter()
            .filter(|e| e.line >= start && e.line <= end)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.expectations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expectations.is_empty()
    }
}

fn parse_one(raw: &str, line: u32) -> Result<Expectation, ExpectationParseError> {
    if raw.is_empty() {
        return Err(ExpectationParseError::Empty { line });
    }
    let (kind_text, counts_text) = match raw.split_once(':') {
        Some((k, rest)) => (k.trim(), rest.trim()),
        None => (raw, ""),
    };
    let kind = DiagnosticKind::from_name(kind_text).ok_or_else(|| {
        ExpectationParseError::UnknownKind {
            line,
            kind: kind_text.to_string(),
        }
    })?;

    let mut counts = Vec::new();
    for piece in counts_text
        .split([',', ' '])
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        let Some((family, count)) = piece.split_once('=') else {
            return Err(ExpectationParseError::MalformedCount {
                line,
                text: piece.to_string(),
            });
        };
        let count: i32 = count
            .trim()
            .parse()
            .map_err(|_| ExpectationParseError::MalformedCount {
                line,
                text: piece.to_string(),
            })?;
        counts.push((family.trim().to_string(), count));
    }

    Ok(Expectation {
        kind,
        counts,
        line,
        raw: raw.to_string(),
    })
}
