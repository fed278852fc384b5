//! Test infrastructure for checker fixture tests.
//!
//! A fixture is a C file in which every function is a test case and `//~`
//! comments state the diagnostics the checker must produce for it. A
//! function with no expectation comments asserts the opposite: the checker
//! must stay silent about it.
//!
//! ```c
//! /* File: return_paths.c */
//! void
//! leaks_on_return(void)
//! {
//!         splraise(IPL_HIGH);
//!         return;                 //~ return: spl=1
//! }
//! ```
//!
//! Verification runs the real pipeline (pre-filter, parse, check) with the
//! default catalog and matches diagnostics against expectations per
//! function, unordered.

pub mod error;
pub mod expectation;
pub mod matcher;

pub use error::{ExpectationFailure, FileTestResult, FnTestResult, VerificationError};
pub use expectation::{Expectation, ExpectationParseError, ExpectationSet};

use crate::analysis::{FunctionChecker, LockCatalog};
use crate::parse::{parse_source, strip_extensions};
use matcher::expectation_matches;
use std::path::Path;

/// Verify a fixture file on disk.
pub fn verify_file(path: &Path) -> Result<FileTestResult, VerificationError> {
    let source = std::fs::read_to_string(path)?;
    verify_source(path, &source)
}

/// Verify fixture source. Parses once, checks every function, and compares
/// against the `//~` expectations in each function's line range.
pub fn verify_source(path: &Path, source: &str) -> Result<FileTestResult, VerificationError> {
    let (expectations, errors) = ExpectationSet::parse(source);
    if !errors.is_empty() {
        return Err(VerificationError::Expectations(errors));
    }

    let unit = parse_source(&strip_extensions(source))?;
    let catalog = LockCatalog::openbsd_defaults();
    let checker = FunctionChecker::new(&catalog);

    let mut functions = Vec::new();
    for func in &unit.functions {
        let expected = expectations.in_range(func.line, func.end_line);
        let produced = checker.check_function(func, path);

        let mut failures = Vec::new();
        let mut claimed = vec![false; produced.len()];
        for exp in &expected {
            let found = produced
                .iter()
                .enumerate()
                .find(|(i, diag)| !claimed[*i] && expectation_matches(exp, diag));
            match found {
                Some((i, _)) => claimed[i] = true,
                None => failures.push(ExpectationFailure::Missing {
                    line: exp.line,
                    raw: exp.raw.clone(),
                }),
            }
        }
        for (i, diagnostic) in produced.into_iter().enumerate() {
            if !claimed[i] {
                failures.push(ExpectationFailure::Unexpected { diagnostic });
            }
        }

        functions.push(FnTestResult {
            name: func.name.clone(),
            failures,
        });
    }

    let result = FileTestResult {
        path: path.to_path_buf(),
        functions,
    };
    if result.passed() {
        Ok(result)
    } else {
        Err(VerificationError::TestFailures(result))
    }
}

/// Format test results for display.
pub fn format_results(result: &FileTestResult) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n", result.path.display()));

    for func in &result.functions {
        if func.passed() {
            output.push_str(&format!("  \u{2713} {}\n", func.name));
        } else {
            output.push_str(&format!("  \u{2717} {}\n", func.name));
            for failure in &func.failures {
                output.push_str(&format!("      {}\n", failure));
            }
        }
    }

    output.push_str(&format!(
        "\n{} passed, {} failed\n",
        result.pass_count(),
        result.fail_count()
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn verify(source: &str) -> Result<FileTestResult, VerificationError> {
        verify_source(&PathBuf::from("inline.c"), source)
    }

    #[test]
    fn test_met_expectation_passes() {
        let src = "void f(void) {\n\
                   \tsplraise(IPL_HIGH);\n\
                   \treturn; //~ return: spl=1\n\
                   }\n";
        let result = verify(src).expect("expectations met");
        assert!(result.passed());
        assert_eq!(result.total(), 1);
    }

    #[test]
    fn test_silent_function_with_expectation_fails() {
        let src = "void f(void) {\n\
                   \tsplraise(s); //~ return: spl=1\n\
                   \tspllower(s);\n\
                   }\n";
        let err = verify(src).unwrap_err();
        let VerificationError::TestFailures(result) = err else {
            panic!("expected test failures");
        };
        assert_eq!(result.fail_count(), 1);
        assert!(matches!(
            result.functions[0].failures[0],
            ExpectationFailure::Missing { .. }
        ));
    }

    #[test]
    fn test_unexpected_diagnostic_fails() {
        let src = "void f(void) { mtx_enter(&m); }\n";
        let err = verify(src).unwrap_err();
        let VerificationError::TestFailures(result) = err else {
            panic!("expected test failures");
        };
        assert!(matches!(
            result.functions[0].failures[0],
            ExpectationFailure::Unexpected { .. }
        ));
    }

    #[test]
    fn test_expectations_scoped_per_function() {
        let src = "void good(void) {\n\
                   \tmtx_enter(&m);\n\
                   \tmtx_leave(&m);\n\
                   }\n\
                   void bad(void) {\n\
                   \tmtx_enter(&m); //~ end-of-function: mtx=1\n\
                   }\n";
        let result = verify(src).expect("expectations met");
        assert!(result.passed());
        assert_eq!(result.total(), 2);
    }

    #[test]
    fn test_bad_expectation_comment_is_reported() {
        let src = "void f(void) { } //~ bogus\n";
        assert!(matches!(
            verify(src),
            Err(VerificationError::Expectations(_))
        ));
    }
}
