//! Expectation-based integration tests.
//!
//! This runner discovers all `.c` files in test-fixtures/ and verifies the
//! checker's diagnostics against their `//~` expectation comments.
//!
//! # Test Organization
//!
//! - Each `.c` file is a test suite ("describe") for a concept
//! - Each function in the file is a test case ("it")
//! - `//~ kind: family=count` comments define the expected diagnostics;
//!   a function without expectations must produce none

use lockbal::testing::{format_results, verify_file, VerificationError};
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-fixtures")
}

/// Discover all `.c` files in the fixtures directory.
fn discover_fixture_files() -> Vec<PathBuf> {
    let mut files = Vec::new();

    if let Ok(entries) = std::fs::read_dir(fixtures_dir()) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "c").unwrap_or(false) {
                files.push(path);
            }
        }
    }

    files.sort();
    files
}

#[test]
fn run_all_fixtures() {
    let files = discover_fixture_files();
    assert!(!files.is_empty(), "no fixtures in {:?}", fixtures_dir());

    let mut total_pass = 0;
    let mut total_fail = 0;
    let mut all_output = String::new();

    for path in &files {
        match verify_file(path) {
            Ok(result) => {
                total_pass += result.pass_count();
                total_fail += result.fail_count();
                all_output.push_str(&format_results(&result));
            }
            Err(VerificationError::TestFailures(result)) => {
                total_pass += result.pass_count();
                total_fail += result.fail_count();
                all_output.push_str(&format_results(&result));
            }
            Err(e) => {
                all_output.push_str(&format!("{}: {}\n", path.display(), e));
                total_fail += 1;
            }
        }
    }

    println!("\n{}", all_output);
    println!("Total: {} passed, {} failed", total_pass, total_fail);

    if total_fail > 0 {
        panic!("{} fixture test(s) failed", total_fail);
    }
}

#[test]
fn test_return_path_fixtures() {
    run_fixture_file("return_paths");
}

#[test]
fn test_branch_fixtures() {
    run_fixture_file("branches");
}

#[test]
fn test_loop_fixtures() {
    run_fixture_file("loops");
}

#[test]
fn test_switch_fixtures() {
    run_fixture_file("switches");
}

#[test]
fn test_goto_fixtures() {
    run_fixture_file("gotos");
}

#[test]
fn test_clean_fixtures() {
    run_fixture_file("clean");
}

fn run_fixture_file(name: &str) {
    let path = fixtures_dir().join(format!("{}.c", name));
    assert!(path.exists(), "{}.c not found", name);

    match verify_file(&path) {
        Ok(result) => {
            println!("{}", format_results(&result));
            assert!(result.passed(), "all {} cases should pass", name);
        }
        Err(VerificationError::TestFailures(result)) => {
            println!("{}", format_results(&result));
            panic!("{} cases failed", name);
        }
        Err(e) => {
            panic!("error running {} fixtures: {}", name, e);
        }
    }
}
