//! Per-function driver: runs the interpreter and classifies terminal
//! outcomes into diagnostics.

use super::catalog::LockCatalog;
use super::context::ExplorationContext;
use super::explorer::{PathEnd, PathState};
use super::interpreter::PathInterpreter;
use crate::ast::{FuncDef, TranslationUnit};
use crate::output::{Diagnostic, DiagnosticKind};
use std::path::Path;

/// Checks every function of a translation unit against a catalog.
pub struct FunctionChecker<'a> {
    catalog: &'a LockCatalog,
}

impl<'a> FunctionChecker<'a> {
    pub fn new(catalog: &'a LockCatalog) -> Self {
        Self { catalog }
    }

    /// Check all functions of `unit`, attributing diagnostics to `file`.
    pub fn check_unit(&self, unit: &TranslationUnit, file: &Path) -> Vec<Diagnostic> {
        unit.functions
            .iter()
            .flat_map(|func| self.check_function(func, file))
            .collect()
    }

    /// Check one function. Returns the union of all explored paths'
    /// diagnostics, deduplicated; an empty vector means every path is clean.
    pub fn check_function(&self, func: &FuncDef, file: &Path) -> Vec<Diagnostic> {
        // A body with no locking-relevant calls cannot misbalance anything.
        let interpreter = PathInterpreter::new(self.catalog, &func.body);
        if !interpreter.function_is_relevant() {
            return Vec::new();
        }
        tracing::debug!(function = %func.name, "checking");

        let initial = ExplorationContext::new(self.catalog.len());
        let paths = interpreter.run(initial);
        tracing::debug!(function = %func.name, paths = paths.len(), "exploration finished");

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let mut emit = |kind, reason: String, ctx: &ExplorationContext| {
            let diagnostic = Diagnostic {
                file: file.to_path_buf(),
                function: func.name.clone(),
                kind,
                reason,
                state: ctx.state.snapshot(self.catalog),
            };
            if !diagnostics.contains(&diagnostic) {
                diagnostics.push(diagnostic);
            }
        };

        for path in paths.into_paths() {
            match path {
                PathState::Live(ctx) => {
                    if ctx.ignoring() {
                        // A forward goto whose label never appeared:
                        // ill-formed input, the path proves nothing.
                        tracing::warn!(
                            function = %func.name,
                            label = ctx.ignore_until.as_deref().unwrap_or(""),
                            "goto target never reached; path ignored"
                        );
                    } else if !ctx.state.balanced() {
                        emit(
                            DiagnosticKind::EndOfFunction,
                            "function can fall through with locks held".into(),
                            &ctx,
                        );
                    }
                }
                PathState::Ended { end, ctx } => match end {
                    PathEnd::NoError => {}
                    PathEnd::Return => emit(
                        DiagnosticKind::Return,
                        "return with unbalanced lock state".into(),
                        &ctx,
                    ),
                    PathEnd::Break => emit(
                        DiagnosticKind::Internal,
                        "break escaped to function root".into(),
                        &ctx,
                    ),
                    PathEnd::Continue => emit(
                        DiagnosticKind::Internal,
                        "continue escaped to function root".into(),
                        &ctx,
                    ),
                    PathEnd::Forbidden { reason } => {
                        emit(DiagnosticKind::Forbidden, reason, &ctx)
                    }
                    PathEnd::Internal { reason } => emit(DiagnosticKind::Internal, reason, &ctx),
                },
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_source;
    use std::path::PathBuf;

    fn check(src: &str) -> Vec<Diagnostic> {
        let unit = parse_source(src).expect("test source parses");
        let catalog = LockCatalog::openbsd_defaults();
        FunctionChecker::new(&catalog).check_unit(&unit, &PathBuf::from("test.c"))
    }

    #[test]
    fn test_clean_function_has_no_diagnostics() {
        let diags = check("void f(void) { splraise(IPL_HIGH); spllower(IPL_NONE); }");
        assert!(diags.is_empty());
    }

    #[test]
    fn test_function_without_lock_calls_is_skipped() {
        let diags = check("void f(int x) { while (x) { x--; } return; }");
        assert!(diags.is_empty());
    }

    #[test]
    fn test_return_diagnostic_carries_snapshot() {
        let diags = check("void f(void) { splraise(IPL_HIGH); return; }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::Return);
        assert_eq!(diags[0].function, "f");
        assert_eq!(diags[0].state.count_of("spl"), Some(1));
    }

    #[test]
    fn test_branch_fall_through_diagnostic() {
        let diags = check("void f(int x) { splraise(IPL_HIGH); if (x) { spllower(IPL_NONE); } }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::EndOfFunction);
        assert_eq!(diags[0].state.count_of("spl"), Some(1));
    }

    #[test]
    fn test_break_at_root_is_internal() {
        let diags = check("void f(void) { mtx_enter(&m); break; }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::Internal);
    }

    #[test]
    fn test_continue_at_root_is_internal() {
        let diags = check("void f(void) { mtx_enter(&m); continue; }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::Internal);
    }

    #[test]
    fn test_statements_after_a_broken_loop_are_analyzed() {
        let src = "void f(int x) {
            while (x) { mtx_enter(&m); break; }
            mtx_enter(&m);
        }";
        let diags = check(src);
        // The skip sibling reaches the end with mtx=1, the break-exit
        // sibling with mtx=2; distinct snapshots, two records.
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.kind == DiagnosticKind::EndOfFunction));
        assert!(diags.iter().any(|d| d.state.count_of("mtx") == Some(2)));
    }

    #[test]
    fn test_switch_over_release_falls_through_to_end() {
        let src = "void f(int x) {
            switch (x) {
            case 1:
                mtx_enter(&m);
            case 2:
                mtx_leave(&m);
                break;
            }
        }";
        let diags = check(src);
        // Entering at case 2 over-releases; its break resumes after the
        // switch and the imbalance reaches the end-of-function check.
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::EndOfFunction);
        assert_eq!(diags[0].state.count_of("mtx"), Some(-1));
    }

    #[test]
    fn test_over_release_detected_at_end() {
        let diags = check("void f(void) { mtx_leave(&m); }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::EndOfFunction);
        assert_eq!(diags[0].state.count_of("mtx"), Some(-1));
    }

    #[test]
    fn test_unmatched_goto_path_is_dropped() {
        let src = "void f(int x) {
            mtx_enter(&m);
            mtx_leave(&m);
            if (x) { goto nowhere; }
        }";
        let diags = check(src);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_duplicate_outcomes_are_united() {
        // Both siblings of the split leak identically; the union holds one
        // record.
        let src = "void f(int x) {
            splraise(s);
            if (x) { mtx_enter(&m); mtx_leave(&m); }
        }";
        let diags = check(src);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].state.count_of("spl"), Some(1));
    }

    #[test]
    fn test_checker_runs_all_functions() {
        let src = "
        void ok(void) { mtx_enter(&m); mtx_leave(&m); }
        void bad(void) { mtx_enter(&m); }
        ";
        let diags = check(src);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].function, "bad");
    }
}
