//! Diagnostic records and their textual renderings.

mod diagnostic;

pub use diagnostic::{Diagnostic, DiagnosticKind};

/// Output encodings supported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line per diagnostic.
    Text,
    /// A JSON array of records.
    Json,
}

/// Render a batch of diagnostics in the requested format. Text output is
/// one record per line; JSON output is a pretty-printed array.
pub fn render_diagnostics(
    diagnostics: &[Diagnostic],
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(diagnostics
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => serde_json::to_string_pretty(diagnostics),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{LockCatalog, LockState};
    use std::path::PathBuf;

    fn sample() -> Vec<Diagnostic> {
        let catalog = LockCatalog::openbsd_defaults();
        let mut state = LockState::new(catalog.len());
        state.update(catalog.classify("mtx_enter"));
        vec![Diagnostic {
            file: PathBuf::from("a.c"),
            function: "f".into(),
            kind: DiagnosticKind::EndOfFunction,
            reason: "function can fall through with locks held".into(),
            state: state.snapshot(&catalog),
        }]
    }

    #[test]
    fn test_text_rendering_is_one_line_per_record() {
        let out = render_diagnostics(&sample(), OutputFormat::Text).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("end-of-function"));
    }

    #[test]
    fn test_json_rendering_round_trips_kind() {
        let out = render_diagnostics(&sample(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["kind"], "end-of-function");
        assert_eq!(value[0]["function"], "f");
    }
}
