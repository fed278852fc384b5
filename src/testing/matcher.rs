//! Matching logic comparing produced diagnostics with expectations.

use super::expectation::Expectation;
use crate::output::Diagnostic;

/// Whether a diagnostic satisfies one expectation: the kind must agree and
/// the snapshot must hold exactly the listed counters, with every unlisted
/// family at zero.
pub fn expectation_matches(expectation: &Expectation, diagnostic: &Diagnostic) -> bool {
    if expectation.kind != diagnostic.kind {
        return false;
    }
    for entry in diagnostic.state.entries() {
        let expected = expectation
            .counts
            .iter()
            .find(|(family, _)| family == &entry.family)
            .map(|(_, count)| *count)
            .unwrap_or(0);
        if entry.count != expected {
            return false;
        }
    }
    // A counter for a family the active catalog does not track can never be
    // satisfied.
    expectation
        .counts
        .iter()
        .all(|(family, _)| diagnostic.state.count_of(family).is_some())
}
