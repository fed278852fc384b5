//! Lock family configuration and call-site classification.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// One lock family: a display name and its paired acquire/release functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFamily {
    pub name: String,
    pub acquire: String,
    pub release: String,
}

impl LockFamily {
    pub fn new(
        name: impl Into<String>,
        acquire: impl Into<String>,
        release: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            acquire: acquire.into(),
            release: release.into(),
        }
    }
}

/// Configuration error raised while building or filtering a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A single call site must never update more than one family, so every
    /// name in the catalog has to be unique.
    #[error("name '{name}' is claimed by both {first} and {second}")]
    NameOverlap {
        name: String,
        first: String,
        second: String,
    },

    #[error("unknown lock family '{0}'")]
    UnknownFamily(String),
}

/// Whether a classified call acquires or releases its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Acquire,
    Release,
}

/// A classified call site: which family, and which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOp {
    /// Index into the catalog's family order.
    pub family: usize,
    pub kind: OpKind,
}

/// Ordered set of lock families. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct LockCatalog {
    families: Vec<LockFamily>,
}

impl LockCatalog {
    /// Build a catalog, rejecting any name shared between families (or
    /// between the acquire and release side of one family).
    pub fn new(families: Vec<LockFamily>) -> Result<Self, CatalogError> {
        let mut seen: HashMap<&str, String> = HashMap::new();
        for family in &families {
            for (role, name) in [
                ("family", family.name.as_str()),
                ("acquire", family.acquire.as_str()),
                ("release", family.release.as_str()),
            ] {
                let owner = format!("{} '{}'", role, family.name);
                if let Some(first) = seen.insert(name, owner.clone()) {
                    return Err(CatalogError::NameOverlap {
                        name: name.to_string(),
                        first,
                        second: owner,
                    });
                }
            }
        }
        Ok(Self { families })
    }

    /// The stock OpenBSD kernel configuration. Try-acquire variants such as
    /// `mtx_enter_try` are deliberately absent: the state model has no
    /// notion of conditional acquisition.
    pub fn openbsd_defaults() -> Self {
        Self::new(vec![
            LockFamily::new("spl", "splraise", "spllower"),
            LockFamily::new("mpl", "__mp_lock", "__mp_unlock"),
            LockFamily::new("mtx", "mtx_enter", "mtx_leave"),
        ])
        .expect("default families have disjoint names")
    }

    /// Restrict the catalog to the named families, keeping catalog order.
    pub fn filtered(&self, names: &[String]) -> Result<Self, CatalogError> {
        for name in names {
            if !self.families.iter().any(|f| &f.name == name) {
                return Err(CatalogError::UnknownFamily(name.clone()));
            }
        }
        let families = self
            .families
            .iter()
            .filter(|f| names.contains(&f.name))
            .cloned()
            .collect();
        Self::new(families)
    }

    /// Classify a callee identifier against the catalog.
    pub fn classify(&self, callee: &str) -> Option<LockOp> {
        self.families.iter().enumerate().find_map(|(i, f)| {
            if f.acquire == callee {
                Some(LockOp {
                    family: i,
                    kind: OpKind::Acquire,
                })
            } else if f.release == callee {
                Some(LockOp {
                    family: i,
                    kind: OpKind::Release,
                })
            } else {
                None
            }
        })
    }

    /// True if `callee` is any family's acquire or release function.
    pub fn knows(&self, callee: &str) -> bool {
        self.classify(callee).is_some()
    }

    pub fn families(&self) -> &[LockFamily] {
        &self.families
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

impl Default for LockCatalog {
    fn default() -> Self {
        Self::openbsd_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_families() {
        let catalog = LockCatalog::openbsd_defaults();
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.families().iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            vec!["spl", "mpl", "mtx"]
        );
    }

    #[test]
    fn test_classify_acquire_and_release() {
        let catalog = LockCatalog::openbsd_defaults();
        let op = catalog.classify("mtx_enter").unwrap();
        assert_eq!(op.family, 2);
        assert_eq!(op.kind, OpKind::Acquire);
        let op = catalog.classify("spllower").unwrap();
        assert_eq!(op.family, 0);
        assert_eq!(op.kind, OpKind::Release);
    }

    #[test]
    fn test_classify_ignores_unknown_and_try_variants() {
        let catalog = LockCatalog::openbsd_defaults();
        assert!(catalog.classify("printf").is_none());
        assert!(catalog.classify("mtx_enter_try").is_none());
    }

    #[test]
    fn test_rejects_overlapping_names() {
        let err = LockCatalog::new(vec![
            LockFamily::new("a", "grab", "drop"),
            LockFamily::new("b", "grab", "release"),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::NameOverlap { name, .. } if name == "grab"));
    }

    #[test]
    fn test_rejects_acquire_equal_release() {
        let err = LockCatalog::new(vec![LockFamily::new("a", "toggle", "toggle")]).unwrap_err();
        assert!(matches!(err, CatalogError::NameOverlap { .. }));
    }

    #[test]
    fn test_filtered_subset() {
        let catalog = LockCatalog::openbsd_defaults();
        let subset = catalog.filtered(&["mtx".to_string()]).unwrap();
        assert_eq!(subset.len(), 1);
        assert!(subset.classify("mtx_enter").is_some());
        assert!(subset.classify("splraise").is_none());
    }

    #[test]
    fn test_filtered_unknown_family() {
        let catalog = LockCatalog::openbsd_defaults();
        let err = catalog.filtered(&["rwlock".to_string()]).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownFamily(name) if name == "rwlock"));
    }
}
