//! Non-fatal resolution warnings collected during a run.

use std::fmt;

use gls_core::enums::{CrossRefKind, EdgeKind};
use serde::Serialize;

/// A warning that does not stop output generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    UnresolvedCrossReference {
        from: String,
        target: String,
        via: CrossRefKind,
    },
    UnresolvedDependency {
        from: String,
        target: String,
        via: EdgeKind,
    },
    DanglingParent {
        label: String,
        parent: String,
    },
    UnparseableSortValue {
        label: String,
        value: String,
        policy: String,
    },
    PruneIterationsClamped {
        requested: u32,
        applied: u32,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedCrossReference { from, target, via } => {
                write!(f, "{from}: unknown {via} target '{target}'")
            }
            Self::UnresolvedDependency { from, target, via } => {
                write!(f, "{from}: unknown {via} dependency '{target}'")
            }
            Self::DanglingParent { label, parent } => {
                write!(f, "{label}: parent '{parent}' is not defined")
            }
            Self::UnparseableSortValue {
                label,
                value,
                policy,
            } => write!(f, "{label}: cannot sort '{value}' as {policy}"),
            Self::PruneIterationsClamped { requested, applied } => {
                write!(f, "prune iterations {requested} clamped to {applied}")
            }
        }
    }
}

/// Collector that logs each warning as it is recorded.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{diagnostic}");
        self.items.push(diagnostic);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_edge() {
        let diagnostic = Diagnostic::UnresolvedCrossReference {
            from: "a".into(),
            target: "zz".into(),
            via: CrossRefKind::SeeAlso,
        };
        assert_eq!(diagnostic.to_string(), "a: unknown see_also target 'zz'");
    }

    #[test]
    fn collector_keeps_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::DanglingParent {
            label: "b".into(),
            parent: "x".into(),
        });
        diagnostics.push(Diagnostic::PruneIterationsClamped {
            requested: 99,
            applied: 20,
        });
        assert_eq!(diagnostics.len(), 2);
        let kinds: Vec<_> = diagnostics.into_vec();
        assert!(matches!(kinds[0], Diagnostic::DanglingParent { .. }));
    }
}
