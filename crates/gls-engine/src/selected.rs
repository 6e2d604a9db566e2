//! The append-only visited/committed set built during expansion.

use gls_core::enums::EdgeKind;
use indexmap::IndexSet;
use serde::Serialize;

/// `dependent` needs `dependency` in the output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DependencyEdge {
    pub dependent: String,
    pub dependency: String,
    pub kind: EdgeKind,
}

/// Committed labels in commit order, plus every edge recorded on the way.
///
/// A label is committed at most once, which is what keeps expansion finite
/// on cyclic reference graphs.
#[derive(Debug, Clone, Default)]
pub struct SelectedSet {
    order: IndexSet<String>,
    edges: IndexSet<DependencyEdge>,
}

impl SelectedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.order.contains(label)
    }

    /// Append `label`; returns `false` if it was already committed.
    pub fn commit(&mut self, label: &str) -> bool {
        if self.order.contains(label) {
            return false;
        }
        self.order.insert(label.to_string())
    }

    pub fn add_edge(&mut self, dependent: &str, dependency: &str, kind: EdgeKind) {
        if dependent == dependency {
            return;
        }
        self.edges.insert(DependencyEdge {
            dependent: dependent.to_string(),
            dependency: dependency.to_string(),
            kind,
        });
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.iter()
    }

    /// Selected entries that depend on `label`, in edge order.
    pub fn dependents_of<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a str> {
        self.edges
            .iter()
            .filter(move |edge| edge.dependency == label && self.contains(&edge.dependent))
            .map(|edge| edge.dependent.as_str())
    }

    /// Labels some committed entry depends on.
    pub fn dependency_labels(&self) -> impl Iterator<Item = &str> {
        self.edges
            .iter()
            .filter(|edge| self.contains(&edge.dependent))
            .map(|edge| edge.dependency.as_str())
    }

    /// Keep the first `limit` committed labels and return the rest.
    pub fn truncate(&mut self, limit: usize) -> Vec<String> {
        if self.order.len() <= limit {
            return Vec::new();
        }
        let removed = self.order.split_off(limit);
        self.drop_edges_of_removed();
        removed.into_iter().collect()
    }

    /// Remove labels failing `keep`, preserving order; returns the removed ones.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let mut removed = Vec::new();
        self.order.retain(|label| {
            let kept = keep(label.as_str());
            if !kept {
                removed.push(label.clone());
            }
            kept
        });
        if !removed.is_empty() {
            self.drop_edges_of_removed();
        }
        removed
    }

    fn drop_edges_of_removed(&mut self) {
        let order = &self.order;
        self.edges
            .retain(|edge| order.contains(&edge.dependent) && order.contains(&edge.dependency));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn commit_is_idempotent() {
        let mut set = SelectedSet::new();
        assert!(set.commit("a"));
        assert!(!set.commit("a"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn truncate_keeps_commit_order() {
        let mut set = SelectedSet::new();
        for label in ["c", "a", "b", "d"] {
            set.commit(label);
        }
        set.add_edge("c", "d", EdgeKind::Dependency);
        let removed = set.truncate(2);
        assert_eq!(set.to_vec(), vec!["c".to_string(), "a".to_string()]);
        assert_eq!(removed, vec!["b".to_string(), "d".to_string()]);
        assert_eq!(set.edges().count(), 0);
    }

    #[test]
    fn dependents_are_reported() {
        let mut set = SelectedSet::new();
        set.commit("a");
        set.commit("b");
        set.add_edge("b", "a", EdgeKind::Parent);
        set.add_edge("a", "a", EdgeKind::Dependency);
        assert_eq!(set.dependents_of("a").collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(set.dependency_labels().collect::<Vec<_>>(), vec!["a"]);
    }
}
