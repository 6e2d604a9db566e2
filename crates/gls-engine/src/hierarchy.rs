//! Hierarchy Manager: parent graph validation, ancestor completion, missing
//! parents, lonely-child flattening and derived tree metadata.
//!
//! Children are never stored. Every operation recomputes parent/child
//! relations from `Entry::parent` labels over the sequence it is given.

use std::collections::{HashMap, HashSet};

use gls_core::entities::Entry;
use gls_core::enums::{EdgeKind, FlattenRule};
use gls_core::policy::{FlattenPolicy, MissingParentCategory, MissingParentPolicy};
use rustworkx_core::petgraph::algo::toposort;
use rustworkx_core::petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::EngineError;
use crate::matcher::CompiledCondition;
use crate::selected::SelectedSet;
use crate::store::EntryStore;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject self-parents and parent cycles anywhere in the pool.
///
/// # Errors
///
/// Returns [`EngineError::SelfParent`] or [`EngineError::ParentCycle`].
pub fn validate_acyclic(store: &EntryStore) -> Result<(), EngineError> {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut id_to_index: HashMap<&str, NodeIndex> = HashMap::new();

    for entry in store.iter() {
        if entry.parent.as_deref() == Some(entry.label.as_str()) {
            return Err(EngineError::SelfParent {
                label: entry.label.clone(),
            });
        }
        let index = graph.add_node(entry.label.clone());
        id_to_index.insert(entry.label.as_str(), index);
    }

    for entry in store.iter() {
        let Some(parent) = entry.parent.as_deref() else {
            continue;
        };
        if let (Some(&child), Some(&parent)) = (
            id_to_index.get(entry.label.as_str()),
            id_to_index.get(parent),
        ) {
            graph.add_edge(child, parent, ());
        }
    }

    toposort(&graph, None).map(|_| ()).map_err(|cycle| {
        let start = &graph[cycle.node_id()];
        EngineError::ParentCycle {
            chain: cycle_chain(store, start),
        }
    })
}

/// Follow parent labels from `start` until one repeats; the returned chain
/// begins and ends with the repeated label.
fn cycle_chain(store: &EntryStore, start: &str) -> Vec<String> {
    let mut path: Vec<String> = Vec::new();
    let mut current = start.to_string();
    loop {
        if let Some(position) = path.iter().position(|label| label == &current) {
            let mut chain = path.split_off(position);
            chain.push(current);
            return chain;
        }
        path.push(current.clone());
        match store.parent_of(&current).filter(|parent| store.contains(parent)) {
            Some(parent) => current = parent.to_string(),
            None => return path,
        }
    }
}

// ---------------------------------------------------------------------------
// Ancestors and missing parents
// ---------------------------------------------------------------------------

/// Commit every not-yet-selected ancestor of `label`, root first.
///
/// Records a parent edge for each link walked, including the final link to an
/// ancestor that was already selected. Returns the newly committed labels in
/// insertion (root-to-leaf) order. Unresolved parents end the walk.
pub fn complete_ancestors(
    label: &str,
    selected: &mut SelectedSet,
    store: &EntryStore,
) -> Vec<String> {
    let mut links: Vec<(String, String)> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::from([label]);
    let mut current = label;

    while let Some(parent) = store.parent_of(current).and_then(|p| store.find(p)) {
        let parent = parent.label.as_str();
        if !seen.insert(parent) {
            break;
        }
        links.push((current.to_string(), parent.to_string()));
        if selected.contains(parent) {
            break;
        }
        current = parent;
    }

    let mut added = Vec::new();
    for (child, parent) in links.iter().rev() {
        if selected.commit(parent) {
            added.push(parent.clone());
        }
        selected.add_edge(child, parent, EdgeKind::Parent);
    }
    added
}

/// Settings for [`synthesize_missing_parent`].
#[derive(Debug, Clone, Copy)]
pub struct MissingParentContext<'a> {
    pub policy: &'a MissingParentPolicy,
    pub base_name: &'a str,
}

/// Apply the missing-parent policy to `label` if its parent is not in the pool.
///
/// Under `create` the fabricated parent is inserted into `store` and its label
/// returned. `strip` clears the dangling label; `warn` reports it.
///
/// # Errors
///
/// Returns [`EngineError::Model`] if the fabricated label collides.
pub fn synthesize_missing_parent(
    store: &mut EntryStore,
    label: &str,
    context: MissingParentContext<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<Option<String>, EngineError> {
    let Some(child) = store.find(label) else {
        return Ok(None);
    };
    let Some(parent_label) = child.parent.clone() else {
        return Ok(None);
    };
    if store.contains(&parent_label) {
        return Ok(None);
    }

    match context.policy {
        MissingParentPolicy::Warn => {
            diagnostics.push(Diagnostic::DanglingParent {
                label: label.to_string(),
                parent: parent_label,
            });
            Ok(None)
        }
        MissingParentPolicy::Strip => {
            tracing::debug!(label, parent = %parent_label, "stripping dangling parent");
            if let Some(child) = store.find_mut(label) {
                child.parent = None;
            }
            Ok(None)
        }
        MissingParentPolicy::Create { category } => {
            let parent = fabricate_parent(store, child, &parent_label, category, context.base_name);
            tracing::debug!(label, parent = %parent_label, "synthesized missing parent");
            store.insert(parent)?;
            Ok(Some(parent_label))
        }
    }
}

fn fabricate_parent(
    store: &EntryStore,
    child: &Entry,
    parent_label: &str,
    category: &MissingParentCategory,
    base_name: &str,
) -> Entry {
    let mut parent = Entry::new(parent_label)
        .with_field("name", store.prefixes().strip(parent_label));
    parent.entry_type.clone_from(&child.entry_type);
    parent.synthesized = true;

    let category = match category {
        MissingParentCategory::SameAsChild => child.category().map(ToString::to_string),
        MissingParentCategory::SameAsBase => Some(base_name.to_string()),
        MissingParentCategory::NoValue => None,
        MissingParentCategory::Fixed(value) => Some(value.clone()),
    };
    if let Some(category) = category {
        parent.fields.insert("category".into(), category);
    }
    parent
}

// ---------------------------------------------------------------------------
// Levels and metadata
// ---------------------------------------------------------------------------

/// Depth of each label, counting only ancestors present in `sequence`.
#[must_use]
pub fn levels(sequence: &[String], store: &EntryStore) -> HashMap<String, usize> {
    let members: HashSet<&str> = sequence.iter().map(String::as_str).collect();
    sequence
        .iter()
        .map(|label| (label.clone(), depth(label, &members, store)))
        .collect()
}

fn depth(label: &str, members: &HashSet<&str>, store: &EntryStore) -> usize {
    let mut level = 0;
    let mut current = label;
    while let Some(parent) = store.parent_of(current) {
        if !members.contains(parent) || level > members.len() {
            break;
        }
        level += 1;
        current = parent;
    }
    level
}

/// Tree facts derived for one entry of the final sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyInfo {
    pub level: usize,
    pub child_count: usize,
    pub sibling_count: usize,
    pub root_ancestor: String,
}

/// Derive level, child and sibling counts, and root ancestor for every label.
#[must_use]
pub fn compute_metadata(sequence: &[String], store: &EntryStore) -> HashMap<String, HierarchyInfo> {
    let members: HashSet<&str> = sequence.iter().map(String::as_str).collect();
    let parent_in_set = |label: &str| store.parent_of(label).filter(|p| members.contains(p));

    let mut child_counts: HashMap<Option<&str>, usize> = HashMap::new();
    for label in sequence {
        *child_counts.entry(parent_in_set(label)).or_default() += 1;
    }

    sequence
        .iter()
        .map(|label| {
            let parent = parent_in_set(label);
            let mut root = label.as_str();
            let mut guard = 0;
            while let Some(up) = parent_in_set(root) {
                guard += 1;
                if guard > members.len() {
                    break;
                }
                root = up;
            }
            let info = HierarchyInfo {
                level: depth(label, &members, store),
                child_count: child_counts.get(&Some(label.as_str())).copied().unwrap_or(0),
                sibling_count: child_counts.get(&parent).copied().unwrap_or(1) - 1,
                root_ancestor: root.to_string(),
            };
            (label.clone(), info)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Lonely-child flattening
// ---------------------------------------------------------------------------

/// Where flattening sits relative to sorting; decides the name layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlattenStage {
    PreSort,
    PostSort,
}

/// What one flattening pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenReport {
    pub flattened: Vec<String>,
    pub discarded: Vec<String>,
    pub reprieved: Vec<String>,
}

impl FlattenReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flattened.is_empty() && self.discarded.is_empty()
    }
}

/// Fold every sole child into its parent, deepest level first.
///
/// Discarded parents leave `sequence` (order of the rest is untouched) and
/// `selected`, and lose their selected flag, so a second pass over the result
/// is a no-op. A flattened child gains a parent edge to its new parent.
pub fn flatten_lonely_children(
    sequence: &mut Vec<String>,
    store: &mut EntryStore,
    selected: &mut SelectedSet,
    policy: &FlattenPolicy,
    condition: Option<&CompiledCondition>,
    stage: FlattenStage,
) -> FlattenReport {
    let mut report = FlattenReport::default();
    let mut settled: HashSet<String> = HashSet::new();

    let max_level = levels(sequence, store).into_values().max().unwrap_or(0);
    for level in (1..=max_level).rev() {
        let current_levels = levels(sequence, store);
        let mut children: Vec<(String, Vec<String>)> = Vec::new();
        for label in sequence.iter() {
            if current_levels.get(label) != Some(&level) {
                continue;
            }
            let Some(parent) = store.parent_of(label) else {
                continue;
            };
            match children.iter_mut().find(|(p, _)| p == parent) {
                Some((_, list)) => list.push(label.clone()),
                None => children.push((parent.to_string(), vec![label.clone()])),
            }
        }

        for (parent_label, kids) in children {
            if kids.len() != 1 || settled.contains(&parent_label) {
                continue;
            }
            // Any other child anywhere in the sequence disqualifies the parent.
            let siblings = sequence
                .iter()
                .filter(|label| store.parent_of(label) == Some(parent_label.as_str()))
                .count();
            if siblings != 1 {
                continue;
            }
            let child_label = &kids[0];
            let Some(parent) = store.find(&parent_label).cloned() else {
                continue;
            };
            if condition.is_some_and(|condition| !condition.evaluate(&parent)) {
                continue;
            }

            let clean = !parent.has_usage_records() && parent.cross_refs.is_empty();
            let discard = match policy.rule {
                FlattenRule::OnlyUnrecordedParents => {
                    if !clean {
                        continue;
                    }
                    true
                }
                FlattenRule::DiscardUnrecorded => clean,
                FlattenRule::NoDiscard => false,
            };

            if let Some(child) = store.find_mut(child_label) {
                let child_name = child.name().to_string();
                let combined = match stage {
                    FlattenStage::PreSort => format!("{child_name}, {}", parent.name()),
                    FlattenStage::PostSort => format!("{}, {child_name}", parent.name()),
                };
                if child.original_name.is_none() {
                    child.original_name = Some(child_name);
                }
                child.fields.insert("name".into(), combined);
                child.parent.clone_from(&parent.parent);
            }
            if let Some(grandparent) = parent.parent.as_deref() {
                selected.add_edge(child_label, grandparent, EdgeKind::Parent);
            }
            report.flattened.push(child_label.clone());
            settled.insert(parent_label.clone());

            if !discard {
                continue;
            }
            if is_needed_elsewhere(&parent_label, child_label, sequence, store, selected) {
                tracing::debug!(parent = %parent_label, "flattened parent reprieved");
                report.reprieved.push(parent_label);
                continue;
            }
            tracing::debug!(parent = %parent_label, child = %child_label, "discarding flattened parent");
            sequence.retain(|label| label != &parent_label);
            selected.retain(|label| label != parent_label);
            if let Some(entry) = store.find_mut(&parent_label) {
                entry.selected = false;
            }
            report.discarded.push(parent_label);
        }
    }
    report
}

/// Another retained entry depends on or cross-references `parent`.
fn is_needed_elsewhere(
    parent: &str,
    child: &str,
    sequence: &[String],
    store: &EntryStore,
    selected: &SelectedSet,
) -> bool {
    let retained = |label: &str| label != parent && label != child && sequence.iter().any(|s| s == label);
    let by_edge = selected.edges().any(|edge| {
        edge.dependency == parent && edge.kind != EdgeKind::Parent && retained(&edge.dependent)
    });
    by_edge
        || sequence.iter().any(|label| {
            retained(label)
                && store.find(label).is_some_and(|entry| {
                    entry.cross_refs.mentions(parent)
                        || entry.dependencies.iter().any(|dep| dep == parent)
                })
        })
}
