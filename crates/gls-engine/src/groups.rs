//! Group assignment over a sorted sequence and small-group merging.

use std::collections::HashMap;

use serde::Serialize;

use crate::hierarchy::levels;
use crate::store::EntryStore;

/// A run of consecutive sorted entries sharing one group label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub label: String,
    /// Hierarchy level of the entries that opened the group.
    pub level: usize,
    pub entries: Vec<String>,
    /// Original group labels when this group is the result of a merge.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

impl Group {
    #[must_use]
    pub fn is_merged(&self) -> bool {
        !self.members.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Partition `sequence` into groups.
///
/// Entries at or above `group_level` are grouped by their own key; deeper
/// entries join the group of their nearest ancestor that is. No keys (an
/// order-preserving or random pass) means no groups.
#[must_use]
pub fn assign_groups(
    sequence: &[String],
    store: &EntryStore,
    group_keys: &HashMap<String, String>,
    group_level: usize,
) -> Vec<Group> {
    if group_keys.is_empty() {
        return Vec::new();
    }
    let levels = levels(sequence, store);
    let mut assigned: HashMap<&str, (usize, String)> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for label in sequence {
        let level = levels.get(label).copied().unwrap_or(0);
        let inherited = (level > group_level)
            .then(|| store.parent_of(label).and_then(|parent| assigned.get(parent)).cloned())
            .flatten();
        let id = inherited.unwrap_or_else(|| {
            (level, group_keys.get(label).cloned().unwrap_or_default())
        });

        match groups.last_mut() {
            Some(last) if last.level == id.0 && last.label == id.1 => last.entries.push(label.clone()),
            _ => groups.push(Group {
                label: id.1.clone(),
                level: id.0,
                entries: vec![label.clone()],
                members: Vec::new(),
            }),
        }
        assigned.insert(label, id);
    }
    groups
}

/// Coalesce maximal runs of adjacent small groups on the same level.
///
/// A run merges only if it holds more than one group and every group in it
/// has at most `threshold` entries.
#[must_use]
pub fn merge_small_groups(groups: Vec<Group>, threshold: usize) -> Vec<Group> {
    let mut merged = Vec::with_capacity(groups.len());
    let mut run: Vec<Group> = Vec::new();

    for group in groups {
        let small = group.len() <= threshold;
        let continues = run.last().is_some_and(|last| last.level == group.level);
        if !(small && continues) {
            flush_run(&mut run, &mut merged);
        }
        if small {
            run.push(group);
        } else {
            merged.push(group);
        }
    }
    flush_run(&mut run, &mut merged);
    merged
}

fn flush_run(run: &mut Vec<Group>, out: &mut Vec<Group>) {
    if run.len() < 2 {
        out.append(run);
        return;
    }
    let first = run.first().map(|g| g.label.clone()).unwrap_or_default();
    let last = run.last().map(|g| g.label.clone()).unwrap_or_default();
    let level = run[0].level;
    let mut combined = Group {
        label: format!("{first}-{last}"),
        level,
        entries: Vec::new(),
        members: Vec::new(),
    };
    for group in run.drain(..) {
        combined.entries.extend(group.entries);
        combined.members.push(group.label);
    }
    tracing::debug!(label = %combined.label, groups = combined.members.len(), "merged small groups");
    out.push(combined);
}
