//! Sort Orchestrator: applies one sort pass to a selected sequence.
//!
//! Comparison-based policies sort hierarchically. Each entry is compared by
//! the path of keys from its topmost selected ancestor down to itself, so a
//! parent always precedes its descendants and siblings order by key, then
//! suffix, then tie-break, then pre-sort position.

use std::cmp::{Ordering, Reverse};
use std::collections::{HashMap, HashSet};

use gls_core::entities::Entry;
use gls_core::policy::{SortPass, SortPolicy, SuffixPolicy, TieBreak};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::collation::{Collator, SortKey};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::store::EntryStore;

/// Result of one sort pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedSequence {
    pub labels: Vec<String>,
    /// Group label per entry; empty for order-preserving and random passes.
    pub group_keys: HashMap<String, String>,
}

#[derive(Debug)]
struct NodeKey {
    key: SortKey,
    suffix: String,
    tie: String,
    position: usize,
}

pub struct SortOrchestrator<'a> {
    collator: &'a dyn Collator,
    rng: &'a mut dyn RngCore,
}

impl<'a> SortOrchestrator<'a> {
    pub fn new(collator: &'a dyn Collator, rng: &'a mut dyn RngCore) -> Self {
        Self { collator, rng }
    }

    pub fn sort(
        &mut self,
        sequence: &[String],
        store: &EntryStore,
        pass: &SortPass,
        diagnostics: &mut Diagnostics,
    ) -> SortedSequence {
        match &pass.policy {
            SortPolicy::None => preserve(sequence, pass.reverse),
            SortPolicy::UseRecordOrder { reverse } => preserve(sequence, *reverse || pass.reverse),
            SortPolicy::Random { seed } => {
                let keys = self.random_keys(sequence.len(), *seed);
                let suffixes = vec![String::new(); sequence.len()];
                let labels = hierarchical_order(sequence, store, keys, suffixes, pass);
                SortedSequence {
                    labels,
                    group_keys: HashMap::new(),
                }
            }
            policy => self.compare_sort(sequence, store, pass, policy, diagnostics),
        }
    }

    fn random_keys(&mut self, len: usize, seed: Option<u64>) -> Vec<SortKey> {
        match seed.filter(|&seed| seed != 0) {
            Some(seed) => {
                let mut seeded = StdRng::seed_from_u64(seed);
                (0..len).map(|_| SortKey::Rank(seeded.next_u64())).collect()
            }
            None => (0..len).map(|_| SortKey::Rank(self.rng.next_u64())).collect(),
        }
    }

    fn compare_sort(
        &self,
        sequence: &[String],
        store: &EntryStore,
        pass: &SortPass,
        policy: &SortPolicy,
        diagnostics: &mut Diagnostics,
    ) -> SortedSequence {
        let mut keys = Vec::with_capacity(sequence.len());
        let mut group_keys = HashMap::new();
        for label in sequence {
            let key = match (policy, store.find(label)) {
                (SortPolicy::RecordCount, Some(entry)) => {
                    SortKey::Count(Reverse(entry.usage_record_count))
                }
                (_, Some(entry)) => {
                    let value = sort_value(entry, pass, store);
                    self.collator.sort_key(&value, policy).unwrap_or_else(|| {
                        diagnostics.push(Diagnostic::UnparseableSortValue {
                            label: label.clone(),
                            value,
                            policy: policy.as_str().to_string(),
                        });
                        SortKey::fallback_for(policy)
                    })
                }
                (_, None) => SortKey::fallback_for(policy),
            };
            group_keys.insert(label.clone(), self.collator.group_key(&key));
            keys.push(key);
        }

        let suffixes = suffixes(policy, sequence, store, &keys);
        let labels = hierarchical_order(sequence, store, keys, suffixes, pass);
        SortedSequence { labels, group_keys }
    }
}

fn preserve(sequence: &[String], reverse: bool) -> SortedSequence {
    let mut labels = sequence.to_vec();
    if reverse {
        labels.reverse();
    }
    SortedSequence {
        labels,
        group_keys: HashMap::new(),
    }
}

/// The policy field, then the pass fallback field, then the unprefixed label.
fn sort_value(entry: &Entry, pass: &SortPass, store: &EntryStore) -> String {
    pass.policy
        .field()
        .and_then(|field| entry.field(field))
        .or_else(|| entry.field(&pass.fallback_field))
        .map_or_else(
            || store.prefixes().strip(&entry.original_label).to_string(),
            ToString::to_string,
        )
}

/// Suffix appended to each collation key, by sequence position.
fn suffixes(policy: &SortPolicy, sequence: &[String], store: &EntryStore, keys: &[SortKey]) -> Vec<String> {
    let SortPolicy::Collation { suffix, .. } = policy else {
        return vec![String::new(); sequence.len()];
    };
    match suffix {
        SuffixPolicy::None => vec![String::new(); sequence.len()],
        SuffixPolicy::Field(field) => sequence
            .iter()
            .map(|label| {
                store
                    .find(label)
                    .and_then(|entry| entry.field(field))
                    .unwrap_or_default()
                    .to_string()
            })
            .collect(),
        SuffixPolicy::NonUnique => {
            let mut seen: Vec<(&SortKey, usize)> = Vec::new();
            keys.iter()
                .map(|key| {
                    let occurrence = if let Some((_, count)) = seen.iter_mut().find(|(k, _)| *k == key) {
                        *count += 1;
                        *count
                    } else {
                        seen.push((key, 0));
                        0
                    };
                    format!("{occurrence:08}")
                })
                .collect()
        }
    }
}

fn tie_value(entry: &Entry, tie_break: &TieBreak) -> String {
    match tie_break {
        TieBreak::None => String::new(),
        TieBreak::Id => entry.label.clone(),
        TieBreak::OriginalId => entry.original_label.clone(),
        TieBreak::Field(field) => entry.field(field).unwrap_or_default().to_string(),
    }
}

fn compare_nodes(a: &NodeKey, b: &NodeKey, reverse: bool) -> Ordering {
    let primary = a.key.cmp(&b.key).then_with(|| a.suffix.cmp(&b.suffix));
    let primary = if reverse { primary.reverse() } else { primary };
    primary
        .then_with(|| a.tie.cmp(&b.tie))
        .then_with(|| a.position.cmp(&b.position))
}

/// Stable hierarchical sort of `sequence` by the given per-position keys.
fn hierarchical_order(
    sequence: &[String],
    store: &EntryStore,
    keys: Vec<SortKey>,
    suffixes: Vec<String>,
    pass: &SortPass,
) -> Vec<String> {
    let position_of: HashMap<&str, usize> = sequence
        .iter()
        .enumerate()
        .map(|(position, label)| (label.as_str(), position))
        .collect();

    let nodes: Vec<NodeKey> = sequence
        .iter()
        .zip(keys.into_iter().zip(suffixes))
        .enumerate()
        .map(|(position, (label, (key, suffix)))| {
            let tie = store
                .find(label)
                .map(|entry| tie_value(entry, &pass.tie_break))
                .unwrap_or_default();
            NodeKey {
                key,
                suffix,
                tie,
                position,
            }
        })
        .collect();

    let paths: Vec<Vec<usize>> = sequence
        .iter()
        .map(|label| ancestor_path(label, store, &position_of))
        .collect();

    let mut order: Vec<usize> = (0..sequence.len()).collect();
    order.sort_by(|&a, &b| {
        for (&x, &y) in paths[a].iter().zip(&paths[b]) {
            if x == y {
                continue;
            }
            return compare_nodes(&nodes[x], &nodes[y], pass.reverse);
        }
        paths[a].len().cmp(&paths[b].len())
    });
    order.into_iter().map(|i| sequence[i].clone()).collect()
}

/// Positions from the topmost ancestor present in the sequence down to `label`.
fn ancestor_path(label: &str, store: &EntryStore, position_of: &HashMap<&str, usize>) -> Vec<usize> {
    let mut path = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(label);
    while let Some(node) = current {
        let Some(&position) = position_of.get(node) else {
            break;
        };
        if !seen.insert(position) {
            break;
        }
        path.push(position);
        current = store.parent_of(node);
    }
    path.reverse();
    path
}
