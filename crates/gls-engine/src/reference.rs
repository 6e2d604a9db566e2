//! Reference Index: usage records and outgoing edges per entry.

use std::collections::HashMap;

use gls_core::entities::{Entry, UsageRecord};
use gls_core::enums::{CrossRefKind, EdgeKind};
use indexmap::IndexMap;

use crate::store::EntryStore;

/// Usage records in observation order, indexed by label.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    records: Vec<UsageRecord>,
    by_label: HashMap<String, Vec<usize>>,
    /// Unique labels keyed to the position of their first record.
    first_seen: IndexMap<String, usize>,
}

impl ReferenceIndex {
    #[must_use]
    pub fn new(records: Vec<UsageRecord>) -> Self {
        let mut index = Self::default();
        for record in records {
            index.push(record);
        }
        index
    }

    pub fn push(&mut self, record: UsageRecord) {
        let position = self.records.len();
        self.by_label
            .entry(record.label.clone())
            .or_default()
            .push(position);
        self.first_seen.entry(record.label.clone()).or_insert(position);
        self.records.push(record);
    }

    pub fn usage_records_for<'a>(&'a self, label: &str) -> impl Iterator<Item = &'a UsageRecord> {
        self.by_label
            .get(label)
            .into_iter()
            .flatten()
            .map(|&position| &self.records[position])
    }

    #[must_use]
    pub fn has_records(&self, label: &str) -> bool {
        self.by_label.contains_key(label)
    }

    #[must_use]
    pub fn count(&self, label: &str) -> u32 {
        self.by_label
            .get(label)
            .map_or(0, |positions| u32::try_from(positions.len()).unwrap_or(u32::MAX))
    }

    /// Position of the first record naming `label`.
    #[must_use]
    pub fn first_seen(&self, label: &str) -> Option<usize> {
        self.first_seen.get(label).copied()
    }

    /// Unique record labels in order of first observation.
    pub fn labels_in_record_order(&self) -> impl Iterator<Item = &str> {
        self.first_seen.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Attribute copies of every record of `from` to `to`.
    ///
    /// Returns the number of records copied.
    pub fn copy_records(&mut self, from: &str, to: &str) -> usize {
        let copies: Vec<UsageRecord> = self
            .usage_records_for(from)
            .map(|record| record.relabelled(to))
            .collect();
        let copied = copies.len();
        for record in copies {
            self.push(record);
        }
        copied
    }

    /// Write record counts onto the entries of `store`.
    pub fn annotate(&self, store: &mut EntryStore) {
        for entry in store.iter_mut() {
            entry.usage_record_count = self.count(&entry.label);
        }
    }
}

/// Labels an entry points at, tagged with the edge kind.
///
/// Parent edges come first, then explicit dependencies, then cross-references
/// in `see`, `see_also`, `alias` order. Variant edges are included only when
/// `with_variant` is set.
#[must_use]
pub fn outgoing_edges(entry: &Entry, with_variant: bool) -> Vec<(EdgeKind, &str)> {
    let mut edges: Vec<(EdgeKind, &str)> = Vec::new();
    if let Some(parent) = entry.parent.as_deref() {
        edges.push((EdgeKind::Parent, parent));
    }
    edges.extend(
        entry
            .dependencies
            .iter()
            .map(|label| (EdgeKind::Dependency, label.as_str())),
    );
    edges.extend(
        entry
            .cross_refs
            .iter()
            .map(|(kind, target)| (EdgeKind::CrossRef(kind), target)),
    );
    if with_variant && let Some(variant) = entry.variant_link.as_deref() {
        edges.push((EdgeKind::Variant, variant));
    }
    edges
}

/// Reverse cross-reference map: target label to the entries naming it.
#[derive(Debug, Default)]
pub struct ReverseCrossRefs {
    referrers: HashMap<String, Vec<String>>,
}

impl ReverseCrossRefs {
    /// Index every cross-reference of `kinds` in `store`, resolving targets
    /// with variant fallback. Referrers stay in definition order.
    #[must_use]
    pub fn build(store: &EntryStore, kinds: &[CrossRefKind]) -> Self {
        let mut referrers: HashMap<String, Vec<String>> = HashMap::new();
        for entry in store.iter() {
            for (kind, target) in entry.cross_refs.iter() {
                if !kinds.contains(&kind) {
                    continue;
                }
                let Some(resolved) = store.resolve(target) else {
                    continue;
                };
                let list = referrers.entry(resolved).or_default();
                if !list.contains(&entry.label) {
                    list.push(entry.label.clone());
                }
            }
        }
        Self { referrers }
    }

    pub fn referrers_of<'a>(&'a self, label: &str) -> impl Iterator<Item = &'a str> {
        self.referrers
            .get(label)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }
}
