//! Dependency Closure Resolver and dead-end cross-reference pruning.
//!
//! Expansion is a breadth-first walk over parent, dependency, cross-reference,
//! compound-element and variant edges. Every label passes through one
//! append-only [`SelectedSet`]; a committed label is never expanded twice.

use std::collections::{HashSet, VecDeque};

use gls_core::enums::{CrossRefKind, EdgeKind, SelectionMode};
use gls_core::policy::{MAX_PRUNE_ITERATIONS, PrunePolicy};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::EngineError;
use crate::fixed_point::{FixedPoint, iterate_until_stable};
use crate::hierarchy::{self, MissingParentContext};
use crate::matcher::FieldMatcher;
use crate::reference::{ReferenceIndex, ReverseCrossRefs, outgoing_edges};
use crate::selected::SelectedSet;
use crate::store::EntryStore;

/// Options that shape which edges the resolver follows.
#[derive(Debug, Clone, Copy)]
pub struct ClosureOptions<'a> {
    pub mode: SelectionMode,
    pub variant_dependency: bool,
    pub missing_parents: MissingParentContext<'a>,
}

/// Resolves seeds into the committed, dependency-closed set.
pub struct ClosureResolver<'a> {
    store: &'a mut EntryStore,
    index: &'a mut ReferenceIndex,
    diagnostics: &'a mut Diagnostics,
    options: ClosureOptions<'a>,
    selected: SelectedSet,
    queue: VecDeque<String>,
    repaired: HashSet<String>,
}

impl<'a> ClosureResolver<'a> {
    pub fn new(
        store: &'a mut EntryStore,
        index: &'a mut ReferenceIndex,
        diagnostics: &'a mut Diagnostics,
        options: ClosureOptions<'a>,
    ) -> Self {
        Self {
            store,
            index,
            diagnostics,
            options,
            selected: SelectedSet::new(),
            queue: VecDeque::new(),
            repaired: HashSet::new(),
        }
    }

    /// Commit `label` and everything it pulls in before returning.
    ///
    /// # Errors
    ///
    /// Propagates failures from missing-parent synthesis.
    pub fn include(&mut self, label: &str) -> Result<(), EngineError> {
        if self.selected.contains(label) {
            return Ok(());
        }
        self.queue.push_back(label.to_string());
        while let Some(next) = self.queue.pop_front() {
            if self.selected.contains(&next) {
                continue;
            }
            self.expand(&next)?;
        }
        Ok(())
    }

    /// Repeatedly add entries whose cross-references name a selected entry.
    ///
    /// Only the kinds the mode asks for are considered. Each round that adds
    /// something may expose new referrers, so this runs to a fixed point.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`Self::include`].
    pub fn add_reverse_cross_refs(&mut self) -> Result<FixedPoint, EngineError> {
        let kinds = self.options.mode.reverse_cross_refs();
        if kinds.is_empty() {
            return Ok(FixedPoint {
                iterations: 0,
                converged: true,
            });
        }
        let reverse = ReverseCrossRefs::build(&*self.store, kinds);
        let cap = u32::try_from(self.store.len())
            .unwrap_or(u32::MAX)
            .saturating_add(1);

        let mut failure = None;
        let outcome = iterate_until_stable(cap, |round| {
            let pending: Vec<String> = self
                .selected
                .labels()
                .flat_map(|label| reverse.referrers_of(label))
                .filter(|referrer| !self.selected.contains(referrer))
                .map(ToString::to_string)
                .collect();
            if pending.is_empty() {
                return false;
            }
            tracing::debug!(round, added = pending.len(), "adding reverse cross-references");
            for referrer in pending {
                if let Err(error) = self.include(&referrer) {
                    failure = Some(error);
                    return false;
                }
            }
            true
        });
        match failure {
            Some(error) => Err(error),
            None => Ok(outcome),
        }
    }

    #[must_use]
    pub fn selected(&self) -> &SelectedSet {
        &self.selected
    }

    #[must_use]
    pub fn into_selected(self) -> SelectedSet {
        self.selected
    }

    fn expand(&mut self, label: &str) -> Result<(), EngineError> {
        let mode = self.options.mode;

        for created in self.repair_parent_chain(label)? {
            if !mode.follows_ancestors() && self.selected.commit(&created) {
                self.selected.add_edge(label, &created, EdgeKind::Parent);
            }
        }
        let ancestors = if mode.follows_ancestors() {
            hierarchy::complete_ancestors(label, &mut self.selected, &*self.store)
        } else {
            Vec::new()
        };

        self.selected.commit(label);
        if mode.follows_dependencies() {
            for ancestor in &ancestors {
                self.follow_edges(ancestor);
            }
            self.follow_edges(label);
        }
        Ok(())
    }

    /// Follow every non-parent edge of `label`.
    fn follow_edges(&mut self, label: &str) {
        let Some(entry) = self.store.find(label) else {
            return;
        };
        let edges: Vec<(EdgeKind, String)> =
            outgoing_edges(entry, self.options.variant_dependency)
                .into_iter()
                .filter(|(kind, _)| *kind != EdgeKind::Parent)
                .map(|(kind, target)| (kind, target.to_string()))
                .collect();

        for (kind, target) in edges {
            self.follow(label, kind, &target);
        }
    }

    /// Resolve one edge, queueing whatever it reaches.
    fn follow(&mut self, from: &str, kind: EdgeKind, target: &str) {
        if let Some(resolved) = self.store.resolve(target) {
            if kind == EdgeKind::CrossRef(CrossRefKind::Alias) {
                self.copy_alias_records(from, &resolved);
            }
            self.enqueue(from, &resolved, kind);
            return;
        }

        if let Some(compound) = self.store.compound(target) {
            let elements = compound.ordered_elements.clone();
            for element in elements {
                match self.store.resolve(&element) {
                    Some(resolved) => self.enqueue(from, &resolved, EdgeKind::CompoundElement),
                    None => self.diagnostics.push(Diagnostic::UnresolvedDependency {
                        from: from.to_string(),
                        target: element,
                        via: EdgeKind::CompoundElement,
                    }),
                }
            }
            return;
        }

        let diagnostic = match kind {
            EdgeKind::CrossRef(via) => Diagnostic::UnresolvedCrossReference {
                from: from.to_string(),
                target: target.to_string(),
                via,
            },
            via => Diagnostic::UnresolvedDependency {
                from: from.to_string(),
                target: target.to_string(),
                via,
            },
        };
        self.diagnostics.push(diagnostic);
    }

    fn enqueue(&mut self, from: &str, to: &str, kind: EdgeKind) {
        self.selected.add_edge(from, to, kind);
        if !self.selected.contains(to) {
            self.queue.push_back(to.to_string());
        }
    }

    fn copy_alias_records(&mut self, alias: &str, target: &str) {
        let copied = self.index.copy_records(alias, target);
        if copied == 0 {
            return;
        }
        let count = self.index.count(target);
        if let Some(entry) = self.store.find_mut(target) {
            entry.usage_record_count = count;
        }
        tracing::debug!(alias, target, copied, "copied alias records");
    }

    /// Apply the missing-parent policy up the chain starting at `label`.
    ///
    /// Returns labels of parents fabricated on the way, root-most last.
    fn repair_parent_chain(&mut self, label: &str) -> Result<Vec<String>, EngineError> {
        let mut created = Vec::new();
        let mut current = label.to_string();
        loop {
            if !self.repaired.insert(current.clone()) {
                break;
            }
            if let Some(parent) = hierarchy::synthesize_missing_parent(
                &mut *self.store,
                &current,
                self.options.missing_parents,
                &mut *self.diagnostics,
            )? {
                created.push(parent);
                break;
            }
            match self.store.parent_of(&current) {
                Some(parent) if self.store.contains(parent) && !self.selected.contains(parent) => {
                    current = parent.to_string();
                }
                _ => break,
            }
        }
        Ok(created)
    }
}

// ---------------------------------------------------------------------------
// Pruning
// ---------------------------------------------------------------------------

/// Compiled discard patterns plus the iteration cap.
#[derive(Debug, Clone)]
pub struct PruneRules {
    pub see: FieldMatcher,
    pub see_also: FieldMatcher,
    pub iterations: u32,
}

impl PruneRules {
    /// Compile the policy, reporting a clamped iteration count.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPattern`] for a bad discard pattern.
    pub fn compile(policy: &PrunePolicy, diagnostics: &mut Diagnostics) -> Result<Self, EngineError> {
        let iterations = policy.effective_iterations();
        if policy.iterations > MAX_PRUNE_ITERATIONS {
            diagnostics.push(Diagnostic::PruneIterationsClamped {
                requested: policy.iterations,
                applied: iterations,
            });
        }
        Ok(Self {
            see: FieldMatcher::from_patterns(&policy.see_match)?,
            see_also: FieldMatcher::from_patterns(&policy.see_also_match)?,
            iterations,
        })
    }

    const fn matcher(&self, kind: CrossRefKind) -> Option<&FieldMatcher> {
        match kind {
            CrossRefKind::See => Some(&self.see),
            CrossRefKind::SeeAlso => Some(&self.see_also),
            CrossRefKind::Alias => None,
        }
    }
}

/// A cross-reference removed because its target was a dead end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunedReference {
    pub from: String,
    pub kind: CrossRefKind,
    pub target: String,
}

/// Labels the closure of `seeds` reaches without following `see` or
/// `see_also` edges. None of these can be a dead end.
#[must_use]
pub fn protected_labels(
    store: &EntryStore,
    seeds: &[String],
    options: &ClosureOptions<'_>,
) -> HashSet<String> {
    let mode = options.mode;
    let mut protected: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = seeds.iter().cloned().collect();
    while let Some(label) = queue.pop_front() {
        if !protected.insert(label.clone()) {
            continue;
        }
        let Some(entry) = store.find(&label) else {
            continue;
        };
        for (kind, target) in outgoing_edges(entry, options.variant_dependency) {
            let follow = match kind {
                EdgeKind::Parent => mode.follows_ancestors(),
                EdgeKind::CrossRef(CrossRefKind::See | CrossRefKind::SeeAlso) => false,
                _ => mode.follows_dependencies(),
            };
            if !follow {
                continue;
            }
            if let Some(resolved) = store.resolve(target) {
                queue.push_back(resolved);
            } else if let Some(compound) = store.compound(target) {
                queue.extend(
                    compound
                        .ordered_elements
                        .iter()
                        .filter_map(|element| store.resolve(element)),
                );
            }
        }
    }
    protected
}

/// Strip dead-end `see`/`see_also` targets from every entry until stable.
///
/// A target is a dead end when it resolves, is not in `keep`, has no usage
/// records and matches the discard patterns for its kind. Removing one edge
/// can turn its referrer into a dead end, hence the bounded iteration.
pub fn prune_dead_ends(
    store: &mut EntryStore,
    keep: &HashSet<String>,
    rules: &PruneRules,
) -> (Vec<PrunedReference>, FixedPoint) {
    let mut pruned = Vec::new();
    let outcome = iterate_until_stable(rules.iterations, |round| {
        let mut removals: Vec<PrunedReference> = Vec::new();
        for entry in store.iter() {
            for (kind, target) in entry.cross_refs.iter() {
                let Some(matcher) = rules.matcher(kind) else {
                    continue;
                };
                let Some(resolved) = store.find_with_variant_fallback(target) else {
                    continue;
                };
                let dead_end = !keep.contains(&resolved.label)
                    && !resolved.has_usage_records()
                    && matcher.matches(resolved);
                if dead_end {
                    removals.push(PrunedReference {
                        from: entry.label.clone(),
                        kind,
                        target: target.to_string(),
                    });
                }
            }
        }
        if removals.is_empty() {
            return false;
        }
        for removal in &removals {
            if let Some(entry) = store.find_mut(&removal.from) {
                let list = match removal.kind {
                    CrossRefKind::See => &mut entry.cross_refs.see,
                    CrossRefKind::SeeAlso => &mut entry.cross_refs.see_also,
                    CrossRefKind::Alias => continue,
                };
                list.retain(|target| target != &removal.target);
            }
            tracing::debug!(round, from = %removal.from, target = %removal.target, "pruned dead-end cross-reference");
        }
        pruned.extend(removals);
        true
    });
    if !outcome.converged {
        tracing::debug!(iterations = outcome.iterations, "prune iteration cap reached");
    }
    (pruned, outcome)
}

#[cfg(test)]
mod tests {
    use gls_core::entities::{CompoundEntry, Entry, UsageRecord};
    use gls_core::labels::LabelPrefixes;
    use gls_core::policy::MissingParentPolicy;
    use pretty_assertions::assert_eq;

    use super::*;

    fn store_with(entries: Vec<Entry>) -> EntryStore {
        let mut store = EntryStore::new(LabelPrefixes::default());
        for entry in entries {
            store.insert(entry).unwrap();
        }
        store
    }

    fn resolve(
        store: &mut EntryStore,
        records: &[&str],
        mode: SelectionMode,
        seeds: &[&str],
    ) -> (SelectedSet, Vec<Diagnostic>) {
        let mut index =
            ReferenceIndex::new(records.iter().map(|l| UsageRecord::new(*l)).collect());
        index.annotate(store);
        let mut diagnostics = Diagnostics::new();
        let policy = MissingParentPolicy::Warn;
        let options = ClosureOptions {
            mode,
            variant_dependency: false,
            missing_parents: MissingParentContext {
                policy: &policy,
                base_name: "",
            },
        };
        let mut resolver = ClosureResolver::new(store, &mut index, &mut diagnostics, options);
        for seed in seeds {
            resolver.include(seed).unwrap();
        }
        resolver.add_reverse_cross_refs().unwrap();
        let selected = resolver.into_selected();
        (selected, diagnostics.into_vec())
    }

    #[test]
    fn closure_follows_every_edge_kind() {
        let mut store = store_with(vec![
            Entry::new("root"),
            Entry::new("a")
                .with_parent("root")
                .with_dependencies(&["pair"])
                .with_see(&["b"]),
            Entry::new("b"),
            Entry::new("x"),
            Entry::new("y"),
        ]);
        store.insert_compound(CompoundEntry::new("pair", "x", &["x", "y"]));
        let (selected, diagnostics) =
            resolve(&mut store, &["a"], SelectionMode::RecordedAndDeps, &["a"]);
        assert_eq!(
            selected.to_vec(),
            vec!["root", "a", "x", "y", "b"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn cyclic_cross_references_terminate() {
        let mut store = store_with(vec![
            Entry::new("a").with_see(&["b"]),
            Entry::new("b").with_see(&["a"]),
        ]);
        let (selected, _) = resolve(&mut store, &["a"], SelectionMode::RecordedAndDeps, &["a"]);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn unresolved_target_is_a_warning() {
        let mut store = store_with(vec![Entry::new("a").with_see_also(&["nowhere"])]);
        let (selected, diagnostics) =
            resolve(&mut store, &["a"], SelectionMode::RecordedAndDeps, &["a"]);
        assert_eq!(selected.len(), 1);
        assert!(matches!(
            diagnostics[0],
            Diagnostic::UnresolvedCrossReference {
                via: CrossRefKind::SeeAlso,
                ..
            }
        ));
    }

    #[test]
    fn alias_target_receives_records() {
        let mut store = store_with(vec![Entry::new("short").with_alias("long"), Entry::new("long")]);
        let (_, _) = resolve(&mut store, &["short"], SelectionMode::RecordedAndDeps, &["short"]);
        assert_eq!(store.find("long").unwrap().usage_record_count, 1);
    }

    #[test]
    fn ancestor_mode_ignores_cross_references() {
        let mut store = store_with(vec![
            Entry::new("p"),
            Entry::new("a").with_parent("p").with_see(&["b"]),
            Entry::new("b"),
        ]);
        let (selected, _) =
            resolve(&mut store, &["a"], SelectionMode::RecordedAndAncestors, &["a"]);
        assert_eq!(selected.to_vec(), vec!["p".to_string(), "a".to_string()]);
    }

    #[test]
    fn reverse_cross_refs_pull_in_referrers() {
        let mut store = store_with(vec![
            Entry::new("target"),
            Entry::new("fan").with_see(&["target"]),
            Entry::new("fan2").with_see(&["fan"]),
        ]);
        let (selected, _) = resolve(
            &mut store,
            &["target"],
            SelectionMode::RecordedAndDepsAndSee,
            &["target"],
        );
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn pruning_removes_dead_ends_iteratively() {
        let mut store = store_with(vec![
            Entry::new("a").with_see(&["b"]),
            Entry::new("b").with_see(&["c"]),
            Entry::new("c"),
        ]);
        let mut diagnostics = Diagnostics::new();
        let policy = PrunePolicy {
            enabled: true,
            iterations: 5,
            ..PrunePolicy::default()
        };
        let rules = PruneRules::compile(&policy, &mut diagnostics).unwrap();
        let keep = HashSet::from(["a".to_string()]);
        let (pruned, outcome) = prune_dead_ends(&mut store, &keep, &rules);
        assert_eq!(pruned.len(), 2);
        assert!(outcome.converged);
        assert!(store.find("a").unwrap().cross_refs.see.is_empty());
    }

    #[test]
    fn single_prune_iteration_stops_early() {
        let mut store = store_with(vec![
            Entry::new("a").with_see(&["b"]),
            Entry::new("b").with_see(&["c"]),
            Entry::new("c"),
        ]);
        let mut diagnostics = Diagnostics::new();
        let rules = PruneRules::compile(&PrunePolicy::default(), &mut diagnostics).unwrap();
        let (pruned, outcome) = prune_dead_ends(&mut store, &HashSet::new(), &rules);
        assert_eq!(pruned.len(), 1);
        assert!(!outcome.converged);
        assert_eq!(store.find("a").unwrap().cross_refs.see, vec!["b".to_string()]);
    }
}
