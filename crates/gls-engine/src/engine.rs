//! The `Engine` run pipeline.
//!
//! One call to [`Engine::run`] drives a candidate store through selection,
//! closure, flattening, sorting, grouping and metadata derivation, in that
//! order, and returns the finalized sequence.

use std::collections::{BTreeMap, HashMap};

use gls_config::GlsConfig;
use gls_core::entities::{CrossRefs, PriorSelection, UsageRecord};
use gls_core::enums::{FlattenTiming, SelectionMode};
use gls_core::events::InputBatch;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;

use crate::closure::{ClosureOptions, PruneRules};
use crate::collation::{Collator, DefaultCollator};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::EngineError;
use crate::groups::{Group, assign_groups, merge_small_groups};
use crate::hierarchy::{
    FlattenStage, HierarchyInfo, MissingParentContext, compute_metadata, flatten_lonely_children,
    validate_acyclic,
};
use crate::matcher::{CompiledCondition, EntryMatcher};
use crate::reference::ReferenceIndex;
use crate::selected::SelectedSet;
use crate::selection::{SelectionEngine, SelectionRules};
use crate::sort::{SortOrchestrator, SortedSequence};
use crate::store::EntryStore;

/// One finalized entry, as handed to the emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputEntry {
    pub label: String,
    pub original_label: String,
    pub entry_type: String,
    pub fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Cross-references left after dead-end pruning.
    #[serde(skip_serializing_if = "CrossRefs::is_empty")]
    pub cross_refs: CrossRefs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Name rewritten by flattening.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_override: Option<String>,
    pub level: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sibling_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_ancestor: Option<String>,
    /// Selected entries that depend on this one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependents: Vec<String>,
    pub usage_record_count: u32,
    pub synthesized: bool,
}

/// The auxiliary ordering produced by a secondary sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecondaryOrdering {
    pub list_name: String,
    pub labels: Vec<String>,
}

/// Everything one run produces.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionOutcome {
    pub entries: Vec<OutputEntry>,
    /// Variants sorted on their own; empty unless a variant pass is configured.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variant_entries: Vec<OutputEntry>,
    pub groups: Vec<Group>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variant_groups: Vec<Group>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<SecondaryOrdering>,
    /// Entries cut by the selection limit.
    pub truncated: Vec<String>,
    /// Parents removed by flattening.
    pub discarded: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    /// The prior selection with this run folded in.
    pub prior: PriorSelection,
}

impl SelectionOutcome {
    /// Labels of the primary sequence, in output order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.label.as_str())
    }
}

/// Runs the selection pipeline with an injected collator and randomness.
pub struct Engine {
    config: GlsConfig,
    collator: Box<dyn Collator>,
    rng: Box<dyn RngCore>,
}

impl Engine {
    #[must_use]
    pub fn new(config: GlsConfig) -> Self {
        Self {
            config,
            collator: Box::new(DefaultCollator),
            rng: Box::new(StdRng::from_entropy()),
        }
    }

    #[must_use]
    pub fn with_collator(mut self, collator: impl Collator + 'static) -> Self {
        self.collator = Box::new(collator);
        self
    }

    #[must_use]
    pub fn with_rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &GlsConfig {
        &self.config
    }

    /// Build the store from parsed events and run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Model`] for malformed input, otherwise as
    /// [`Self::run`].
    pub fn run_batch(
        &mut self,
        mut batch: InputBatch,
        prior: &PriorSelection,
    ) -> Result<SelectionOutcome, EngineError> {
        let records = std::mem::take(&mut batch.records);
        let store = EntryStore::from_batch(batch, self.config.labels.clone())?;
        self.run(store, records, prior)
    }

    /// Select, close, flatten, sort and group `store`.
    ///
    /// The store is consumed; a failed run leaves nothing half-mutated behind.
    ///
    /// # Errors
    ///
    /// Every [`EngineError`] variant is fatal: inconsistent configuration, an
    /// invalid pattern, `selected_before` without a prior selection, a parent
    /// cycle, or a broken variant pair.
    pub fn run(
        &mut self,
        mut store: EntryStore,
        records: Vec<UsageRecord>,
        prior: &PriorSelection,
    ) -> Result<SelectionOutcome, EngineError> {
        let config = &self.config;
        config.validate()?;

        let mut diagnostics = Diagnostics::new();
        let matcher = EntryMatcher::compile(&config.selection.match_policy)?;
        let condition = config
            .hierarchy
            .flatten
            .condition
            .as_ref()
            .map(CompiledCondition::compile)
            .transpose()?;
        let prune = if config.prune.enabled {
            Some(PruneRules::compile(&config.prune, &mut diagnostics)?)
        } else {
            None
        };
        let secondary = config
            .sort
            .secondary
            .as_ref()
            .map(|secondary| EntryMatcher::compile(&secondary.match_policy).map(|m| (secondary, m)))
            .transpose()?;

        if config.selection.mode == SelectionMode::SelectedBefore && prior.selected.is_empty() {
            return Err(EngineError::SelectedBeforeWithoutPrior);
        }
        validate_acyclic(&store)?;
        store.check_variant_links()?;

        let mut index = ReferenceIndex::new(records);
        index.annotate(&mut store);
        tracing::debug!(entries = store.len(), records = index.len(), "indexed usage records");

        let rules = SelectionRules {
            closure: ClosureOptions {
                mode: config.selection.mode,
                variant_dependency: config.selection.variant_dependency,
                missing_parents: MissingParentContext {
                    policy: &config.hierarchy.missing_parents,
                    base_name: &config.general.base_name,
                },
            },
            limit: config.selection.limit,
            matcher: &matcher,
            prune: prune.as_ref(),
        };
        let mut selection =
            SelectionEngine::new(&mut store, &mut index, &mut diagnostics, prior, rules).run()?;

        let flatten = &config.hierarchy.flatten;
        let mut sequence = selection.sequence.clone();
        let mut discarded = Vec::new();
        if flatten.timing == FlattenTiming::PreSort {
            let report = flatten_lonely_children(
                &mut sequence,
                &mut store,
                &mut selection.selected,
                flatten,
                condition.as_ref(),
                FlattenStage::PreSort,
            );
            discarded.extend(report.discarded);
        }

        let (primary, variants): (Vec<String>, Vec<String>) = match &config.sort.variant {
            Some(_) => sequence.iter().cloned().partition(|label| !store.is_variant(label)),
            None => (sequence.clone(), Vec::new()),
        };

        let mut sorter = SortOrchestrator::new(self.collator.as_ref(), self.rng.as_mut());
        let mut primary = sorter.sort(&primary, &store, &config.sort.primary, &mut diagnostics);
        let mut variants = match &config.sort.variant {
            Some(pass) => sorter.sort(&variants, &store, pass, &mut diagnostics),
            None => SortedSequence::default(),
        };

        let secondary = secondary.map(|(secondary, matcher)| {
            let subset: Vec<String> = sequence
                .iter()
                .filter(|label| store.find(label).is_some_and(|entry| matcher.matches(entry)))
                .cloned()
                .collect();
            let sorted = sorter.sort(&subset, &store, &secondary.pass, &mut diagnostics);
            SecondaryOrdering {
                list_name: secondary.list_name.clone(),
                labels: sorted.labels,
            }
        });

        if flatten.timing == FlattenTiming::PostSort {
            for labels in [&mut primary.labels, &mut variants.labels] {
                let report = flatten_lonely_children(
                    labels,
                    &mut store,
                    &mut selection.selected,
                    flatten,
                    condition.as_ref(),
                    FlattenStage::PostSort,
                );
                discarded.extend(report.discarded);
            }
        }

        let groups = self.groups_for(&primary.labels, &store, &primary.group_keys);
        let variant_groups = self.groups_for(&variants.labels, &store, &variants.group_keys);

        let mut metadata = compute_metadata(&primary.labels, &store);
        metadata.extend(compute_metadata(&variants.labels, &store));
        let group_of: HashMap<&str, &str> = groups
            .iter()
            .chain(&variant_groups)
            .flat_map(|group| group.entries.iter().map(|label| (label.as_str(), group.label.as_str())))
            .collect();

        let output = OutputBuilder {
            store: &store,
            selected: &selection.selected,
            metadata: &metadata,
            group_of: &group_of,
            config,
        };
        let entries = output.build(&primary.labels);
        let variant_entries = output.build(&variants.labels);

        let mut next_prior = prior.clone();
        next_prior.absorb(
            entries.iter().chain(&variant_entries).map(|entry| entry.label.as_str()),
            selection.selected.dependency_labels(),
        );

        tracing::info!(
            selected = entries.len() + variant_entries.len(),
            truncated = selection.truncated.len(),
            warnings = diagnostics.len(),
            "selection finished"
        );

        Ok(SelectionOutcome {
            entries,
            variant_entries,
            groups,
            variant_groups,
            secondary,
            truncated: selection.truncated,
            discarded,
            diagnostics: diagnostics.into_vec(),
            prior: next_prior,
        })
    }

    fn groups_for(
        &self,
        labels: &[String],
        store: &EntryStore,
        keys: &HashMap<String, String>,
    ) -> Vec<Group> {
        let groups = assign_groups(labels, store, keys, self.config.groups.group_level);
        match self.config.groups.merge_small_groups {
            Some(threshold) => merge_small_groups(groups, threshold),
            None => groups,
        }
    }
}

struct OutputBuilder<'a> {
    store: &'a EntryStore,
    selected: &'a SelectedSet,
    metadata: &'a HashMap<String, HierarchyInfo>,
    group_of: &'a HashMap<&'a str, &'a str>,
    config: &'a GlsConfig,
}

impl OutputBuilder<'_> {
    fn build(&self, labels: &[String]) -> Vec<OutputEntry> {
        let hierarchy = &self.config.hierarchy;
        labels
            .iter()
            .filter_map(|label| {
                let entry = self.store.find(label)?;
                let info = self.metadata.get(label);
                Some(OutputEntry {
                    label: entry.label.clone(),
                    original_label: entry.original_label.clone(),
                    entry_type: entry.entry_type.clone(),
                    fields: entry.fields.clone(),
                    parent: entry.parent.clone(),
                    cross_refs: entry.cross_refs.clone(),
                    group: self.group_of.get(label.as_str()).map(ToString::to_string),
                    display_override: entry
                        .original_name
                        .as_ref()
                        .map(|_| entry.name().to_string()),
                    level: info.map_or(0, |info| info.level),
                    child_count: info
                        .filter(|_| hierarchy.save_child_count)
                        .map(|info| info.child_count),
                    sibling_count: info
                        .filter(|_| hierarchy.save_sibling_count)
                        .map(|info| info.sibling_count),
                    root_ancestor: info
                        .filter(|_| hierarchy.save_root_ancestor)
                        .map(|info| info.root_ancestor.clone()),
                    dependents: self
                        .selected
                        .dependents_of(label)
                        .map(ToString::to_string)
                        .collect(),
                    usage_record_count: entry.usage_record_count,
                    synthesized: entry.synthesized,
                })
            })
            .collect()
    }
}
