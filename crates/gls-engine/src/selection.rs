//! Selection Engine: seeding, expansion, truncation and finalization.

use std::fmt;

use gls_core::entities::PriorSelection;
use gls_core::enums::SelectionMode;
use indexmap::IndexSet;

use crate::closure::{
    ClosureOptions, ClosureResolver, PruneRules, protected_labels, prune_dead_ends,
};
use crate::diagnostics::Diagnostics;
use crate::error::EngineError;
use crate::matcher::EntryMatcher;
use crate::reference::ReferenceIndex;
use crate::selected::SelectedSet;
use crate::store::EntryStore;

/// Stages of one selection run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Seeding,
    Expanding,
    Truncating,
    Finalizing,
    Finalized,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seeding => "seeding",
            Self::Expanding => "expanding",
            Self::Truncating => "truncating",
            Self::Finalizing => "finalizing",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs that parametrize one selection run.
pub struct SelectionRules<'a> {
    pub closure: ClosureOptions<'a>,
    pub limit: usize,
    pub matcher: &'a EntryMatcher,
    pub prune: Option<&'a PruneRules>,
}

/// The finalized selection.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Selected labels in commit order.
    pub sequence: Vec<String>,
    pub selected: SelectedSet,
    /// Entries cut by the limit, in commit order.
    pub truncated: Vec<String>,
    /// Entries dropped because they had their own records.
    pub excluded: Vec<String>,
}

pub struct SelectionEngine<'a> {
    store: &'a mut EntryStore,
    index: &'a mut ReferenceIndex,
    diagnostics: &'a mut Diagnostics,
    prior: &'a PriorSelection,
    rules: SelectionRules<'a>,
    stage: Stage,
}

impl<'a> SelectionEngine<'a> {
    pub fn new(
        store: &'a mut EntryStore,
        index: &'a mut ReferenceIndex,
        diagnostics: &'a mut Diagnostics,
        prior: &'a PriorSelection,
        rules: SelectionRules<'a>,
    ) -> Self {
        Self {
            store,
            index,
            diagnostics,
            prior,
            rules,
            stage: Stage::Seeding,
        }
    }

    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, stage: Stage) {
        tracing::debug!(from = %self.stage, to = %stage, "selection stage");
        self.stage = stage;
    }

    /// Drive the state machine to `Finalized`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SelectedBeforeWithoutPrior`] before touching the
    /// store, or any error raised while synthesizing parents.
    pub fn run(mut self) -> Result<Selection, EngineError> {
        let mode = self.rules.closure.mode;
        if mode == SelectionMode::SelectedBefore && self.prior.selected.is_empty() {
            return Err(EngineError::SelectedBeforeWithoutPrior);
        }

        let seeds = self.seed();
        tracing::debug!(%mode, seeds = seeds.len(), "seeded selection");

        if let Some(rules) = self.rules.prune {
            let mut keep = protected_labels(&*self.store, &seeds, &self.rules.closure);
            keep.extend(self.prior.dependencies.iter().cloned());
            let (pruned, _) = prune_dead_ends(self.store, &keep, rules);
            tracing::debug!(pruned = pruned.len(), "pruned dead-end cross-references");
        }

        self.enter(Stage::Expanding);
        let mut selected = self.expand(&seeds)?;

        self.enter(Stage::Truncating);
        let truncated = if self.rules.limit > 0 {
            selected.truncate(self.rules.limit)
        } else {
            Vec::new()
        };
        if !truncated.is_empty() {
            tracing::debug!(limit = self.rules.limit, cut = truncated.len(), "truncated selection");
        }

        self.enter(Stage::Finalizing);
        let excluded = if mode.excludes_recorded() {
            let store = &*self.store;
            selected.retain(|label| !store.find(label).is_some_and(|e| e.has_usage_records()))
        } else {
            Vec::new()
        };
        self.finalize_flags(&selected, &truncated, &excluded);
        self.enter(Stage::Finalized);

        Ok(Selection {
            sequence: selected.to_vec(),
            selected,
            truncated,
            excluded,
        })
    }

    /// Initial labels in the order the mode dictates.
    fn seed(&self) -> Vec<String> {
        let mode = self.rules.closure.mode;
        let matcher = self.rules.matcher;
        let store = &*self.store;
        let mut seeds: IndexSet<String> = IndexSet::new();

        match mode {
            SelectionMode::All => {
                seeds.extend(store.labels());
            }
            SelectionMode::SelectedBefore => {
                seeds.extend(
                    store
                        .iter()
                        .filter(|e| self.prior.was_selected(&e.label))
                        .map(|e| e.label.clone()),
                );
            }
            _ if matcher.is_additive() => {
                seeds.extend(
                    store
                        .iter()
                        .filter(|e| {
                            e.has_usage_records()
                                || self.prior.is_dependency(&e.label)
                                || matcher.matches(e)
                        })
                        .map(|e| e.label.clone()),
                );
            }
            _ => {
                for label in self.index.labels_in_record_order() {
                    if let Some(resolved) = store.resolve(label) {
                        seeds.insert(resolved);
                    } else if let Some(compound) = store.compound(label) {
                        seeds.extend(
                            compound
                                .ordered_elements
                                .iter()
                                .filter_map(|element| store.resolve(element)),
                        );
                    } else {
                        tracing::debug!(
                            label,
                            first_record = ?self.index.first_seen(label),
                            "record names no known entry"
                        );
                    }
                }
                seeds.extend(
                    store
                        .iter()
                        .filter(|e| self.prior.is_dependency(&e.label))
                        .map(|e| e.label.clone()),
                );
            }
        }

        seeds.retain(|label| !store.find(label).is_some_and(|e| matcher.filters_out(e)));

        if !self.rules.closure.variant_dependency || mode == SelectionMode::All {
            return seeds.into_iter().collect();
        }
        let mut paired: IndexSet<String> = IndexSet::new();
        for label in seeds {
            let partner = store
                .find(&label)
                .and_then(|e| e.variant_link.clone())
                .filter(|partner| store.contains(partner));
            paired.insert(label);
            if let Some(partner) = partner {
                paired.insert(partner);
            }
        }
        paired.into_iter().collect()
    }

    fn expand(&mut self, seeds: &[String]) -> Result<SelectedSet, EngineError> {
        let mut resolver = ClosureResolver::new(
            &mut *self.store,
            &mut *self.index,
            &mut *self.diagnostics,
            self.rules.closure,
        );
        for seed in seeds {
            resolver.include(seed)?;
        }
        let reverse = resolver.add_reverse_cross_refs()?;
        if reverse.iterations > 0 {
            tracing::debug!(rounds = reverse.iterations, "reverse cross-references settled");
        }
        Ok(resolver.into_selected())
    }

    /// Set selection flags and drop parent labels that point outside the set.
    fn finalize_flags(&mut self, selected: &SelectedSet, truncated: &[String], excluded: &[String]) {
        for label in truncated.iter().chain(excluded) {
            if let Some(entry) = self.store.find_mut(label) {
                entry.selected = false;
            }
        }
        let unselected_parents: Vec<String> = selected
            .labels()
            .filter(|label| {
                self.store
                    .parent_of(label)
                    .is_some_and(|parent| self.store.contains(parent) && !selected.contains(parent))
            })
            .map(ToString::to_string)
            .collect();
        for label in selected.labels() {
            if let Some(entry) = self.store.find_mut(label) {
                entry.selected = true;
            }
        }
        for label in unselected_parents {
            if let Some(entry) = self.store.find_mut(&label) {
                entry.parent = None;
            }
        }
    }
}
