//! Entry Store: the arena of candidate entries keyed by label.

use gls_core::entities::{CompoundEntry, Entry};
use gls_core::errors::CoreError;
use gls_core::events::InputBatch;
use gls_core::labels::LabelPrefixes;
use indexmap::IndexMap;

/// Owns every candidate entry and compound, in definition order.
///
/// Lookups never fail loudly: an unresolved label is meaningful input to the
/// resolver, so every finder returns `Option`.
#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    entries: IndexMap<String, Entry>,
    compounds: IndexMap<String, CompoundEntry>,
    prefixes: LabelPrefixes,
    next_index: usize,
}

impl EntryStore {
    #[must_use]
    pub fn new(prefixes: LabelPrefixes) -> Self {
        Self {
            entries: IndexMap::new(),
            compounds: IndexMap::new(),
            prefixes,
            next_index: 0,
        }
    }

    /// Build a store from parsed input, checking variant symmetry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] on duplicate labels or broken variant pairs.
    pub fn from_batch(batch: InputBatch, prefixes: LabelPrefixes) -> Result<Self, CoreError> {
        let mut store = Self::new(prefixes);
        for entry in batch.entries {
            store.insert(entry)?;
        }
        for compound in batch.compounds {
            store.insert_compound(compound);
        }
        store.check_variant_links()?;
        Ok(store)
    }

    /// Add an entry, stamping it with the next definition index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateLabel`] if the label is already present.
    pub fn insert(&mut self, mut entry: Entry) -> Result<(), CoreError> {
        if self.entries.contains_key(&entry.label) {
            return Err(CoreError::DuplicateLabel { label: entry.label });
        }
        entry.definition_index = self.next_index;
        self.next_index += 1;
        self.entries.insert(entry.label.clone(), entry);
        Ok(())
    }

    pub fn insert_compound(&mut self, compound: CompoundEntry) {
        self.compounds.insert(compound.label.clone(), compound);
    }

    /// Verify that every variant link is reciprocated.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] naming the first broken pair.
    pub fn check_variant_links(&self) -> Result<(), CoreError> {
        for entry in self.entries.values() {
            let Some(target) = &entry.variant_link else {
                continue;
            };
            let other = self
                .entries
                .get(target)
                .ok_or_else(|| CoreError::MissingVariant {
                    label: entry.label.clone(),
                    target: target.clone(),
                })?;
            if other.variant_link.as_deref() != Some(entry.label.as_str()) {
                return Err(CoreError::AsymmetricVariant {
                    label: entry.label.clone(),
                    target: target.clone(),
                    actual: other.variant_link.clone().unwrap_or_default(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn find(&self, label: &str) -> Option<&Entry> {
        self.entries.get(label)
    }

    pub fn find_mut(&mut self, label: &str) -> Option<&mut Entry> {
        self.entries.get_mut(label)
    }

    /// Try `label`, then its flipped (variant-prefixed) form.
    #[must_use]
    pub fn find_with_variant_fallback(&self, label: &str) -> Option<&Entry> {
        self.entries
            .get(label)
            .or_else(|| self.entries.get(&self.prefixes.flip(label)))
    }

    /// The stored label that `label` resolves to, with variant fallback.
    #[must_use]
    pub fn resolve(&self, label: &str) -> Option<String> {
        self.find_with_variant_fallback(label)
            .map(|entry| entry.label.clone())
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    #[must_use]
    pub fn compound(&self, label: &str) -> Option<&CompoundEntry> {
        self.compounds.get(label)
    }

    /// Entries in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.entries.values_mut()
    }

    /// Labels in definition order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn prefixes(&self) -> &LabelPrefixes {
        &self.prefixes
    }

    /// Whether `label` is the variant half of a linked pair.
    #[must_use]
    pub fn is_variant(&self, label: &str) -> bool {
        self.entries
            .get(label)
            .is_some_and(|entry| entry.variant_link.is_some())
            && self.prefixes.is_variant_label(label)
    }

    /// Parent label of `label`, if the entry exists and has one.
    #[must_use]
    pub fn parent_of(&self, label: &str) -> Option<&str> {
        self.entries.get(label)?.parent.as_deref()
    }
}
