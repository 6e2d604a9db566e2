//! # gls-engine
//!
//! Selection, dependency closure, hierarchy and ordering engine for glossary
//! entries.
//!
//! Given a pool of candidate entries and the usage records observed in a
//! document, the engine decides which entries belong in the output, pulls in
//! everything they depend on, repairs and optionally flattens the parent
//! hierarchy, and produces a stably sorted, grouped sequence.
//!
//! Pipeline (see [`Engine::run`]):
//! - [`store::EntryStore`] and [`reference::ReferenceIndex`] hold the input
//! - [`selection::SelectionEngine`] seeds, expands via [`closure::ClosureResolver`] and truncates
//! - [`hierarchy`] validates parents, synthesizes missing ones and flattens lonely children
//! - [`sort::SortOrchestrator`] orders the set with a [`collation::Collator`]
//! - [`groups`] assigns group labels and merges small groups
//!
//! Warnings are logged with `tracing` and also collected as
//! [`diagnostics::Diagnostic`] values in the [`SelectionOutcome`].

pub mod closure;
pub mod collation;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod fixed_point;
pub mod groups;
pub mod hierarchy;
pub mod matcher;
pub mod reference;
pub mod selected;
pub mod selection;
pub mod sort;
pub mod store;

pub use collation::{Collator, DefaultCollator, SortKey};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use engine::{Engine, OutputEntry, SecondaryOrdering, SelectionOutcome};
pub use error::EngineError;
pub use groups::Group;
pub use store::EntryStore;
