//! Data model structs.
//!
//! Entries live in an arena keyed by label; every relationship (parent,
//! variant, cross-reference, dependency) is a label, never a pointer.

mod compound;
mod entry;
mod prior;
mod record;

pub use compound::CompoundEntry;
pub use entry::{CrossRefs, Entry};
pub use prior::PriorSelection;
pub use record::UsageRecord;
