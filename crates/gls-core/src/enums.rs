//! Closed enums for selection modes, cross-reference kinds, match policies,
//! flattening and sort rules.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! so they read naturally in TOML configuration and environment overrides.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// SelectionMode
// ---------------------------------------------------------------------------

/// Which entries a resource selects from the candidate pool.
///
/// ```text
/// recorded_and_deps                 seeds + parents + deps + forward cross-refs
/// recorded_and_deps_and_see         ... + entries that cross-reference a selected entry
/// recorded_and_deps_and_see_not_also ... same, ignoring see-also back-references
/// recorded_no_deps                  seeds only
/// recorded_and_ancestors            seeds + ancestors
/// all                               every candidate, definition order
/// deps_but_not_recorded             recorded_and_deps minus entries with records
/// ancestors_but_not_recorded        recorded_and_ancestors minus entries with records
/// selected_before                   entries selected by a prior resource
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    #[default]
    RecordedAndDeps,
    RecordedAndDepsAndSee,
    RecordedAndDepsAndSeeNotAlso,
    RecordedNoDeps,
    RecordedAndAncestors,
    All,
    DepsButNotRecorded,
    AncestorsButNotRecorded,
    SelectedBefore,
}

impl SelectionMode {
    /// Whether dependency, cross-reference, compound and variant edges are followed.
    #[must_use]
    pub const fn follows_dependencies(self) -> bool {
        matches!(
            self,
            Self::RecordedAndDeps
                | Self::RecordedAndDepsAndSee
                | Self::RecordedAndDepsAndSeeNotAlso
                | Self::DepsButNotRecorded
        )
    }

    /// Whether parent edges are followed.
    #[must_use]
    pub const fn follows_ancestors(self) -> bool {
        self.follows_dependencies()
            || matches!(self, Self::RecordedAndAncestors | Self::AncestorsButNotRecorded)
    }

    /// Cross-reference kinds whose *referrers* are pulled in once the target is selected.
    #[must_use]
    pub const fn reverse_cross_refs(self) -> &'static [CrossRefKind] {
        match self {
            Self::RecordedAndDepsAndSee => {
                &[CrossRefKind::See, CrossRefKind::SeeAlso, CrossRefKind::Alias]
            }
            Self::RecordedAndDepsAndSeeNotAlso => &[CrossRefKind::See, CrossRefKind::Alias],
            _ => &[],
        }
    }

    /// Modes that drop entries with their own usage records after expansion.
    #[must_use]
    pub const fn excludes_recorded(self) -> bool {
        matches!(
            self,
            Self::DepsButNotRecorded | Self::AncestorsButNotRecorded
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RecordedAndDeps => "recorded_and_deps",
            Self::RecordedAndDepsAndSee => "recorded_and_deps_and_see",
            Self::RecordedAndDepsAndSeeNotAlso => "recorded_and_deps_and_see_not_also",
            Self::RecordedNoDeps => "recorded_no_deps",
            Self::RecordedAndAncestors => "recorded_and_ancestors",
            Self::All => "all",
            Self::DepsButNotRecorded => "deps_but_not_recorded",
            Self::AncestorsButNotRecorded => "ancestors_but_not_recorded",
            Self::SelectedBefore => "selected_before",
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CrossRefKind / EdgeKind
// ---------------------------------------------------------------------------

/// The three cross-reference lists an entry may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CrossRefKind {
    See,
    SeeAlso,
    Alias,
}

impl CrossRefKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::See => "see",
            Self::SeeAlso => "see_also",
            Self::Alias => "alias",
        }
    }
}

impl fmt::Display for CrossRefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every kind of edge the dependency closure follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Parent,
    Dependency,
    CrossRef(CrossRefKind),
    CompoundElement,
    Variant,
}

impl EdgeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Dependency => "dependency",
            Self::CrossRef(kind) => kind.as_str(),
            Self::CompoundElement => "compound_element",
            Self::Variant => "variant",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Match policy
// ---------------------------------------------------------------------------

/// What a match policy does with matching entries.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MatchAction {
    /// Only matching entries are candidates for seeding.
    #[default]
    Filter,
    /// Matching entries are seeded in addition to recorded ones.
    Add,
}

/// How multiple field patterns combine.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MatchOp {
    #[default]
    And,
    Or,
}

// ---------------------------------------------------------------------------
// Flattening
// ---------------------------------------------------------------------------

/// When lonely-child flattening runs relative to sorting.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FlattenTiming {
    #[default]
    Disabled,
    PreSort,
    PostSort,
}

impl FlattenTiming {
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Which lonely children are flattened and which parents are discarded.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FlattenRule {
    /// Flatten only under parents without records or cross-references; discard them.
    #[default]
    OnlyUnrecordedParents,
    /// Flatten every lonely child; never discard the parent.
    NoDiscard,
    /// Flatten every lonely child; discard parents without records or cross-references.
    DiscardUnrecorded,
}

// ---------------------------------------------------------------------------
// Sort rules
// ---------------------------------------------------------------------------

/// Textual comparison rule handed to the collation service.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CollationRule {
    /// Letters and digits only, case-sensitive.
    LetterCase,
    /// Letters and digits only, case-insensitive.
    #[default]
    LetterNoCase,
    /// Whole words (spaces significant), case-sensitive.
    WordCase,
    /// Whole words (spaces significant), case-insensitive.
    WordNoCase,
}

impl CollationRule {
    #[must_use]
    pub const fn is_case_sensitive(self) -> bool {
        matches!(self, Self::LetterCase | Self::WordCase)
    }

    #[must_use]
    pub const fn keeps_spaces(self) -> bool {
        matches!(self, Self::WordCase | Self::WordNoCase)
    }
}

/// Numeric notation of a sort field.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum NumericFormat {
    Integer,
    #[default]
    Decimal,
    Hex,
    Octal,
    Binary,
    Percent,
}

/// Which part of a date/time value participates in the comparison.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DateGranularity {
    #[default]
    Date,
    DateTime,
    Time,
}

/// Letter-number comparison rules.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum LetterNumberRules {
    Case,
    #[default]
    NoCase,
}
