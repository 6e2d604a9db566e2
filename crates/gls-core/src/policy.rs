//! Typed policy values that parametrize selection, closure, hierarchy and sorting.
//!
//! These are plain data: patterns are kept as strings here and compiled by the
//! engine before a run starts, so an invalid pattern fails the run up front.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{
    CollationRule, DateGranularity, FlattenRule, FlattenTiming, LetterNumberRules, MatchAction,
    MatchOp, NumericFormat,
};

/// Upper bound on prune iterations regardless of configuration.
pub const MAX_PRUNE_ITERATIONS: u32 = 20;

const fn default_prune_iterations() -> u32 {
    1
}

fn default_fallback_field() -> String {
    "name".to_string()
}

// ---------------------------------------------------------------------------
// Field patterns and match policies
// ---------------------------------------------------------------------------

/// A regular expression applied to one field (or pseudo-field) of an entry.
///
/// The pattern is anchored at both ends when compiled. Pseudo-fields `label`,
/// `original_label`, `parent`, `entry_type`, `see`, `see_also` and `alias` are
/// resolved from the entry structure rather than its field map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldPattern {
    pub field: String,
    pub pattern: String,
}

impl FieldPattern {
    pub fn new(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            pattern: pattern.into(),
        }
    }
}

/// Field-pattern filter used by the selection engine.
///
/// An empty pattern list matches nothing for `Add` and everything for `Filter`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MatchPolicy {
    #[serde(default)]
    pub action: MatchAction,
    #[serde(default)]
    pub op: MatchOp,
    /// Invert the combined result.
    #[serde(default)]
    pub negate: bool,
    #[serde(default)]
    pub patterns: Vec<FieldPattern>,
}

impl MatchPolicy {
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.patterns.is_empty()
    }

    #[must_use]
    pub fn filter(patterns: Vec<FieldPattern>) -> Self {
        Self {
            action: MatchAction::Filter,
            patterns,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn add(patterns: Vec<FieldPattern>) -> Self {
        Self {
            action: MatchAction::Add,
            patterns,
            ..Self::default()
        }
    }
}

/// A bare set of patterns with a combining operator (no action).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldPatterns {
    #[serde(default)]
    pub op: MatchOp,
    #[serde(default)]
    pub patterns: Vec<FieldPattern>,
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// Boolean expression over a single entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    Always,
    HasRecords,
    HasCrossRefs,
    FieldDefined { field: String },
    FieldEquals { field: String, value: String },
    FieldMatches { field: String, pattern: String },
    Not { condition: Box<Condition> },
    All { conditions: Vec<Condition> },
    Any { conditions: Vec<Condition> },
}

// ---------------------------------------------------------------------------
// Hierarchy policies
// ---------------------------------------------------------------------------

/// Category given to a synthesized parent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MissingParentCategory {
    #[default]
    SameAsChild,
    SameAsBase,
    NoValue,
    Fixed(String),
}

/// What to do when an entry's parent label resolves to nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MissingParentPolicy {
    /// Leave the parent dangling and report it.
    #[default]
    Warn,
    /// Clear the dangling parent label.
    Strip,
    /// Fabricate a minimal parent entry.
    Create {
        #[serde(default)]
        category: MissingParentCategory,
    },
}

/// Lonely-child flattening configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FlattenPolicy {
    #[serde(default)]
    pub timing: FlattenTiming,
    #[serde(default)]
    pub rule: FlattenRule,
    /// Evaluated on the parent; flattening only happens when it holds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

// ---------------------------------------------------------------------------
// Prune policy
// ---------------------------------------------------------------------------

/// Dead-end cross-reference pruning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PrunePolicy {
    #[serde(default)]
    pub enabled: bool,
    /// Discard patterns for `see` targets.
    #[serde(default = "PrunePolicy::default_patterns")]
    pub see_match: FieldPatterns,
    /// Discard patterns for `see_also` targets.
    #[serde(default = "PrunePolicy::default_patterns")]
    pub see_also_match: FieldPatterns,
    #[serde(default = "default_prune_iterations")]
    pub iterations: u32,
}

impl PrunePolicy {
    /// Targets that have no onward cross-references of their own.
    #[must_use]
    pub fn default_patterns() -> FieldPatterns {
        FieldPatterns {
            op: MatchOp::And,
            patterns: vec![FieldPattern::new("see", ""), FieldPattern::new("see_also", "")],
        }
    }

    /// Iteration count clamped to [`MAX_PRUNE_ITERATIONS`].
    #[must_use]
    pub fn effective_iterations(&self) -> u32 {
        self.iterations.clamp(1, MAX_PRUNE_ITERATIONS)
    }
}

impl Default for PrunePolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            see_match: Self::default_patterns(),
            see_also_match: Self::default_patterns(),
            iterations: default_prune_iterations(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sort policies
// ---------------------------------------------------------------------------

/// How identical sort keys are ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep pre-sort order.
    None,
    #[default]
    Id,
    OriginalId,
    Field(String),
}

/// Suffix appended to identical collation keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SuffixPolicy {
    #[default]
    None,
    /// Number repeated keys in pre-sort order.
    NonUnique,
    /// Append the value of this field.
    Field(String),
}

/// One total-ordering strategy. Exactly one is active per sort pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SortPolicy {
    /// Keep the selection order.
    None,
    /// Keep record order, optionally reversed.
    UseRecordOrder {
        #[serde(default)]
        reverse: bool,
    },
    /// Shuffle; a missing or zero seed draws a fresh one.
    Random {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<u64>,
    },
    Collation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locale: Option<String>,
        #[serde(default)]
        rule: CollationRule,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        numeric_pad: Option<usize>,
        #[serde(default)]
        suffix: SuffixPolicy,
    },
    Numeric {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        #[serde(default)]
        format: NumericFormat,
    },
    DateTime {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        #[serde(default)]
        granularity: DateGranularity,
    },
    LetterNumber {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        #[serde(default)]
        rule_set: LetterNumberRules,
    },
    RecordCount,
}

impl SortPolicy {
    /// Locale-free letter collation on the default sort field.
    #[must_use]
    pub const fn collation() -> Self {
        Self::Collation {
            locale: None,
            rule: CollationRule::LetterNoCase,
            field: None,
            numeric_pad: None,
            suffix: SuffixPolicy::None,
        }
    }

    /// Policies that never reorder by comparison.
    #[must_use]
    pub const fn is_order_preserving(&self) -> bool {
        matches!(self, Self::None | Self::UseRecordOrder { .. })
    }

    /// The field the policy reads its sort value from, if it names one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Collation { field, .. }
            | Self::Numeric { field, .. }
            | Self::DateTime { field, .. }
            | Self::LetterNumber { field, .. } => field.as_deref(),
            Self::None | Self::UseRecordOrder { .. } | Self::Random { .. } | Self::RecordCount => {
                None
            }
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::UseRecordOrder { .. } => "use_record_order",
            Self::Random { .. } => "random",
            Self::Collation { .. } => "collation",
            Self::Numeric { .. } => "numeric",
            Self::DateTime { .. } => "date_time",
            Self::LetterNumber { .. } => "letter_number",
            Self::RecordCount => "record_count",
        }
    }
}

impl Default for SortPolicy {
    fn default() -> Self {
        Self::collation()
    }
}

/// A single sort pass: the policy plus tie-breaking and field fallback.
///
/// The sort itself is stable, but `tie_break` defaults to [`TieBreak::Id`],
/// so entries with identical keys are ordered by label. Set it to
/// [`TieBreak::None`] to keep their pre-sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SortPass {
    #[serde(default)]
    pub policy: SortPolicy,
    /// Reverse comparison order (parents still precede their children).
    #[serde(default)]
    pub reverse: bool,
    #[serde(default)]
    pub tie_break: TieBreak,
    /// Field used when the policy's field is absent from an entry.
    #[serde(default = "default_fallback_field")]
    pub fallback_field: String,
}

impl SortPass {
    #[must_use]
    pub fn new(policy: SortPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    #[must_use]
    pub const fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }
}

impl Default for SortPass {
    fn default() -> Self {
        Self {
            policy: SortPolicy::default(),
            reverse: false,
            tie_break: TieBreak::default(),
            fallback_field: default_fallback_field(),
        }
    }
}

/// Auxiliary ordering of a filtered subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SecondarySort {
    pub pass: SortPass,
    #[serde(default)]
    pub match_policy: MatchPolicy,
    pub list_name: String,
}
