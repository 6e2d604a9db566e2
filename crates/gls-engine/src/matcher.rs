//! Compiled field patterns, match policies and conditions.
//!
//! Patterns are anchored at both ends and compiled once before a run, so a
//! bad expression fails fast with [`EngineError::InvalidPattern`].

use std::borrow::Cow;

use gls_core::entities::Entry;
use gls_core::enums::{MatchAction, MatchOp};
use gls_core::policy::{Condition, FieldPattern, FieldPatterns, MatchPolicy};
use regex::Regex;

use crate::error::EngineError;

/// Value of a field or pseudo-field; an absent field reads as `""`.
#[must_use]
pub fn field_value<'a>(entry: &'a Entry, field: &str) -> Cow<'a, str> {
    match field {
        "label" => Cow::Borrowed(&entry.label),
        "original_label" => Cow::Borrowed(&entry.original_label),
        "entry_type" => Cow::Borrowed(&entry.entry_type),
        "parent" => Cow::Borrowed(entry.parent.as_deref().unwrap_or_default()),
        "see" => Cow::Owned(entry.cross_refs.see.join(",")),
        "see_also" => Cow::Owned(entry.cross_refs.see_also.join(",")),
        "alias" => Cow::Borrowed(entry.cross_refs.alias.as_deref().unwrap_or_default()),
        other => Cow::Borrowed(entry.field(other).unwrap_or_default()),
    }
}

fn compile_anchored(field: &str, pattern: &str) -> Result<Regex, EngineError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| EngineError::InvalidPattern {
        field: field.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    field: String,
    regex: Regex,
}

/// A set of anchored field patterns combined with AND or OR.
#[derive(Debug, Clone, Default)]
pub struct FieldMatcher {
    op: MatchOp,
    patterns: Vec<CompiledPattern>,
}

impl FieldMatcher {
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPattern`] for the first bad expression.
    pub fn compile(op: MatchOp, patterns: &[FieldPattern]) -> Result<Self, EngineError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Ok(CompiledPattern {
                    field: p.field.clone(),
                    regex: compile_anchored(&p.field, &p.pattern)?,
                })
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        Ok(Self { op, patterns })
    }

    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPattern`] for the first bad expression.
    pub fn from_patterns(patterns: &FieldPatterns) -> Result<Self, EngineError> {
        Self::compile(patterns.op, &patterns.patterns)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `entry` satisfies the combined patterns. An empty matcher
    /// matches nothing.
    #[must_use]
    pub fn matches(&self, entry: &Entry) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let hit = |p: &CompiledPattern| p.regex.is_match(&field_value(entry, &p.field));
        match self.op {
            MatchOp::And => self.patterns.iter().all(hit),
            MatchOp::Or => self.patterns.iter().any(hit),
        }
    }
}

/// A compiled [`MatchPolicy`].
#[derive(Debug, Clone, Default)]
pub struct EntryMatcher {
    action: MatchAction,
    negate: bool,
    fields: FieldMatcher,
}

impl EntryMatcher {
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPattern`] for the first bad expression.
    pub fn compile(policy: &MatchPolicy) -> Result<Self, EngineError> {
        Ok(Self {
            action: policy.action,
            negate: policy.negate,
            fields: FieldMatcher::compile(policy.op, &policy.patterns)?,
        })
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Inactive filters accept everything; inactive add-matchers accept nothing.
    #[must_use]
    pub fn matches(&self, entry: &Entry) -> bool {
        if !self.is_active() {
            return matches!(self.action, MatchAction::Filter);
        }
        self.fields.matches(entry) != self.negate
    }

    /// Active filter that rejects `entry`.
    #[must_use]
    pub fn filters_out(&self, entry: &Entry) -> bool {
        self.is_active() && self.action == MatchAction::Filter && !self.matches(entry)
    }

    #[must_use]
    pub fn is_additive(&self) -> bool {
        self.is_active() && self.action == MatchAction::Add
    }
}

/// A compiled [`Condition`].
#[derive(Debug, Clone)]
pub enum CompiledCondition {
    Always,
    HasRecords,
    HasCrossRefs,
    FieldDefined(String),
    FieldEquals(String, String),
    FieldMatches(String, Regex),
    Not(Box<CompiledCondition>),
    All(Vec<CompiledCondition>),
    Any(Vec<CompiledCondition>),
}

impl CompiledCondition {
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPattern`] for a bad `field_matches` pattern.
    pub fn compile(condition: &Condition) -> Result<Self, EngineError> {
        Ok(match condition {
            Condition::Always => Self::Always,
            Condition::HasRecords => Self::HasRecords,
            Condition::HasCrossRefs => Self::HasCrossRefs,
            Condition::FieldDefined { field } => Self::FieldDefined(field.clone()),
            Condition::FieldEquals { field, value } => {
                Self::FieldEquals(field.clone(), value.clone())
            }
            Condition::FieldMatches { field, pattern } => {
                Self::FieldMatches(field.clone(), compile_anchored(field, pattern)?)
            }
            Condition::Not { condition } => Self::Not(Box::new(Self::compile(condition)?)),
            Condition::All { conditions } => Self::All(Self::compile_all(conditions)?),
            Condition::Any { conditions } => Self::Any(Self::compile_all(conditions)?),
        })
    }

    fn compile_all(conditions: &[Condition]) -> Result<Vec<Self>, EngineError> {
        conditions.iter().map(Self::compile).collect()
    }

    #[must_use]
    pub fn evaluate(&self, entry: &Entry) -> bool {
        match self {
            Self::Always => true,
            Self::HasRecords => entry.has_usage_records(),
            Self::HasCrossRefs => !entry.cross_refs.is_empty(),
            Self::FieldDefined(field) => !field_value(entry, field).is_empty(),
            Self::FieldEquals(field, value) => field_value(entry, field) == value.as_str(),
            Self::FieldMatches(field, regex) => regex.is_match(&field_value(entry, field)),
            Self::Not(inner) => !inner.evaluate(entry),
            Self::All(all) => all.iter().all(|c| c.evaluate(entry)),
            Self::Any(any) => any.iter().any(|c| c.evaluate(entry)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_are_anchored() {
        let matcher =
            FieldMatcher::compile(MatchOp::And, &[FieldPattern::new("category", "abbr")]).unwrap();
        assert!(matcher.matches(&Entry::new("a").with_field("category", "abbr")));
        assert!(!matcher.matches(&Entry::new("b").with_field("category", "abbreviation")));
    }

    #[test]
    fn absent_field_reads_as_empty() {
        let matcher = FieldMatcher::from_patterns(&gls_core::policy::PrunePolicy::default_patterns())
            .unwrap();
        assert!(matcher.matches(&Entry::new("dead-end")));
        assert!(!matcher.matches(&Entry::new("onward").with_see(&["x"])));
    }

    #[test]
    fn or_matches_any_pattern() {
        let matcher = FieldMatcher::compile(
            MatchOp::Or,
            &[
                FieldPattern::new("label", "x.*"),
                FieldPattern::new("parent", "root"),
            ],
        )
        .unwrap();
        assert!(matcher.matches(&Entry::new("xylophone")));
        assert!(matcher.matches(&Entry::new("drum").with_parent("root")));
        assert!(!matcher.matches(&Entry::new("drum")));
    }

    #[test]
    fn inactive_policy_depends_on_action() {
        let filter = EntryMatcher::compile(&MatchPolicy::default()).unwrap();
        assert!(filter.matches(&Entry::new("a")));
        assert!(!filter.filters_out(&Entry::new("a")));

        let add = EntryMatcher::compile(&MatchPolicy::add(Vec::new())).unwrap();
        assert!(!add.matches(&Entry::new("a")));
        assert!(!add.is_additive());
    }

    #[test]
    fn negate_inverts_result() {
        let policy = MatchPolicy {
            negate: true,
            ..MatchPolicy::filter(vec![FieldPattern::new("entry_type", "index")])
        };
        let matcher = EntryMatcher::compile(&policy).unwrap();
        assert!(matcher.filters_out(&Entry::new("a")));
        let mut plain = Entry::new("b");
        plain.entry_type = "symbol".into();
        assert!(matcher.matches(&plain));
    }

    #[test]
    fn invalid_pattern_names_field() {
        let error =
            FieldMatcher::compile(MatchOp::And, &[FieldPattern::new("name", "(unclosed")])
                .unwrap_err();
        assert!(matches!(error, EngineError::InvalidPattern { ref field, .. } if field == "name"));
    }

    #[test]
    fn conditions_nest() {
        let condition = CompiledCondition::compile(&Condition::All {
            conditions: vec![
                Condition::FieldMatches {
                    field: "name".into(),
                    pattern: "[A-Z].*".into(),
                },
                Condition::Not {
                    condition: Box::new(Condition::HasCrossRefs),
                },
            ],
        })
        .unwrap();
        assert!(condition.evaluate(&Entry::new("a").with_field("name", "Alpha")));
        assert!(!condition.evaluate(&Entry::new("b").with_field("name", "beta")));
        assert!(
            !condition.evaluate(&Entry::new("c").with_field("name", "Gamma").with_see(&["a"]))
        );
    }
}
