//! Sort keys and the default collation service.
//!
//! The engine only asks a [`Collator`] for keys; which text folding or number
//! parsing produces them is the collator's business. [`DefaultCollator`] is
//! locale-free: it decomposes, drops combining marks and case-folds.

use std::cmp::{Ordering, Reverse};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use gls_core::enums::{CollationRule, DateGranularity, LetterNumberRules, NumericFormat};
use gls_core::policy::SortPolicy;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// One run of a letter-number key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyPart {
    Number(u64),
    Text(String),
}

/// An orderable value derived from an entry.
#[derive(Debug, Clone)]
pub enum SortKey {
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
    Parts(Vec<KeyPart>),
    Count(Reverse<u32>),
    Rank(u64),
}

impl SortKey {
    const fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::DateTime(_) => 1,
            Self::Parts(_) => 2,
            Self::Text(_) => 3,
            Self::Count(_) => 4,
            Self::Rank(_) => 5,
        }
    }

    /// Key substituted when a value cannot be parsed for `policy`.
    #[must_use]
    pub fn fallback_for(policy: &SortPolicy) -> Self {
        match policy {
            SortPolicy::Numeric { .. } => Self::Number(0.0),
            SortPolicy::DateTime { .. } => Self::DateTime(NaiveDateTime::MIN),
            SortPolicy::LetterNumber { .. } => Self::Parts(Vec::new()),
            _ => Self::Text(String::new()),
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::DateTime(a), Self::DateTime(b)) => a.cmp(b),
            (Self::Parts(a), Self::Parts(b)) => a.cmp(b),
            (Self::Count(a), Self::Count(b)) => a.cmp(b),
            (Self::Rank(a), Self::Rank(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

/// Group label for keys that start with a digit.
pub const NUMBERS_GROUP: &str = "Numbers";
/// Group label for keys that start with neither a letter nor a digit.
pub const SYMBOLS_GROUP: &str = "Symbols";

fn group_of_char(first: Option<char>) -> String {
    match first {
        Some(c) if c.is_alphabetic() => c.to_uppercase().collect(),
        Some(c) if c.is_ascii_digit() => NUMBERS_GROUP.to_string(),
        _ => SYMBOLS_GROUP.to_string(),
    }
}

/// Turns field values into sort keys and group labels.
pub trait Collator {
    /// Key for `value` under a value-based policy; `None` if unparseable.
    fn sort_key(&self, value: &str, policy: &SortPolicy) -> Option<SortKey>;

    /// Group label for an already computed key.
    fn group_key(&self, key: &SortKey) -> String {
        match key {
            SortKey::Text(text) => group_of_char(text.chars().next()),
            SortKey::Parts(parts) => match parts.first() {
                Some(KeyPart::Number(_)) => NUMBERS_GROUP.to_string(),
                Some(KeyPart::Text(text)) => group_of_char(text.chars().next()),
                None => SYMBOLS_GROUP.to_string(),
            },
            SortKey::Number(_) => NUMBERS_GROUP.to_string(),
            SortKey::DateTime(moment) => moment.format("%Y").to_string(),
            SortKey::Count(Reverse(count)) => count.to_string(),
            SortKey::Rank(_) => String::new(),
        }
    }
}

/// Locale-free collator used unless another is injected.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCollator;

impl Collator for DefaultCollator {
    fn sort_key(&self, value: &str, policy: &SortPolicy) -> Option<SortKey> {
        match policy {
            SortPolicy::Collation {
                rule, numeric_pad, ..
            } => Some(SortKey::Text(fold_text(value, *rule, *numeric_pad))),
            SortPolicy::Numeric { format, .. } => parse_number(value, *format).map(SortKey::Number),
            SortPolicy::DateTime { granularity, .. } => {
                parse_moment(value, *granularity).map(SortKey::DateTime)
            }
            SortPolicy::LetterNumber { rule_set, .. } => {
                Some(SortKey::Parts(letter_number_parts(value, *rule_set)))
            }
            SortPolicy::None
            | SortPolicy::UseRecordOrder { .. }
            | SortPolicy::Random { .. }
            | SortPolicy::RecordCount => None,
        }
    }
}

/// Decompose, strip marks, keep letters and digits (and spaces for word
/// rules), fold case for `*NoCase` rules, then zero-pad digit runs.
#[must_use]
pub fn fold_text(value: &str, rule: CollationRule, numeric_pad: Option<usize>) -> String {
    let mut folded = String::with_capacity(value.len());
    for c in value.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_alphanumeric() {
            if rule.is_case_sensitive() {
                folded.push(c);
            } else {
                folded.extend(c.to_lowercase());
            }
        } else if c.is_whitespace() && rule.keeps_spaces() && !folded.ends_with(' ') {
            folded.push(' ');
        }
    }
    let folded = folded.trim().to_string();
    match numeric_pad {
        Some(width) if width > 0 => pad_digit_runs(&folded, width),
        _ => folded,
    }
}

fn pad_digit_runs(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut digits = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if !digits.is_empty() {
            out.push_str(&format!("{digits:0>width$}"));
            digits.clear();
        }
        out.push(c);
    }
    if !digits.is_empty() {
        out.push_str(&format!("{digits:0>width$}"));
    }
    out
}

#[allow(clippy::cast_precision_loss)]
fn parse_number(value: &str, format: NumericFormat) -> Option<f64> {
    let value = value.trim();
    let radix = |prefixes: &[&str], radix: u32| {
        let digits = prefixes
            .iter()
            .find_map(|prefix| value.strip_prefix(prefix))
            .unwrap_or(value);
        i64::from_str_radix(digits, radix).ok().map(|n| n as f64)
    };
    match format {
        NumericFormat::Integer => value.parse::<i64>().ok().map(|n| n as f64),
        NumericFormat::Decimal => value.parse::<f64>().ok().filter(|n| n.is_finite()),
        NumericFormat::Hex => radix(&["0x", "0X", "#"], 16),
        NumericFormat::Octal => radix(&["0o", "0O"], 8),
        NumericFormat::Binary => radix(&["0b", "0B"], 2),
        NumericFormat::Percent => value
            .strip_suffix('%')
            .unwrap_or(value)
            .trim()
            .parse::<f64>()
            .ok()
            .map(|n| n / 100.0),
    }
}

fn parse_moment(value: &str, granularity: DateGranularity) -> Option<NaiveDateTime> {
    let value = value.trim();
    match granularity {
        DateGranularity::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0)),
        DateGranularity::DateTime => DateTime::parse_from_rfc3339(value)
            .map(|moment| moment.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
            .ok(),
        DateGranularity::Time => {
            let time = NaiveTime::parse_from_str(value, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
                .ok()?;
            NaiveDate::from_ymd_opt(1970, 1, 1).map(|date| date.and_time(time))
        }
    }
}

fn letter_number_parts(value: &str, rules: LetterNumberRules) -> Vec<KeyPart> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut digits = String::new();
    let flush_digits = |digits: &mut String, parts: &mut Vec<KeyPart>| {
        if !digits.is_empty() {
            parts.push(KeyPart::Number(digits.parse().unwrap_or(u64::MAX)));
            digits.clear();
        }
    };
    let flush_text = |text: &mut String, parts: &mut Vec<KeyPart>| {
        if !text.is_empty() {
            parts.push(KeyPart::Text(std::mem::take(text)));
        }
    };
    for c in value.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_digit() {
            flush_text(&mut text, &mut parts);
            digits.push(c);
        } else if c.is_alphabetic() {
            flush_digits(&mut digits, &mut parts);
            match rules {
                LetterNumberRules::Case => text.push(c),
                LetterNumberRules::NoCase => text.extend(c.to_lowercase()),
            }
        }
    }
    flush_text(&mut text, &mut parts);
    flush_digits(&mut digits, &mut parts);
    parts
}

#[cfg(test)]
mod tests {
    use gls_core::policy::SuffixPolicy;
    use pretty_assertions::assert_eq;

    use super::*;

    fn collation(rule: CollationRule, numeric_pad: Option<usize>) -> SortPolicy {
        SortPolicy::Collation {
            locale: None,
            rule,
            field: None,
            numeric_pad,
            suffix: SuffixPolicy::None,
        }
    }

    #[test]
    fn letter_rules_drop_marks_and_punctuation() {
        assert_eq!(fold_text("Élan-vital", CollationRule::LetterNoCase, None), "elanvital");
        assert_eq!(fold_text("Élan vital", CollationRule::WordCase, None), "Elan vital");
    }

    #[test]
    fn numeric_pad_orders_digit_runs() {
        let policy = collation(CollationRule::LetterNoCase, Some(3));
        let two = DefaultCollator.sort_key("item2", &policy).unwrap();
        let ten = DefaultCollator.sort_key("item10", &policy).unwrap();
        assert!(two < ten);
    }

    #[test]
    fn numeric_formats_parse() {
        assert_eq!(parse_number("0x1f", NumericFormat::Hex), Some(31.0));
        assert_eq!(parse_number("0b101", NumericFormat::Binary), Some(5.0));
        assert_eq!(parse_number("50%", NumericFormat::Percent), Some(0.5));
        assert_eq!(parse_number("abc", NumericFormat::Decimal), None);
    }

    #[test]
    fn dates_parse_by_granularity() {
        assert!(parse_moment("2024-02-29", DateGranularity::Date).is_some());
        assert!(parse_moment("2024-02-29T10:00:00Z", DateGranularity::DateTime).is_some());
        assert!(parse_moment("10:30", DateGranularity::Time).is_some());
        assert!(parse_moment("yesterday", DateGranularity::Date).is_none());
    }

    #[test]
    fn letter_number_compares_digit_runs_numerically() {
        let a = letter_number_parts("file9", LetterNumberRules::NoCase);
        let b = letter_number_parts("File10", LetterNumberRules::NoCase);
        assert!(a < b);
    }

    #[test]
    fn group_keys_by_first_character() {
        let policy = collation(CollationRule::LetterNoCase, None);
        let key = |v: &str| DefaultCollator.sort_key(v, &policy).unwrap();
        assert_eq!(DefaultCollator.group_key(&key("apple")), "A");
        assert_eq!(DefaultCollator.group_key(&key("3d")), NUMBERS_GROUP);
        assert_eq!(DefaultCollator.group_key(&key("--")), SYMBOLS_GROUP);
        let date = DefaultCollator
            .sort_key(
                "1999-12-31",
                &SortPolicy::DateTime {
                    field: None,
                    granularity: DateGranularity::Date,
                },
            )
            .unwrap();
        assert_eq!(DefaultCollator.group_key(&date), "1999");
    }
}
