//! Condition parsing and per-record evaluation.

use super::{FilterError, FilterResult};
use crate::model::record::{Record, RecordAttribute};
use crate::model::value::FieldValue;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static CONDITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s*(!?[=<>:])(.*)$").expect("valid condition regex"));

const NONE_LITERAL: &str = "none";

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`: case-insensitive equality.
    Equal,
    /// `<`: integer comparison.
    LessThan,
    /// `>`: integer comparison.
    GreaterThan,
    /// `:`: case-insensitive containment of the filter value.
    Contains,
}

impl Operator {
    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '=' => Some(Self::Equal),
            '<' => Some(Self::LessThan),
            '>' => Some(Self::GreaterThan),
            ':' => Some(Self::Contains),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Equal => '=',
            Self::LessThan => '<',
            Self::GreaterThan => '>',
            Self::Contains => ':',
        }
    }

    fn is_ordering(self) -> bool {
        matches!(self, Self::LessThan | Self::GreaterThan)
    }
}

/// Record attribute a condition can inspect, including derived ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAttribute {
    Stored(RecordAttribute),
    /// Days until the due date.
    DaysLeft,
}

impl FilterAttribute {
    /// Resolves a filter key or abbreviation, ignoring case.
    pub fn resolve(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "days" | "daysleft" | "days_left" => Some(Self::DaysLeft),
            other => RecordAttribute::resolve(other).map(Self::Stored),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Stored(attribute) => attribute.name(),
            Self::DaysLeft => "days_left",
        }
    }

    fn value_of(self, record: &Record, today: NaiveDate) -> FieldValue {
        match self {
            Self::Stored(attribute) => record.value_of(attribute),
            Self::DaysLeft => record.days_remaining_from(today).into(),
        }
    }
}

/// One parsed `<attribute><operator><value>` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub attribute: FilterAttribute,
    pub operator: Operator,
    pub negate: bool,
    /// Raw text after the operator.
    pub value: String,
    // Parsed filter value for `<`/`>`.
    threshold: Option<i64>,
}

impl Condition {
    /// Parses condition text.
    ///
    /// A `!` may prefix the operator (`s!:art`) or the attribute (`!s:art`).
    ///
    /// # Errors
    /// - `InvalidCondition` when the text has no operator.
    /// - `UnknownAttribute` when the attribute key is not recognised.
    /// - `DateComparison` for `<`/`>` on the due date.
    /// - `InvalidValue` for `<`/`>` with a non-integer value.
    pub fn parse(text: &str) -> FilterResult<Self> {
        let Some(captures) = CONDITION_RE.captures(text) else {
            return Err(FilterError::InvalidCondition(text.to_string()));
        };

        let mut raw_attribute = captures[1].trim();
        let raw_operator = &captures[2];
        let value = captures[3].to_string();

        let mut negate = raw_operator.starts_with('!');
        if let Some(stripped) = raw_attribute.strip_prefix('!') {
            raw_attribute = stripped.trim_start();
            negate = !negate;
        }

        let operator = raw_operator
            .chars()
            .last()
            .and_then(Operator::from_symbol)
            .ok_or_else(|| FilterError::InvalidCondition(text.to_string()))?;
        let attribute = FilterAttribute::resolve(raw_attribute)
            .ok_or_else(|| FilterError::UnknownAttribute(raw_attribute.to_string()))?;

        let threshold = if operator.is_ordering() {
            if attribute == FilterAttribute::Stored(RecordAttribute::DueDate) {
                return Err(FilterError::DateComparison);
            }
            Some(parse_integer(&value).ok_or_else(|| FilterError::InvalidValue(value.clone()))?)
        } else {
            None
        };

        Ok(Self {
            attribute,
            operator,
            negate,
            value,
            threshold,
        })
    }

    /// Human-readable form used in the applied-condition trail.
    pub fn describe(&self) -> String {
        let negation = if self.negate { "!" } else { "" };
        format!(
            "{} {}{} {}",
            self.attribute.name(),
            negation,
            self.operator.symbol(),
            self.value
        )
    }

    /// Decides whether `record` is selected.
    ///
    /// Records whose attribute is null are excluded unless the filter value
    /// is `none`; negation does not bring them back.
    pub fn matches(&self, record: &Record, today: NaiveDate) -> FilterResult<bool> {
        let record_value = self.attribute.value_of(record, today);
        if record_value.is_null() && !self.value.eq_ignore_ascii_case(NONE_LITERAL) {
            return Ok(false);
        }

        let matched = self.compare(&record_value)?;
        Ok(if self.negate { !matched } else { matched })
    }

    fn compare(&self, record_value: &FieldValue) -> FilterResult<bool> {
        match self.operator {
            Operator::Equal => Ok(record_value.to_match_string() == self.value.to_lowercase()),
            Operator::Contains => Ok(record_value
                .to_match_string()
                .contains(&self.value.to_lowercase())),
            Operator::LessThan | Operator::GreaterThan => {
                let left = coerce_integer(record_value)?;
                let right = self
                    .threshold
                    .ok_or_else(|| FilterError::InvalidValue(self.value.clone()))?;
                Ok(if self.operator == Operator::LessThan {
                    left < right
                } else {
                    left > right
                })
            }
        }
    }
}

/// Returns whether `text` has the condition shape, without resolving it.
pub fn is_valid_condition(text: &str) -> bool {
    CONDITION_RE.is_match(text)
}

fn coerce_integer(value: &FieldValue) -> FilterResult<i64> {
    match value {
        FieldValue::Int(number) => Ok(*number),
        FieldValue::Bool(flag) => Ok(i64::from(*flag)),
        FieldValue::Text(text) => {
            parse_integer(text).ok_or_else(|| FilterError::InvalidValue(text.clone()))
        }
        FieldValue::Date(_) => Err(FilterError::DateComparison),
        FieldValue::Null => Err(FilterError::InvalidValue(value.to_string())),
    }
}

fn parse_integer(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::{is_valid_condition, Condition, FilterAttribute, Operator};
    use crate::filter::FilterError;
    use crate::model::record::RecordAttribute;

    #[test]
    fn splits_on_first_operator_and_keeps_raw_value() {
        let condition = Condition::parse("description: due = soon").unwrap();
        assert_eq!(
            condition.attribute,
            FilterAttribute::Stored(RecordAttribute::Description)
        );
        assert_eq!(condition.operator, Operator::Contains);
        assert_eq!(condition.value, " due = soon");
        assert!(!condition.negate);
    }

    #[test]
    fn negation_prefix_is_accepted_on_operator_or_attribute() {
        let on_operator = Condition::parse("s!:art").unwrap();
        let on_attribute = Condition::parse("!s:art").unwrap();
        assert!(on_operator.negate);
        assert!(on_attribute.negate);
        assert_eq!(on_operator.describe(), "subject !: art");
    }

    #[test]
    fn abbreviations_resolve_case_insensitively() {
        assert_eq!(
            Condition::parse("DAYS>2").unwrap().attribute,
            FilterAttribute::DaysLeft
        );
        assert_eq!(
            Condition::parse("due=none").unwrap().attribute,
            FilterAttribute::Stored(RecordAttribute::DueDate)
        );
    }

    #[test]
    fn rejects_text_without_operator() {
        assert!(!is_valid_condition("subject maths"));
        assert!(matches!(
            Condition::parse("subject maths"),
            Err(FilterError::InvalidCondition(_))
        ));
    }

    #[test]
    fn ordering_on_due_date_or_non_numbers_is_rejected() {
        assert_eq!(
            Condition::parse("due<3").unwrap_err(),
            FilterError::DateComparison
        );
        assert!(matches!(
            Condition::parse("days>soon"),
            Err(FilterError::InvalidValue(_))
        ));
    }
}
