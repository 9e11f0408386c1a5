//! Single-condition evaluation.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::rules::field::{Field, FieldCategory, FieldValue};
use crate::rules::types::EmailRecord;

/// Comparison a condition applies to its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Contains,
    DoesNotContain,
    Equals,
    DoesNotEqual,
    /// `less_than` in rule files: received more than N days ago.
    OlderThanDays,
    /// `greater_than` in rule files: received less than N days ago.
    NewerThanDays,
}

impl Predicate {
    /// Parse the rule-file spelling of a predicate.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "contains" => Some(Self::Contains),
            "does_not_contain" => Some(Self::DoesNotContain),
            "equals" => Some(Self::Equals),
            "does_not_equal" => Some(Self::DoesNotEqual),
            "less_than" => Some(Self::OlderThanDays),
            "greater_than" => Some(Self::NewerThanDays),
            _ => None,
        }
    }

    /// Rule-file spelling.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::DoesNotContain => "does_not_contain",
            Self::Equals => "equals",
            Self::DoesNotEqual => "does_not_equal",
            Self::OlderThanDays => "less_than",
            Self::NewerThanDays => "greater_than",
        }
    }

    /// The only field category this predicate may be applied to.
    pub fn category(&self) -> FieldCategory {
        match self {
            Self::Contains | Self::DoesNotContain | Self::Equals | Self::DoesNotEqual => {
                FieldCategory::Text
            }
            Self::OlderThanDays | Self::NewerThanDays => FieldCategory::Timestamp,
        }
    }
}

/// Why a condition could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    #[error("predicate '{}' cannot be used on field '{}'", .predicate.name(), .field.name())]
    Mismatch { field: Field, predicate: Predicate },

    #[error("'{0}' is not a non-negative day count")]
    InvalidDayCount(String),
}

/// One field/predicate/value test.
///
/// Only constructible through [`Condition::new`], which guarantees the
/// predicate fits the field and that day counts parse, so evaluation
/// is total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    field: Field,
    predicate: Predicate,
    value: String,
    days: u32,
}

impl Condition {
    pub fn new(
        field: Field,
        predicate: Predicate,
        value: impl Into<String>,
    ) -> Result<Self, ConditionError> {
        let value = value.into();
        if field.category() != predicate.category() {
            return Err(ConditionError::Mismatch { field, predicate });
        }
        let days = match predicate.category() {
            FieldCategory::Timestamp => parse_day_count(&value)
                .ok_or_else(|| ConditionError::InvalidDayCount(value.clone()))?,
            FieldCategory::Text => 0,
        };
        Ok(Self {
            field,
            predicate,
            value,
            days,
        })
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn predicate(&self) -> Predicate {
        self.predicate
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Evaluate against one record at the run's fixed instant `now`.
    pub fn evaluate(&self, record: &EmailRecord, now: DateTime<Utc>) -> bool {
        match (self.field.extract(record), self.predicate) {
            (FieldValue::Text(s), Predicate::Contains) => s.contains(self.value.as_str()),
            (FieldValue::Text(s), Predicate::DoesNotContain) => !s.contains(self.value.as_str()),
            (FieldValue::Text(s), Predicate::Equals) => s == self.value,
            (FieldValue::Text(s), Predicate::DoesNotEqual) => s != self.value,
            // A cutoff below the representable range is older than every record.
            (FieldValue::Timestamp(t), Predicate::OlderThanDays) => {
                self.cutoff(now).is_some_and(|cutoff| t < cutoff)
            }
            (FieldValue::Timestamp(t), Predicate::NewerThanDays) => {
                self.cutoff(now).is_none_or(|cutoff| t > cutoff)
            }
            // Ruled out by `new`.
            _ => false,
        }
    }

    fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        TimeDelta::try_days(i64::from(self.days)).and_then(|d| now.checked_sub_signed(d))
    }
}

fn parse_day_count(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}
