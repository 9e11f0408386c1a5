//! Structural validation of a raw rule file.
//!
//! Runs once per batch, before any record is evaluated. The first problem
//! found wins; rules are checked in file order, and within a rule the
//! combinator, then each condition, then each action. Validation never
//! talks to the mail provider.

use serde_json::Value;
use tracing::debug;

use crate::error::{ValidationError, ValidationReason};
use crate::rules::condition::{Condition, ConditionError, Predicate};
use crate::rules::field::{Field, FieldCategory};
use crate::rules::matcher::{Rule, RuleSet};
use crate::rules::types::{
    Action, Combinator, MARK_AS_READ, MARK_AS_UNREAD, MOVE_MESSAGE, RawCondition, RawRule,
    RawRuleSet,
};

/// Turns a [`RawRuleSet`] into a [`RuleSet`] or the first [`ValidationError`].
pub struct RuleSetValidator;

impl RuleSetValidator {
    /// Validate every rule. An empty rule set is valid.
    pub fn validate(raw: &RawRuleSet) -> Result<RuleSet, ValidationError> {
        let rules = raw
            .rules
            .iter()
            .enumerate()
            .map(|(rule_index, rule)| {
                validate_rule(rule).map_err(|reason| ValidationError { rule_index, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(rules = rules.len(), "Rule set validated");
        Ok(RuleSet::new(rules))
    }
}

/// The string inside `value`, or the JSON text of anything else.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn validate_rule(raw: &RawRule) -> Result<Rule, ValidationReason> {
    let combinator = raw
        .predicate
        .as_str()
        .and_then(Combinator::parse)
        .ok_or_else(|| ValidationReason::UnknownCombinator(text_of(&raw.predicate)))?;

    let conditions = raw
        .conditions
        .iter()
        .enumerate()
        .map(|(i, c)| validate_condition(i, c))
        .collect::<Result<Vec<_>, _>>()?;

    let actions = raw
        .actions
        .iter()
        .enumerate()
        .map(|(i, a)| validate_action(i, a))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Rule {
        combinator,
        conditions,
        actions,
    })
}

fn validate_condition(
    condition_index: usize,
    raw: &RawCondition,
) -> Result<Condition, ValidationReason> {
    let field = raw
        .field
        .as_str()
        .and_then(Field::parse)
        .ok_or_else(|| ValidationReason::UnknownField {
            condition_index,
            field: text_of(&raw.field),
        })?;

    let predicate = raw
        .predicate
        .as_str()
        .and_then(Predicate::parse)
        .ok_or_else(|| ValidationReason::UnknownPredicate {
            condition_index,
            predicate: text_of(&raw.predicate),
        })?;

    let mismatch = || ValidationReason::PredicateFieldMismatch {
        condition_index,
        field: field.name().to_string(),
        predicate: predicate.name().to_string(),
    };

    if field.category() != predicate.category() {
        return Err(mismatch());
    }

    let value = match (&raw.value, predicate.category()) {
        (Value::String(s), _) => s.clone(),
        // Day counts may be written as bare integers.
        (Value::Number(n), FieldCategory::Timestamp) => n.to_string(),
        (other, FieldCategory::Timestamp) => {
            return Err(ValidationReason::InvalidDayCount {
                condition_index,
                value: other.to_string(),
            });
        }
        (other, FieldCategory::Text) => {
            return Err(ValidationReason::InvalidValue {
                condition_index,
                value: other.to_string(),
            });
        }
    };

    Condition::new(field, predicate, value).map_err(|e| match e {
        ConditionError::InvalidDayCount(value) => ValidationReason::InvalidDayCount {
            condition_index,
            value,
        },
        ConditionError::Mismatch { .. } => mismatch(),
    })
}

fn validate_action(action_index: usize, raw: &Value) -> Result<Action, ValidationReason> {
    let unknown = || ValidationReason::UnknownAction {
        action_index,
        action: raw.to_string(),
    };

    match raw {
        Value::String(s) if s == MARK_AS_READ => Ok(Action::MarkRead),
        Value::String(s) if s == MARK_AS_UNREAD => Ok(Action::MarkUnread),
        Value::Object(map) if map.len() == 1 => match map.get(MOVE_MESSAGE) {
            Some(Value::String(folder)) if folder.trim().is_empty() => {
                Err(ValidationReason::EmptyMoveFolder { action_index })
            }
            Some(Value::String(folder)) => Ok(Action::Move {
                folder: folder.clone(),
            }),
            Some(Value::Null) => Err(ValidationReason::EmptyMoveFolder { action_index }),
            _ => Err(unknown()),
        },
        _ => Err(unknown()),
    }
}
