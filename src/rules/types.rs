//! Shared types for rules and the records they run against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Records ─────────────────────────────────────────────────────────

/// One stored message, as seen by the rule engine.
///
/// Records are a read-only snapshot for the duration of a run. Dispatched
/// actions change provider-side state only; they are never written back
/// here, so every rule sees the fields as they were fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    /// Local row identity.
    pub id: i64,
    /// Raw `From` header value.
    pub from_email: String,
    pub subject: String,
    /// Body snippet.
    pub message: String,
    /// Provider-side message identity (opaque).
    pub message_id: String,
    pub received_date: DateTime<Utc>,
}

/// A message fetched from the provider that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmail {
    pub from_email: String,
    pub subject: String,
    pub message: String,
    pub message_id: String,
    pub received_date: DateTime<Utc>,
}

// ── Combinator ──────────────────────────────────────────────────────

/// How a rule combines its condition results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combinator {
    /// Every condition must hold.
    All,
    /// At least one condition must hold.
    Any,
}

impl Combinator {
    /// Parse the rule-file spelling (`"All"` / `"Any"`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "All" => Some(Self::All),
            "Any" => Some(Self::Any),
            _ => None,
        }
    }
}

// ── Action ──────────────────────────────────────────────────────────

/// A side-effecting request against the mail provider.
///
/// Serialized with the same names the rule file uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Action {
    #[serde(rename = "mark_as_read")]
    MarkRead,
    #[serde(rename = "mark_as_unread")]
    MarkUnread,
    /// Apply the label named `folder`.
    #[serde(rename = "move_message")]
    Move { folder: String },
}

pub(crate) const MARK_AS_READ: &str = "mark_as_read";
pub(crate) const MARK_AS_UNREAD: &str = "mark_as_unread";
pub(crate) const MOVE_MESSAGE: &str = "move_message";

impl Action {
    /// The action's rule-file name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MarkRead => MARK_AS_READ,
            Self::MarkUnread => MARK_AS_UNREAD,
            Self::Move { .. } => MOVE_MESSAGE,
        }
    }
}

// ── Raw rule file ───────────────────────────────────────────────────

/// Rule file contents before validation.
///
/// Everything that can be wrong in a rule file is kept as loosely typed
/// JSON here so the validator can report it with the rule's index instead
/// of failing deserialization wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRuleSet {
    #[serde(default)]
    pub rules: Vec<RawRule>,
}

/// One unvalidated rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRule {
    /// Combinator, `"All"` or `"Any"`.
    #[serde(default)]
    pub predicate: serde_json::Value,
    #[serde(default)]
    pub conditions: Vec<RawCondition>,
    /// `"mark_as_read"`, `"mark_as_unread"` or `{"move_message": "<folder>"}`.
    #[serde(default)]
    pub actions: Vec<serde_json::Value>,
}

/// One unvalidated condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCondition {
    #[serde(default)]
    pub field: serde_json::Value,
    #[serde(default)]
    pub predicate: serde_json::Value,
    /// A string, or an integer day count for date predicates.
    #[serde(default)]
    pub value: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinator_parse_is_exact() {
        assert_eq!(Combinator::parse("All"), Some(Combinator::All));
        assert_eq!(Combinator::parse("Any"), Some(Combinator::Any));
        assert_eq!(Combinator::parse("all"), None);
        assert_eq!(Combinator::parse(""), None);
    }

    #[test]
    fn action_labels() {
        assert_eq!(Action::MarkRead.label(), "mark_as_read");
        assert_eq!(Action::MarkUnread.label(), "mark_as_unread");
        assert_eq!(
            Action::Move {
                folder: "Spam".into()
            }
            .label(),
            "move_message"
        );
    }

    #[test]
    fn action_serialization_is_tagged() {
        let json = serde_json::to_value(Action::Move {
            folder: "Receipts".into(),
        })
        .unwrap();
        assert_eq!(json["action"], "move_message");
        assert_eq!(json["folder"], "Receipts");

        let json = serde_json::to_value(Action::MarkRead).unwrap();
        assert_eq!(json["action"], "mark_as_read");
        let json = serde_json::to_value(Action::MarkUnread).unwrap();
        assert_eq!(json["action"], Action::MarkUnread.label());
    }

    #[test]
    fn raw_rule_set_parses_mixed_actions() {
        let raw: RawRuleSet = serde_json::from_str(
            r#"{"rules": [{
                "predicate": "Any",
                "conditions": [{"field": "subject", "predicate": "contains", "value": "invoice"}],
                "actions": ["mark_as_read", {"move_message": "Bills"}]
            }]}"#,
        )
        .unwrap();
        assert_eq!(raw.rules.len(), 1);
        assert_eq!(raw.rules[0].predicate, "Any");
        assert_eq!(raw.rules[0].actions.len(), 2);
        assert_eq!(raw.rules[0].conditions[0].value, "invoice");
    }

    #[test]
    fn raw_rule_keeps_mistyped_fields_for_validation() {
        let raw: RawRuleSet = serde_json::from_str(
            r#"{"rules": [{
                "predicate": 5,
                "conditions": [{"field": null, "predicate": ["contains"]}]
            }]}"#,
        )
        .unwrap();
        let rule = &raw.rules[0];
        assert_eq!(rule.predicate, 5);
        assert!(rule.conditions[0].field.is_null());
        assert!(rule.conditions[0].predicate.is_array());
        assert!(rule.conditions[0].value.is_null());
    }

    #[test]
    fn raw_rule_set_missing_rules_is_empty() {
        let raw: RawRuleSet = serde_json::from_str("{}").unwrap();
        assert!(raw.rules.is_empty());
    }
}
