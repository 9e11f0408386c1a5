//! Rule matching: combining condition results.

use chrono::{DateTime, Utc};

use crate::rules::condition::Condition;
use crate::rules::types::{Action, Combinator, EmailRecord};

/// A validated rule: a combinator over conditions, plus the actions to run
/// when it matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub combinator: Combinator,
    pub conditions: Vec<Condition>,
    /// Run in declared order.
    pub actions: Vec<Action>,
}

impl Rule {
    /// Does this rule match the record?
    ///
    /// `All` over no conditions matches every record; `Any` over no
    /// conditions matches none. Both are the documented contract.
    pub fn matches(&self, record: &EmailRecord, now: DateTime<Utc>) -> bool {
        match self.combinator {
            Combinator::All => self.conditions.iter().all(|c| c.evaluate(record, now)),
            Combinator::Any => self.conditions.iter().any(|c| c.evaluate(record, now)),
        }
    }
}

/// An ordered, validated list of rules.
///
/// Built by [`RuleSetValidator`](crate::rules::RuleSetValidator); read-only
/// for the duration of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub(crate) fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Rules in file order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::condition::Predicate;
    use crate::rules::field::Field;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap()
    }

    fn record(from: &str, subject: &str) -> EmailRecord {
        EmailRecord {
            id: 1,
            from_email: from.into(),
            subject: subject.into(),
            message: String::new(),
            message_id: "m1".into(),
            received_date: now(),
        }
    }

    fn rule(combinator: Combinator, conditions: Vec<Condition>) -> Rule {
        Rule {
            combinator,
            conditions,
            actions: vec![Action::MarkRead],
        }
    }

    fn from_contains(v: &str) -> Condition {
        Condition::new(Field::FromEmail, Predicate::Contains, v).unwrap()
    }

    fn subject_contains(v: &str) -> Condition {
        Condition::new(Field::Subject, Predicate::Contains, v).unwrap()
    }

    #[test]
    fn all_requires_every_condition() {
        let r = rule(
            Combinator::All,
            vec![from_contains("@shop.com"), subject_contains("Order")],
        );
        assert!(r.matches(&record("x@shop.com", "Order shipped"), now()));
        assert!(!r.matches(&record("x@shop.com", "Newsletter"), now()));
        assert!(!r.matches(&record("x@other.com", "Order shipped"), now()));
    }

    #[test]
    fn any_requires_one_condition() {
        let r = rule(
            Combinator::Any,
            vec![from_contains("@shop.com"), subject_contains("Order")],
        );
        assert!(r.matches(&record("x@shop.com", "Newsletter"), now()));
        assert!(r.matches(&record("x@other.com", "Order shipped"), now()));
        assert!(!r.matches(&record("x@other.com", "Hello"), now()));
    }

    #[test]
    fn all_over_empty_conditions_matches_everything() {
        let r = rule(Combinator::All, vec![]);
        assert!(r.matches(&record("anyone@anywhere", "anything"), now()));
        assert!(r.matches(&record("", ""), now()));
    }

    #[test]
    fn any_over_empty_conditions_matches_nothing() {
        let r = rule(Combinator::Any, vec![]);
        assert!(!r.matches(&record("anyone@anywhere", "anything"), now()));
        assert!(!r.matches(&record("", ""), now()));
    }

    #[test]
    fn empty_rule_set() {
        let set = RuleSet::default();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(set.rules().is_empty());
    }
}
