//! Per-run results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rules::types::Action;

/// Result of dispatching one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The provider accepted the change.
    Applied,
    /// The change was not made.
    Failed { reason: String },
}

impl ActionOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// One dispatched action and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEntry {
    /// Position of the matching rule in the rule set.
    pub rule_index: usize,
    pub record_id: i64,
    pub message_id: String,
    pub action: Action,
    pub outcome: ActionOutcome,
}

/// Everything a run did, in the order it did it.
///
/// Created at run start and filled in as pairs are evaluated. `partial`
/// is set when the run was cancelled; `processed_count` then tells how far
/// it got.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// (rule, record) pairs evaluated.
    pub processed_count: usize,
    /// rules × records.
    pub total_count: usize,
    pub outcomes: Vec<OutcomeEntry>,
    pub partial: bool,
}

impl RunReport {
    pub(crate) fn start(total_count: usize, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: None,
            processed_count: 0,
            total_count,
            outcomes: Vec::new(),
            partial: false,
        }
    }

    pub(crate) fn record(&mut self, entry: OutcomeEntry) {
        self.outcomes.push(entry);
    }

    pub(crate) fn finish(&mut self, partial: bool) {
        self.partial = partial;
        self.finished_at = Some(Utc::now());
    }

    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|e| e.outcome.is_applied()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.applied_count()
    }

    /// Entries whose action was not made.
    pub fn failures(&self) -> impl Iterator<Item = &OutcomeEntry> {
        self.outcomes.iter().filter(|e| !e.outcome.is_applied())
    }

    /// Entries for one record, in dispatch order.
    pub fn for_record(&self, record_id: i64) -> impl Iterator<Item = &OutcomeEntry> {
        self.outcomes.iter().filter(move |e| e.record_id == record_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(record_id: i64, outcome: ActionOutcome) -> OutcomeEntry {
        OutcomeEntry {
            rule_index: 0,
            record_id,
            message_id: format!("m{record_id}"),
            action: Action::MarkRead,
            outcome,
        }
    }

    #[test]
    fn counts_and_filters() {
        let mut report = RunReport::start(4, Utc::now());
        report.record(entry(1, ActionOutcome::Applied));
        report.record(entry(2, ActionOutcome::failed("label not found")));
        report.record(entry(1, ActionOutcome::Applied));
        report.finish(false);

        assert_eq!(report.applied_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.for_record(1).count(), 2);
        assert!(report.finished_at.is_some());
        assert!(!report.partial);
    }

    #[test]
    fn outcome_serialization() {
        let json = serde_json::to_value(ActionOutcome::failed("label not found")).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "label not found");

        let json = serde_json::to_value(entry(3, ActionOutcome::Applied)).unwrap();
        assert_eq!(json["record_id"], 3);
        assert_eq!(json["outcome"]["status"], "applied");
        assert_eq!(json["action"]["action"], "mark_as_read");
    }
}
