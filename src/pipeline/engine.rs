//! The rule engine: rules × records → dispatched actions.
//!
//! Traversal is strictly sequential: for each rule in file order, for each
//! record in fetch order, every action of a matching rule is dispatched in
//! declared order. That order is part of the contract: when two rules
//! issue conflicting actions for the same message, the one dispatched last
//! decides the provider-side state.
//!
//! Records are never updated by dispatched actions. A record that matches
//! several rules is evaluated against each of them using its original
//! field values.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::mail::MailService;
use crate::pipeline::dispatcher::{ActionDispatcher, DispatchOptions};
use crate::pipeline::report::{OutcomeEntry, RunReport};
use crate::rules::matcher::RuleSet;
use crate::rules::types::EmailRecord;

/// Drives one or more runs against a single mail-service handle.
pub struct RuleEngine {
    dispatcher: ActionDispatcher,
}

impl RuleEngine {
    pub fn new(mail: Arc<dyn MailService>) -> Self {
        Self::with_options(mail, DispatchOptions::default())
    }

    pub fn with_options(mail: Arc<dyn MailService>, options: DispatchOptions) -> Self {
        Self {
            dispatcher: ActionDispatcher::new(mail, options),
        }
    }

    /// Evaluate every rule against every record and dispatch the actions of
    /// each match.
    ///
    /// `now` is the single instant all date conditions are measured from.
    /// Cancellation is checked before each (rule, record) pair; dispatches
    /// already started for the current pair run to completion. The report
    /// is marked partial whenever the token was cancelled by the time the
    /// run returns, even if every pair had already been evaluated.
    pub async fn run(
        &self,
        rule_set: &RuleSet,
        records: &[EmailRecord],
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> RunReport {
        let total = rule_set.len() * records.len();
        let mut report = RunReport::start(total, Utc::now());

        info!(
            run_id = %report.run_id,
            rules = rule_set.len(),
            records = records.len(),
            "Starting rule run"
        );

        'rules: for (rule_index, rule) in rule_set.rules().iter().enumerate() {
            for record in records {
                if cancel.is_cancelled() {
                    warn!(
                        run_id = %report.run_id,
                        processed = report.processed_count,
                        total,
                        "Rule run cancelled"
                    );
                    break 'rules;
                }

                if rule.matches(record, now) {
                    debug!(rule = rule_index, record = record.id, "Rule matched");
                    for action in &rule.actions {
                        let outcome = self.dispatcher.dispatch(action, record).await;
                        report.record(OutcomeEntry {
                            rule_index,
                            record_id: record.id,
                            message_id: record.message_id.clone(),
                            action: action.clone(),
                            outcome,
                        });
                    }
                }
                report.processed_count += 1;
            }
        }

        // A token tripped during the last pair still marks the run partial.
        report.finish(cancel.is_cancelled());

        info!(
            run_id = %report.run_id,
            processed = report.processed_count,
            total,
            applied = report.applied_count(),
            failed = report.failed_count(),
            partial = report.partial,
            "Rule run complete"
        );
        report
    }
}
