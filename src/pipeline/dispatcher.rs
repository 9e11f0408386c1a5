//! Turning actions into mail-service calls.
//!
//! Every dispatch is independent: provider errors become a `Failed`
//! outcome and are never raised, so one failing action cannot stop the
//! actions after it.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::mail::{LabelId, MailService};
use crate::pipeline::report::ActionOutcome;
use crate::rules::types::{Action, EmailRecord};

/// Reason recorded when a `Move` target has no matching label.
pub const LABEL_NOT_FOUND: &str = "label not found";

/// Dispatcher behavior switches.
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Also remove `INBOX` when moving a message to a label.
    pub archive_on_move: bool,
}

/// Runs actions against one mail-service handle for a whole run.
pub struct ActionDispatcher {
    mail: Arc<dyn MailService>,
    options: DispatchOptions,
}

impl ActionDispatcher {
    pub fn new(mail: Arc<dyn MailService>, options: DispatchOptions) -> Self {
        Self { mail, options }
    }

    /// Apply one action to one record's provider-side message.
    pub async fn dispatch(&self, action: &Action, record: &EmailRecord) -> ActionOutcome {
        let result = match action {
            Action::MarkRead => {
                self.mail
                    .modify_labels(&record.message_id, &[], &[LabelId::unread()])
                    .await
            }
            Action::MarkUnread => {
                self.mail
                    .modify_labels(&record.message_id, &[LabelId::unread()], &[])
                    .await
            }
            Action::Move { folder } => return self.move_to(folder, record).await,
        };

        match result {
            Ok(()) => {
                debug!(
                    record = record.id,
                    message_id = %record.message_id,
                    action = action.label(),
                    "Action applied"
                );
                ActionOutcome::Applied
            }
            Err(e) => {
                warn!(
                    record = record.id,
                    message_id = %record.message_id,
                    action = action.label(),
                    error = %e,
                    "Action failed"
                );
                ActionOutcome::failed(e.to_string())
            }
        }
    }

    async fn move_to(&self, folder: &str, record: &EmailRecord) -> ActionOutcome {
        let labels = match self.mail.list_labels().await {
            Ok(labels) => labels,
            Err(e) => {
                warn!(folder, error = %e, "Failed to list labels for move");
                return ActionOutcome::failed(e.to_string());
            }
        };

        let Some(label) = labels.get(folder) else {
            warn!(folder, record = record.id, "Move target label not found");
            return ActionOutcome::failed(LABEL_NOT_FOUND);
        };

        let remove = if self.options.archive_on_move {
            vec![LabelId::inbox()]
        } else {
            Vec::new()
        };

        match self
            .mail
            .modify_labels(&record.message_id, std::slice::from_ref(label), &remove)
            .await
        {
            Ok(()) => {
                debug!(
                    record = record.id,
                    message_id = %record.message_id,
                    folder,
                    "Message moved"
                );
                ActionOutcome::Applied
            }
            Err(e) => {
                warn!(
                    record = record.id,
                    message_id = %record.message_id,
                    folder,
                    error = %e,
                    "Move failed"
                );
                ActionOutcome::failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::InMemoryMailService;
    use crate::mail::memory::MailCall;
    use chrono::Utc;

    fn record(message_id: &str) -> EmailRecord {
        EmailRecord {
            id: 1,
            from_email: "a@b.com".into(),
            subject: "s".into(),
            message: "m".into(),
            message_id: message_id.into(),
            received_date: Utc::now(),
        }
    }

    fn dispatcher(mail: &Arc<InMemoryMailService>, archive_on_move: bool) -> ActionDispatcher {
        ActionDispatcher::new(mail.clone(), DispatchOptions { archive_on_move })
    }

    #[tokio::test]
    async fn mark_read_removes_unread() {
        let mail = Arc::new(InMemoryMailService::new().with_message("m1", [LabelId::unread()]));
        let outcome = dispatcher(&mail, false)
            .dispatch(&Action::MarkRead, &record("m1"))
            .await;
        assert_eq!(outcome, ActionOutcome::Applied);
        assert!(!mail.is_unread("m1"));
        assert_eq!(
            mail.calls(),
            vec![MailCall::ModifyLabels {
                message_id: "m1".into(),
                add: vec![],
                remove: vec![LabelId::unread()],
            }]
        );
    }

    #[tokio::test]
    async fn mark_unread_adds_unread() {
        let mail = Arc::new(InMemoryMailService::new());
        let outcome = dispatcher(&mail, false)
            .dispatch(&Action::MarkUnread, &record("m1"))
            .await;
        assert!(outcome.is_applied());
        assert!(mail.is_unread("m1"));
    }

    #[tokio::test]
    async fn provider_error_becomes_failed_outcome() {
        let mail = Arc::new(InMemoryMailService::new().failing_for("m1"));
        let outcome = dispatcher(&mail, false)
            .dispatch(&Action::MarkRead, &record("m1"))
            .await;
        match outcome {
            ActionOutcome::Failed { reason } => assert!(reason.contains("500")),
            other => panic!("Expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn move_resolves_label_by_name() {
        let mail = Arc::new(
            InMemoryMailService::new()
                .with_label("Receipts", "Label_7")
                .with_message("m1", [LabelId::inbox()]),
        );
        let action = Action::Move {
            folder: "Receipts".into(),
        };
        let outcome = dispatcher(&mail, false).dispatch(&action, &record("m1")).await;

        assert!(outcome.is_applied());
        let labels = mail.labels_of("m1");
        assert!(labels.contains(&LabelId::from("Label_7")));
        assert!(labels.contains(&LabelId::inbox()));
    }

    #[tokio::test]
    async fn move_with_archive_removes_inbox() {
        let mail = Arc::new(
            InMemoryMailService::new()
                .with_label("Receipts", "Label_7")
                .with_message("m1", [LabelId::inbox()]),
        );
        let action = Action::Move {
            folder: "Receipts".into(),
        };
        dispatcher(&mail, true).dispatch(&action, &record("m1")).await;
        assert!(!mail.labels_of("m1").contains(&LabelId::inbox()));
    }

    #[tokio::test]
    async fn move_to_unknown_label_makes_no_mutation() {
        let mail = Arc::new(InMemoryMailService::new());
        let action = Action::Move {
            folder: "Nowhere".into(),
        };
        let outcome = dispatcher(&mail, false).dispatch(&action, &record("m1")).await;

        assert_eq!(outcome, ActionOutcome::failed(LABEL_NOT_FOUND));
        assert_eq!(mail.modify_count(), 0);
        assert_eq!(mail.calls(), vec![MailCall::ListLabels]);
    }

    #[tokio::test]
    async fn move_label_lookup_is_case_sensitive() {
        let mail = Arc::new(InMemoryMailService::new().with_label("Spam", "Label_1"));
        let action = Action::Move {
            folder: "spam".into(),
        };
        let outcome = dispatcher(&mail, false).dispatch(&action, &record("m1")).await;
        assert_eq!(outcome, ActionOutcome::failed(LABEL_NOT_FOUND));
    }

    #[tokio::test]
    async fn move_fails_when_labels_unavailable() {
        let mail = Arc::new(
            InMemoryMailService::new()
                .with_label("Spam", "Label_1")
                .failing_list_labels(),
        );
        let action = Action::Move {
            folder: "Spam".into(),
        };
        let outcome = dispatcher(&mail, false).dispatch(&action, &record("m1")).await;
        assert!(!outcome.is_applied());
        assert_eq!(mail.modify_count(), 0);
    }
}
