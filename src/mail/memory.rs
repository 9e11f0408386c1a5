//! In-memory mail service.
//!
//! Keeps per-message label sets and a log of every call, so a run's
//! provider-visible effects can be inspected afterwards. Individual
//! messages or the label listing can be made to fail.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::mail::{LabelId, MailService};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailCall {
    ListLabels,
    ModifyLabels {
        message_id: String,
        add: Vec<LabelId>,
        remove: Vec<LabelId>,
    },
}

#[derive(Default)]
struct State {
    message_labels: HashMap<String, BTreeSet<LabelId>>,
    calls: Vec<MailCall>,
}

/// [`MailService`] backed by in-process state.
#[derive(Default)]
pub struct InMemoryMailService {
    labels: HashMap<String, LabelId>,
    failing_messages: HashSet<String>,
    fail_list_labels: bool,
    state: Mutex<State>,
}

impl InMemoryMailService {
    /// A service that knows the `INBOX` and `UNREAD` system labels.
    pub fn new() -> Self {
        Self::default()
            .with_label("INBOX", LabelId::inbox())
            .with_label("UNREAD", LabelId::unread())
    }

    /// Register a label name.
    pub fn with_label(mut self, name: &str, id: impl Into<LabelId>) -> Self {
        self.labels.insert(name.to_string(), id.into());
        self
    }

    /// Seed a message's current labels.
    pub fn with_message<I>(self, message_id: &str, labels: I) -> Self
    where
        I: IntoIterator<Item = LabelId>,
    {
        self.lock()
            .message_labels
            .insert(message_id.to_string(), labels.into_iter().collect());
        self
    }

    /// Make every `modify_labels` call for this message fail.
    pub fn failing_for(mut self, message_id: &str) -> Self {
        self.failing_messages.insert(message_id.to_string());
        self
    }

    /// Make `list_labels` fail.
    pub fn failing_list_labels(mut self) -> Self {
        self.fail_list_labels = true;
        self
    }

    /// Current labels on a message.
    pub fn labels_of(&self, message_id: &str) -> BTreeSet<LabelId> {
        self.lock()
            .message_labels
            .get(message_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_unread(&self, message_id: &str) -> bool {
        self.labels_of(message_id).contains(&LabelId::unread())
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<MailCall> {
        self.lock().calls.clone()
    }

    /// Number of `modify_labels` calls made so far.
    pub fn modify_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, MailCall::ModifyLabels { .. }))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock only means a panicking test thread; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl MailService for InMemoryMailService {
    async fn modify_labels(
        &self,
        message_id: &str,
        add: &[LabelId],
        remove: &[LabelId],
    ) -> Result<(), ProviderError> {
        let mut state = self.lock();
        state.calls.push(MailCall::ModifyLabels {
            message_id: message_id.to_string(),
            add: add.to_vec(),
            remove: remove.to_vec(),
        });

        if self.failing_messages.contains(message_id) {
            return Err(ProviderError::Api {
                status: 500,
                body: format!("modify failed for {message_id}"),
            });
        }

        let labels = state
            .message_labels
            .entry(message_id.to_string())
            .or_default();
        for id in remove {
            labels.remove(id);
        }
        labels.extend(add.iter().cloned());
        Ok(())
    }

    async fn list_labels(&self) -> Result<HashMap<String, LabelId>, ProviderError> {
        self.lock().calls.push(MailCall::ListLabels);
        if self.fail_list_labels {
            return Err(ProviderError::Connection("labels unavailable".into()));
        }
        Ok(self.labels.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn modify_applies_remove_then_add() {
        let mail = InMemoryMailService::new().with_message("m1", [LabelId::unread()]);
        mail.modify_labels("m1", &[LabelId::from("Label_1")], &[LabelId::unread()])
            .await
            .unwrap();

        let labels = mail.labels_of("m1");
        assert!(labels.contains(&LabelId::from("Label_1")));
        assert!(!mail.is_unread("m1"));
        assert_eq!(mail.modify_count(), 1);
    }

    #[tokio::test]
    async fn failing_message_records_call_without_effect() {
        let mail = InMemoryMailService::new()
            .with_message("m1", [LabelId::unread()])
            .failing_for("m1");
        let result = mail.modify_labels("m1", &[], &[LabelId::unread()]).await;

        assert!(matches!(result, Err(ProviderError::Api { status: 500, .. })));
        assert!(mail.is_unread("m1"));
        assert_eq!(mail.modify_count(), 1);
    }

    #[tokio::test]
    async fn list_labels_includes_registered() {
        let mail = InMemoryMailService::new().with_label("Spam", "Label_9");
        let labels = mail.list_labels().await.unwrap();
        assert_eq!(labels.get("Spam"), Some(&LabelId::from("Label_9")));
        assert_eq!(labels.get("INBOX"), Some(&LabelId::inbox()));
        assert_eq!(mail.calls(), vec![MailCall::ListLabels]);
    }

    #[tokio::test]
    async fn list_labels_can_fail() {
        let mail = InMemoryMailService::new().failing_list_labels();
        assert!(matches!(
            mail.list_labels().await,
            Err(ProviderError::Connection(_))
        ));
    }
}
