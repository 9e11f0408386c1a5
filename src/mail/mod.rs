//! Mail provider collaborators.
//!
//! The rule engine only ever talks to a provider through [`MailService`].
//! Session and credential lifecycle belong to whoever builds the service;
//! the engine receives one handle per run and threads it through every
//! dispatch.

pub mod gmail;
pub mod memory;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::rules::types::NewEmail;

pub use gmail::GmailService;
pub use memory::InMemoryMailService;

/// Provider-side label identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(pub String);

impl LabelId {
    /// System label carried by unread messages.
    pub fn unread() -> Self {
        Self("UNREAD".to_string())
    }

    /// System label for the inbox.
    pub fn inbox() -> Self {
        Self("INBOX".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LabelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LabelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State-changing and lookup calls against the mail provider.
#[async_trait]
pub trait MailService: Send + Sync {
    /// Add and remove labels on one message.
    async fn modify_labels(
        &self,
        message_id: &str,
        add: &[LabelId],
        remove: &[LabelId],
    ) -> Result<(), ProviderError>;

    /// All labels on the account, keyed by display name.
    async fn list_labels(&self) -> Result<HashMap<String, LabelId>, ProviderError>;
}

/// Source of recently received messages.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch up to `limit` of the most recent messages, newest first.
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<NewEmail>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_id_display_and_serde() {
        let id = LabelId::from("Label_42");
        assert_eq!(id.to_string(), "Label_42");
        assert_eq!(serde_json::to_value(&id).unwrap(), "Label_42");
        assert_eq!(LabelId::unread().as_str(), "UNREAD");
        assert_eq!(LabelId::inbox().as_str(), "INBOX");
    }
}
