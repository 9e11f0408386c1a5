//! `EmailStore` trait: the record collection a run is evaluated against.

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::rules::types::{EmailRecord, NewEmail};

/// Backend-agnostic storage for fetched emails.
#[async_trait]
pub trait EmailStore: Send + Sync {
    /// Every stored email, in insertion order.
    async fn fetch_all(&self) -> Result<Vec<EmailRecord>, DatabaseError>;

    /// One stored email by its local id.
    async fn fetch_by_id(&self, id: i64) -> Result<Option<EmailRecord>, DatabaseError>;

    /// Store newly fetched emails. Emails whose `message_id` is already
    /// stored are skipped. Returns the number of rows inserted.
    async fn save_all(&self, emails: &[NewEmail]) -> Result<usize, DatabaseError>;
}
