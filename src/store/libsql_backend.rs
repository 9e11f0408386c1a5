//! libSQL backend: async `EmailStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info, warn};

use crate::error::DatabaseError;
use crate::rules::types::{EmailRecord, NewEmail};
use crate::store::migrations;
use crate::store::traits::EmailStore;

/// libSQL email store.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlEmailStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlEmailStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db).await?;
        info!(path = %path.display(), "Email store opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|ndt| ndt.and_utc())
}

fn row_to_email(row: &libsql::Row) -> Result<EmailRecord, String> {
    let received: String = row.get(5).map_err(|e| e.to_string())?;
    let received_date =
        parse_datetime(&received).ok_or_else(|| format!("bad received_date '{received}'"))?;

    Ok(EmailRecord {
        id: row.get(0).map_err(|e| e.to_string())?,
        from_email: row.get(1).map_err(|e| e.to_string())?,
        subject: row.get(2).map_err(|e| e.to_string())?,
        message: row.get(3).map_err(|e| e.to_string())?,
        message_id: row.get(4).map_err(|e| e.to_string())?,
        received_date,
    })
}

const EMAIL_COLUMNS: &str = "id, from_email, subject, message, message_id, received_date";

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl EmailStore for LibSqlEmailStore {
    async fn fetch_all(&self) -> Result<Vec<EmailRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {EMAIL_COLUMNS} FROM emails ORDER BY id ASC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("fetch_all: {e}")))?;

        let mut emails = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("fetch_all: {e}")))?
        {
            match row_to_email(&row) {
                Ok(email) => emails.push(email),
                Err(e) => warn!("Skipping email row: {e}"),
            }
        }
        debug!(count = emails.len(), "Loaded stored emails");
        Ok(emails)
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Option<EmailRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {EMAIL_COLUMNS} FROM emails WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("fetch_by_id: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("fetch_by_id: {e}")))?
        {
            Some(row) => row_to_email(&row)
                .map(Some)
                .map_err(|e| DatabaseError::Query(format!("fetch_by_id({id}): {e}"))),
            None => Ok(None),
        }
    }

    async fn save_all(&self, emails: &[NewEmail]) -> Result<usize, DatabaseError> {
        let conn = self.conn();
        let mut inserted = 0;
        for email in emails {
            let changed = conn
                .execute(
                    "INSERT OR IGNORE INTO emails (from_email, subject, message, message_id, received_date)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        email.from_email.as_str(),
                        email.subject.as_str(),
                        email.message.as_str(),
                        email.message_id.as_str(),
                        email.received_date.to_rfc3339(),
                    ],
                )
                .await
                .map_err(|e| DatabaseError::Query(format!("save_all: {e}")))?;
            inserted += changed as usize;
        }

        info!(
            inserted,
            skipped = emails.len() - inserted,
            "Saved fetched emails"
        );
        Ok(inserted)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
