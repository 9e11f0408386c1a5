//! Error types for mail-rules.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Action request error: {0}")]
    ActionRequest(#[from] ActionRequestError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors reading a rule file into its raw structure.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("Failed to read rule file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed rule file: {0}")]
    Json(#[from] serde_json::Error),
}

/// A rule set failed structural validation.
///
/// Raised before any record is evaluated; a run never starts on an
/// invalid rule set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rule {rule_index}: {reason}")]
pub struct ValidationError {
    /// Position of the offending rule in file order.
    pub rule_index: usize,
    pub reason: ValidationReason,
}

/// What exactly was wrong with a rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationReason {
    #[error("unknown combinator '{0}' (expected All or Any)")]
    UnknownCombinator(String),

    #[error("condition {condition_index}: unknown field '{field}'")]
    UnknownField {
        condition_index: usize,
        field: String,
    },

    #[error("condition {condition_index}: unknown predicate '{predicate}'")]
    UnknownPredicate {
        condition_index: usize,
        predicate: String,
    },

    #[error("condition {condition_index}: predicate '{predicate}' cannot be used on field '{field}'")]
    PredicateFieldMismatch {
        condition_index: usize,
        field: String,
        predicate: String,
    },

    #[error("condition {condition_index}: '{value}' is not a non-negative day count")]
    InvalidDayCount {
        condition_index: usize,
        value: String,
    },

    #[error("condition {condition_index}: value must be a string, got {value}")]
    InvalidValue {
        condition_index: usize,
        value: String,
    },

    #[error("action {action_index}: move_message requires a non-empty folder")]
    EmptyMoveFolder { action_index: usize },

    #[error("action {action_index}: unknown action {action}")]
    UnknownAction { action_index: usize, action: String },
}

/// A single-email action request that cannot be carried out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionRequestError {
    #[error("unknown action '{0}' (expected mark_as_read, mark_as_unread or move_message)")]
    UnknownAction(String),

    #[error("move_message requires a folder name")]
    MissingFolder,

    #[error("email {0} not found")]
    EmailNotFound(i64),
}

/// Mail provider errors.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Result type alias for mail-rules.
pub type Result<T> = std::result::Result<T, Error>;
