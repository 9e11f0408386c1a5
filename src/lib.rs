//! Declarative rule engine for mailbox housekeeping.

pub mod config;
pub mod error;
pub mod mail;
pub mod pipeline;
pub mod rules;
pub mod store;
