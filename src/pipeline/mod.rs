//! Rule run pipeline.
//!
//! A run takes a validated [`RuleSet`](crate::rules::RuleSet) and a
//! snapshot of stored records and:
//! 1. `RuleEngine::run()`: walks rule → record in order, matching each pair
//! 2. `ActionDispatcher::dispatch()`: applies each action of a match via `MailService`
//! 3. `RunReport`: collects every outcome, success or failure
//!
//! Provider failures are per action. Only validation (before the run) and
//! caller cancellation stop a run early.
//!
//! `single` applies one requested action to one stored email with the same
//! dispatcher.

pub mod dispatcher;
pub mod engine;
pub mod report;
pub mod single;

pub use dispatcher::{ActionDispatcher, DispatchOptions};
pub use engine::RuleEngine;
pub use report::{ActionOutcome, OutcomeEntry, RunReport};
pub use single::{ActionReceipt, apply_to_email, requested_action};
