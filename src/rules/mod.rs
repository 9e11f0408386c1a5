//! Declarative mail rules.
//!
//! A rule file is read into a raw structure, validated once into a
//! [`RuleSet`], and then evaluated against stored records:
//! 1. `loader`: JSON rule file → [`RawRuleSet`]
//! 2. `validator`: [`RawRuleSet`] → [`RuleSet`] or [`ValidationError`](crate::error::ValidationError)
//! 3. `field` / `condition` / `matcher`: pure matching of one rule against one record
//!
//! Matching never has side effects. Dispatching the actions of a matching
//! rule is the job of [`crate::pipeline`].

pub mod condition;
pub mod field;
pub mod loader;
pub mod matcher;
pub mod types;
pub mod validator;

pub use condition::{Condition, Predicate};
pub use field::{Field, FieldCategory, FieldValue};
pub use matcher::{Rule, RuleSet};
pub use types::{Action, Combinator, EmailRecord, NewEmail, RawRuleSet};
pub use validator::RuleSetValidator;
