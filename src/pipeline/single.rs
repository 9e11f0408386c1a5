//! One action on one stored email, outside any rule run.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{self, ActionRequestError};
use crate::pipeline::dispatcher::ActionDispatcher;
use crate::pipeline::report::ActionOutcome;
use crate::rules::types::{Action, MARK_AS_READ, MARK_AS_UNREAD, MOVE_MESSAGE};
use crate::store::EmailStore;

/// What a single requested action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReceipt {
    pub record_id: i64,
    pub message_id: String,
    pub action: Action,
    pub outcome: ActionOutcome,
}

/// Build an action from its rule-file name and an optional folder.
///
/// `move_message` needs a non-blank folder; the other actions ignore it.
pub fn requested_action(name: &str, folder: Option<&str>) -> Result<Action, ActionRequestError> {
    match name {
        MARK_AS_READ => Ok(Action::MarkRead),
        MARK_AS_UNREAD => Ok(Action::MarkUnread),
        MOVE_MESSAGE => match folder.map(str::trim) {
            Some(f) if !f.is_empty() => Ok(Action::Move {
                folder: f.to_string(),
            }),
            _ => Err(ActionRequestError::MissingFolder),
        },
        other => Err(ActionRequestError::UnknownAction(other.to_string())),
    }
}

/// Look up a stored email and dispatch `action` against it.
///
/// A missing email is an error and reaches no provider. Provider failures
/// come back as a `Failed` outcome in the receipt, as they do in a run.
pub async fn apply_to_email(
    store: &dyn EmailStore,
    dispatcher: &ActionDispatcher,
    email_id: i64,
    action: &Action,
) -> error::Result<ActionReceipt> {
    let record = store
        .fetch_by_id(email_id)
        .await?
        .ok_or(ActionRequestError::EmailNotFound(email_id))?;

    let outcome = dispatcher.dispatch(action, &record).await;
    info!(
        record = record.id,
        action = action.label(),
        applied = outcome.is_applied(),
        "Single action dispatched"
    );

    Ok(ActionReceipt {
        record_id: record.id,
        message_id: record.message_id,
        action: action.clone(),
        outcome,
    })
}
