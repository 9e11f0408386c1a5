//! Gmail REST API implementation of [`MailService`] and [`MessageSource`].
//!
//! Uses the Gmail API v1:
//! - `users.labels.list` to resolve folder names
//! - `users.messages.modify` to add/remove labels
//! - `users.messages.list` + `users.messages.get` to fetch recent mail
//!
//! The caller supplies an already-issued OAuth access token; obtaining and
//! refreshing it is outside this crate.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderValue, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::mail::{LabelId, MailService, MessageSource};
use crate::rules::types::NewEmail;

/// Base URL for the authenticated user's mailbox.
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Gmail labels list response.
#[derive(Debug, Deserialize)]
struct LabelsListResponse {
    labels: Option<Vec<GmailLabel>>,
}

#[derive(Debug, Deserialize)]
struct GmailLabel {
    id: String,
    name: String,
}

/// Gmail messages list response.
#[derive(Debug, Deserialize)]
struct MessageListResponse {
    messages: Option<Vec<MessageRef>>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

/// A message as returned by `users.messages.get`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GmailMessage {
    id: String,
    #[serde(default)]
    snippet: String,
    /// Milliseconds since the epoch, as a decimal string.
    internal_date: Option<String>,
    payload: Option<GmailPayload>,
}

#[derive(Debug, Deserialize)]
struct GmailPayload {
    #[serde(default)]
    headers: Vec<GmailHeader>,
}

#[derive(Debug, Deserialize)]
struct GmailHeader {
    name: String,
    value: String,
}

/// Gmail modify request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModifyRequest<'a> {
    #[serde(skip_serializing_if = "no_labels")]
    add_label_ids: &'a [LabelId],
    #[serde(skip_serializing_if = "no_labels")]
    remove_label_ids: &'a [LabelId],
}

fn no_labels(ids: &&[LabelId]) -> bool {
    ids.is_empty()
}

/// Gmail-backed mail service.
pub struct GmailService {
    client: reqwest::Client,
    base_url: String,
    access_token: SecretString,
}

impl GmailService {
    pub fn new(access_token: SecretString) -> Self {
        Self::with_base_url(access_token, GMAIL_API_BASE)
    }

    /// Point at a different API root (e.g. a proxy).
    pub fn with_base_url(access_token: SecretString, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        }
    }

    fn auth_header(&self) -> Result<HeaderValue, ProviderError> {
        HeaderValue::from_str(&format!("Bearer {}", self.access_token.expose_secret()))
            .map_err(|e| ProviderError::Authentication(format!("invalid access token: {e}")))
    }

    /// Authenticated GET returning a JSON body.
    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.auth_header()?)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("parse response: {e}")))
    }

    /// Authenticated POST whose response body is not needed.
    async fn post_no_response<B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<(), ProviderError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.auth_header()?)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }
}

/// Map non-success responses to [`ProviderError`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs);
    let body = response.text().await.unwrap_or_default();

    Err(match status.as_u16() {
        401 | 403 => ProviderError::Authentication(format!("{status}: {body}")),
        404 => ProviderError::NotFound(body),
        429 => ProviderError::RateLimited { retry_after },
        code => ProviderError::Api { status: code, body },
    })
}

#[async_trait]
impl MailService for GmailService {
    async fn modify_labels(
        &self,
        message_id: &str,
        add: &[LabelId],
        remove: &[LabelId],
    ) -> Result<(), ProviderError> {
        let body = ModifyRequest {
            add_label_ids: add,
            remove_label_ids: remove,
        };
        self.post_no_response(&format!("/messages/{message_id}/modify"), &body)
            .await?;
        debug!(message_id, ?add, ?remove, "Modified Gmail labels");
        Ok(())
    }

    async fn list_labels(&self) -> Result<HashMap<String, LabelId>, ProviderError> {
        let response: LabelsListResponse = self.get("/labels", &[]).await?;
        Ok(labels_by_name(response))
    }
}

#[async_trait]
impl MessageSource for GmailService {
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<NewEmail>, ProviderError> {
        let list: MessageListResponse = self
            .get("/messages", &[("maxResults", limit.to_string())])
            .await?;

        let refs = list.messages.unwrap_or_default();
        let mut emails = Vec::with_capacity(refs.len());
        for message_ref in refs {
            let msg: GmailMessage = self
                .get(
                    &format!("/messages/{}", message_ref.id),
                    &[
                        ("format", "metadata".to_string()),
                        ("metadataHeaders", "From".to_string()),
                        ("metadataHeaders", "Subject".to_string()),
                    ],
                )
                .await?;

            match to_new_email(&msg) {
                Some(email) => emails.push(email),
                None => warn!(id = %msg.id, "Skipping Gmail message without From/Subject/date"),
            }
        }

        debug!(count = emails.len(), "Fetched recent Gmail messages");
        Ok(emails)
    }
}

fn labels_by_name(response: LabelsListResponse) -> HashMap<String, LabelId> {
    response
        .labels
        .unwrap_or_default()
        .into_iter()
        .map(|label| (label.name, LabelId(label.id)))
        .collect()
}

fn header<'a>(payload: &'a GmailPayload, name: &str) -> Option<&'a str> {
    payload
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Convert a fetched Gmail message into a storable email.
pub(crate) fn to_new_email(msg: &GmailMessage) -> Option<NewEmail> {
    let payload = msg.payload.as_ref()?;
    let millis: i64 = msg.internal_date.as_deref()?.parse().ok()?;

    Some(NewEmail {
        from_email: header(payload, "From")?.to_string(),
        subject: header(payload, "Subject")?.to_string(),
        message: msg.snippet.clone(),
        message_id: msg.id.clone(),
        received_date: DateTime::<Utc>::from_timestamp_millis(millis)?,
    })
}
