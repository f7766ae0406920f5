//! SMAX delivery sink: posts formatted replies back to the broker for out-of-band distribution.
//!
//! One attempt per reply, no retry. Every failure is logged and reported as `false`.

use crate::channels::inbound::{is_placeholder, InboundEvent, TransportHeaders};
use serde::Serialize;
use std::time::Duration;

const USER_AGENT: &str = "Biva-Bot/1.0";

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("sink request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("sink returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Raw identifier values resolved from headers (preferred) and the event body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientIds {
    pub pid: String,
    pub page_pid: String,
    pub user_id: String,
    pub group_id: String,
}

impl RecipientIds {
    pub fn resolve(event: &InboundEvent, headers: &TransportHeaders) -> Self {
        let pick = |field: &str| {
            headers
                .identifier(field)
                .map(str::to_string)
                .or_else(|| event.data_field(field))
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };
        Self {
            pid: pick("pid"),
            page_pid: pick("page_pid"),
            user_id: pick("user_id"),
            group_id: pick("group_id"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub pid: String,
    pub page_pid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

impl Attr {
    fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// Body posted to the sink: `{customer: {pid, page_pid}, attrs: [message, user_id, group_id]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryPayload {
    pub customer: Customer,
    pub attrs: Vec<Attr>,
}

/// Required identifier: non-empty and not a template placeholder.
fn valid_identifier(value: &str, name: &str) -> bool {
    if value.is_empty() || is_placeholder(value) {
        log::warn!("smax: invalid or placeholder value for '{}': '{}'", name, value);
        return false;
    }
    true
}

impl DeliveryPayload {
    /// Build the payload, or None when `pid`, `page_pid` or `user_id` is missing or a placeholder.
    pub fn build(reply: &str, ids: &RecipientIds) -> Option<Self> {
        let valid = [
            valid_identifier(&ids.pid, "pid"),
            valid_identifier(&ids.page_pid, "page_pid"),
            valid_identifier(&ids.user_id, "user_id"),
        ];
        if valid.contains(&false) {
            return None;
        }
        Some(Self {
            customer: Customer {
                pid: ids.pid.clone(),
                page_pid: ids.page_pid.clone(),
            },
            attrs: vec![
                Attr::new("message", reply),
                Attr::new("user_id", ids.user_id.clone()),
                Attr::new("group_id", ids.group_id.clone()),
            ],
        })
    }
}

/// Delivery connector. Holds the one HTTP client shared by all requests.
pub struct SmaxChannel {
    url: Option<String>,
    token: Option<String>,
    client: reqwest::Client,
}

impl SmaxChannel {
    /// Build the shared client with a per-request timeout. Delivery is disabled when url or token is None.
    pub fn new(
        url: Option<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { url, token, client })
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.token.is_some()
    }

    /// Forward a reply for the event. Returns whether the sink accepted it; never fails.
    pub async fn forward(
        &self,
        reply: &str,
        event: &InboundEvent,
        headers: &TransportHeaders,
    ) -> bool {
        if reply.trim().is_empty() {
            log::error!("smax: empty reply text, nothing to forward");
            return false;
        }
        let ids = RecipientIds::resolve(event, headers);
        let Some(payload) = DeliveryPayload::build(reply, &ids) else {
            log::error!(
                "smax: missing or invalid identifiers (pid, page_pid, user_id), not forwarding"
            );
            return false;
        };
        let (Some(url), Some(token)) = (self.url.as_deref(), self.token.as_deref()) else {
            log::warn!("smax: sink url or token not configured, not forwarding");
            return false;
        };
        match self.send(url, token, &payload).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("smax: forward failed: {}", e);
                if let Ok(body) = serde_json::to_string(&payload) {
                    log::debug!("smax: payload that failed: {}", body);
                }
                false
            }
        }
    }

    /// POST the payload once with the bearer credential.
    async fn send(
        &self,
        url: &str,
        token: &str,
        payload: &DeliveryPayload,
    ) -> Result<(), DeliveryError> {
        log::info!("smax: sending reply to {}", url);
        let res = self
            .client
            .post(url)
            .bearer_auth(token)
            .header("Content-Type", "application/json; charset=utf-8")
            .header("Accept", "application/json")
            .json(payload)
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(DeliveryError::Status { status, body });
        }
        log::info!("smax: reply accepted ({})", status);
        Ok(())
    }
}
