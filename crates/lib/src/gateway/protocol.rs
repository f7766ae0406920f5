//! Gateway HTTP response types for the webhook endpoints.

use crate::intent::{Intent, IntentResult};
use crate::pipeline::Outcome;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

pub const MSG_NOT_ADDRESSED: &str = "Bot not mentioned, ignored";
pub const MSG_NO_TEXT: &str = "No message text found, ignored";
pub const MSG_PROBE_OK: &str = "Webhook test successful";

/// Whether the reply reached the delivery sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardStatus {
    Sent,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub intent: Intent,
    pub confidence: f64,
    /// RFC 3339 UTC.
    pub processed_at: String,
}

/// Body of every 200 response from `POST /webhook/smax`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smax_forward_status: Option<ForwardStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

impl WebhookResponse {
    fn acknowledged(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            smax_forward_status: None,
            metadata: None,
        }
    }

    fn reply(reply: String, intent: &IntentResult, forwarded: bool) -> Self {
        Self {
            success: true,
            message: reply,
            smax_forward_status: Some(if forwarded {
                ForwardStatus::Sent
            } else {
                ForwardStatus::Failed
            }),
            metadata: Some(ResponseMetadata {
                intent: intent.intent,
                confidence: intent.confidence,
                processed_at: chrono::Utc::now().to_rfc3339(),
            }),
        }
    }
}

impl From<Outcome> for WebhookResponse {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::NoText => Self::acknowledged(MSG_NO_TEXT),
            Outcome::NotAddressed => Self::acknowledged(MSG_NOT_ADDRESSED),
            Outcome::VerificationProbe => Self::acknowledged(MSG_PROBE_OK),
            Outcome::Replied {
                reply,
                intent,
                forwarded,
            } => Self::reply(reply, &intent, forwarded),
        }
    }
}

/// Transport-level failures. Messages are generic; details only go to the log.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Invalid JSON payload")]
    MalformedBody,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Internal server error")]
    Internal,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MalformedBody => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "success": false, "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
