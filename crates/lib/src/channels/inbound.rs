//! Inbound event normalization: maps the payload shapes senders use onto one `InboundEvent`.

use axum::http::HeaderMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Unresolved template marker sent by upstream integrations during connectivity checks.
pub const PLACEHOLDER_MARKER: &str = "{{";

const DEFAULT_EVENT_TYPE: &str = "message_received";

/// Body fields checked for message text, in priority order. `raw.message` is checked last.
const BODY_TEXT_FIELDS: [&str; 4] = ["message_text", "last_content_by_user", "message", "text"];

/// Identifier fields that mark a verification probe when they hold a placeholder.
const PROBE_ID_FIELDS: [&str; 3] = ["pid", "page_pid", "user_id"];

/// True if the value still contains an unresolved template placeholder.
pub fn is_placeholder(value: &str) -> bool {
    value.contains(PLACEHOLDER_MARKER)
}

/// One tag of a user inside the raw text. Offsets are advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionEntity {
    pub user_id: String,
    pub display_name: String,
    #[serde(rename = "start")]
    pub start_offset: Option<i64>,
    #[serde(rename = "end")]
    pub end_offset: Option<i64>,
}

/// Offset given as a number or a numeric string; anything else is unknown.
fn lenient_offset(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl MentionEntity {
    /// Read one mention entry. Only a string `user_id` is required; the other fields
    /// fall back to empty or unknown when absent or of an unexpected type.
    pub fn from_value(value: &Value) -> Option<Self> {
        let entry = value.as_object()?;
        let user_id = entry.get("user_id")?.as_str()?.to_string();
        Some(Self {
            user_id,
            display_name: entry
                .get("display_name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            start_offset: lenient_offset(entry.get("start")),
            end_offset: lenient_offset(entry.get("end")),
        })
    }
}

/// Canonical event, created once per request.
#[derive(Debug, Clone, Default)]
pub struct InboundEvent {
    pub event_type: String,
    /// Identifiers and sender details (body `data` merged with top-level scalar fields).
    pub data: Map<String, Value>,
    /// Freeform message text under `message` plus an optional `mentions` list.
    pub raw: Map<String, Value>,
}

impl InboundEvent {
    /// Event carrying only message text (flattened shape).
    pub fn from_text(text: impl Into<String>) -> Self {
        let mut raw = Map::new();
        raw.insert("message".to_string(), Value::String(text.into()));
        Self {
            event_type: DEFAULT_EVENT_TYPE.to_string(),
            data: Map::new(),
            raw,
        }
    }

    /// Resolved message text; empty when none was found.
    pub fn text(&self) -> &str {
        self.raw.get("message").and_then(Value::as_str).unwrap_or("")
    }

    /// Mention entities. A missing list or malformed entries yield no mentions.
    pub fn mentions(&self) -> Vec<MentionEntity> {
        let Some(Value::Array(items)) = self.raw.get("mentions") else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(MentionEntity::from_value)
            .collect()
    }

    /// String value of a body-derived field (strings and numbers only).
    pub fn data_field(&self, key: &str) -> Option<String> {
        match self.data.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Header values that can override or supplement the body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportHeaders {
    pub last_content_by_user: Option<String>,
    pub pid: Option<String>,
    pub page_pid: Option<String>,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
    pub api_key: Option<String>,
}

/// First non-empty header among the spellings (hyphen or underscore).
/// Values are read as UTF-8 since relayed message text is not limited to ASCII.
fn header_value(headers: &HeaderMap, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

impl TransportHeaders {
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        Self {
            last_content_by_user: header_value(
                headers,
                &["last-content-by-user", "last_content_by_user"],
            ),
            pid: header_value(headers, &["pid"]),
            page_pid: header_value(headers, &["page-pid", "page_pid"]),
            user_id: header_value(headers, &["user-id", "user_id"]),
            group_id: header_value(headers, &["group-id", "group_id"]),
            api_key: header_value(headers, &["x-api-key"]),
        }
    }

    /// Header value for an identifier field name (`pid`, `page_pid`, `user_id`, `group_id`).
    pub fn identifier(&self, field: &str) -> Option<&str> {
        match field {
            "pid" => self.pid.as_deref(),
            "page_pid" => self.page_pid.as_deref(),
            "user_id" => self.user_id.as_deref(),
            "group_id" => self.group_id.as_deref(),
            _ => None,
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Resolve message text: header (unless a placeholder), then body fields, then `raw.message`.
fn resolve_text(body: &Map<String, Value>, headers: &TransportHeaders) -> String {
    if let Some(h) = headers
        .last_content_by_user
        .as_deref()
        .filter(|h| !is_placeholder(h))
    {
        return h.to_string();
    }
    BODY_TEXT_FIELDS
        .iter()
        .find_map(|field| non_empty_str(body.get(*field)))
        .or_else(|| {
            body.get("raw")
                .and_then(Value::as_object)
                .and_then(|raw| non_empty_str(raw.get("message")))
        })
        .unwrap_or("")
        .to_string()
}

/// Normalize any supported payload shape. Never fails: a payload without text yields empty text.
pub fn normalize(body: &Value, headers: &TransportHeaders) -> InboundEvent {
    let empty = Map::new();
    let body = body.as_object().unwrap_or(&empty);

    let event_type = body
        .get("event_type")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_EVENT_TYPE)
        .to_string();

    let mut data = body
        .get("data")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    for (key, value) in body {
        if key == "data" || key == "raw" || value.is_object() || value.is_array() {
            continue;
        }
        data.insert(key.clone(), value.clone());
    }

    let mut raw = body
        .get("raw")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    if !raw.contains_key("mentions") {
        if let Some(mentions) = body.get("mentions") {
            raw.insert("mentions".to_string(), mentions.clone());
        }
    }
    raw.insert(
        "message".to_string(),
        Value::String(resolve_text(body, headers)),
    );

    InboundEvent {
        event_type,
        data,
        raw,
    }
}

/// True if the whole value is one template token such as `{{message}}`.
fn is_bare_template(value: &str) -> bool {
    let v = value.trim();
    v.strip_prefix(PLACEHOLDER_MARKER)
        .and_then(|rest| rest.strip_suffix("}}"))
        .is_some_and(|inner| !inner.contains("{{") && !inner.contains("}}"))
}

/// True when the event is a connectivity test rather than a real command:
/// a required identifier (header or body) holds a placeholder, or the message text
/// is nothing but a template token. Text that merely contains braces is a real command.
pub fn is_verification_probe(event: &InboundEvent, headers: &TransportHeaders) -> bool {
    let id_placeholder = PROBE_ID_FIELDS.iter().any(|field| {
        headers.identifier(field).is_some_and(is_placeholder)
            || event
                .data_field(field)
                .is_some_and(|v| is_placeholder(&v))
    });
    id_placeholder || is_bare_template(event.text())
}
