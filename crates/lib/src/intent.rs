//! Rule-based intent classification with parameter extraction.
//!
//! Rules are evaluated in a fixed priority order; the first pattern that matches anywhere
//! in the lower-cased command decides the intent. Parameters are extracted from the whole
//! command regardless of which rule matched.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Confidence reported for any matched rule.
pub const MATCHED_CONFIDENCE: f64 = 0.95;
/// Confidence reported when no rule matched.
pub const UNKNOWN_CONFIDENCE: f64 = 0.1;

pub const PARAM_PHONE_NUMBER: &str = "phone_number";
pub const PARAM_PERIOD: &str = "period";
pub const PARAM_ORDER_ID: &str = "order_id";

/// Known intents plus `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CallReportToday,
    CallReportWeek,
    CallReportMonth,
    SystemStatus,
    PhoneList,
    PhoneConfig,
    CheckOrder,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CallReportToday => "call_report_today",
            Intent::CallReportWeek => "call_report_week",
            Intent::CallReportMonth => "call_report_month",
            Intent::SystemStatus => "system_status",
            Intent::PhoneList => "phone_list",
            Intent::PhoneConfig => "phone_config",
            Intent::CheckOrder => "check_order",
            Intent::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracted parameters, keyed by parameter name.
pub type IntentParameters = BTreeMap<String, String>;

/// Classification outcome for one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: Intent,
    pub parameters: IntentParameters,
    pub confidence: f64,
    pub original_text: String,
}

/// One intent and its ordered patterns (source form, before compilation).
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub intent: Intent,
    pub patterns: &'static [&'static str],
}

/// Rule set in priority order. `phone_list` is checked before `phone_config`
/// so "phone config list" lists numbers instead of asking for one.
pub const RULES: &[ClassificationRule] = &[
    ClassificationRule {
        intent: Intent::CallReportToday,
        patterns: &[
            r"báo cáo.*hôm nay",
            r"số cuộc gọi.*ngày",
            r"thống kê.*hôm nay",
            r"cuộc gọi.*today",
        ],
    },
    ClassificationRule {
        intent: Intent::CallReportWeek,
        patterns: &[
            r"báo cáo.*tuần",
            r"thống kê.*tuần",
            r"cuộc gọi.*tuần",
            r"weekly.*report",
        ],
    },
    ClassificationRule {
        intent: Intent::CallReportMonth,
        patterns: &[
            r"báo cáo.*tháng",
            r"thống kê.*tháng",
            r"cuộc gọi.*tháng",
            r"monthly.*report",
        ],
    },
    ClassificationRule {
        intent: Intent::SystemStatus,
        patterns: &[
            r"trạng thái.*hệ thống",
            r"kiểm tra.*hệ thống",
            r"hệ thống.*thế nào",
            r"system.*status",
            r"health.*check",
        ],
    },
    ClassificationRule {
        intent: Intent::PhoneList,
        patterns: &[
            r"danh sách.*số",
            r"số điện thoại.*nào",
            r"list.*phone",
            r"show.*numbers",
            r"phone.*list",
        ],
    },
    ClassificationRule {
        intent: Intent::PhoneConfig,
        patterns: &[
            r"cấu hình.*số",
            r"config.*phone",
            r"thiết lập.*điện thoại",
            r"setup.*number",
        ],
    },
    ClassificationRule {
        intent: Intent::CheckOrder,
        patterns: &[
            r"kiểm tra.*đơn",
            r"tra cứu.*đơn",
            r"đơn hàng",
            r"check.*order",
            r"order.*status",
        ],
    },
];

const PHONE_PATTERN: &str = r"(\+?84|0)[0-9]{8,10}";
const ORDER_ID_PATTERN: &str =
    r"\b(?:đơn hàng|đơn|order)\s*(?:số|id|#|:)?\s*#?\s*([a-z0-9_-]*[0-9][a-z0-9_-]*)";

/// Relative-time qualifiers, first match wins.
const PERIODS: [(&str, &str); 3] = [
    ("hôm qua", "yesterday"),
    ("tuần trước", "last_week"),
    ("tháng trước", "last_month"),
];

/// Compiled, read-only classifier. Build once at startup and share.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<(Intent, Vec<Regex>)>,
    phone: Regex,
    order_id: Regex,
}

impl IntentClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        let rules = RULES
            .iter()
            .map(|rule| {
                let compiled = rule
                    .patterns
                    .iter()
                    .map(|p| Regex::new(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, regex::Error>((rule.intent, compiled))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self {
            rules,
            phone: Regex::new(PHONE_PATTERN)?,
            order_id: Regex::new(ORDER_ID_PATTERN)?,
        })
    }

    /// Classify a command. Never fails; no match is an ordinary `Unknown` result.
    pub fn classify(&self, command: &str) -> IntentResult {
        let lowered = command.to_lowercase();
        let intent = self.detect_intent(&lowered);
        let confidence = if intent == Intent::Unknown {
            UNKNOWN_CONFIDENCE
        } else {
            MATCHED_CONFIDENCE
        };
        IntentResult {
            intent,
            parameters: self.extract_parameters(&lowered),
            confidence,
            original_text: command.to_string(),
        }
    }

    fn detect_intent(&self, text: &str) -> Intent {
        self.rules
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| p.is_match(text)))
            .map(|(intent, _)| *intent)
            .unwrap_or(Intent::Unknown)
    }

    /// Scan lower-cased text for a phone number, a period qualifier and an order id.
    pub fn extract_parameters(&self, text: &str) -> IntentParameters {
        let mut params = IntentParameters::new();
        if let Some(m) = self.phone.find(text) {
            params.insert(PARAM_PHONE_NUMBER.to_string(), m.as_str().to_string());
        }
        if let Some((_, period)) = PERIODS.iter().find(|(phrase, _)| text.contains(phrase)) {
            params.insert(PARAM_PERIOD.to_string(), period.to_string());
        }
        if let Some(id) = self.order_id.captures(text).and_then(|c| c.get(1)) {
            params.insert(PARAM_ORDER_ID.to_string(), id.as_str().to_string());
        }
        params
    }
}
