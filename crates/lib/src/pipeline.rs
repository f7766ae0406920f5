//! Request pipeline: normalize → addressing → extract → classify → dispatch → forward.
//!
//! Built once at startup from config; all parts are read-only and shared across requests.

use crate::backend::DataProvider;
use crate::channels::{
    is_verification_probe, normalize, AddressingDetector, CommandExtractor, SmaxChannel,
    TransportHeaders,
};
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::intent::{IntentClassifier, IntentResult};
use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// What happened to one inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// No message text could be found.
    NoText,
    /// The event does not address the assistant.
    NotAddressed,
    /// Upstream connectivity test carrying template placeholders.
    VerificationProbe,
    /// A reply was produced; `forwarded` tells whether the sink accepted it.
    Replied {
        reply: String,
        intent: IntentResult,
        forwarded: bool,
    },
}

pub struct Pipeline {
    detector: AddressingDetector,
    extractor: CommandExtractor,
    classifier: IntentClassifier,
    dispatcher: Dispatcher,
    sink: Arc<SmaxChannel>,
    delivery_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        config: &Config,
        provider: Arc<dyn DataProvider>,
        sink: Arc<SmaxChannel>,
    ) -> Result<Self> {
        let extractor =
            CommandExtractor::new(&config.assistant).context("compiling assistant aliases")?;
        let classifier = IntentClassifier::new().context("compiling intent rules")?;
        Ok(Self {
            detector: AddressingDetector::new(&config.assistant),
            extractor,
            classifier,
            dispatcher: Dispatcher::new(
                provider,
                Duration::from_secs(config.backend.timeout_secs),
            ),
            sink,
            delivery_timeout: Duration::from_secs(config.sink.timeout_secs),
        })
    }

    /// Run one event through the pipeline. `req_id` only prefixes log lines.
    pub async fn handle(&self, req_id: &str, body: &Value, headers: &TransportHeaders) -> Outcome {
        let event = normalize(body, headers);
        if is_verification_probe(&event, headers) {
            log::info!("{}: verification payload with template placeholders", req_id);
            return Outcome::VerificationProbe;
        }
        if event.text().is_empty() {
            log::info!("{}: no message text in payload", req_id);
            return Outcome::NoText;
        }
        if !self.detector.is_addressed(&event) {
            log::debug!("{}: assistant not addressed, ignoring", req_id);
            return Outcome::NotAddressed;
        }

        let command = self.extractor.extract_command(&event);
        log::info!("{}: command extracted: {:?}", req_id, command);
        let intent = self.classifier.classify(&command);
        log::info!(
            "{}: intent {} (confidence {})",
            req_id,
            intent.intent,
            intent.confidence
        );
        let reply = self.dispatcher.dispatch(&intent).await;

        // Delivery runs detached so a dropped request cannot cut it short.
        let (tx, rx) = oneshot::channel();
        let sink = self.sink.clone();
        let reply_out = reply.clone();
        let headers_out = headers.clone();
        tokio::spawn(async move {
            let sent = sink.forward(&reply_out, &event, &headers_out).await;
            let _ = tx.send(sent);
        });
        let forwarded = match tokio::time::timeout(self.delivery_timeout, rx).await {
            Ok(Ok(sent)) => sent,
            Ok(Err(_)) => {
                log::error!("{}: delivery task ended without a result", req_id);
                false
            }
            Err(_) => {
                log::warn!("{}: delivery still running after timeout, reporting failed", req_id);
                false
            }
        };
        log::info!(
            "{}: reply {}",
            req_id,
            if forwarded { "forwarded" } else { "not forwarded" }
        );

        Outcome::Replied {
            reply,
            intent,
            forwarded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DemoDataProvider;
    use crate::format;
    use crate::intent::Intent;
    use serde_json::json;

    fn pipeline() -> Pipeline {
        let mut config = Config::default();
        config.assistant.bot_id = "bot-42".to_string();
        let sink = SmaxChannel::new(None, None, Duration::from_secs(1)).unwrap();
        Pipeline::new(&config, Arc::new(DemoDataProvider::new()), Arc::new(sink)).unwrap()
    }

    #[tokio::test]
    async fn addressed_command_is_answered() {
        let body = json!({
            "event_type": "message_received",
            "data": { "user_id": "u1" },
            "raw": {
                "message": "@BotBiva báo cáo cuộc gọi hôm nay",
                "mentions": [{ "user_id": "bot-42", "display_name": "BotBiva", "start": 0, "end": 8 }]
            }
        });
        let outcome = pipeline()
            .handle("req-test", &body, &TransportHeaders::default())
            .await;
        let Outcome::Replied {
            reply,
            intent,
            forwarded,
        } = outcome
        else {
            panic!("expected a reply, got {:?}", outcome);
        };
        assert_eq!(intent.intent, Intent::CallReportToday);
        assert!(reply.contains("BÁO CÁO CUỘC GỌI HÔM NAY"));
        assert!(!forwarded);
    }

    #[tokio::test]
    async fn unaddressed_message_is_ignored() {
        let body = json!({ "message": "báo cáo cuộc gọi hôm nay" });
        let outcome = pipeline()
            .handle("req-test", &body, &TransportHeaders::default())
            .await;
        assert_eq!(outcome, Outcome::NotAddressed);
    }

    #[tokio::test]
    async fn bare_tag_still_classifies_empty_command() {
        let body = json!({ "message": "@BotBiva" });
        let outcome = pipeline()
            .handle("req-test", &body, &TransportHeaders::default())
            .await;
        match outcome {
            Outcome::Replied { reply, intent, .. } => {
                assert_eq!(intent.intent, Intent::Unknown);
                assert_eq!(intent.original_text, "");
                assert_eq!(reply, format::UNKNOWN_COMMAND);
            }
            other => panic!("expected a reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn placeholder_identifiers_short_circuit() {
        let body = json!({ "pid": "{{pid}}", "message_text": "@BotBiva báo cáo tuần" });
        let outcome = pipeline()
            .handle("req-test", &body, &TransportHeaders::default())
            .await;
        assert_eq!(outcome, Outcome::VerificationProbe);
    }

    #[tokio::test]
    async fn braces_in_command_still_get_a_reply() {
        let body = json!({
            "pid": "p",
            "page_pid": "pp",
            "user_id": "u",
            "message_text": "@BotBiva báo cáo tuần {{ghi chú}}"
        });
        let outcome = pipeline()
            .handle("req-test", &body, &TransportHeaders::default())
            .await;
        match outcome {
            Outcome::Replied { intent, .. } => assert_eq!(intent.intent, Intent::CallReportWeek),
            other => panic!("expected a reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_payload_has_no_text() {
        let outcome = pipeline()
            .handle("req-test", &json!({}), &TransportHeaders::default())
            .await;
        assert_eq!(outcome, Outcome::NoText);
    }
}
