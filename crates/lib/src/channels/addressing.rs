//! Addressing: decide whether an event is directed at the assistant, and strip the tags from the text.

use crate::channels::inbound::InboundEvent;
use crate::config::AssistantConfig;
use regex::Regex;

/// Decides whether an event addresses the assistant (mention entity or alias substring).
#[derive(Debug, Clone)]
pub struct AddressingDetector {
    bot_id: String,
    display_name_lower: String,
    aliases_lower: Vec<String>,
}

impl AddressingDetector {
    pub fn new(assistant: &AssistantConfig) -> Self {
        Self {
            bot_id: assistant.bot_id.trim().to_string(),
            display_name_lower: assistant.display_name.trim().to_lowercase(),
            aliases_lower: assistant
                .effective_aliases()
                .iter()
                .map(|a| a.to_lowercase())
                .collect(),
        }
    }

    /// True if a mention entity names the assistant or the text contains any alias (case-insensitive).
    pub fn is_addressed(&self, event: &InboundEvent) -> bool {
        let mentioned = event.mentions().iter().any(|m| {
            (!self.bot_id.is_empty() && m.user_id == self.bot_id)
                || (!self.display_name_lower.is_empty()
                    && m.display_name.to_lowercase().contains(&self.display_name_lower))
        });
        if mentioned {
            return true;
        }
        let text = event.text().to_lowercase();
        self.aliases_lower.iter().any(|a| text.contains(a.as_str()))
    }
}

/// Removes every alias occurrence from the message and tidies whitespace.
///
/// Aliases are matched case-insensitively, longest first, so an alias that contains
/// another (e.g. `@BotBiva` and `BotBiva`) is removed whole.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    aliases: Option<Regex>,
}

impl CommandExtractor {
    pub fn new(assistant: &AssistantConfig) -> Result<Self, regex::Error> {
        let mut aliases = assistant.effective_aliases();
        aliases.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        let aliases = if aliases.is_empty() {
            None
        } else {
            let alternation = aliases
                .iter()
                .map(|a| regex::escape(a))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!("(?i)(?:{})", alternation))?)
        };
        Ok(Self { aliases })
    }

    /// Residual command text; empty when the message held only addressing markers.
    pub fn extract_command(&self, event: &InboundEvent) -> String {
        let text = event.text();
        let stripped = match &self.aliases {
            Some(re) => re.replace_all(text, " "),
            None => text.into(),
        };
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::inbound::{normalize, TransportHeaders};
    use serde_json::json;

    fn assistant() -> AssistantConfig {
        AssistantConfig {
            bot_id: "bot-42".to_string(),
            display_name: "BotBiva".to_string(),
            aliases: vec!["@Quốc Anh".to_string()],
        }
    }

    fn event(body: serde_json::Value) -> InboundEvent {
        normalize(&body, &TransportHeaders::default())
    }

    #[test]
    fn every_alias_addresses_and_strips() {
        let detector = AddressingDetector::new(&assistant());
        let extractor = CommandExtractor::new(&assistant()).unwrap();
        for alias in assistant().effective_aliases() {
            let e = InboundEvent::from_text(format!("{} báo cáo cuộc gọi hôm nay ", alias));
            assert!(detector.is_addressed(&e), "alias {alias} not detected");
            assert_eq!(extractor.extract_command(&e), "báo cáo cuộc gọi hôm nay");
        }
    }

    #[test]
    fn plain_text_without_alias_is_not_addressed() {
        let detector = AddressingDetector::new(&assistant());
        assert!(!detector.is_addressed(&InboundEvent::from_text("báo cáo cuộc gọi hôm nay")));
        assert!(!detector.is_addressed(&InboundEvent::from_text("")));
    }

    #[test]
    fn alias_match_ignores_case() {
        let detector = AddressingDetector::new(&assistant());
        let extractor = CommandExtractor::new(&assistant()).unwrap();
        let e = InboundEvent::from_text("@BOTBIVA  thống kê   tuần");
        assert!(detector.is_addressed(&e));
        assert_eq!(extractor.extract_command(&e), "thống kê tuần");
    }

    #[test]
    fn mention_entity_by_id_or_display_name() {
        let detector = AddressingDetector::new(&assistant());
        let by_id = event(json!({
            "raw": {
                "message": "hello",
                "mentions": [{ "user_id": "bot-42", "display_name": "x" }]
            }
        }));
        assert!(detector.is_addressed(&by_id));

        let by_name = event(json!({
            "raw": {
                "message": "hello",
                "mentions": [{ "user_id": "other", "display_name": "Sếp botbiva" }]
            }
        }));
        assert!(detector.is_addressed(&by_name));

        let someone_else = event(json!({
            "raw": { "message": "hello", "mentions": [{ "user_id": "u2", "display_name": "Lan" }] }
        }));
        assert!(!detector.is_addressed(&someone_else));
    }

    #[test]
    fn mention_with_odd_offsets_still_addresses() {
        let detector = AddressingDetector::new(&assistant());
        let e = event(json!({
            "raw": {
                "message": "hey lan, báo cáo tuần",
                "mentions": [{ "user_id": "bot-42", "start": null, "end": "8" }]
            }
        }));
        assert!(detector.is_addressed(&e));
    }

    #[test]
    fn malformed_mentions_do_not_fail() {
        let detector = AddressingDetector::new(&assistant());
        let e = event(json!({
            "raw": { "message": "hello", "mentions": { "user_id": "bot-42" } }
        }));
        assert!(!detector.is_addressed(&e));
    }

    #[test]
    fn removes_every_occurrence_longest_first() {
        let extractor = CommandExtractor::new(&assistant()).unwrap();
        let e = InboundEvent::from_text("@BotBiva hi BotBiva there @bot-42");
        assert_eq!(extractor.extract_command(&e), "hi there");
    }

    #[test]
    fn only_markers_leaves_empty_command() {
        let extractor = CommandExtractor::new(&assistant()).unwrap();
        assert_eq!(extractor.extract_command(&InboundEvent::from_text("@BotBiva")), "");
        assert_eq!(extractor.extract_command(&InboundEvent::from_text("   ")), "");
    }
}
