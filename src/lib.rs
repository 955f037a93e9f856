// ============================================
// lib.rs - Library Root
// ============================================

pub mod config;
pub mod entity;
pub mod error;
pub mod escape;
pub mod html;
pub mod logger;
pub mod markdown;
pub mod peers;
pub mod resolver;

use serde::{Deserialize, Serialize};

pub use config::Config;
pub use entity::{utf16_len, EntityKind, EntityType, MessageEntity};
pub use error::{Error, Result};
pub use escape::{escape_html, escape_markdown};
pub use html::html_to_entities;
pub use markdown::markdown_to_entities;
pub use peers::{merge_users_chats, Channel, Chat, Group, PeerBatch, PeerCache, PeerSource, User};
pub use resolver::{mention_user_id, AccessHashResolver, NoAccessHashes};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

pub fn version() -> String {
    format!("{} v{}", NAME, VERSION)
}

/// Markup dialect of the input text.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Markdown,
    Html,
}

impl Dialect {
    /// Convert `text` into plain text and entities using this dialect.
    pub fn parse<R>(self, text: &str, resolver: &R) -> (String, Option<Vec<MessageEntity>>)
    where
        R: AccessHashResolver + ?Sized,
    {
        match self {
            Dialect::Markdown => markdown_to_entities(text, resolver),
            Dialect::Html => html_to_entities(text, resolver),
        }
    }

    /// Escape plain text so this dialect reads it back unchanged.
    pub fn escape(self, text: &str) -> String {
        match self {
            Dialect::Markdown => escape_markdown(text),
            Dialect::Html => escape_html(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(version().starts_with("tgmarkup v"));
    }

    #[test]
    fn test_dialect_dispatch() {
        let (text, entities) = Dialect::Markdown.parse("*hi*", &NoAccessHashes);
        assert_eq!(text, "hi");
        assert_eq!(entities, Some(vec![MessageEntity::new(EntityKind::Bold, 0, 2)]));

        let (text, entities) = Dialect::Html.parse("<b>hi</b>", &NoAccessHashes);
        assert_eq!(text, "hi");
        assert_eq!(entities, Some(vec![MessageEntity::new(EntityKind::Bold, 0, 2)]));
    }

    #[test]
    fn test_dialect_round_trip() {
        let raw = "*a* <b> & [c](d)";
        for dialect in [Dialect::Markdown, Dialect::Html] {
            let (text, entities) = dialect.parse(&dialect.escape(raw), &NoAccessHashes);
            assert_eq!(text, raw);
            assert!(entities.is_none());
        }
    }

    #[test]
    fn test_dialect_serde() {
        let dialect: Dialect = serde_json::from_str("\"html\"").unwrap();
        assert_eq!(dialect, Dialect::Html);
    }
}
