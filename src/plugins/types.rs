//! Plugin types for doiici
//!
//! This module defines the contract every installed plugin satisfies, the
//! reply a plugin produces, and the send configuration a plugin may tweak
//! while producing it.

use serde::{Deserialize, Serialize};

/// A command handler installed into the bot.
///
/// Plugins are constructed once at startup and never mutated afterwards, so
/// implementations must be `Send + Sync` and take `&self`.
///
/// # Example
///
/// ```rust
/// use doiici::plugins::{OutgoingMessage, Plugin, ResponseConfig};
///
/// struct Shout;
///
/// impl Plugin for Shout {
///     fn name(&self) -> &str {
///         "shout"
///     }
///
///     fn match_command(&self, command: &str, _config: &mut ResponseConfig) -> OutgoingMessage {
///         OutgoingMessage::text(command.to_uppercase())
///     }
/// }
///
/// let mut config = ResponseConfig::as_bot();
/// assert_eq!(Shout.match_command("hi", &mut config).text, "HI");
/// ```
pub trait Plugin: Send + Sync {
    /// Stable, non-empty identifier used as the dispatch key.
    fn name(&self) -> &str;

    /// Produce a reply for `command`.
    ///
    /// `command` is everything after the plugin selector and may be empty
    /// when the user supplied no argument. It is passed through untrimmed.
    fn match_command(&self, command: &str, config: &mut ResponseConfig) -> OutgoingMessage;
}

/// A plugin's reply: message text plus optional structured attachments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl OutgoingMessage {
    /// A plain text reply without attachments.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    /// Append an attachment, preserving order.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// A Slack message attachment.
///
/// The router never inspects attachments; they travel from the plugin's reply
/// into the send configuration unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<AttachmentField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    /// Unix timestamp shown next to the footer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

/// A title/value pair rendered inside an attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    #[serde(default)]
    pub short: bool,
}

/// Send options a plugin may adjust before its reply is posted.
///
/// Mirrors the subset of `chat.postMessage` parameters the bot forwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Post as the bot user rather than as an anonymous app message.
    #[serde(default)]
    pub as_user: bool,

    /// Attachments sent with the message. Overwritten by the router with the
    /// attachments of the plugin's reply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unfurl_links: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unfurl_media: Option<bool>,

    /// Reply inside a thread instead of the channel root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

impl ResponseConfig {
    /// Default parameters for plugin replies: posted as the bot itself.
    pub fn as_bot() -> Self {
        Self {
            as_user: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outgoing_message_text_has_no_attachments() {
        let msg = OutgoingMessage::text("hello");
        assert_eq!(msg.text, "hello");
        assert!(msg.attachments.is_empty());
    }

    #[test]
    fn test_with_attachment_preserves_order() {
        let first = Attachment {
            title: Some("first".into()),
            ..Default::default()
        };
        let second = Attachment {
            title: Some("second".into()),
            ..Default::default()
        };
        let msg = OutgoingMessage::text("x")
            .with_attachment(first.clone())
            .with_attachment(second.clone());
        assert_eq!(msg.attachments, vec![first, second]);
    }

    #[test]
    fn test_as_bot_sets_as_user() {
        let config = ResponseConfig::as_bot();
        assert!(config.as_user);
        assert!(config.attachments.is_empty());
        assert!(config.thread_ts.is_none());
    }

    #[test]
    fn test_attachment_serialization_skips_empty_fields() {
        let attachment = Attachment {
            text: Some("body".into()),
            fields: vec![AttachmentField {
                title: "Status".into(),
                value: "ok".into(),
                short: true,
            }],
            ..Default::default()
        };
        let value = serde_json::to_value(&attachment).unwrap();
        assert_eq!(
            value,
            json!({
                "text": "body",
                "fields": [{"title": "Status", "value": "ok", "short": true}]
            })
        );
    }
}
