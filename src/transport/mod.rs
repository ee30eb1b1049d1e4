//! Chat transport for doiici
//!
//! The router only talks to the chat platform through two seams:
//!
//! - an ordered stream of [`TransportEvent`]s delivered over a
//!   `tokio::sync::mpsc` channel, and
//! - a [`MessageSender`] that posts replies.
//!
//! The Slack implementation of both lives in [`slack`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::plugins::ResponseConfig;

pub mod slack;

pub use slack::{SlackRtm, SlackWebClient};

/// An event produced by the transport, consumed in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The connection is confirmed and the bot's own user id is known.
    Connected { bot_user_id: String },
    /// A message was posted somewhere the bot can see.
    Message(InboundMessage),
    /// A transient connection problem. Logged; processing continues.
    ConnectionError(String),
    /// The credentials were rejected. Terminal.
    InvalidAuth,
}

/// A message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub sender_id: String,
    pub channel_id: String,
    pub text: String,
}

impl InboundMessage {
    pub fn new(sender_id: &str, channel_id: &str, text: &str) -> Self {
        Self {
            sender_id: sender_id.to_string(),
            channel_id: channel_id.to_string(),
            text: text.to_string(),
        }
    }
}

/// A reply ready to be posted to `channel_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel_id: String,
    pub text: String,
    pub config: ResponseConfig,
}

impl OutboundMessage {
    /// A reply with default send options (not posted as the bot user).
    pub fn new(channel_id: &str, text: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            text: text.into(),
            config: ResponseConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResponseConfig) -> Self {
        self.config = config;
        self
    }
}

/// Posts outbound messages to the chat platform.
///
/// Delivery guarantees belong to the implementation; callers do not retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, msg: OutboundMessage) -> Result<()>;
}
