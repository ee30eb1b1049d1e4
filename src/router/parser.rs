//! Message parser.
//!
//! Decides whether an inbound message is addressed to the bot and, if so,
//! splits it into a plugin selector and a command payload. Parsing is pure:
//! the resulting command borrows from the message.

use crate::transport::InboundMessage;

use super::session::SessionState;

/// Channel id prefix the platform uses for direct-message conversations.
const DIRECT_MESSAGE_PREFIX: char = 'D';

/// Why a message was not treated as bot-directed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No connection has been confirmed yet, so the bot's identity is unknown.
    SessionNotReady,
    /// The bot wrote this message itself.
    SelfAuthored,
    /// Neither a mention of the bot nor a direct message.
    NotAddressed,
}

/// A bot-directed command split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    /// Plugin name as typed by the user; matched case-insensitively.
    pub plugin_selector: &'a str,
    /// Everything after the selector. Empty when absent, never trimmed.
    pub command_payload: &'a str,
}

/// Outcome of parsing one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    Ignored(IgnoreReason),
    /// Addressed to the bot but no plugin name was given.
    MalformedDirected,
    Parsed(ParsedCommand<'a>),
}

/// Classify `msg` against the current session.
///
/// # Example
///
/// ```rust
/// use doiici::router::{parse, Classification, ParsedCommand, SessionState};
/// use doiici::transport::InboundMessage;
///
/// let mut session = SessionState::new();
/// session.on_connected("U1");
///
/// let msg = InboundMessage::new("U2", "C1", "<@U1> echo hello");
/// assert_eq!(
///     parse(&session, &msg),
///     Classification::Parsed(ParsedCommand {
///         plugin_selector: "echo",
///         command_payload: "hello",
///     })
/// );
/// ```
pub fn parse<'a>(session: &SessionState, msg: &'a InboundMessage) -> Classification<'a> {
    let Some(bot_user_id) = session.bot_user_id() else {
        return Classification::Ignored(IgnoreReason::SessionNotReady);
    };

    if msg.sender_id == bot_user_id {
        return Classification::Ignored(IgnoreReason::SelfAuthored);
    }

    let at_bot = session
        .mention_token()
        .is_some_and(|mention| msg.text.starts_with(&mention));
    let to_bot = msg.channel_id.starts_with(DIRECT_MESSAGE_PREFIX);

    if !at_bot && !to_bot {
        return Classification::Ignored(IgnoreReason::NotAddressed);
    }

    let max_parts = if at_bot { 3 } else { 2 };
    let parts: Vec<&'a str> = msg.text.splitn(max_parts, ' ').collect();

    if parts.len() < max_parts - 1 {
        return Classification::MalformedDirected;
    }

    Classification::Parsed(ParsedCommand {
        plugin_selector: parts[max_parts - 2],
        command_payload: parts.get(max_parts - 1).copied().unwrap_or(""),
    })
}
