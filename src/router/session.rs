//! Session state carried across the event stream.

use tracing::info;

/// The bot's own identity, known once the transport confirms a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    bot_user_id: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self { bot_user_id: None }
    }

    /// Record the bot's user id. A reconnect may overwrite a previous value.
    pub fn on_connected(&mut self, bot_user_id: &str) {
        match self.bot_user_id.as_deref() {
            Some(previous) if previous != bot_user_id => {
                info!(previous, bot_user_id, "Bot identity changed on reconnect");
            }
            Some(_) => {}
            None => info!(bot_user_id, "Connected"),
        }
        self.bot_user_id = Some(bot_user_id.to_string());
    }

    pub fn bot_user_id(&self) -> Option<&str> {
        self.bot_user_id.as_deref()
    }

    /// The mention token users type to address the bot, e.g. `<@U1>`.
    pub fn mention_token(&self) -> Option<String> {
        self.bot_user_id.as_deref().map(|id| format!("<@{}>", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_not_ready() {
        let session = SessionState::new();
        assert_eq!(session.bot_user_id(), None);
        assert_eq!(session.mention_token(), None);
    }

    #[test]
    fn test_on_connected_records_identity() {
        let mut session = SessionState::new();
        session.on_connected("U1");
        assert_eq!(session.bot_user_id(), Some("U1"));
        assert_eq!(session.mention_token().as_deref(), Some("<@U1>"));
    }

    #[test]
    fn test_reconnect_overwrites_identity() {
        let mut session = SessionState::new();
        session.on_connected("U1");
        session.on_connected("U2");
        assert_eq!(session.bot_user_id(), Some("U2"));
    }
}
