//! Dispatcher: turns one inbound message into at most one outbound reply.

use tracing::debug;

use crate::plugins::{PluginRegistry, ResponseConfig};
use crate::transport::{InboundMessage, OutboundMessage};

use super::parser::{parse, Classification, IgnoreReason, ParsedCommand};
use super::session::SessionState;

/// Reply when the bot is addressed without a plugin name.
pub const MALFORMED_REPLY: &str = "Yes?";

/// Reply when the selector names no installed plugin.
pub fn not_installed_reply(selector: &str) -> String {
    format!("Sorry, the \"{}\" plugin doesn't seem to be installed.", selector)
}

/// Route `msg` and build the reply, if any.
///
/// Returns `None` for messages that are not bot-directed. Selected plugins are
/// invoked synchronously and are not isolated from the caller.
pub fn dispatch(
    registry: &PluginRegistry,
    session: &SessionState,
    msg: &InboundMessage,
) -> Option<OutboundMessage> {
    match parse(session, msg) {
        Classification::Ignored(IgnoreReason::SessionNotReady) => None,
        Classification::Ignored(reason) => {
            debug!(channel = %msg.channel_id, ?reason, "Ignoring message");
            None
        }
        Classification::MalformedDirected => {
            debug!(channel = %msg.channel_id, "Addressed without a plugin name");
            Some(OutboundMessage::new(&msg.channel_id, MALFORMED_REPLY))
        }
        Classification::Parsed(command) => Some(run_command(registry, &msg.channel_id, command)),
    }
}

fn run_command(
    registry: &PluginRegistry,
    channel_id: &str,
    command: ParsedCommand<'_>,
) -> OutboundMessage {
    let Some(plugin) = registry.resolve(command.plugin_selector) else {
        debug!(selector = command.plugin_selector, "Plugin not installed");
        return OutboundMessage::new(channel_id, not_installed_reply(command.plugin_selector));
    };

    debug!(plugin = plugin.name(), channel = channel_id, "Dispatching command");

    let mut config = ResponseConfig::as_bot();
    let reply = plugin.match_command(command.command_payload, &mut config);
    config.attachments = reply.attachments;

    OutboundMessage::new(channel_id, reply.text).with_config(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{Attachment, OutgoingMessage, Plugin};
    use std::sync::{Arc, Mutex};

    /// Records every payload it sees and tweaks the send config.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl Plugin for Recorder {
        fn name(&self) -> &str {
            "Record"
        }

        fn match_command(&self, command: &str, config: &mut ResponseConfig) -> OutgoingMessage {
            self.seen.lock().unwrap().push(command.to_string());
            config.icon_emoji = Some(":memo:".to_string());
            // Anything set here is replaced by the reply's own attachments.
            config.attachments.push(Attachment::default());
            OutgoingMessage::text(format!("recorded {command}")).with_attachment(Attachment {
                title: Some("entry".into()),
                ..Default::default()
            })
        }
    }

    fn setup() -> (PluginRegistry, Arc<Recorder>, SessionState) {
        let recorder = Arc::new(Recorder::default());
        let mut registry = PluginRegistry::new();
        registry.register(recorder.clone()).unwrap();
        let mut session = SessionState::new();
        session.on_connected("U1");
        (registry, recorder, session)
    }

    #[test]
    fn test_not_ready_produces_nothing() {
        let (registry, recorder, _) = setup();
        let session = SessionState::new();
        let msg = InboundMessage::new("U2", "D1", "record hi");
        assert!(dispatch(&registry, &session, &msg).is_none());
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_self_authored_produces_nothing() {
        let (registry, recorder, session) = setup();
        for text in ["<@U1> record hi", "record hi", "<@U1>"] {
            let msg = InboundMessage::new("U1", "D1", text);
            assert!(dispatch(&registry, &session, &msg).is_none());
        }
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_bare_mention_gets_acknowledgment() {
        let (registry, recorder, session) = setup();
        let msg = InboundMessage::new("U2", "C9", "<@U1>");
        let reply = dispatch(&registry, &session, &msg).unwrap();
        assert_eq!(reply.channel_id, "C9");
        assert_eq!(reply.text, MALFORMED_REPLY);
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_plugin_named_in_reply() {
        let (registry, recorder, session) = setup();
        let msg = InboundMessage::new("U2", "C9", "<@U1> nonexistent do things");
        let reply = dispatch(&registry, &session, &msg).unwrap();
        assert!(reply.text.contains("nonexistent"));
        assert_eq!(
            reply.text,
            "Sorry, the \"nonexistent\" plugin doesn't seem to be installed."
        );
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_plugin_reply_keeps_selector_case() {
        let (registry, _, session) = setup();
        let msg = InboundMessage::new("U2", "D1", "NoSuchThing");
        let reply = dispatch(&registry, &session, &msg).unwrap();
        assert!(reply.text.contains("\"NoSuchThing\""));
    }

    #[test]
    fn test_unknown_plugin_reply_does_not_escape_selector() {
        let (registry, _, session) = setup();
        for (text, selector) in [("\"weather\" x", "\"weather\""), ("a\\b", "a\\b")] {
            let msg = InboundMessage::new("U2", "D1", text);
            let reply = dispatch(&registry, &session, &msg).unwrap();
            assert_eq!(reply.text, not_installed_reply(selector));
            assert!(reply.text.contains(&format!("\"{}\"", selector)));
        }
        let msg = InboundMessage::new("U2", "D1", "\"weather\" x");
        let reply = dispatch(&registry, &session, &msg).unwrap();
        assert_eq!(
            reply.text,
            "Sorry, the \"\"weather\"\" plugin doesn't seem to be installed."
        );
    }

    #[test]
    fn test_found_plugin_reply_sent_as_bot_with_attachments() {
        let (registry, recorder, session) = setup();
        let msg = InboundMessage::new("U2", "C9", "<@U1> RECORD hello there");
        let reply = dispatch(&registry, &session, &msg).unwrap();

        assert_eq!(reply.channel_id, "C9");
        assert_eq!(reply.text, "recorded hello there");
        assert!(reply.config.as_user);
        assert_eq!(reply.config.icon_emoji.as_deref(), Some(":memo:"));
        assert_eq!(reply.config.attachments.len(), 1);
        assert_eq!(reply.config.attachments[0].title.as_deref(), Some("entry"));
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["hello there"]);
    }

    #[test]
    fn test_missing_payload_passes_empty_string() {
        let (registry, recorder, session) = setup();
        let msg = InboundMessage::new("U2", "D1", "record");
        dispatch(&registry, &session, &msg).unwrap();
        assert_eq!(*recorder.seen.lock().unwrap(), vec![""]);
    }

    #[test]
    fn test_canned_replies_not_sent_as_bot() {
        let (registry, _, session) = setup();
        let bare = InboundMessage::new("U2", "C1", "<@U1>");
        let unknown = InboundMessage::new("U2", "C1", "<@U1> nope");
        for msg in [bare, unknown] {
            let reply = dispatch(&registry, &session, &msg).unwrap();
            assert!(!reply.config.as_user);
            assert!(reply.config.attachments.is_empty());
        }
    }
}
