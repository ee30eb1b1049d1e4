//! Built-in plugins shipped with the bot.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;

use super::registry::PluginRegistry;
use super::types::{Attachment, OutgoingMessage, Plugin, ResponseConfig};

/// Reply sent by `echo` when invoked without an argument.
pub const ECHO_EMPTY_REPLY: &str = "Nothing to echo.";

/// Repeats the command payload back verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoPlugin;

impl Plugin for EchoPlugin {
    fn name(&self) -> &str {
        "echo"
    }

    fn match_command(&self, command: &str, _config: &mut ResponseConfig) -> OutgoingMessage {
        if command.is_empty() {
            return OutgoingMessage::text(ECHO_EMPTY_REPLY);
        }
        OutgoingMessage::text(command)
    }
}

/// Liveness check. Replies `pong`, attaching the payload when one is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct PingPlugin;

impl Plugin for PingPlugin {
    fn name(&self) -> &str {
        "ping"
    }

    fn match_command(&self, command: &str, _config: &mut ResponseConfig) -> OutgoingMessage {
        let reply = OutgoingMessage::text("pong");
        if command.is_empty() {
            return reply;
        }

        reply.with_attachment(Attachment {
            fallback: Some(command.to_string()),
            color: Some("good".to_string()),
            text: Some(command.to_string()),
            footer: Some("ping".to_string()),
            ts: Some(Utc::now().timestamp()),
            ..Default::default()
        })
    }
}

/// All plugins compiled into this binary.
pub fn builtin_plugins() -> Vec<Arc<dyn Plugin>> {
    vec![Arc::new(EchoPlugin), Arc::new(PingPlugin)]
}

/// Build the startup registry from the built-in plugins.
///
/// Fails if two plugins share a name or if none are installed.
pub fn build_registry() -> Result<PluginRegistry> {
    let registry = PluginRegistry::from_plugins(builtin_plugins())?;
    tracing::info!(count = registry.plugin_count(), "Plugins loaded");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_repeats_payload_verbatim() {
        let mut config = ResponseConfig::as_bot();
        let reply = EchoPlugin.match_command("hello  there ", &mut config);
        assert_eq!(reply.text, "hello  there ");
        assert!(reply.attachments.is_empty());
    }

    #[test]
    fn test_echo_without_payload() {
        let mut config = ResponseConfig::as_bot();
        let reply = EchoPlugin.match_command("", &mut config);
        assert_eq!(reply.text, ECHO_EMPTY_REPLY);
    }

    #[test]
    fn test_echo_whitespace_payload_is_not_trimmed() {
        let mut config = ResponseConfig::as_bot();
        assert_eq!(EchoPlugin.match_command("  ", &mut config).text, "  ");
    }

    #[test]
    fn test_ping_plain() {
        let mut config = ResponseConfig::as_bot();
        let reply = PingPlugin.match_command("", &mut config);
        assert_eq!(reply.text, "pong");
        assert!(reply.attachments.is_empty());
    }

    #[test]
    fn test_ping_attaches_payload() {
        let mut config = ResponseConfig::as_bot();
        let reply = PingPlugin.match_command("latency check", &mut config);
        assert_eq!(reply.text, "pong");
        assert_eq!(reply.attachments.len(), 1);
        assert_eq!(reply.attachments[0].text.as_deref(), Some("latency check"));
        assert!(reply.attachments[0].ts.is_some());
    }

    #[test]
    fn test_build_registry_contains_builtins() {
        let registry = build_registry().unwrap();
        assert_eq!(registry.names(), vec!["echo", "ping"]);
    }
}
