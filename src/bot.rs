//! Bot runtime: the single consumer of transport events.
//!
//! Events are handled strictly one at a time in arrival order. Each message
//! runs parse, resolve, invoke and send to completion before the next event
//! is received, so the session state needs no locking.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::error::{BotError, Result};
use crate::plugins::PluginRegistry;
use crate::router::{dispatch, SessionState};
use crate::transport::{MessageSender, TransportEvent};

/// Owns the plugin registry and session state for the life of the process.
pub struct Bot {
    registry: PluginRegistry,
    session: SessionState,
    sender: Arc<dyn MessageSender>,
}

impl Bot {
    /// Create a bot from a finished registry.
    ///
    /// Fails with `BotError::NoPlugins` if the registry is empty.
    pub fn new(registry: PluginRegistry, sender: Arc<dyn MessageSender>) -> Result<Self> {
        registry.ensure_not_empty()?;
        Ok(Self {
            registry,
            session: SessionState::new(),
            sender,
        })
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Consume `events` until the stream ends or the credentials are rejected.
    ///
    /// Returns `Ok(())` when the transport closes the stream and
    /// `BotError::Unauthorized` on an invalid-credentials event.
    pub async fn run(mut self, mut events: mpsc::Receiver<TransportEvent>) -> Result<()> {
        info!(plugins = ?self.registry.names(), "Bot ready, waiting for events");
        while let Some(event) = events.recv().await {
            self.handle_event(event).await?;
        }
        info!("Event stream closed");
        Ok(())
    }

    /// Handle a single event. Only fatal conditions are returned as errors.
    pub async fn handle_event(&mut self, event: TransportEvent) -> Result<()> {
        match event {
            TransportEvent::Connected { bot_user_id } => {
                self.session.on_connected(&bot_user_id);
            }
            TransportEvent::Message(msg) => {
                let Some(reply) = dispatch(&self.registry, &self.session, &msg) else {
                    return Ok(());
                };
                let channel = reply.channel_id.clone();
                if let Err(e) = self.sender.send(reply).await {
                    warn!(channel = %channel, error = %e, "Failed to send reply");
                }
            }
            TransportEvent::ConnectionError(description) => {
                warn!(error = %description, "Connection error");
            }
            TransportEvent::InvalidAuth => {
                error!("Invalid credentials");
                return Err(BotError::Unauthorized("invalid credentials".to_string()));
            }
        }
        Ok(())
    }
}
