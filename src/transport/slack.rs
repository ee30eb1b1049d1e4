//! Slack transport implementation.
//!
//! Inbound events come from the Real Time Messaging websocket opened via
//! `rtm.connect`; replies go out through the Web API (`chat.postMessage`).
//! [`SlackRtm`] owns connection management (keepalive pings and reconnects
//! with exponential backoff) and only ever produces [`TransportEvent`]s.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{BotError, Result};

use super::{InboundMessage, MessageSender, OutboundMessage, TransportEvent};

/// Initial backoff delay for reconnection.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Maximum backoff delay cap for reconnection.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// `rtm.connect` error codes that mean the token itself is unusable.
const AUTH_ERROR_CODES: &[&str] = &[
    "invalid_auth",
    "not_authed",
    "account_inactive",
    "token_revoked",
    "token_expired",
];

/// Keepalive pings allowed to go unanswered before the socket is treated as dead.
const MAX_MISSED_PONGS: u64 = 2;

/// Message subtypes that still carry user-authored text.
const FORWARDED_SUBTYPES: &[&str] = &["me_message", "thread_broadcast"];

fn is_auth_error(code: &str) -> bool {
    AUTH_ERROR_CODES.contains(&code)
}

// ---- Web API response types ----

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConnectResponse {
    ok: bool,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "self")]
    identity: Option<SelfInfo>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SelfInfo {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

/// A websocket URL plus the identity it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RtmSession {
    url: String,
    bot_user_id: String,
}

impl ConnectResponse {
    fn into_session(self) -> Result<RtmSession> {
        if !self.ok {
            let code = self.error.unwrap_or_else(|| "unknown_error".to_string());
            if is_auth_error(&code) {
                return Err(BotError::Unauthorized(code));
            }
            return Err(BotError::Transport(format!("rtm.connect failed: {}", code)));
        }

        match (self.url, self.identity) {
            (Some(url), Some(identity)) if !url.is_empty() && !identity.id.is_empty() => {
                debug!(bot_user_id = %identity.id, name = ?identity.name, "rtm.connect ok");
                Ok(RtmSession {
                    url,
                    bot_user_id: identity.id,
                })
            }
            _ => Err(BotError::Transport(
                "rtm.connect response missing url or self.id".to_string(),
            )),
        }
    }
}

// ---- RTM frames ----

/// A decoded RTM websocket frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RtmFrame {
    /// Server greeting; the connection is live.
    Hello,
    Message(InboundMessage),
    /// The server is about to close the connection.
    Goodbye,
    /// Error reported by the server.
    Error(String),
    /// Answer to the keepalive ping with this id.
    Pong(u64),
    /// Anything the bot does not act on (presence, typing, ...).
    Ignored,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<RawError>,
    #[serde(default)]
    reply_to: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
}

/// Decode one text frame from the RTM websocket.
pub fn decode_frame(text: &str) -> RtmFrame {
    let raw: RawFrame = match serde_json::from_str(text) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Undecodable RTM frame");
            return RtmFrame::Ignored;
        }
    };

    match raw.kind.as_deref() {
        Some("hello") => RtmFrame::Hello,
        Some("goodbye") => RtmFrame::Goodbye,
        Some("pong") => raw.reply_to.map_or(RtmFrame::Ignored, RtmFrame::Pong),
        Some("error") => {
            let (code, msg) = raw
                .error
                .map(|e| (e.code, e.msg))
                .unwrap_or((None, None));
            RtmFrame::Error(format!(
                "RTM error {}: {}",
                code.map_or_else(|| "?".to_string(), |c| c.to_string()),
                msg.unwrap_or_else(|| "unknown".to_string())
            ))
        }
        Some("message") => {
            if let Some(subtype) = raw.subtype.as_deref() {
                if !FORWARDED_SUBTYPES.contains(&subtype) {
                    return RtmFrame::Ignored;
                }
            }
            let Some(channel) = raw.channel else {
                return RtmFrame::Ignored;
            };
            RtmFrame::Message(InboundMessage {
                sender_id: raw.user.unwrap_or_default(),
                channel_id: channel,
                text: raw.text.unwrap_or_default(),
            })
        }
        _ => RtmFrame::Ignored,
    }
}

// ---- RTM event producer ----

/// Tracks keepalive pings against the pongs that answer them.
#[derive(Debug, Default)]
struct Heartbeat {
    sent: u64,
    acked: u64,
}

impl Heartbeat {
    /// Id for the next ping, or an error once too many pings went unanswered.
    fn next_ping(&mut self) -> Result<u64> {
        let missed = self.sent - self.acked;
        if missed >= MAX_MISSED_PONGS {
            return Err(BotError::Transport(format!(
                "{} keepalive pings unanswered",
                missed
            )));
        }
        self.sent += 1;
        Ok(self.sent)
    }

    fn on_pong(&mut self, reply_to: u64) {
        if reply_to <= self.sent {
            self.acked = self.acked.max(reply_to);
        }
    }
}

enum ConnectionExit {
    /// The server or network closed the socket; reconnect.
    Disconnect,
    /// Nobody is consuming events any more; stop.
    ReceiverGone,
}

/// Background producer of [`TransportEvent`]s from the Slack RTM API.
pub struct SlackRtm {
    bot_token: String,
    api_base: String,
    heartbeat: Duration,
    client: reqwest::Client,
}

impl SlackRtm {
    pub fn new(config: &Config) -> Self {
        Self {
            bot_token: config.bot_token.clone(),
            api_base: config.api_base.clone(),
            heartbeat: Duration::from_secs(config.heartbeat_secs),
            client: reqwest::Client::new(),
        }
    }

    /// Run the connection loop on its own task, feeding `tx`.
    ///
    /// The task ends after sending `InvalidAuth` or once `tx`'s receiver is
    /// dropped.
    pub fn spawn(self, tx: mpsc::Sender<TransportEvent>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(tx).await })
    }

    async fn run(self, tx: mpsc::Sender<TransportEvent>) {
        let mut backoff = INITIAL_BACKOFF;

        loop {
            match self.connect().await {
                Ok(session) => match self.run_connection(&session, &tx).await {
                    Ok(ConnectionExit::ReceiverGone) => {
                        info!("Event receiver dropped, stopping Slack transport");
                        return;
                    }
                    Ok(ConnectionExit::Disconnect) => {
                        info!("RTM connection closed, reconnecting");
                        backoff = INITIAL_BACKOFF;
                    }
                    Err(e) => {
                        if tx.send(TransportEvent::ConnectionError(e.to_string())).await.is_err() {
                            return;
                        }
                    }
                },
                Err(BotError::Unauthorized(code)) => {
                    warn!(code = %code, "Slack rejected the bot token");
                    let _ = tx.send(TransportEvent::InvalidAuth).await;
                    return;
                }
                Err(e) => {
                    if tx.send(TransportEvent::ConnectionError(e.to_string())).await.is_err() {
                        return;
                    }
                }
            }

            debug!(backoff_secs = backoff.as_secs(), "Waiting before reconnect");
            tokio::select! {
                () = tokio::time::sleep(backoff) => {}
                () = tx.closed() => return,
            }
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    /// Call `rtm.connect` to obtain a websocket URL and the bot's identity.
    async fn connect(&self) -> Result<RtmSession> {
        let response = self
            .client
            .post(format!("{}/rtm.connect", self.api_base))
            .bearer_auth(&self.bot_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BotError::Transport(format!(
                "rtm.connect returned HTTP {}",
                status
            )));
        }

        let body: ConnectResponse = response.json().await?;
        body.into_session()
    }

    async fn run_connection(
        &self,
        session: &RtmSession,
        tx: &mpsc::Sender<TransportEvent>,
    ) -> Result<ConnectionExit> {
        let (socket, _) = connect_async(session.url.as_str()).await?;
        let (mut write, mut read) = socket.split();
        info!("RTM websocket open");

        let mut ticker = tokio::time::interval(self.heartbeat);
        ticker.tick().await;
        let mut heartbeat = Heartbeat::default();

        loop {
            tokio::select! {
                frame = read.next() => {
                    let event = match frame {
                        None | Some(Ok(WsMessage::Close(_))) => return Ok(ConnectionExit::Disconnect),
                        Some(Err(e)) => return Err(e.into()),
                        Some(Ok(WsMessage::Text(text))) => match decode_frame(&text) {
                            RtmFrame::Hello => Some(TransportEvent::Connected {
                                bot_user_id: session.bot_user_id.clone(),
                            }),
                            RtmFrame::Message(msg) => Some(TransportEvent::Message(msg)),
                            RtmFrame::Error(desc) => Some(TransportEvent::ConnectionError(desc)),
                            RtmFrame::Goodbye => return Ok(ConnectionExit::Disconnect),
                            RtmFrame::Pong(reply_to) => {
                                heartbeat.on_pong(reply_to);
                                None
                            }
                            RtmFrame::Ignored => None,
                        },
                        Some(Ok(_)) => None,
                    };

                    if let Some(event) = event {
                        if tx.send(event).await.is_err() {
                            return Ok(ConnectionExit::ReceiverGone);
                        }
                    }
                }
                _ = ticker.tick() => {
                    let ping_id = heartbeat.next_ping()?;
                    let ping = json!({ "id": ping_id, "type": "ping" }).to_string();
                    write.send(WsMessage::Text(ping)).await?;
                }
                () = tx.closed() => return Ok(ConnectionExit::ReceiverGone),
            }
        }
    }
}

// ---- Web API sender ----

/// Posts replies through `chat.postMessage`.
pub struct SlackWebClient {
    bot_token: String,
    api_base: String,
    client: reqwest::Client,
}

impl SlackWebClient {
    pub fn new(config: &Config) -> Self {
        Self {
            bot_token: config.bot_token.clone(),
            api_base: config.api_base.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn build_payload(msg: &OutboundMessage) -> Result<Value> {
        let channel = msg.channel_id.trim();
        if channel.is_empty() {
            return Err(BotError::Transport(
                "Slack channel ID cannot be empty".to_string(),
            ));
        }

        let mut payload = serde_json::to_value(&msg.config)?;
        if let Some(map) = payload.as_object_mut() {
            map.insert("channel".to_string(), Value::String(channel.to_string()));
            map.insert("text".to_string(), Value::String(msg.text.clone()));
        }
        Ok(payload)
    }
}

#[async_trait]
impl MessageSender for SlackWebClient {
    async fn send(&self, msg: OutboundMessage) -> Result<()> {
        let payload = Self::build_payload(&msg)?;

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(&self.bot_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| BotError::Transport(format!("Failed to call Slack API: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            BotError::Transport(format!("Failed to read Slack API response: {}", e))
        })?;

        if !status.is_success() {
            return Err(BotError::Transport(format!(
                "Slack API returned HTTP {}: {}",
                status, body
            )));
        }

        let body: ApiResponse = serde_json::from_str(&body)
            .map_err(|e| BotError::Transport(format!("Invalid Slack API response JSON: {}", e)))?;

        if !body.ok {
            return Err(BotError::Transport(format!(
                "Slack API returned error: {}",
                body.error.as_deref().unwrap_or("unknown_error")
            )));
        }

        debug!(channel = %msg.channel_id, "Slack: message sent");
        Ok(())
    }
}
