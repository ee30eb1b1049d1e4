//! Runtime configuration for doiici
//!
//! All settings come from the process environment, which the binary seeds
//! from a `.env` file via `dotenvy` before anything is read. Only `BOT_TOKEN`
//! is required.

use std::fmt;
use std::str::FromStr;

use crate::error::{BotError, Result};

/// Environment variable holding the Slack bot token.
pub const BOT_TOKEN_ENV: &str = "BOT_TOKEN";
pub const API_BASE_ENV: &str = "DOIICI_API_BASE";
pub const EVENT_BUFFER_ENV: &str = "DOIICI_EVENT_BUFFER";
pub const HEARTBEAT_SECS_ENV: &str = "DOIICI_HEARTBEAT_SECS";
pub const LOG_JSON_ENV: &str = "DOIICI_LOG_JSON";

pub const DEFAULT_API_BASE: &str = "https://slack.com/api";
pub const DEFAULT_EVENT_BUFFER: usize = 256;
pub const DEFAULT_HEARTBEAT_SECS: u64 = 30;
const MIN_HEARTBEAT_SECS: u64 = 5;

/// Bot configuration.
#[derive(Clone)]
pub struct Config {
    /// Slack bot token (`xoxb-...`).
    pub bot_token: String,

    /// Base URL of the Slack Web API, without a trailing slash.
    pub api_base: String,

    /// Capacity of the transport to router event channel.
    pub event_buffer: usize,

    /// Seconds between RTM keepalive pings.
    pub heartbeat_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("event_buffer", &self.event_buffer)
            .field("heartbeat_secs", &self.heartbeat_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Callers load `.env` beforehand if they want it applied.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup(BOT_TOKEN_ENV)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BotError::Config(format!("{} is not set", BOT_TOKEN_ENV)))?;

        let api_base = lookup(API_BASE_ENV)
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let event_buffer: usize =
            parse_var(&lookup, EVENT_BUFFER_ENV)?.unwrap_or(DEFAULT_EVENT_BUFFER);
        let heartbeat_secs: u64 =
            parse_var(&lookup, HEARTBEAT_SECS_ENV)?.unwrap_or(DEFAULT_HEARTBEAT_SECS);

        Ok(Self {
            bot_token,
            api_base,
            event_buffer: event_buffer.max(1),
            heartbeat_secs: heartbeat_secs.max(MIN_HEARTBEAT_SECS),
        })
    }
}

/// Whether JSON logging is requested via `DOIICI_LOG_JSON`.
///
/// Kept apart from [`Config`] so logging can be set up before the token is
/// validated.
pub fn log_json_enabled<F>(lookup: F) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_bool(&lookup, LOG_JSON_ENV)?.unwrap_or(false))
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| BotError::Config(format!("invalid {}={:?}: {}", key, raw, e))),
    }
}

fn parse_bool<F>(lookup: &F, key: &str) -> Result<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(BotError::Config(format!(
            "invalid {}={:?}: expected a boolean",
            key, raw
        ))),
    }
}
