//! Error types for doiici
//!
//! This module defines all error types used throughout the bot. Uses
//! `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use thiserror::Error;

/// The primary error type for doiici operations.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration-related errors (missing token, unparsable values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Two plugins normalise to the same lowercase name.
    #[error("Plugin {0:?} registered twice")]
    DuplicatePlugin(String),

    /// Startup finished without any plugin installed.
    #[error("At least one plugin must be installed")]
    NoPlugins,

    /// Transport errors (connection failures, rejected sends, etc.)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The chat platform rejected the bot credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket errors from the RTM connection
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// A specialized `Result` type for doiici operations.
pub type Result<T> = std::result::Result<T, BotError>;
