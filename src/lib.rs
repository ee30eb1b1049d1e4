//! doiici - Slack bot that routes addressed messages to installed plugins

pub mod bot;
pub mod config;
pub mod error;
pub mod plugins;
pub mod router;
pub mod transport;

pub use bot::Bot;
pub use config::Config;
pub use error::{BotError, Result};
