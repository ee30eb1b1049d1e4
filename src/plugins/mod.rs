//! Plugin system for doiici
//!
//! Every command the bot understands is provided by a plugin. A plugin has a
//! name, used as the dispatch key, and a match function that turns the text
//! after the name into a reply.
//!
//! # Architecture
//!
//! - **types**: The `Plugin` contract and reply types (`OutgoingMessage`, `Attachment`, `ResponseConfig`)
//! - **registry**: Case-insensitive name to plugin mapping with duplicate detection
//! - **builtin**: Plugins compiled into the binary (`echo`, `ping`)
//!
//! # Usage
//!
//! ```rust
//! use doiici::plugins::{build_registry, ResponseConfig};
//!
//! let registry = build_registry().unwrap();
//! let echo = registry.resolve("Echo").unwrap();
//!
//! let mut config = ResponseConfig::as_bot();
//! assert_eq!(echo.match_command("hi", &mut config).text, "hi");
//! ```

mod builtin;
pub mod registry;
pub mod types;

pub use builtin::{build_registry, builtin_plugins, EchoPlugin, PingPlugin, ECHO_EMPTY_REPLY};
pub use registry::PluginRegistry;
pub use types::{Attachment, AttachmentField, OutgoingMessage, Plugin, ResponseConfig};
