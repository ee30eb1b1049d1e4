//! Message routing for doiici
//!
//! A message is bot-directed when it either starts with a mention of the bot
//! (`<@BOTID> plugin payload...`) or arrives on a direct-message channel
//! (`plugin payload...`). The parser splits such messages into a plugin
//! selector and payload; the dispatcher resolves the selector and builds the
//! reply.
//!
//! ```text
//! InboundMessage ──► parse(session) ──► Classification
//!                                         ├─ Ignored            ─► no reply
//!                                         ├─ MalformedDirected  ─► "Yes?"
//!                                         └─ Parsed ─► registry.resolve()
//!                                                        ├─ None ─► "not installed"
//!                                                        └─ Some ─► plugin reply
//! ```

pub mod dispatcher;
pub mod parser;
pub mod session;

pub use dispatcher::{dispatch, not_installed_reply, MALFORMED_REPLY};
pub use parser::{parse, Classification, IgnoreReason, ParsedCommand};
pub use session::SessionState;
