//! Transport-agnostic view of the chat service.
//!
//! A transport pushes [`ChatEvent`]s into a channel and implements [`ChatTransport`]
//! for outbound messages. The event loop and the scheduler only see these types.

use async_trait::async_trait;

use crate::error::Result;

/// One inbound event from the chat transport, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Handshake succeeded. The count includes reconnects.
    Connected { connection_count: u32 },
    Message {
        author: String,
        text: String,
        channel: String,
    },
    /// Recoverable transport failure.
    Error(String),
    /// Credentials rejected. Nothing after this is delivered.
    InvalidAuth,
    /// Anything the bot does not act on (edits, joins, media).
    Other(String),
}

/// Who the bot is on the chat service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: String,
    pub username: String,
}

impl BotIdentity {
    /// Leading text a message must start with to be addressed to the bot.
    pub fn mention_prefix(&self) -> String {
        format!("@{} ", self.username)
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, channel: &str, text: &str) -> Result<()>;

    /// `None` until the first successful handshake.
    fn identity(&self) -> Option<BotIdentity>;
}
