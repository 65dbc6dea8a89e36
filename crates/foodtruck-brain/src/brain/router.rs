use foodtruck_core::chat::{BotIdentity, ChatEvent};
use foodtruck_core::error::{FoodtruckError, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use super::Brain;

impl Brain {
    /// Consume transport events in order until the stream closes or the credentials
    /// are rejected.
    pub async fn run_event_loop(&self, mut events: mpsc::Receiver<ChatEvent>) -> Result<()> {
        while let Some(event) = events.recv().await {
            match event {
                ChatEvent::Connected { connection_count } => {
                    info!(connection_count, "[recv] connected");
                }
                ChatEvent::Message {
                    author,
                    text,
                    channel,
                } => self.handle_message(&author, &text, &channel).await,
                ChatEvent::Error(description) => {
                    warn!(error = %description, "[recv] transport error");
                }
                ChatEvent::InvalidAuth => {
                    error!("[recv] invalid credentials");
                    return Err(FoodtruckError::InvalidAuth);
                }
                ChatEvent::Other(kind) => {
                    trace!(kind, "[recv] ignored event");
                }
            }
        }

        info!("[recv] event stream closed");
        Ok(())
    }

    async fn handle_message(&self, author: &str, text: &str, channel: &str) {
        let Some(me) = self.chat.identity() else {
            warn!(channel, "[recv] message before handshake, ignoring");
            return;
        };
        let Some(command) = addressed_text(&me, author, text) else {
            return;
        };

        debug!(channel, command, "[recv] command");
        let reply = self.dispatcher.respond(&command).await;
        if let Err(e) = self.chat.send_message(channel, &reply).await {
            warn!(channel, error = %e, "[recv] failed to send reply");
        }
    }
}

/// Command text of a message addressed to the bot: mention prefix stripped, trimmed
/// and lower-cased. `None` for the bot's own messages and for anything not starting
/// with the mention.
pub fn addressed_text(me: &BotIdentity, author: &str, text: &str) -> Option<String> {
    if author == me.id {
        return None;
    }
    let rest = text.strip_prefix(me.mention_prefix().as_str())?;
    Some(rest.trim().to_lowercase())
}
