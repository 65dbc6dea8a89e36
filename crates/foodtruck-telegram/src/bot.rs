use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use foodtruck_core::chat::{BotIdentity, ChatEvent, ChatTransport};
use foodtruck_core::error::{FoodtruckError, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::types::*;

const API_URL: &str = "https://api.telegram.org";
const MAX_MESSAGE_LENGTH: usize = 4096;
const POLL_TIMEOUT_SECS: u32 = 30;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
/// Consecutive poll failures before the getMe handshake is redone.
const MAX_POLL_FAILURES: u32 = 3;

pub struct TelegramBot {
    client: Client,
    base_url: String,
    retry_delay: Duration,
    identity: RwLock<Option<BotIdentity>>,
}

impl TelegramBot {
    pub fn new(token: &str) -> Self {
        Self::with_api_url(API_URL, token)
    }

    /// Point the bot at another Bot API server (self-hosted, or a test double).
    pub fn with_api_url(api_url: &str, token: &str) -> Self {
        let base_url = format!("{}/bot{token}", api_url.trim_end_matches('/'));
        Self {
            client: Client::new(),
            base_url,
            retry_delay: DEFAULT_RETRY_DELAY,
            identity: RwLock::new(None),
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// POST a Bot API method and unwrap its `result`.
    async fn call<T: DeserializeOwned>(&self, method: &str, body: &serde_json::Value) -> Result<T> {
        let url = format!("{}/{method}", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| FoodtruckError::Network(format!("telegram {method}: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
            return Err(FoodtruckError::InvalidAuth);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FoodtruckError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let telegram_response: TelegramResponse<T> = response
            .json()
            .await
            .map_err(|e| FoodtruckError::Decode(format!("telegram {method}: {e}")))?;

        if !telegram_response.ok {
            return Err(FoodtruckError::Telegram(
                telegram_response
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        telegram_response
            .result
            .ok_or_else(|| FoodtruckError::Telegram("missing result in response".to_string()))
    }

    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({})).await
    }

    pub async fn get_updates(&self, offset: i64, timeout: u32) -> Result<Vec<Update>> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": timeout,
            "allowed_updates": ["message"],
        });
        self.call("getUpdates", &body).await
    }

    async fn send_single_message(&self, chat_id: &serde_json::Value, text: &str) -> Result<()> {
        let html = markdown_to_html(text);
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": html,
            "parse_mode": "HTML",
        });

        match self.call::<serde_json::Value>("sendMessage", &body).await {
            Ok(_) => Ok(()),
            // HTML rejected, resend as plain text
            Err(FoodtruckError::Http { status: 400, body }) => {
                debug!(%body, "[telegram] html rejected, resending as plain text");
                let plain = serde_json::json!({ "chat_id": chat_id, "text": text });
                self.call::<serde_json::Value>("sendMessage", &plain)
                    .await
                    .map(|_| ())
            }
            Err(e) => Err(e),
        }
    }

    fn set_identity(&self, me: &User) {
        let identity = BotIdentity {
            id: me.id.to_string(),
            username: me.username.clone().unwrap_or_else(|| me.first_name.clone()),
        };
        if let Ok(mut slot) = self.identity.write() {
            *slot = Some(identity);
        }
    }

    /// Spawn the connection manager. Events flow into `events` until the receiver is
    /// dropped or the credentials are rejected.
    pub fn connect(self: Arc<Self>, events: mpsc::Sender<ChatEvent>) -> JoinHandle<()> {
        tokio::spawn(async move { self.manage_connection(events).await })
    }

    async fn manage_connection(&self, events: mpsc::Sender<ChatEvent>) {
        let mut connection_count: u32 = 0;
        let mut offset: i64 = 0;

        loop {
            match self.get_me().await {
                Ok(me) => {
                    self.set_identity(&me);
                    connection_count += 1;
                    info!(
                        username = me.username.as_deref().unwrap_or("unknown"),
                        connection_count,
                        "[telegram] connected"
                    );
                    if events
                        .send(ChatEvent::Connected { connection_count })
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Err(FoodtruckError::InvalidAuth) => {
                    let _ = events.send(ChatEvent::InvalidAuth).await;
                    return;
                }
                Err(e) => {
                    if events.send(ChatEvent::Error(e.to_string())).await.is_err() {
                        return;
                    }
                    tokio::time::sleep(self.retry_delay).await;
                    continue;
                }
            }

            let mut failures = 0;
            while failures < MAX_POLL_FAILURES {
                match self.get_updates(offset, POLL_TIMEOUT_SECS).await {
                    Ok(updates) => {
                        failures = 0;
                        for update in &updates {
                            if update.update_id >= offset {
                                offset = update.update_id + 1;
                            }
                            if events.send(to_chat_event(update)).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(FoodtruckError::InvalidAuth) => {
                        let _ = events.send(ChatEvent::InvalidAuth).await;
                        return;
                    }
                    Err(e) => {
                        failures += 1;
                        if events.send(ChatEvent::Error(e.to_string())).await.is_err() {
                            return;
                        }
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }

            warn!(failures, "[telegram] polling keeps failing, reconnecting");
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramBot {
    async fn send_message(&self, channel: &str, text: &str) -> Result<()> {
        let chat_id = chat_id_value(channel)?;
        for chunk in split_message(text) {
            self.send_single_message(&chat_id, &chunk).await?;
        }
        Ok(())
    }

    fn identity(&self) -> Option<BotIdentity> {
        self.identity.read().ok().and_then(|slot| slot.clone())
    }
}

/// Numeric chat ids go out as numbers, `@channelname` as a string.
fn chat_id_value(channel: &str) -> Result<serde_json::Value> {
    let channel = channel.trim();
    if let Ok(id) = channel.parse::<i64>() {
        return Ok(serde_json::json!(id));
    }
    if channel.starts_with('@') && channel.len() > 1 {
        return Ok(serde_json::json!(channel));
    }
    Err(FoodtruckError::InvalidConfig(format!(
        "invalid telegram chat id: {channel:?}"
    )))
}

pub fn to_chat_event(update: &Update) -> ChatEvent {
    let Some(msg) = &update.message else {
        return ChatEvent::Other("update without message".to_string());
    };
    match (&msg.from, &msg.text) {
        (Some(from), Some(text)) => ChatEvent::Message {
            author: from.id.to_string(),
            text: text.clone(),
            channel: msg.chat.id.to_string(),
        },
        _ => ChatEvent::Other(format!("non-text message in chat {}", msg.chat.id)),
    }
}

/// Convert standard Markdown to Telegram-compatible HTML using pulldown-cmark.
///
/// Telegram supports: <b>, <i>, <u>, <s>, <code>, <pre>, <a href="">, <blockquote>.
/// Raw HTML in the input (e.g. `<location>` placeholders) is shown as text.
fn markdown_to_html(text: &str) -> String {
    use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

    let options = Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(text, options);

    let mut html = String::with_capacity(text.len() + 128);

    for event in parser {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { .. } => html.push_str("\n<b>"),
                Tag::Strong => html.push_str("<b>"),
                Tag::Emphasis => html.push_str("<i>"),
                Tag::Strikethrough => html.push_str("<s>"),
                Tag::BlockQuote(_) => html.push_str("<blockquote>"),
                Tag::CodeBlock(kind) => match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => {
                        html.push_str(&format!(
                            "<pre><code class=\"language-{}\">",
                            html_escape(&lang)
                        ));
                    }
                    _ => html.push_str("<pre><code>"),
                },
                Tag::Link { dest_url, .. } => {
                    html.push_str(&format!("<a href=\"{}\">", html_escape(&dest_url)));
                }
                Tag::List(Some(start)) => html.push_str(&format!("\n{start}. ")),
                Tag::List(None) => html.push('\n'),
                Tag::Item => html.push_str("• "),
                _ => {}
            },
            Event::End(tag) => match tag {
                TagEnd::Heading(_) => html.push_str("</b>\n"),
                TagEnd::Paragraph => html.push('\n'),
                TagEnd::Strong => html.push_str("</b>"),
                TagEnd::Emphasis => html.push_str("</i>"),
                TagEnd::Strikethrough => html.push_str("</s>"),
                TagEnd::BlockQuote(_) => html.push_str("</blockquote>"),
                TagEnd::CodeBlock => html.push_str("</code></pre>"),
                TagEnd::Link => html.push_str("</a>"),
                TagEnd::Item => html.push('\n'),
                _ => {}
            },
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                html.push_str(&html_escape(&text));
            }
            Event::Code(code) => {
                html.push_str("<code>");
                html.push_str(&html_escape(&code));
                html.push_str("</code>");
            }
            Event::SoftBreak | Event::HardBreak => html.push('\n'),
            Event::Rule => html.push_str("\n---\n"),
            _ => {}
        }
    }

    html.trim().to_string()
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn split_message(text: &str) -> Vec<String> {
    if text.len() <= MAX_MESSAGE_LENGTH {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= MAX_MESSAGE_LENGTH {
            chunks.push(remaining.to_string());
            break;
        }

        let mut limit = MAX_MESSAGE_LENGTH;
        while !remaining.is_char_boundary(limit) {
            limit -= 1;
        }
        let split_at = &remaining[..limit];

        let split_pos = match split_at.rfind('\n') {
            Some(pos) => pos + 1,
            None => limit,
        };

        chunks.push(remaining[..split_pos].to_string());
        remaining = &remaining[split_pos..];
    }

    chunks
}
