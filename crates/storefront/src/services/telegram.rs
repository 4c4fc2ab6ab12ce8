//! Telegram Bot API client for staff notifications.
//!
//! Every lead, test request and order is posted to one chat. Messages use
//! HTML parse mode, so every user-supplied value goes through [`escape_html`].

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::TelegramConfig;

/// Errors that can occur when sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Bot API rejected the message.
    #[error("API error: {status} - {description}")]
    Api { status: u16, description: String },
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Bot API client bound to one chat.
///
/// Implements `Debug` manually to redact the bot token.
#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    api_url: String,
    bot_token: SecretString,
    chat_id: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_url", &self.api_url)
            .field("bot_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a new bot client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    /// Post an HTML-formatted message to the configured chat.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the bot API answers `ok: false`.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        // The URL embeds the bot token; keep it out of error messages
        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_url,
            self.bot_token.expose_secret()
        );
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)?;

        let parsed: Option<BotResponse> = serde_json::from_str(&text).ok();
        if status.is_success() && parsed.as_ref().is_some_and(|r| r.ok) {
            return Ok(());
        }

        let description = parsed
            .and_then(|r| r.description)
            .unwrap_or_else(|| text.chars().take(200).collect());
        tracing::error!(status = %status, description = %description, "Bot API rejected message");

        Err(NotifyError::Api {
            status: status.as_u16(),
            description,
        })
    }
}

/// Escape text for Telegram HTML parse mode.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Longest message the bot API accepts, counted after HTML parsing.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Longest single value or line kept in a message; the rest is cut with `…`.
pub const MAX_FIELD_LENGTH: usize = 500;

fn clip(text: &str) -> (String, usize) {
    let length = text.chars().count();
    if length <= MAX_FIELD_LENGTH {
        return (escape_html(text), length);
    }
    let kept: String = text.chars().take(MAX_FIELD_LENGTH - 1).collect();
    (format!("{}…", escape_html(&kept)), MAX_FIELD_LENGTH)
}

/// Builder for a notification: a bold title followed by labelled fields.
///
/// Tracks the visible length (markup and entities excluded) so callers can
/// stay under [`MAX_MESSAGE_LENGTH`].
#[derive(Debug, Clone, Default)]
pub struct TelegramMessage {
    lines: Vec<String>,
    visible: usize,
}

impl TelegramMessage {
    #[must_use]
    pub fn new(title: &str) -> Self {
        let (title, visible) = clip(title);
        Self::default().push(format!("<b>{title}</b>"), visible)
    }

    fn push(mut self, html: String, visible: usize) -> Self {
        if !self.lines.is_empty() {
            self.visible += 1;
        }
        self.visible += visible;
        self.lines.push(html);
        self
    }

    /// Add `Label: value`. Empty or missing values are skipped.
    #[must_use]
    pub fn field(self, label: &str, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => {
                let (value, visible) = clip(value);
                let label_len = label.chars().count() + 2;
                self.push(
                    format!("<b>{}:</b> {value}", escape_html(label)),
                    label_len + visible,
                )
            }
            None => self,
        }
    }

    /// Add a plain line.
    #[must_use]
    pub fn line(self, text: &str) -> Self {
        let (text, visible) = clip(text);
        self.push(text, visible)
    }

    /// Add an empty separator line.
    #[must_use]
    pub fn blank(self) -> Self {
        self.push(String::new(), 0)
    }

    /// Length of the message as the bot API counts it.
    #[must_use]
    pub const fn visible_len(&self) -> usize {
        self.visible
    }

    #[must_use]
    pub fn build(&self) -> String {
        self.lines.join("\n")
    }
}
