//! Delivers the final recommendation to a Telegram chat.

use crate::config;
use crate::error::AnalyzerError;
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;

/// Telegram bot client bound to one chat
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(config::TELEGRAM_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            bot_token,
            chat_id,
        })
    }

    /// Notifier from TELEGRAM_SECRET_TOKEN and TELEGRAM_CHAT_ID, None if either is unset
    pub fn from_env() -> Result<Option<Self>> {
        match (config::get_telegram_token(), config::get_telegram_chat_id()) {
            (Some(token), Some(chat_id)) => Ok(Some(Self::new(token, chat_id)?)),
            _ => Ok(None),
        }
    }

    /// Send a plain text message. Single attempt.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let url = config::telegram_send_message_url(&self.bot_token);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Telegram request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(
                AnalyzerError::Request(format!("Telegram API error {}: {}", status, error_text))
                    .into(),
            );
        }

        Ok(())
    }
}
