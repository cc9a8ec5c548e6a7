use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Delivers a text message to a Telegram chat.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()>;
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(bot_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("https://api.telegram.org/bot{bot_token}"),
        }
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let resp: TelegramResponse = self
            .http
            .post(format!("{}/sendMessage", self.base_url))
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
            }))
            .send()
            .await?
            .json()
            .await?;

        if resp.ok {
            Ok(())
        } else {
            Err(anyhow!(
                "telegram rejected message: {}",
                resp.description.unwrap_or_default()
            ))
        }
    }
}
