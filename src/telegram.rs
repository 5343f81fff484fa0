// src/telegram.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Telegram rejected the call: {0}")]
    Rejected(String),
}

/// Anything that can deliver a text message to a chat
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), SendError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, SendError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(SendError::Rejected(
                self.description.unwrap_or_else(|| "no description".to_string()),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BotUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Thin Bot API client: `getMe` and `sendMessage`
pub struct TelegramBot {
    client: Client,
    base: String,
}

impl TelegramBot {
    pub fn new(api_url: &str, token: &str) -> Result<Self, SendError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            base: method_base(api_url, token),
        })
    }

    /// Confirms the token is accepted; used once at startup.
    pub async fn get_me(&self) -> Result<BotUser, SendError> {
        let resp: ApiResponse<BotUser> = self
            .client
            .get(format!("{}/getMe", self.base))
            .send()
            .await?
            .json()
            .await?;
        resp.into_result()
    }
}

#[async_trait]
impl Messenger for TelegramBot {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
        debug!("sendMessage → chat {}", chat_id);
        let resp: ApiResponse<serde_json::Value> = self
            .client
            .post(format!("{}/sendMessage", self.base))
            .json(&SendMessage { chat_id, text })
            .send()
            .await?
            .json()
            .await?;
        resp.into_result().map(|_| ())
    }
}

fn method_base(api_url: &str, token: &str) -> String {
    format!("{}/bot{}", api_url.trim_end_matches('/'), token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_base_joins_without_double_slash() {
        assert_eq!(
            method_base("https://api.telegram.org/", "123:abc"),
            "https://api.telegram.org/bot123:abc"
        );
    }

    #[test]
    fn rejected_response_carries_description() {
        let resp: ApiResponse<BotUser> = serde_json::from_value(json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        }))
        .unwrap();

        match resp.into_result() {
            Err(SendError::Rejected(desc)) => assert_eq!(desc, "Unauthorized"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn get_me_result_decodes() {
        let resp: ApiResponse<BotUser> = serde_json::from_value(json!({
            "ok": true,
            "result": { "id": 42, "is_bot": true, "first_name": "w", "username": "watch_bot" }
        }))
        .unwrap();

        let user = resp.into_result().unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.username.as_deref(), Some("watch_bot"));
    }

    #[test]
    fn send_payload_shape() {
        let body = serde_json::to_value(SendMessage { chat_id: -100, text: "hi" }).unwrap();
        assert_eq!(body, json!({ "chat_id": -100, "text": "hi" }));
    }
}
