//! Telegram Bot API client

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::{Messenger, TextFormat};

/// Seconds a `getUpdates` call may be held open by the server
pub const LONG_POLL_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Telegram API returned no result for {0}")]
    MissingResult(&'static str),

    #[error("Failed to write downloaded file: {0}")]
    Io(#[from] std::io::Error),
}

impl TelegramError {
    /// Errors retrying cannot fix: bad token, or the bot was removed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TelegramError::Api { code: 401 | 404, .. })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhotoSize {
    pub file_id: String,
    #[serde(default)]
    pub file_unique_id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// Largest-resolution variant of a photo (pixel area, then file size).
pub fn largest_photo(sizes: &[PhotoSize]) -> Option<&PhotoSize> {
    sizes.iter().max_by_key(|p| {
        (
            u64::from(p.width) * u64::from(p.height),
            p.file_size.unwrap_or(0),
        )
    })
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct File {
    file_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, TelegramError> {
        // Must outlive a long poll
        let client = Client::builder()
            .user_agent("BoardSight/1.0")
            .timeout(Duration::from_secs(LONG_POLL_SECS + 30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, TelegramError> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        let resp: ApiResponse<T> = self.client.post(&url).json(&params).send().await?.json().await?;

        if !resp.ok {
            return Err(TelegramError::Api {
                code: resp.error_code.unwrap_or(0),
                description: resp.description.unwrap_or_default(),
            });
        }
        resp.result.ok_or(TelegramError::MissingResult(method))
    }

    /// Startup handshake: validates the token.
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", json!({})).await
    }

    /// Long-poll for updates newer than `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": LONG_POLL_SECS,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn set_webhook(&self, url: &str) -> Result<(), TelegramError> {
        self.call::<bool>("setWebhook", json!({ "url": url, "allowed_updates": ["message"] }))
            .await
            .map(|_| ())
    }

    pub async fn delete_webhook(&self) -> Result<(), TelegramError> {
        self.call::<bool>("deleteWebhook", json!({})).await.map(|_| ())
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        format: TextFormat,
    ) -> Result<i64, TelegramError> {
        let mut params = json!({ "chat_id": chat_id, "text": text });
        if format == TextFormat::Markdown {
            params["parse_mode"] = json!("Markdown");
        }
        let message: Message = self.call("sendMessage", params).await?;
        Ok(message.message_id)
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TelegramError> {
        self.call::<bool>(
            "deleteMessage",
            json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await
        .map(|_| ())
    }

    async fn download_file(&self, file_id: &str, dest: &Path) -> Result<(), TelegramError> {
        let file: File = self.call("getFile", json!({ "file_id": file_id })).await?;
        let file_path = file.file_path.ok_or(TelegramError::MissingResult("getFile"))?;

        let url = format!("{}/file/bot{}/{}", self.base_url, self.token, file_path);
        let bytes = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}
