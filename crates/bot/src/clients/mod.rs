pub mod telegram;

use std::path::Path;

use async_trait::async_trait;

use telegram::TelegramError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    Markdown,
}

/// Outbound side of the messaging service, as seen by request handling.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a message and return its id.
    async fn send_text(&self, chat_id: i64, text: &str, format: TextFormat)
        -> Result<i64, TelegramError>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TelegramError>;

    /// Fetch an uploaded file into `dest`.
    async fn download_file(&self, file_id: &str, dest: &Path) -> Result<(), TelegramError>;
}
