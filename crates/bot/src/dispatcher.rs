//! Routes inbound updates to command replies or the photo handler.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::clients::telegram::Update;
use crate::clients::{Messenger, TextFormat};
use crate::handler::PhotoRequestHandler;

pub const START_TEXT: &str = "Hello! I am a chessboard recognition bot. \
    Send me a photo of a chessboard and I will reply with its FEN and the best move.";

pub const HELP_TEXT: &str = "Usage:\n\
    1. Send me a photo of a chessboard\n\
    2. I will show you the FEN and the best move\n\
    3. /start - start the bot\n\
    4. /help - show this help message";

/// Shared by both transports; owns nothing but handles to collaborators.
pub struct Dispatcher {
    messenger: Arc<dyn Messenger>,
    photos: Arc<PhotoRequestHandler>,
}

impl Dispatcher {
    pub fn new(messenger: Arc<dyn Messenger>, photos: Arc<PhotoRequestHandler>) -> Self {
        Self { messenger, photos }
    }

    pub async fn dispatch(&self, update: Update) {
        let Some(message) = update.message else {
            debug!(update_id = update.update_id, "Ignoring non-message update");
            return;
        };
        let chat_id = message.chat.id;

        if let Some(photos) = message.photo.as_deref().filter(|p| !p.is_empty()) {
            let stage = self.photos.handle_photo(chat_id, photos).await;
            debug!(chat_id, ?stage, "Photo request finished");
            return;
        }

        let reply = match message.text.as_deref().and_then(command_name) {
            Some("start") => START_TEXT,
            Some("help") => HELP_TEXT,
            _ => {
                debug!(chat_id, "Ignoring message without photo or known command");
                return;
            }
        };
        if let Err(e) = self.messenger.send_text(chat_id, reply, TextFormat::Plain).await {
            warn!(chat_id, error = %e, "Failed to reply to command");
        }
    }
}

/// "/help@SomeBot extra" -> "help"
fn command_name(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    let command = first.strip_prefix('/')?;
    command.split('@').next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_name() {
        assert_eq!(command_name("/start"), Some("start"));
        assert_eq!(command_name("/help@BoardSightBot now"), Some("help"));
        assert_eq!(command_name("hello"), None);
        assert_eq!(command_name(""), None);
    }
}
