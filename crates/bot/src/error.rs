//! Bot error types

use thiserror::Error;
use uci_engine::EngineError;

use crate::clients::telegram::TelegramError;
use crate::recognition::RecognitionError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0} not set")]
    Missing(&'static str),

    #[error("Configuration error: {0} has an invalid value")]
    Invalid(&'static str),
}

/// Failures of a single photo request. Each maps to exactly one message
/// shown to the user.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Message has no photo")]
    NoPhoto,

    #[error("Photo download failed: {0}")]
    Download(#[source] TelegramError),

    #[error("Temporary file error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Recognition(#[from] RecognitionError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Shown when a request fails in a way no category covers (e.g. a panic).
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong while processing your photo. Please try again.";

impl BotError {
    /// Text sent to the user for this failure
    pub fn user_message(&self) -> String {
        match self {
            BotError::NoPhoto => "I could not find a photo in your message.".to_string(),
            BotError::Download(_) | BotError::Io(_) => {
                "I could not download your photo. Please send it again.".to_string()
            }
            BotError::Recognition(e) => {
                format!("I could not recognize a chessboard in this photo: {e}")
            }
            BotError::Engine(EngineError::InvalidPosition(e)) => {
                format!("The recognized position is not a legal chess position: {e}")
            }
            BotError::Engine(EngineError::Unavailable(_)) => {
                "The analysis engine is currently unavailable. Please try again later.".to_string()
            }
            BotError::Engine(EngineError::Failed(e)) => {
                format!("An error occurred while analyzing the position: {e}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_category_has_its_own_message() {
        let messages = [
            BotError::NoPhoto.user_message(),
            BotError::Io(std::io::Error::other("disk full")).user_message(),
            BotError::Recognition(RecognitionError::Failed("no board".into())).user_message(),
            BotError::Engine(EngineError::Unavailable("missing".into())).user_message(),
            BotError::Engine(EngineError::Failed("crashed".into())).user_message(),
        ];
        assert!(messages[2].contains("recognize"));
        assert!(messages[2].contains("no board"));
        assert!(messages[4].contains("analyzing"));
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
