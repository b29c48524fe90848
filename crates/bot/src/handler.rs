//! Photo request orchestration.
//!
//! One inbound photo walks `Idle → Received → Downloading → Recognizing →
//! Analyzing → Reporting → Done`, or drops into `ErrorReported` from any
//! stage. Whatever happens, the user gets exactly one explanation for a
//! failure and the temporary file and processing notice are cleaned up.

use std::io::ErrorKind;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chess_core::{analysis_url, format_confidence, format_verdict};
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::analyzer::Analyzer;
use crate::clients::telegram::{largest_photo, PhotoSize};
use crate::clients::{Messenger, TextFormat};
use crate::config::Config;
use crate::error::{BotError, GENERIC_ERROR_MESSAGE};
use crate::recognition::{Recognition, RecognitionOptions, Recognizer};

pub const PROCESSING_NOTICE: &str = "Processing your photo...";

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Received,
    Downloading,
    Recognizing,
    Analyzing,
    Reporting,
    Done,
    ErrorReported,
}

#[derive(Debug, Clone)]
pub struct HandlerSettings {
    pub recognition: RecognitionOptions,
    pub analysis_url_base: String,
    /// Directory for downloaded photos
    pub temp_dir: PathBuf,
}

impl HandlerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            recognition: config.recognition,
            analysis_url_base: config.analysis_url_base.clone(),
            temp_dir: std::env::temp_dir(),
        }
    }
}

/// Per-photo unit of work. Exclusively owns the downloaded file and the
/// processing notice until [`AnalysisRequest::finalize`].
#[derive(Debug)]
pub struct AnalysisRequest {
    chat_id: i64,
    stage: Stage,
    temp_file: Option<PathBuf>,
    notice_id: Option<i64>,
}

impl AnalysisRequest {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            stage: Stage::Idle,
            temp_file: None,
            notice_id: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, stage: Stage) {
        debug!(chat_id = self.chat_id, from = ?self.stage, to = ?stage, "Photo request stage");
        self.stage = stage;
    }

    /// Delete the temporary file and the processing notice if still present.
    /// Idempotent; cleanup failures are logged and swallowed.
    pub async fn finalize(&mut self, messenger: &dyn Messenger) {
        if let Some(path) = self.temp_file.take() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "Removed temporary photo"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temporary photo"),
            }
        }
        if let Some(message_id) = self.notice_id.take() {
            if let Err(e) = messenger.delete_message(self.chat_id, message_id).await {
                warn!(chat_id = self.chat_id, error = %e, "Failed to delete processing notice");
            }
        }
    }
}

pub struct PhotoRequestHandler {
    messenger: Arc<dyn Messenger>,
    recognizer: Arc<dyn Recognizer>,
    analyzer: Arc<dyn Analyzer>,
    settings: HandlerSettings,
}

impl PhotoRequestHandler {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        recognizer: Arc<dyn Recognizer>,
        analyzer: Arc<dyn Analyzer>,
        settings: HandlerSettings,
    ) -> Self {
        Self {
            messenger,
            recognizer,
            analyzer,
            settings,
        }
    }

    /// Handle one inbound photo. Never fails: every error, panics included,
    /// ends in a single message to the user. Returns the final stage.
    pub async fn handle_photo(&self, chat_id: i64, photos: &[PhotoSize]) -> Stage {
        let mut request = AnalysisRequest::new(chat_id);
        request.advance(Stage::Received);

        let outcome = AssertUnwindSafe(self.process(&mut request, photos))
            .catch_unwind()
            .await;

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                warn!(chat_id, stage = ?request.stage, error = %e, "Photo request failed");
                Some(e.user_message())
            }
            Err(_) => {
                error!(chat_id, stage = ?request.stage, "Photo request panicked");
                Some(GENERIC_ERROR_MESSAGE.to_string())
            }
        };

        match failure {
            Some(text) => {
                request.advance(Stage::ErrorReported);
                self.deliver(chat_id, &text, TextFormat::Plain).await;
            }
            None => request.advance(Stage::Done),
        }

        request.finalize(self.messenger.as_ref()).await;
        request.stage()
    }

    async fn process(
        &self,
        request: &mut AnalysisRequest,
        photos: &[PhotoSize],
    ) -> Result<(), BotError> {
        let chat_id = request.chat_id;

        match self
            .messenger
            .send_text(chat_id, PROCESSING_NOTICE, TextFormat::Plain)
            .await
        {
            Ok(message_id) => request.notice_id = Some(message_id),
            Err(e) => warn!(chat_id, error = %e, "Failed to send processing notice"),
        }

        request.advance(Stage::Downloading);
        let photo = largest_photo(photos).ok_or(BotError::NoPhoto)?;
        let path = unique_temp_path(&self.settings.temp_dir);
        // Owned from here on, so a partial download is cleaned up too
        request.temp_file = Some(path.clone());
        self.messenger
            .download_file(&photo.file_id, &path)
            .await
            .map_err(BotError::Download)?;

        request.advance(Stage::Recognizing);
        let recognition = self
            .recognizer
            .predict(&path, &self.settings.recognition)
            .await?;
        info!(
            chat_id,
            fen = %recognition.position,
            confidence = ?recognition.confidence.map(|c| c.value()),
            "Board recognized"
        );

        request.advance(Stage::Analyzing);
        self.report_position(chat_id, &recognition).await;
        let verdict = self.analyzer.analyze(&recognition.position).await?;

        request.advance(Stage::Reporting);
        self.deliver(chat_id, &format_verdict(&verdict), TextFormat::Plain)
            .await;
        Ok(())
    }

    /// Notation, viewer link and confidence. Sent before analysis so they
    /// reach the user even if the engine fails.
    async fn report_position(&self, chat_id: i64, recognition: &Recognition) {
        let fen = &recognition.position;
        self.deliver(chat_id, &format!("FEN:\n`{fen}`"), TextFormat::Markdown)
            .await;

        let url = analysis_url(&self.settings.analysis_url_base, fen);
        self.deliver(
            chat_id,
            &format!("Open in the analysis board:\n{url}"),
            TextFormat::Plain,
        )
        .await;

        if let Some(confidence) = recognition.confidence {
            self.deliver(chat_id, &format_confidence(confidence), TextFormat::Plain)
                .await;
        }
    }

    /// Send a message; failures are logged and never retried.
    async fn deliver(&self, chat_id: i64, text: &str, format: TextFormat) {
        if let Err(e) = self.messenger.send_text(chat_id, text, format).await {
            warn!(chat_id, error = %e, "Failed to deliver message");
        }
    }
}

/// A file name unique across concurrent requests: process id, wall-clock
/// nanoseconds and a process-wide sequence number.
fn unique_temp_path(dir: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    dir.join(format!("board_{}_{nanos}_{seq}.jpg", std::process::id()))
}
