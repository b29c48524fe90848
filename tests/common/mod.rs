#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bot::analyzer::Analyzer;
use bot::clients::telegram::{PhotoSize, TelegramError};
use bot::clients::{Messenger, TextFormat};
use bot::dispatcher::Dispatcher;
use bot::handler::{HandlerSettings, PhotoRequestHandler};
use bot::recognition::{Recognition, RecognitionError, RecognitionOptions, Recognizer};
use chess_core::{
    ConfidenceScore, EngineVerdict, PositionDescriptor, PositionError, Score, Variation, Wdl,
};
use reqwest::Client;
use uci_engine::EngineError;

pub const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
pub const ANALYSIS_BASE: &str = "https://lichess.org/analysis/standard/";
pub const CHAT: i64 = 4242;

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}

// ---------------------------------------------------------------------------
// Messenger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub chat_id: i64,
    pub text: String,
    pub format: TextFormat,
    pub message_id: i64,
}

/// Records everything sent; downloads write a small fake image.
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<Sent>>,
    pub deleted: Mutex<Vec<i64>>,
    pub downloads: Mutex<Vec<PathBuf>>,
    pub fail_notice: bool,
    pub fail_download: bool,
    pub next_id: AtomicI64,
}

impl RecordingMessenger {
    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|s| s.text.clone()).collect()
    }

    /// Texts other than the processing notice
    pub fn replies(&self) -> Vec<String> {
        self.texts()
            .into_iter()
            .filter(|t| t != bot::handler::PROCESSING_NOTICE)
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        format: TextFormat,
    ) -> Result<i64, TelegramError> {
        if self.fail_notice && text == bot::handler::PROCESSING_NOTICE {
            return Err(TelegramError::Api {
                code: 429,
                description: "Too Many Requests".into(),
            });
        }
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent.lock().unwrap().push(Sent {
            chat_id,
            text: text.to_string(),
            format,
            message_id,
        });
        Ok(message_id)
    }

    async fn delete_message(&self, _chat_id: i64, message_id: i64) -> Result<(), TelegramError> {
        self.deleted.lock().unwrap().push(message_id);
        Ok(())
    }

    async fn download_file(&self, _file_id: &str, dest: &Path) -> Result<(), TelegramError> {
        self.downloads.lock().unwrap().push(dest.to_path_buf());
        if self.fail_download {
            return Err(TelegramError::MissingResult("getFile"));
        }
        tokio::fs::write(dest, b"\xff\xd8fake-jpeg").await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recognizer
// ---------------------------------------------------------------------------

pub struct StubRecognizer {
    outcome: Result<Recognition, String>,
    pub seen: Mutex<Vec<(PathBuf, bool)>>,
}

impl StubRecognizer {
    pub fn recognizes(fen: &str, confidence: Option<f64>) -> Self {
        Self {
            outcome: Ok(Recognition {
                position: PositionDescriptor::new(fen),
                confidence: confidence.map(|c| ConfidenceScore::new(c).unwrap()),
            }),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn fails(reason: &str) -> Self {
        Self {
            outcome: Err(reason.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Paths handed to the recognizer and whether the file existed at the time
    pub fn seen(&self) -> Vec<(PathBuf, bool)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Recognizer for StubRecognizer {
    async fn predict(
        &self,
        image: &Path,
        _options: &RecognitionOptions,
    ) -> Result<Recognition, RecognitionError> {
        self.seen
            .lock()
            .unwrap()
            .push((image.to_path_buf(), image.exists()));
        self.outcome
            .clone()
            .map_err(RecognitionError::Failed)
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

enum AnalyzerOutcome {
    Verdict(EngineVerdict),
    Failed(String),
    Unavailable(String),
    IllegalPosition(String),
    Panic(String),
}

pub struct StubAnalyzer {
    outcome: AnalyzerOutcome,
    pub calls: AtomicUsize,
}

impl StubAnalyzer {
    fn with(outcome: AnalyzerOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn returns(verdict: EngineVerdict) -> Self {
        Self::with(AnalyzerOutcome::Verdict(verdict))
    }

    /// Fails mid-search
    pub fn crashes(reason: &str) -> Self {
        Self::with(AnalyzerOutcome::Failed(reason.to_string()))
    }

    /// Engine could not be started
    pub fn unavailable(reason: &str) -> Self {
        Self::with(AnalyzerOutcome::Unavailable(reason.to_string()))
    }

    pub fn rejects_position(reason: &str) -> Self {
        Self::with(AnalyzerOutcome::IllegalPosition(reason.to_string()))
    }

    /// Panics instead of returning
    pub fn panics(message: &str) -> Self {
        Self::with(AnalyzerOutcome::Panic(message.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyzer for StubAnalyzer {
    async fn analyze(&self, _position: &PositionDescriptor) -> Result<EngineVerdict, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            AnalyzerOutcome::Verdict(verdict) => Ok(verdict.clone()),
            AnalyzerOutcome::Failed(reason) => Err(EngineError::Failed(reason.clone())),
            AnalyzerOutcome::Unavailable(reason) => Err(EngineError::Unavailable(reason.clone())),
            AnalyzerOutcome::IllegalPosition(reason) => Err(EngineError::InvalidPosition(
                PositionError::IllegalPosition(reason.clone()),
            )),
            AnalyzerOutcome::Panic(message) => panic!("{message}"),
        }
    }
}

/// e4 at depth 15, -3.50 for the side to move
pub fn losing_verdict() -> EngineVerdict {
    EngineVerdict {
        best_move: "e4".into(),
        score: Some(Score::Centipawns(-350)),
        variation: Variation {
            first_move_number: 1,
            white_to_move: true,
            moves: vec!["e4".into(), "e5".into()],
        },
        depth: Some(15),
        wdl: Some(Wdl {
            win: 4,
            draw: 31,
            loss: 65,
        }),
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub fn photo(file_id: &str, side: u32) -> PhotoSize {
    PhotoSize {
        file_id: file_id.to_string(),
        file_unique_id: format!("u-{file_id}"),
        width: side,
        height: side,
        file_size: Some(u64::from(side) * 10),
    }
}

pub fn photos() -> Vec<PhotoSize> {
    vec![photo("thumb", 90), photo("full", 1280), photo("medium", 320)]
}

pub fn handler(
    messenger: Arc<RecordingMessenger>,
    recognizer: Arc<dyn Recognizer>,
    analyzer: Arc<dyn Analyzer>,
    temp_dir: &Path,
) -> PhotoRequestHandler {
    PhotoRequestHandler::new(
        messenger,
        recognizer,
        analyzer,
        HandlerSettings {
            recognition: RecognitionOptions::default(),
            analysis_url_base: ANALYSIS_BASE.to_string(),
            temp_dir: temp_dir.to_path_buf(),
        },
    )
}

pub fn dispatcher(
    messenger: Arc<RecordingMessenger>,
    recognizer: Arc<dyn Recognizer>,
    analyzer: Arc<dyn Analyzer>,
    temp_dir: &Path,
) -> Arc<Dispatcher> {
    let photos = Arc::new(handler(messenger.clone(), recognizer, analyzer, temp_dir));
    Arc::new(Dispatcher::new(messenger, photos))
}

/// Number of entries left in a directory
pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
