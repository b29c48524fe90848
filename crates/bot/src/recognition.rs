//! Call boundary to the external board recognizer.
//!
//! The recognizer is an opaque collaborator: given an image path it returns
//! a FEN and, optionally, a confidence in [0, 1]. It runs as a separate
//! command and answers on stdout with either
//! `{"fen": "...", "confidence": 0.97}` or a bare FEN on its last line.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chess_core::confidence::ConfidenceError;
use chess_core::{ConfidenceScore, PositionDescriptor};
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("recognizer could not be started: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("recognizer timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Confidence(#[from] ConfidenceError),
}

/// Recognizer switches. New options go here, not into call signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognitionOptions {
    pub quiet: bool,
    pub debug: bool,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            quiet: true,
            debug: false,
        }
    }
}

/// What the recognizer saw in one photo
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub position: PositionDescriptor,
    pub confidence: Option<ConfidenceScore>,
}

/// Turns a photo into a position. No retries: a failure is final for the request.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn predict(
        &self,
        image: &Path,
        options: &RecognitionOptions,
    ) -> Result<Recognition, RecognitionError>;
}

/// Runs `program [args..] <image> [--quiet] [--debug]` and reads its stdout.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }
}

#[async_trait]
impl Recognizer for CommandRecognizer {
    async fn predict(
        &self,
        image: &Path,
        options: &RecognitionOptions,
    ) -> Result<Recognition, RecognitionError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(image)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if options.quiet {
            command.arg("--quiet");
        }
        if options.debug {
            command.arg("--debug");
        }

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| RecognitionError::Timeout(self.timeout))?
            .map_err(RecognitionError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            return Err(RecognitionError::Failed(format!(
                "recognizer exited with {}: {}",
                output.status,
                detail.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(stdout = %stdout.trim(), "Recognizer output");
        parse_output(&stdout)
    }
}

#[derive(Deserialize)]
struct RecognizerOutput {
    fen: String,
    confidence: Option<f64>,
}

/// Parse recognizer stdout: a JSON object or a bare FEN on the last non-empty line.
pub(crate) fn parse_output(stdout: &str) -> Result<Recognition, RecognitionError> {
    let last = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| RecognitionError::Failed("recognizer produced no output".into()))?;

    let (fen, confidence) = if last.starts_with('{') {
        let parsed: RecognizerOutput = serde_json::from_str(last)
            .map_err(|e| RecognitionError::Failed(format!("unreadable recognizer output: {e}")))?;
        (parsed.fen, parsed.confidence)
    } else {
        (last.to_string(), None)
    };

    if fen.trim().is_empty() {
        return Err(RecognitionError::Failed("recognizer returned an empty position".into()));
    }

    Ok(Recognition {
        position: PositionDescriptor::new(fen),
        confidence: confidence.map(ConfidenceScore::new).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_output() {
        let out = "loading model...\n{\"fen\": \"8/8/8/8/8/8/8/K6k w - - 0 1\", \"confidence\": 0.91}\n";
        let r = parse_output(out).unwrap();
        assert_eq!(r.position.as_str(), "8/8/8/8/8/8/8/K6k w - - 0 1");
        assert_eq!(r.confidence.unwrap().value(), 0.91);
    }

    #[test]
    fn test_parse_bare_fen() {
        let r = parse_output("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR\n\n").unwrap();
        assert_eq!(
            r.position.as_str(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1"
        );
        assert_eq!(r.confidence, None);
    }

    #[test]
    fn test_bad_output_is_a_failure() {
        assert!(matches!(parse_output("  \n"), Err(RecognitionError::Failed(_))));
        assert!(matches!(parse_output("{\"fen\": 3}"), Err(RecognitionError::Failed(_))));
        assert!(matches!(
            parse_output("{\"fen\": \"8/8/8/8/8/8/8/K6k w - - 0 1\", \"confidence\": 1.5}"),
            Err(RecognitionError::Confidence(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_recognizer_passes_flags() {
        let recognizer = CommandRecognizer::new(
            "/bin/sh",
            vec![
                "-c".into(),
                "case \"$*\" in \
                   \"/tmp/board.png --quiet\") echo 'model loaded'; echo 'K6k/8/8/8/8/8/8/8 w - - 0 1' ;; \
                   *) echo \"unexpected arguments: $*\" >&2; exit 2 ;; \
                 esac"
                    .into(),
                "recognize".into(),
            ],
            Duration::from_secs(10),
        );
        let r = recognizer
            .predict(Path::new("/tmp/board.png"), &RecognitionOptions::default())
            .await
            .unwrap();
        assert_eq!(r.position.as_str(), "K6k/8/8/8/8/8/8/8 w - - 0 1");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_recognizer_failure_carries_cause() {
        let recognizer = CommandRecognizer::new(
            "/bin/sh",
            vec!["-c".into(), "echo 'no chessboard found' >&2; exit 1".into()],
            Duration::from_secs(10),
        );
        let err = recognizer
            .predict(Path::new("/tmp/board.png"), &RecognitionOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no chessboard found"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_recognizer_times_out() {
        let recognizer = CommandRecognizer::new(
            "/bin/sh",
            vec!["-c".into(), "sleep 5".into()],
            Duration::from_millis(100),
        );
        let err = recognizer
            .predict(Path::new("/tmp/board.png"), &RecognitionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionError::Timeout(_)));
    }
}
