//! UCI engine session (async I/O). One process per evaluation.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};

use chess_core::notation::{uci_line_to_variation, uci_to_san};
use chess_core::{EngineVerdict, PositionDescriptor, Score, Wdl};

use crate::error::EngineError;

/// Plies of the principal variation kept in a verdict
pub const PV_PREVIEW_PLIES: usize = 2;

/// Extra time past movetime + move overhead before `stop` is sent
const SEARCH_GRACE: Duration = Duration::from_secs(2);
/// Time allowed for `bestmove` after `stop`
const STOP_GRACE: Duration = Duration::from_secs(2);
const QUIT_TIMEOUT: Duration = Duration::from_secs(2);

/// How to launch the engine executable.
#[derive(Debug, Clone)]
pub struct EngineCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl EngineCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Option profile applied right after the handshake.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub threads: u32,
    pub hash_mb: u32,
    pub skill_level: u32,
    pub move_overhead_ms: u32,
    pub show_wdl: bool,
    pub handshake_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            hash_mb: 32,
            skill_level: 20,
            move_overhead_ms: 1000,
            show_wdl: true,
            handshake_timeout: Duration::from_secs(10),
        }
    }
}

impl EngineOptions {
    fn setoption_commands(&self) -> Vec<String> {
        vec![
            format!("setoption name Threads value {}", self.threads),
            format!("setoption name Hash value {}", self.hash_mb),
            format!("setoption name Skill Level value {}", self.skill_level),
            format!("setoption name Move Overhead value {}", self.move_overhead_ms),
            format!("setoption name UCI_ShowWDL value {}", self.show_wdl),
            "setoption name Ponder value false".to_string(),
            "setoption name MultiPV value 1".to_string(),
        ]
    }
}

/// Search bounds; the engine stops at whichever is reached first.
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub depth: u32,
    pub movetime: Duration,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            depth: 15,
            movetime: Duration::from_secs(5),
        }
    }
}

/// Latest principal-variation info reported during a search
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SearchInfo {
    pub depth: Option<u32>,
    pub score: Option<Score>,
    pub wdl: Option<Wdl>,
    pub pv: Vec<String>,
}

/// A running engine process
pub struct EngineSession {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    move_overhead: Duration,
}

impl EngineSession {
    /// Spawn the engine, run the UCI handshake and apply the option profile.
    pub async fn open(
        command: &EngineCommand,
        options: &EngineOptions,
    ) -> Result<Self, EngineError> {
        let mut process = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EngineError::Unavailable(format!(
                    "failed to spawn {}: {e}",
                    command.program.display()
                ))
            })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| EngineError::Unavailable("engine stdout not captured".into()))?;

        let mut session = Self {
            process,
            stdin,
            stdout,
            move_overhead: Duration::from_millis(u64::from(options.move_overhead_ms)),
        };

        let outcome = timeout(options.handshake_timeout, session.handshake(options)).await;
        let failure = match outcome {
            Ok(Ok(())) => return Ok(session),
            Ok(Err(EngineError::Failed(msg))) => msg,
            Ok(Err(e)) => e.to_string(),
            Err(_) => "handshake timed out".to_string(),
        };
        session.close().await;
        Err(EngineError::Unavailable(failure))
    }

    async fn handshake(&mut self, options: &EngineOptions) -> Result<(), EngineError> {
        self.send("uci").await?;
        self.wait_for("uciok").await?;
        for cmd in options.setoption_commands() {
            self.send(&cmd).await?;
        }
        self.send("isready").await?;
        self.wait_for("readyok").await
    }

    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        debug!(cmd, "UCI <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| EngineError::Failed(format!("failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| EngineError::Failed(format!("failed to flush engine stdin: {e}")))
    }

    async fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| EngineError::Failed(format!("failed to read from engine: {e}")))?;
        if read == 0 {
            return Err(EngineError::Failed("engine process exited".into()));
        }
        let trimmed = line.trim().to_string();
        debug!(line = %trimmed, "UCI >");
        Ok(trimmed)
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), EngineError> {
        while self.read_line().await? != expected {}
        Ok(())
    }

    /// Evaluate a position, bounded by both depth and wall-clock time.
    /// The descriptor is validated before anything is sent to the engine.
    pub async fn evaluate(
        &mut self,
        position: &PositionDescriptor,
        limits: SearchLimits,
    ) -> Result<EngineVerdict, EngineError> {
        let pos = position.to_position()?;

        self.send(&format!("position fen {position}")).await?;
        self.send(&format!(
            "go depth {} movetime {}",
            limits.depth,
            limits.movetime.as_millis()
        ))
        .await?;

        let deadline = Instant::now() + limits.movetime + self.move_overhead + SEARCH_GRACE;
        let mut info = SearchInfo::default();
        let best = match timeout_at(deadline, self.read_until_bestmove(&mut info)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(depth = limits.depth, "Engine exceeded its time ceiling, sending stop");
                self.send("stop").await?;
                timeout(STOP_GRACE, self.read_until_bestmove(&mut info))
                    .await
                    .map_err(|_| EngineError::Failed("engine did not answer within its time ceiling".into()))??
            }
        };

        if best == "(none)" {
            return Err(EngineError::Failed("engine reported no best move".into()));
        }
        let best_move = uci_to_san(&pos, &best)
            .ok_or_else(|| EngineError::Failed(format!("engine returned illegal move {best}")))?;

        let pv = if info.pv.first() == Some(&best) {
            info.pv
        } else {
            vec![best]
        };

        Ok(EngineVerdict {
            best_move,
            score: info.score,
            variation: uci_line_to_variation(&pos, &pv, PV_PREVIEW_PLIES),
            depth: info.depth,
            wdl: info.wdl,
        })
    }

    /// Read search output until `bestmove`, keeping the latest PV info.
    async fn read_until_bestmove(&mut self, info: &mut SearchInfo) -> Result<String, EngineError> {
        loop {
            let line = self.read_line().await?;
            if let Some(parsed) = parse_info(&line) {
                *info = parsed;
            } else if let Some(rest) = line.strip_prefix("bestmove") {
                return rest
                    .split_whitespace()
                    .next()
                    .map(String::from)
                    .ok_or_else(|| EngineError::Failed("malformed bestmove line".into()));
            }
        }
    }

    /// Send quit and wait for the process to exit, killing it if it lingers.
    pub async fn close(mut self) {
        let _ = self.send("quit").await;
        if timeout(QUIT_TIMEOUT, self.process.wait()).await.is_err() {
            warn!("Engine ignored quit, killing process");
            let _ = self.process.kill().await;
        }
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Parse an `info` line that carries a principal variation. Bound-only
/// scores and secondary multipv lines are ignored.
pub(crate) fn parse_info(line: &str) -> Option<SearchInfo> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "info" {
        return None;
    }

    let mut info = SearchInfo::default();
    let mut has_pv = false;

    while let Some(token) = tokens.next() {
        match token {
            "depth" => info.depth = tokens.next().and_then(|v| v.parse().ok()),
            "multipv" => {
                if tokens.next() != Some("1") {
                    return None;
                }
            }
            "score" => {
                let kind = tokens.next()?;
                let value: i32 = tokens.next()?.parse().ok()?;
                info.score = match kind {
                    "cp" => Some(Score::Centipawns(value)),
                    "mate" => Some(Score::Mate(value)),
                    _ => None,
                };
            }
            "lowerbound" | "upperbound" => return None,
            "wdl" => {
                let mut next = || tokens.next().and_then(|v| v.parse::<u32>().ok());
                let (w, d, l) = (next()?, next()?, next()?);
                info.wdl = Wdl::from_permille(w, d, l);
            }
            "pv" => {
                info.pv = tokens
                    .by_ref()
                    .take_while(|t| *t != "string" && !t.starts_with("bmc"))
                    .map(String::from)
                    .collect();
                has_pv = true;
            }
            "string" => break,
            _ => {}
        }
    }

    has_pv.then_some(info)
}
