//! Bot configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use uci_engine::{EngineCommand, EngineOptions, SearchLimits};

use crate::error::ConfigError;
use crate::recognition::RecognitionOptions;

/// How updates reach the bot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    Polling,
    Webhook,
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Bot secret token
    pub bot_token: String,

    pub transport: Transport,

    /// Externally reachable URL, used for webhook registration and self-ping
    pub public_url: Option<String>,

    pub host: String,
    pub port: u16,

    /// Bot API base URL
    pub telegram_api_url: String,

    pub engine_command: EngineCommand,
    pub engine_options: EngineOptions,
    pub search_limits: SearchLimits,

    /// Recognizer executable and its leading arguments
    pub recognizer_path: PathBuf,
    pub recognizer_args: Vec<String>,
    pub recognition: RecognitionOptions,
    pub recognizer_timeout: Duration,

    /// Prefix of the third-party analysis board link
    pub analysis_url_base: String,

    /// Self-ping interval, `None` when the prober is disabled
    pub keepalive_interval: Option<Duration>,

    /// Delay before a crashed task is restarted
    pub restart_backoff: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = var("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let transport = match var("TRANSPORT").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("polling") => Transport::Polling,
            Some("webhook") => Transport::Webhook,
            Some(_) => return Err(ConfigError::Invalid("TRANSPORT")),
        };

        let public_url = var("PUBLIC_URL").map(|u| u.trim_end_matches('/').to_string());
        if transport == Transport::Webhook && public_url.is_none() {
            return Err(ConfigError::Missing("PUBLIC_URL"));
        }

        let parsed = |key: &'static str| -> Result<Option<u64>, ConfigError> {
            var(key)
                .map(|v| v.trim().parse().map_err(|_| ConfigError::Invalid(key)))
                .transpose()
        };

        let defaults = EngineOptions::default();
        let engine_options = EngineOptions {
            threads: parse_or(&var, "ENGINE_THREADS", defaults.threads)?,
            hash_mb: parse_or(&var, "ENGINE_HASH_MB", defaults.hash_mb)?,
            skill_level: parse_or(&var, "ENGINE_SKILL_LEVEL", defaults.skill_level)?,
            move_overhead_ms: parse_or(&var, "ENGINE_MOVE_OVERHEAD_MS", defaults.move_overhead_ms)?,
            ..defaults
        };

        let movetime_secs: f64 = parse_or(&var, "ENGINE_MOVETIME_SECS", 5.0)?;
        if !movetime_secs.is_finite() || movetime_secs <= 0.0 {
            return Err(ConfigError::Invalid("ENGINE_MOVETIME_SECS"));
        }
        let search_limits = SearchLimits {
            depth: parse_or(&var, "ENGINE_DEPTH", SearchLimits::default().depth)?,
            movetime: Duration::from_secs_f64(movetime_secs),
        };

        let engine_command = EngineCommand::new(
            var("STOCKFISH_PATH").unwrap_or_else(|| "./stockfish".to_string()),
        )
        .with_args(split_args(var("STOCKFISH_ARGS")));

        let recognizer_path =
            PathBuf::from(var("RECOGNIZER_PATH").unwrap_or_else(|| "./recognize".to_string()));

        let debug: bool = parse_or(&var, "RECOGNIZER_DEBUG", false)?;

        let keepalive_enabled: bool = parse_or(&var, "KEEPALIVE", public_url.is_some())?;
        let keepalive_secs = parsed("KEEPALIVE_INTERVAL_SECS")?.unwrap_or(14 * 60);
        if keepalive_secs == 0 {
            return Err(ConfigError::Invalid("KEEPALIVE_INTERVAL_SECS"));
        }
        let keepalive_interval = (keepalive_enabled && public_url.is_some())
            .then(|| Duration::from_secs(keepalive_secs));

        Ok(Self {
            bot_token,
            transport,
            public_url,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&var, "PORT", 8080)?,
            telegram_api_url: var("TELEGRAM_API_URL")
                .unwrap_or_else(|| "https://api.telegram.org".to_string())
                .trim_end_matches('/')
                .to_string(),
            engine_command,
            engine_options,
            search_limits,
            recognizer_path,
            recognizer_args: split_args(var("RECOGNIZER_ARGS")),
            recognition: RecognitionOptions {
                quiet: !debug,
                debug,
            },
            recognizer_timeout: Duration::from_secs(parsed("RECOGNIZER_TIMEOUT_SECS")?.unwrap_or(60)),
            analysis_url_base: var("ANALYSIS_URL_BASE")
                .unwrap_or_else(|| "https://lichess.org/analysis/standard/".to_string()),
            keepalive_interval,
            restart_backoff: Duration::from_secs(parsed("RESTART_BACKOFF_SECS")?.unwrap_or(30)),
        })
    }

    /// Path the webhook is served on
    pub fn webhook_path(&self) -> String {
        format!("/{}", self.bot_token)
    }
}

fn parse_or<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn split_args(value: Option<String>) -> Vec<String> {
    value
        .map(|v| v.split_whitespace().map(String::from).collect())
        .unwrap_or_default()
}
