//! Runtime configuration loading from environment variables and trace files.
//!
//! All configuration values are loaded from `GG_STREAM_*` environment
//! variables with sensible defaults. Invalid values fall back to defaults
//! without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `GG_STREAM_MAX_TOKENS` | 10000000 | Token budget when a run sets none |
//! | `GG_STREAM_CHANNEL_CAPACITY` | 16 | Buffered results per async stream |
//! | `GG_STREAM_LOG_LEVEL` | info | Log filter directive |
//! | `GG_STREAM_LOG_FORMAT` | json | `json` or `pretty` |
//! | `GG_STREAM_LOG_FILE` | (stderr) | Optional log file path |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{
    GenerationConfig, GenerationError, ScriptedStep, VocabPiece, VocabTokenizer,
    DEFAULT_MAX_TOKENS,
};
use crate::telemetry::{LogConfig, LogFormat};

/// Effective runtime configuration summary (serializable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    pub max_tokens: usize,
    pub channel_capacity: usize,
    pub log_level: String,
    pub log_format: String,
    pub log_file: Option<PathBuf>,
}

/// All runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub default_max_tokens: usize,
    pub channel_capacity: usize,
    pub log: LogConfig,
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Load logging configuration from environment.
fn load_log_config() -> LogConfig {
    let defaults = LogConfig::default();
    let level = std::env::var("GG_STREAM_LOG_LEVEL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(defaults.level);
    let format = std::env::var("GG_STREAM_LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse::<LogFormat>().ok())
        .unwrap_or(defaults.format);
    let output_path = std::env::var_os("GG_STREAM_LOG_FILE").map(PathBuf::from);
    LogConfig { format, level, output_path }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> EnvConfig {
    let default_max_tokens = parse_usize("GG_STREAM_MAX_TOKENS", DEFAULT_MAX_TOKENS);
    let channel_capacity = parse_usize("GG_STREAM_CHANNEL_CAPACITY", 16).max(1);

    EnvConfig {
        default_max_tokens,
        channel_capacity,
        log: load_log_config(),
    }
}

impl EnvConfig {
    /// Return a serializable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        let log_format = match self.log.format {
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        };
        EffectiveConfig {
            max_tokens: self.default_max_tokens,
            channel_capacity: self.channel_capacity,
            log_level: self.log.level.clone(),
            log_format: log_format.to_string(),
            log_file: self.log.output_path.clone(),
        }
    }
}

/// Errors from loading a replay trace.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Failed to read trace file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse trace file: {0}")]
    Parse(String),
    #[error(transparent)]
    Invalid(#[from] GenerationError),
}

/// Generation settings inside a trace; `max_tokens` falls back to the
/// environment default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraceSettings {
    #[serde(default)]
    pub stop_strings: Vec<String>,
    #[serde(default)]
    pub max_tokens: Option<usize>,
    #[serde(default)]
    pub top_logprobs: usize,
}

/// A recorded generation: vocabulary, settings and the token steps.
///
/// ```toml
/// vocab = ["Hello", " world", "</s>", [240, 159], [140], [159]]
/// eos_token = 2
///
/// [generation]
/// stop_strings = [" world"]
/// top_logprobs = 2
///
/// [[steps]]
/// token = 0
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TraceFile {
    pub vocab: Vec<VocabPiece>,
    #[serde(default)]
    pub eos_token: Option<u32>,
    #[serde(default)]
    pub generation: TraceSettings,
    #[serde(default)]
    pub steps: Vec<ScriptedStep>,
}

impl TraceFile {
    pub fn from_toml_str(raw: &str) -> Result<Self, TraceError> {
        toml::from_str(raw).map_err(|e| TraceError::Parse(e.to_string()))
    }

    /// Build the vocabulary tokenizer the trace was recorded with.
    pub fn tokenizer(&self) -> VocabTokenizer {
        let tokenizer = VocabTokenizer::new(self.vocab.iter().cloned());
        match self.eos_token {
            Some(eos) => tokenizer.with_eos(eos),
            None => tokenizer,
        }
    }

    /// Validated generation config for replaying this trace.
    pub fn generation_config(&self, default_max_tokens: usize) -> Result<GenerationConfig, TraceError> {
        let config = GenerationConfig {
            stop_strings: self.generation.stop_strings.clone(),
            max_tokens: self.generation.max_tokens.unwrap_or(default_max_tokens),
            top_logprobs: self.generation.top_logprobs,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Read and parse a TOML replay trace.
pub fn load_trace(path: &Path) -> Result<TraceFile, TraceError> {
    let raw = std::fs::read_to_string(path)?;
    TraceFile::from_toml_str(&raw)
}
