//! Generation configuration types for GG-STREAM.
//!
//! All fields have safe defaults. Configuration is validated before the
//! first token is requested from the source.

use serde::{Deserialize, Serialize};

use super::error::GenerationError;

/// Upper bound on the number of alternatives reported per step.
pub const MAX_TOP_LOGPROBS: usize = 10;

/// Token budget used when the caller does not set one.
pub const DEFAULT_MAX_TOKENS: usize = 10_000_000;

/// Per-run generation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Literals that end generation when they appear in the output.
    /// Order matters: on a tie, the first configured string wins.
    #[serde(default)]
    pub stop_strings: Vec<String>,
    /// Maximum tokens to request from the source (0 = stop immediately).
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Number of top alternatives to report per step (0 = disabled).
    #[serde(default)]
    pub top_logprobs: usize,
}

fn default_max_tokens() -> usize {
    DEFAULT_MAX_TOKENS
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            stop_strings: Vec::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            top_logprobs: 0,
        }
    }
}

impl GenerationConfig {
    /// Validate configuration values. Returns error on invalid values.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.top_logprobs > MAX_TOP_LOGPROBS {
            return Err(GenerationError::Config(format!(
                "top_logprobs must be less than or equal to {}",
                MAX_TOP_LOGPROBS
            )));
        }
        if self.stop_strings.iter().any(String::is_empty) {
            return Err(GenerationError::Config(
                "stop strings must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Parse a configuration from TOML, mapping parse failures to
    /// configuration errors.
    pub fn from_toml_str(raw: &str) -> Result<Self, GenerationError> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| GenerationError::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Builder-style helper for the common stop-strings-only case.
    pub fn with_stop_strings<I, S>(stop_strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stop_strings: stop_strings.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}
