//! Generation output types for GG-STREAM.
//!
//! A run yields a sequence of `GenerationResult`s; only the last one carries
//! a stop condition.

use serde::{Deserialize, Serialize};

use super::logprobs::TokenLogprob;

/// One emitted segment of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Text resolved since the previous result.
    pub text: String,
    /// Tokens produced since the previous result.
    pub tokens: Vec<TokenLogprob>,
    /// Top alternatives per token, if requested.
    pub top_logprobs: Vec<Vec<TokenLogprob>>,
    /// Set on the final result only.
    pub stop_condition: Option<GenerationStopCondition>,
}

impl GenerationResult {
    /// Returns true if this is the last result of its run.
    pub fn is_final(&self) -> bool {
        self.stop_condition.is_some()
    }
}

/// Why a generation run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStopCondition {
    pub stop_reason: StopReason,
    /// The configured stop string that matched, if any.
    pub stop_string: Option<String>,
    /// Tokens that produced the stop condition.
    pub stop_tokens: Vec<u32>,
}

/// Reason why text generation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Model emitted its end-of-sequence token, or the source ran dry.
    #[serde(rename = "eos_token")]
    EndOfSequence,
    /// A configured stop string appeared.
    StopString,
    /// Hit max_tokens limit.
    MaxTokens,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndOfSequence => write!(f, "eos_token"),
            Self::StopString => write!(f, "stop_string"),
            Self::MaxTokens => write!(f, "max_tokens"),
        }
    }
}
