//! Stateful stop-string processing during token generation.
//!
//! Stop strings are tracked both as text (for matches that straddle token
//! boundaries) and as token sequences (for multi-token characters such as
//! emoji, whose prefix does not decode to any recognizable text).

use std::sync::Arc;

use super::criteria::{stopping_criteria, StopCriteria};
use super::error::GenerationError;
use super::tokenizer::Tokenizer;

/// A configured stop string and its token encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopString {
    pub text: String,
    pub tokens: Vec<u32>,
}

/// Ordered, immutable set of stop strings for a run.
///
/// Encodings are computed once at construction. Runs with identical stop
/// strings may share one `StopSpec` behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopSpec {
    entries: Vec<StopString>,
}

impl StopSpec {
    /// Encode each stop string with `tokenizer`.
    pub fn new(stop_strings: &[String], tokenizer: &dyn Tokenizer) -> Result<Self, GenerationError> {
        let entries = stop_strings
            .iter()
            .map(|text| -> Result<StopString, GenerationError> {
                Ok(StopString {
                    text: text.clone(),
                    tokens: tokenizer.encode(text)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_entries(entries)
    }

    /// Build from pre-encoded entries.
    pub fn from_entries(entries: Vec<StopString>) -> Result<Self, GenerationError> {
        if entries.iter().any(|e| e.text.is_empty()) {
            return Err(GenerationError::Config(
                "stop strings must not be empty".into(),
            ));
        }
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> Option<&StopString> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StopString> {
        self.entries.iter()
    }
}

/// Verdict for one processed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopVerdict {
    /// `stop_string` appeared; `stop_tokens` are the buffered tokens whose
    /// decoding contains it.
    FullStop {
        stop_string: String,
        stop_tokens: Vec<u32>,
    },
    /// Output must be withheld until more tokens arrive.
    PartialMatch,
    NoMatch,
}

/// Per-run stop detector. Owns the buffer of token IDs seen since the last
/// unambiguous verdict.
pub struct StopProcessor {
    spec: Arc<StopSpec>,
    tokenizer: Arc<dyn Tokenizer>,
    token_id_buffer: Vec<u32>,
}

impl StopProcessor {
    pub fn new(spec: Arc<StopSpec>, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            spec,
            tokenizer,
            token_id_buffer: Vec::new(),
        }
    }

    /// Process a new token and check if generation should stop.
    pub fn process(&mut self, token: u32) -> Result<StopVerdict, GenerationError> {
        if self.spec.is_empty() {
            return Ok(StopVerdict::NoMatch);
        }

        self.token_id_buffer.push(token);
        let text = self.tokenizer.decode(&self.token_id_buffer)?;
        let criteria = stopping_criteria(&text, &self.token_id_buffer, &self.spec);
        tracing::trace!(token, buffered = self.token_id_buffer.len(), ?criteria, "stop criteria");

        match criteria {
            StopCriteria::NoMatch => {
                self.token_id_buffer.clear();
                Ok(StopVerdict::NoMatch)
            }
            StopCriteria::PartialMatch => Ok(StopVerdict::PartialMatch),
            StopCriteria::FullStop { index, .. } => {
                let stop = self.spec.get(index).ok_or_else(|| {
                    GenerationError::ContractViolation(format!(
                        "evaluator matched stop string #{} but only {} are configured",
                        index,
                        self.spec.len()
                    ))
                })?;
                Ok(StopVerdict::FullStop {
                    stop_string: stop.text.clone(),
                    stop_tokens: std::mem::take(&mut self.token_id_buffer),
                })
            }
        }
    }

    /// Tokens held back while a match is ambiguous.
    pub fn pending(&self) -> &[u32] {
        &self.token_id_buffer
    }

    /// Drop any pending tokens.
    pub fn reset(&mut self) {
        self.token_id_buffer.clear();
    }

    pub fn spec(&self) -> &StopSpec {
        &self.spec
    }
}
