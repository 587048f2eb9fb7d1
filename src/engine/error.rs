//! Generation error types for GG-STREAM.
//!
//! All errors are fail-closed: a run that hits one stops, and anything it
//! had buffered but not yet flushed is discarded.

use thiserror::Error;

use super::tokenizer::TokenizerError;

/// Errors that can occur while configuring or running a generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid generation config: {0}")]
    Config(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("Token source failed: {0}")]
    Source(String),

    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Generation cancelled")]
    Cancelled,
}

impl GenerationError {
    /// Returns true if this error is raised before any token is requested.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this error aborts an in-progress run.
    pub fn is_fatal(&self) -> bool {
        !self.is_config()
    }
}
