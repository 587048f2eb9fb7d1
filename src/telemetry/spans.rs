//! Span utilities and extension traits for GG-STREAM tracing.
//!
//! Provides standardized span creation and result recording.

use tracing::{info_span, Span};

use crate::engine::{GenerationConfig, StopReason};

/// Extension trait for adding context to spans.
pub trait SpanExt {
    /// Record the result of an operation into the span.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;

    /// Record how a generation run ended.
    fn record_finish(&self, reason: StopReason, tokens_generated: usize);
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }

    fn record_finish(&self, reason: StopReason, tokens_generated: usize) {
        self.record("status", "ok");
        self.record("stop_reason", reason.to_string().as_str());
        self.record("tokens_generated", tokens_generated as u64);
    }
}

/// Factory for creating standardized generation spans.
pub struct GenerationSpan;

impl GenerationSpan {
    /// Create a new span for one generation run.
    ///
    /// Fields included:
    /// - `stop_strings`: Number of configured stop strings
    /// - `max_tokens`: Token budget
    /// - `top_logprobs`: Alternatives reported per step
    /// - `status`: To be filled in by `SpanExt`
    /// - `error.message`: To be filled in on error
    /// - `stop_reason`: To be filled in on completion
    /// - `tokens_generated`: To be filled in on completion
    pub fn new(config: &GenerationConfig) -> Span {
        info_span!(
            "generation_run",
            stop_strings = config.stop_strings.len() as u64,
            max_tokens = config.max_tokens as u64,
            top_logprobs = config.top_logprobs as u64,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
            stop_reason = tracing::field::Empty,
            tokens_generated = tracing::field::Empty,
        )
    }
}
