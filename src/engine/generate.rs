//! Generation loop: assembles a token stream into caller-facing results.
//!
//! The loop pulls one token at a time, feeds it to the stop processor, and
//! either flushes a result, keeps buffering while a stop string may be
//! forming, or terminates. Exactly one result per run carries a stop
//! condition, and it is always the last one.

use std::iter::FusedIterator;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Span;

use super::config::GenerationConfig;
use super::error::GenerationError;
use super::logprobs::{summarize_top_logprobs, token_logprob, TokenLogprob};
use super::output::{GenerationResult, GenerationStopCondition, StopReason};
use super::source::{GeneratedToken, TokenSource};
use super::stop_processor::{StopProcessor, StopSpec, StopVerdict};
use super::tokenizer::Tokenizer;
use crate::telemetry::{GenerationSpan, SpanExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Accumulating,
    Terminal,
}

/// Validate `config`, encode its stop strings, and build a generator.
///
/// Configuration errors surface here, before any token is requested.
pub fn create_generator<S: TokenSource>(
    tokenizer: Arc<dyn Tokenizer>,
    source: S,
    config: &GenerationConfig,
) -> Result<Generator<S>, GenerationError> {
    config.validate()?;
    let spec = StopSpec::new(&config.stop_strings, tokenizer.as_ref())?;
    Generator::with_stop_spec(tokenizer, source, Arc::new(spec), config)
}

/// A single generation run, consumed front to back as an iterator.
///
/// Dropping the generator abandons the run; it owns all of its buffers and
/// leaves no background work behind.
pub struct Generator<S> {
    source: S,
    tokenizer: Arc<dyn Tokenizer>,
    stop_processor: StopProcessor,
    max_tokens: usize,
    top_logprobs: usize,
    tokens_generated: usize,
    text: String,
    token_buffer: Vec<TokenLogprob>,
    top_logprobs_buffer: Vec<Vec<TokenLogprob>>,
    state: RunState,
    cancel: CancellationToken,
    span: Span,
}

impl<S: TokenSource> Generator<S> {
    /// Build a generator around a pre-encoded stop spec, which may be shared
    /// between runs. The spec must list exactly `config.stop_strings`.
    pub fn with_stop_spec(
        tokenizer: Arc<dyn Tokenizer>,
        source: S,
        spec: Arc<StopSpec>,
        config: &GenerationConfig,
    ) -> Result<Self, GenerationError> {
        config.validate()?;
        let matches_config = spec.len() == config.stop_strings.len()
            && spec
                .iter()
                .zip(&config.stop_strings)
                .all(|(stop, configured)| &stop.text == configured);
        if !matches_config {
            return Err(GenerationError::Config(
                "stop spec does not match configured stop strings".into(),
            ));
        }

        Ok(Self {
            source,
            stop_processor: StopProcessor::new(spec, tokenizer.clone()),
            tokenizer,
            max_tokens: config.max_tokens,
            top_logprobs: config.top_logprobs,
            tokens_generated: 0,
            text: String::new(),
            token_buffer: Vec::new(),
            top_logprobs_buffer: Vec::new(),
            state: RunState::Accumulating,
            cancel: CancellationToken::new(),
            span: GenerationSpan::new(config),
        })
    }

    /// Stop pulling from the source once `cancel` fires. The run then ends
    /// with `GenerationError::Cancelled` and unflushed output is discarded.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Tokens pulled from the source so far.
    pub fn tokens_generated(&self) -> usize {
        self.tokens_generated
    }

    /// Returns true once the final result (or an error) has been produced.
    pub fn is_finished(&self) -> bool {
        self.state == RunState::Terminal
    }

    /// Pull tokens until there is something to hand to the caller.
    fn advance(&mut self) -> Result<GenerationResult, GenerationError> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(GenerationError::Cancelled);
            }
            if self.tokens_generated >= self.max_tokens {
                return Ok(self.finish(StopReason::MaxTokens, Vec::new()));
            }

            let Some(step) = self.source.next_token()? else {
                return Ok(self.finish(StopReason::EndOfSequence, Vec::new()));
            };
            self.tokens_generated += 1;

            if self.tokenizer.is_eos(step.token) {
                return Ok(self.finish(StopReason::EndOfSequence, vec![step.token]));
            }

            self.record(&step)?;
            let verdict = self.stop_processor.process(step.token)?;
            self.text.push_str(&step.text);

            match verdict {
                StopVerdict::FullStop {
                    stop_string,
                    stop_tokens,
                } => return Ok(self.finish_on_stop_string(stop_string, stop_tokens)),
                // Hold everything until we know whether the stop string completes.
                StopVerdict::PartialMatch => continue,
                StopVerdict::NoMatch => {
                    // Only yield once the detokenizer has a segment to yield.
                    if !self.text.is_empty() {
                        return Ok(self.flush(None));
                    }
                }
            }
        }
    }

    fn record(&mut self, step: &GeneratedToken) -> Result<(), GenerationError> {
        self.token_buffer.push(TokenLogprob {
            token: step.token,
            text: self.tokenizer.decode(&[step.token])?,
            logprob: token_logprob(&step.logprobs, step.token)?,
        });
        if self.top_logprobs > 0 {
            self.top_logprobs_buffer.push(summarize_top_logprobs(
                self.tokenizer.as_ref(),
                &step.logprobs,
                self.top_logprobs,
            )?);
        }
        Ok(())
    }

    fn flush(&mut self, stop_condition: Option<GenerationStopCondition>) -> GenerationResult {
        let result = GenerationResult {
            text: std::mem::take(&mut self.text),
            tokens: std::mem::take(&mut self.token_buffer),
            top_logprobs: std::mem::take(&mut self.top_logprobs_buffer),
            stop_condition,
        };
        tracing::debug!(
            bytes = result.text.len(),
            tokens = result.tokens.len(),
            is_final = result.is_final(),
            "flushing generation result"
        );
        result
    }

    /// End of sequence or budget exhausted. A pending partial match is
    /// resolved as no match: nothing is trimmed.
    fn finish(&mut self, stop_reason: StopReason, stop_tokens: Vec<u32>) -> GenerationResult {
        let tail = self.source.drain_text();
        self.text.push_str(&tail);
        self.stop_processor.reset();
        self.terminate(GenerationStopCondition {
            stop_reason,
            stop_string: None,
            stop_tokens,
        })
    }

    fn finish_on_stop_string(
        &mut self,
        stop_string: String,
        stop_tokens: Vec<u32>,
    ) -> GenerationResult {
        let text = std::mem::take(&mut self.text);
        self.text = truncate_at_stop_string(text, &stop_string);
        self.terminate(GenerationStopCondition {
            stop_reason: StopReason::StopString,
            stop_string: Some(stop_string),
            stop_tokens,
        })
    }

    fn terminate(&mut self, stop_condition: GenerationStopCondition) -> GenerationResult {
        self.state = RunState::Terminal;
        self.span
            .record_finish(stop_condition.stop_reason, self.tokens_generated);
        tracing::info!(
            stop_reason = %stop_condition.stop_reason,
            stop_string = stop_condition.stop_string.as_deref(),
            tokens_generated = self.tokens_generated,
            "generation finished"
        );
        self.flush(Some(stop_condition))
    }

    /// Discard unflushed output after a fatal error.
    fn abort(&mut self, error: &GenerationError) {
        self.state = RunState::Terminal;
        self.text.clear();
        self.token_buffer.clear();
        self.top_logprobs_buffer.clear();
        self.stop_processor.reset();
        self.span.record_result::<(), _>(&Err(error));
        if matches!(error, GenerationError::Cancelled) {
            tracing::debug!(tokens_generated = self.tokens_generated, "generation cancelled");
        } else {
            tracing::warn!(error = %error, tokens_generated = self.tokens_generated, "generation aborted");
        }
    }
}

impl<S: TokenSource> Iterator for Generator<S> {
    type Item = Result<GenerationResult, GenerationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == RunState::Terminal {
            return None;
        }
        let span = self.span.clone();
        let _entered = span.enter();

        match self.advance() {
            Ok(result) => Some(Ok(result)),
            Err(error) => {
                self.abort(&error);
                Some(Err(error))
            }
        }
    }
}

impl<S: TokenSource> FusedIterator for Generator<S> {}

/// Cut `text` at the first occurrence of `stop`. If the stop string is not
/// fully present (the detokenizer may still hold its tail), drop the longest
/// suffix of `text` that begins it.
fn truncate_at_stop_string(mut text: String, stop: &str) -> String {
    if let Some(position) = text.find(stop) {
        text.truncate(position);
        return text;
    }
    let max_overlap = text.len().min(stop.len());
    for len in (1..=max_overlap).rev() {
        if stop.is_char_boundary(len) && text.ends_with(&stop[..len]) {
            text.truncate(text.len() - len);
            break;
        }
    }
    text
}
