//! Token sources: the pull side of a generation run.
//!
//! A source hands out one token per call. Requesting the next token is the
//! only point where a run may block.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::detokenize::StreamDetokenizer;
use super::error::GenerationError;
use super::tokenizer::{Tokenizer, VocabTokenizer};

/// One generation step as produced by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedToken {
    pub token: u32,
    /// Log-probabilities over the full vocabulary at this step.
    pub logprobs: Vec<f32>,
    /// Text fragment that became visible with this token (may be empty).
    pub text: String,
}

/// Lazily produces generated tokens.
pub trait TokenSource {
    /// Pull the next token. `Ok(None)` signals natural end-of-sequence.
    fn next_token(&mut self) -> Result<Option<GeneratedToken>, GenerationError>;

    /// Text the source is still holding back, handed over when the run ends
    /// without a stop string.
    fn drain_text(&mut self) -> String {
        String::new()
    }
}

/// Adapts any iterator of generated tokens into a `TokenSource`.
pub struct IterSource<I> {
    inner: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = Result<GeneratedToken, GenerationError>>,
{
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I> TokenSource for IterSource<I>
where
    I: Iterator<Item = Result<GeneratedToken, GenerationError>>,
{
    fn next_token(&mut self) -> Result<Option<GeneratedToken>, GenerationError> {
        self.inner.next().transpose()
    }
}

/// A recorded step: token ID plus optional full-vocabulary logprobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedStep {
    pub token: u32,
    #[serde(default)]
    pub logprobs: Option<Vec<f32>>,
}

impl From<u32> for ScriptedStep {
    fn from(token: u32) -> Self {
        Self { token, logprobs: None }
    }
}

/// Replays recorded steps against a vocabulary tokenizer.
///
/// Fragments come from a streaming detokenizer, so pieces that split a
/// multi-byte character yield empty text until the character completes.
/// Steps without logprobs get a one-hot distribution on their token.
pub struct ScriptedSource {
    tokenizer: Arc<VocabTokenizer>,
    steps: std::vec::IntoIter<ScriptedStep>,
    detokenizer: StreamDetokenizer,
    pulled: usize,
}

impl ScriptedSource {
    pub fn new(tokenizer: Arc<VocabTokenizer>, steps: Vec<ScriptedStep>) -> Self {
        Self {
            tokenizer,
            steps: steps.into_iter(),
            detokenizer: StreamDetokenizer::new(),
            pulled: 0,
        }
    }

    pub fn from_tokens(tokenizer: Arc<VocabTokenizer>, tokens: &[u32]) -> Self {
        Self::new(tokenizer, tokens.iter().copied().map(ScriptedStep::from).collect())
    }

    /// Number of tokens handed out so far.
    pub fn pulled(&self) -> usize {
        self.pulled
    }

    fn one_hot(&self, token: u32) -> Vec<f32> {
        let mut logprobs = vec![f32::NEG_INFINITY; self.tokenizer.vocab_size()];
        if let Some(slot) = logprobs.get_mut(token as usize) {
            *slot = 0.0;
        }
        logprobs
    }
}

impl TokenSource for ScriptedSource {
    fn next_token(&mut self) -> Result<Option<GeneratedToken>, GenerationError> {
        let Some(step) = self.steps.next() else {
            return Ok(None);
        };
        self.pulled += 1;

        let text = if self.tokenizer.is_eos(step.token) {
            String::new()
        } else {
            let bytes = self.tokenizer.piece_bytes(step.token)?;
            self.detokenizer.push(bytes)
        };
        let logprobs = match step.logprobs {
            Some(logprobs) => logprobs,
            None => self.one_hot(step.token),
        };

        Ok(Some(GeneratedToken {
            token: step.token,
            logprobs,
            text,
        }))
    }

    fn drain_text(&mut self) -> String {
        self.detokenizer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_source_replays_in_order() {
        let tok = Arc::new(VocabTokenizer::new(["a", "b"]));
        let mut source = ScriptedSource::from_tokens(tok, &[1, 0]);
        let first = source.next_token().unwrap().unwrap();
        assert_eq!((first.token, first.text.as_str()), (1, "b"));
        assert_eq!(first.logprobs, vec![f32::NEG_INFINITY, 0.0]);
        assert_eq!(source.next_token().unwrap().unwrap().text, "a");
        assert!(source.next_token().unwrap().is_none());
        assert_eq!(source.pulled(), 2);
    }

    #[test]
    fn scripted_source_eos_has_no_text() {
        let tok = Arc::new(VocabTokenizer::new(["a", "</s>"]).with_eos(1));
        let mut source = ScriptedSource::from_tokens(tok, &[1]);
        assert_eq!(source.next_token().unwrap().unwrap().text, "");
    }

    #[test]
    fn scripted_source_rejects_unknown_token() {
        let tok = Arc::new(VocabTokenizer::new(["a"]));
        let mut source = ScriptedSource::from_tokens(tok, &[5]);
        assert!(matches!(source.next_token(), Err(GenerationError::Tokenizer(_))));
    }

    #[test]
    fn iter_source_passes_errors_through() {
        let steps = vec![Err(GenerationError::Source("boom".into()))];
        let mut source = IterSource::new(steps.into_iter());
        assert!(matches!(source.next_token(), Err(GenerationError::Source(_))));
        assert!(source.next_token().unwrap().is_none());
    }
}
