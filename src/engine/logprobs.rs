//! Per-token log-probability records and top-k summaries.

use serde::{Deserialize, Serialize};

use super::error::GenerationError;
use super::tokenizer::Tokenizer;

/// A token together with its decoded text and log-probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenLogprob {
    pub token: u32,
    pub text: String,
    pub logprob: f32,
}

/// Log-probability of `token` within a full-vocabulary vector.
pub fn token_logprob(logprobs: &[f32], token: u32) -> Result<f32, GenerationError> {
    logprobs.get(token as usize).copied().ok_or_else(|| {
        GenerationError::Source(format!(
            "logprob vector of length {} has no entry for token {}",
            logprobs.len(),
            token
        ))
    })
}

/// NaN ranks below everything else.
fn rank_key(logprob: f32) -> f32 {
    if logprob.is_nan() {
        f32::NEG_INFINITY
    } else {
        logprob
    }
}

/// The `top_k` most probable tokens, by descending logprob then ascending ID.
pub fn summarize_top_logprobs(
    tokenizer: &dyn Tokenizer,
    logprobs: &[f32],
    top_k: usize,
) -> Result<Vec<TokenLogprob>, GenerationError> {
    let k = top_k.min(logprobs.len());
    if k == 0 {
        return Ok(Vec::new());
    }

    let by_rank = |a: &u32, b: &u32| {
        rank_key(logprobs[*b as usize])
            .total_cmp(&rank_key(logprobs[*a as usize]))
            .then(a.cmp(b))
    };

    let mut ids: Vec<u32> = (0..logprobs.len() as u32).collect();
    if k < ids.len() {
        ids.select_nth_unstable_by(k - 1, by_rank);
        ids.truncate(k);
    }
    ids.sort_unstable_by(by_rank);

    ids.into_iter()
        .map(|token| -> Result<TokenLogprob, GenerationError> {
            Ok(TokenLogprob {
                token,
                text: tokenizer.decode(&[token])?,
                logprob: logprobs[token as usize],
            })
        })
        .collect()
}
