//! Generation engine module for GG-STREAM.
//!
//! Handles stop-string detection, detokenization and result assembly.
//! Provides the `Tokenizer` and `TokenSource` traits and supporting types.

pub mod config;
pub mod criteria;
pub mod detokenize;
pub mod error;
pub mod logprobs;
pub mod matcher;
pub mod output;
pub mod source;
pub mod stop_processor;
pub mod tokenizer;

mod generate;
mod streaming;

pub use config::{GenerationConfig, DEFAULT_MAX_TOKENS, MAX_TOP_LOGPROBS};
pub use criteria::{stopping_criteria, StopCriteria};
pub use detokenize::StreamDetokenizer;
pub use error::GenerationError;
pub use generate::{create_generator, Generator};
pub use logprobs::{summarize_top_logprobs, TokenLogprob};
pub use matcher::sequence_overlap;
pub use output::{GenerationResult, GenerationStopCondition, StopReason};
pub use source::{GeneratedToken, IterSource, ScriptedSource, ScriptedStep, TokenSource};
pub use stop_processor::{StopProcessor, StopSpec, StopString, StopVerdict};
pub use streaming::ResultStream;
pub use tokenizer::{Tokenizer, TokenizerError, VocabPiece, VocabTokenizer};
