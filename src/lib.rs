//! GG-STREAM Runtime
//!
//! Stop-string aware token streaming for local inference. Wraps a token
//! source and decides, one token at a time, what text may be delivered to
//! the caller and when generation has to stop.
//!
//! # Guarantees
//!
//! - **Withheld**: text that might belong to a stop string is never emitted
//!   until the ambiguity resolves.
//! - **Final**: emitted text is never retracted.
//! - **Trimmed**: the stop string and everything after it is excised.
//! - **Isolated**: every run owns its buffers; nothing is shared but the
//!   read-only stop specification and the tokenizer.

pub mod config;
pub mod engine;
pub mod telemetry;

pub use engine::{
    create_generator, GenerationConfig, GenerationError, GenerationResult,
    GenerationStopCondition, Generator, StopReason,
};
