//! Telemetry module for GG-STREAM.
//!
//! Provides structured logging and per-run tracing spans.

mod logging;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use spans::{GenerationSpan, SpanExt};
