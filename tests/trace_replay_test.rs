//! Tests for loading and replaying recorded traces.

use std::io::Write;
use std::sync::Arc;

use gg_stream::config::{load_trace, TraceError};
use gg_stream::engine::{create_generator, GenerationResult, ScriptedSource, StopReason, Tokenizer};
use tempfile::NamedTempFile;

const TRACE: &str = r#"
vocab = ["Hello", " wor", "ld", "</", "s>", [240, 159], [140], [159], "<eos>"]
eos_token = 8

[generation]
stop_strings = ["</s>", "🌟"]
top_logprobs = 2

[[steps]]
token = 0
logprobs = [-0.1, -2.5, -3.0, -4.0, -5.0, -6.0, -7.0, -8.0, -9.0]

[[steps]]
token = 1

[[steps]]
token = 2

[[steps]]
token = 3

[[steps]]
token = 4

[[steps]]
token = 0
"#;

fn write_trace(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn replay(contents: &str) -> Vec<GenerationResult> {
    let file = write_trace(contents);
    let trace = load_trace(file.path()).unwrap();
    let config = trace.generation_config(64).unwrap();
    let vocab = Arc::new(trace.tokenizer());
    let tokenizer: Arc<dyn Tokenizer> = vocab.clone();
    let source = ScriptedSource::new(vocab, trace.steps);
    create_generator(tokenizer, source, &config)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn test_replay_stops_on_trace_stop_string() {
    let results = replay(TRACE);
    let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["Hello", " wor", "ld", ""]);

    let stop = results.last().unwrap().stop_condition.as_ref().unwrap();
    assert_eq!(stop.stop_reason, StopReason::StopString);
    assert_eq!(stop.stop_string.as_deref(), Some("</s>"));
    assert_eq!(stop.stop_tokens, vec![3, 4]);
}

#[test]
fn test_replay_uses_recorded_logprobs() {
    let results = replay(TRACE);
    let first = &results[0];
    assert_eq!(first.tokens[0].logprob, -0.1);
    let top = &first.top_logprobs[0];
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].text, "Hello");
    assert_eq!(top[1].text, " wor");

    // Steps without logprobs are replayed as certain.
    assert_eq!(results[1].tokens[0].logprob, 0.0);
    assert_eq!(results[1].top_logprobs[0][0].token, 1);
}

#[test]
fn test_replay_max_tokens_from_trace() {
    let trace = TRACE.replace("top_logprobs = 2", "max_tokens = 2");
    let results = replay(&trace);
    assert_eq!(results.len(), 3);
    assert_eq!(results[2].text, "");
    assert_eq!(
        results[2].stop_condition.as_ref().unwrap().stop_reason,
        StopReason::MaxTokens
    );
}

#[test]
fn test_replay_eos_token_from_trace() {
    let trace = TRACE.replace("token = 3\n", "token = 8\n");
    let results = replay(&trace);
    let stop = results.last().unwrap().stop_condition.as_ref().unwrap();
    assert_eq!(stop.stop_reason, StopReason::EndOfSequence);
    assert_eq!(stop.stop_tokens, vec![8]);
}

#[test]
fn test_missing_trace_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_trace(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, TraceError::Read(_)));
}

#[test]
fn test_malformed_trace_is_parse_error() {
    let file = write_trace("vocab = 12");
    let err = load_trace(file.path()).unwrap_err();
    assert!(matches!(err, TraceError::Parse(_)));
}

#[test]
fn test_negative_max_tokens_is_parse_error() {
    let file = write_trace("vocab = [\"a\"]\n[generation]\nmax_tokens = -1\n");
    let err = load_trace(file.path()).unwrap_err();
    assert!(matches!(err, TraceError::Parse(_)));
}

#[test]
fn test_empty_stop_string_is_invalid() {
    let file = write_trace("vocab = [\"a\"]\n[generation]\nstop_strings = [\"\"]\n");
    let trace = load_trace(file.path()).unwrap();
    let err = trace.generation_config(8).unwrap_err();
    assert!(matches!(err, TraceError::Invalid(ref e) if e.is_config()));
}
