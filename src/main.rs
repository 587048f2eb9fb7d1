//! GG-STREAM command-line entry point.
//!
//! ## CLI Subcommands
//!
//! - `gg-stream-cli replay <trace.toml>` - Replay a recorded trace, printing
//!   one JSON line per generation result
//! - `gg-stream-cli config` - Print the effective environment configuration

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use gg_stream::config::{self as gg_config, EnvConfig};
use gg_stream::engine::{create_generator, ResultStream, ScriptedSource, Tokenizer};
use gg_stream::telemetry::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("");
    let config = gg_config::load();

    if let Err(e) = init_logging(&config.log) {
        eprintln!("Logging setup failed: {}", e);
        return ExitCode::FAILURE;
    }

    match command {
        "replay" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: gg-stream-cli replay <trace.toml>");
                return ExitCode::FAILURE;
            };
            match run_replay(&config, Path::new(path)).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Replay failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        "config" => match serde_json::to_string_pretty(&config.effective_config()) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to render config: {}", e);
                ExitCode::FAILURE
            }
        },
        _ => {
            print_usage();
            ExitCode::FAILURE
        }
    }
}

async fn run_replay(
    config: &EnvConfig,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let trace = gg_config::load_trace(path)?;
    let generation = trace.generation_config(config.default_max_tokens)?;
    let vocab = Arc::new(trace.tokenizer());
    let tokenizer: Arc<dyn Tokenizer> = vocab.clone();
    let source = ScriptedSource::new(vocab, trace.steps);

    let generator = create_generator(tokenizer, source, &generation)?;
    let mut stream = ResultStream::spawn(generator, config.channel_capacity);
    while let Some(item) = stream.next().await {
        let result = item?;
        println!("{}", serde_json::to_string(&result)?);
    }
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: gg-stream-cli <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  replay <trace.toml>  Replay a recorded token trace");
    eprintln!("  config               Print effective configuration");
}
