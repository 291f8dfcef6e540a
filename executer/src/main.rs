//! Command-line entry point for the request executer.
//!
//! `executer replay` runs a recorded-exchange script through the same
//! orchestration a live template uses and prints the match result.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde_json::Value;

use executer::core::context::ScanContext;
use executer::replay::run_replay;
use executer::{exit_codes, logging};

#[derive(Parser)]
#[command(
    name = "executer",
    version,
    about = "Sequential request executer with match transcripts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a recorded-exchange script and print the latest match as JSON.
    Replay {
        /// Path to the JSON replay script.
        script: PathBuf,
        /// Optional TOML file with executer options.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Target passed to every step.
        #[arg(long, default_value = "")]
        input: String,
        /// Payload value seeded into the run context (`KEY=VALUE`, VALUE parsed as JSON when possible).
        #[arg(long = "payload", value_parser = parse_payload)]
        payloads: Vec<(String, Value)>,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Replay {
            script,
            config,
            input,
            payloads,
        } => cmd_replay(script, config, input, payloads),
    }
}

fn cmd_replay(
    script: PathBuf,
    config: Option<PathBuf>,
    input: String,
    payloads: Vec<(String, Value)>,
) -> Result<i32> {
    let mut scan = ScanContext::new(input);
    scan.payloads.extend(payloads);

    let outcome = run_replay(&script, config.as_deref(), &scan)?;
    let rendered =
        serde_json::to_string_pretty(&outcome.result).context("serialize replay result")?;
    println!("{rendered}");

    Ok(if outcome.result.is_some() {
        exit_codes::OK
    } else {
        exit_codes::NO_MATCH
    })
}

fn parse_payload(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("payload must be KEY=VALUE, got '{raw}'"))?;
    if key.trim().is_empty() {
        return Err(anyhow!("payload key must not be empty"));
    }
    let value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.trim().to_string(), value))
}
