use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use income_engine::api::{AppState, create_router};
use income_engine::engine::IncomeEngine;
use income_engine::error::EngineError;
use income_engine::ruleset::{RulesetKey, RulesetRegistry};
use income_engine::telemetry::{self, TelemetryError};
use thiserror::Error;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "income-engine",
    about = "Evaluate borrower income evidence against versioned underwriting rulesets",
    version
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// Directory of ruleset files; the built-in rulesets are used when omitted
    #[arg(long, global = true, env = "INCOME_ENGINE_RULESETS")]
    rulesets: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate an evidence file and print the decision package
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "INCOME_ENGINE_ADDR", default_value = "127.0.0.1:8080")]
    addr: SocketAddr,
}

impl Default for ServeArgs {
    fn default() -> Self {
        let addr = std::env::var("INCOME_ENGINE_ADDR")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)));
        Self { addr }
    }
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Path to an evidence bundle JSON file
    file: PathBuf,
    /// Ruleset to apply, as id@version; defaults to the latest for the program
    #[arg(long, value_parser = parse_ruleset_key)]
    ruleset: Option<RulesetKey>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write output: {0}")]
    Output(#[source] serde_json::Error),
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("income-engine: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level)?;

    let registry = match &cli.rulesets {
        Some(dir) => RulesetRegistry::load(dir)?,
        None => RulesetRegistry::builtin(),
    };

    match cli.command.unwrap_or_else(|| Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => run_server(registry, args).await,
        Command::Evaluate(args) => run_evaluate(registry, args),
    }
}

fn parse_ruleset_key(raw: &str) -> Result<RulesetKey, String> {
    match raw.split_once('@') {
        Some((id, version)) if !id.is_empty() && !version.is_empty() => {
            Ok(RulesetKey::new(id, version))
        }
        _ => Err(format!("expected id@version, got '{raw}'")),
    }
}

async fn run_server(registry: RulesetRegistry, args: ServeArgs) -> Result<(), CliError> {
    let rulesets = registry.len();
    let app = create_router(AppState::new(registry));

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    info!(addr = %args.addr, rulesets, "income engine listening");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_evaluate(registry: RulesetRegistry, args: EvaluateArgs) -> Result<(), CliError> {
    let path = args.file.display().to_string();
    let content = std::fs::read_to_string(&args.file).map_err(|source| CliError::Read {
        path: path.clone(),
        source,
    })?;
    let raw: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| CliError::Json { path, source })?;

    let engine = IncomeEngine::new(registry);
    let package = match &args.ruleset {
        Some(key) => engine.evaluate_with_ruleset(&raw, key)?,
        None => engine.evaluate(&raw)?,
    };

    let rendered = serde_json::to_string_pretty(&package).map_err(CliError::Output)?;
    println!("{rendered}");
    Ok(())
}
