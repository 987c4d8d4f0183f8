// oncall-cli/src/main.rs
// ============================================================================
// Module: Oncall CLI Entry Point
// Description: Command dispatcher for the server, config inspection, and
//              manual alert injection.
// Purpose: Operator-facing binary wrapping oncall-server and oncall-config.
// Dependencies: clap, oncall-config, oncall-core, oncall-server, tokio.
// ============================================================================

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "this binary's entire purpose is printing operator-facing output to stdout/stderr"
)]
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )
)]

//! ## Overview
//! `oncall` has five subcommand groups: `serve` starts the HTTP server;
//! `config` inspects the environment-variable surface §6 defines; `alert
//! inject` feeds one alert straight into a locally-built `IncidentEngine`
//! for an operator drill, without requiring a server process to be running;
//! `approvals`/`audit`/`emergency-stop`/`reset-circuit-breaker` are thin
//! HTTP clients against a running server's operator routes (`--server`,
//! default `http://127.0.0.1:8080`, overridable via `ONCALL_SERVER_URL`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Read;
use std::io::Write;
use std::io::stdin;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use oncall_broker::InlineSource;
use oncall_broker::Source;
use oncall_config::ConfigError;
use oncall_config::EngineConfig;
use oncall_core::LiveLogPublisher;
use oncall_server::ServerError;
use thiserror::Error;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default base URL the `approvals`/`audit`/`emergency-stop` subcommands
/// call against; overridden with `--server` or `ONCALL_SERVER_URL`.
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "oncall", arg_required_else_help = true)]
struct Cli {
    /// Base URL of a running `oncall serve` process, for subcommands that
    /// operate against its shared state rather than a freshly built engine.
    #[arg(long, env = "ONCALL_SERVER_URL", default_value = DEFAULT_SERVER_URL, global = true)]
    server: String,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server: webhook ingress, SSE live log, operator API.
    Serve,
    /// Inspect the environment-variable configuration surface.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Inject an alert directly into a freshly built engine, bypassing HTTP.
    Alert {
        /// Selected alert subcommand.
        #[command(subcommand)]
        command: AlertCommand,
    },
    /// Inspect or decide pending `ApprovalRequest`s on a running server.
    Approvals {
        /// Selected approvals subcommand.
        #[command(subcommand)]
        command: ApprovalsCommand,
    },
    /// Read a running server's durable audit trail.
    Audit {
        /// Selected audit subcommand.
        #[command(subcommand)]
        command: AuditCommand,
    },
    /// Flip a running server's `AutonomyConfig.emergency_stop` flag.
    EmergencyStop(EmergencyStopArgs),
    /// Manually close a running server's execution circuit breaker.
    ResetCircuitBreaker,
}

/// Configuration-inspection subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the configuration surface as a Markdown table.
    Docs,
    /// Print the configuration surface as a JSON schema array.
    Schema,
    /// Print a `.env`-style example file documenting every variable.
    EnvExample,
    /// Load configuration from the environment and report any errors.
    Validate,
}

/// Manual alert-injection subcommands.
#[derive(Subcommand, Debug)]
enum AlertCommand {
    /// Parse an `Alert`-shaped JSON document and hand it to the engine.
    Inject(AlertInjectCommand),
}

/// Arguments for `alert inject`.
#[derive(Args, Debug)]
struct AlertInjectCommand {
    /// Path to a JSON file matching `Alert`'s own shape; omit to read stdin.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
}

/// Approval-queue subcommands.
#[derive(Subcommand, Debug)]
enum ApprovalsCommand {
    /// List every `ApprovalRequest` still awaiting an operator decision.
    List,
    /// Record an operator decision on one pending approval.
    Decide(ApprovalsDecideArgs),
}

/// Arguments for `approvals decide`.
#[derive(Args, Debug)]
struct ApprovalsDecideArgs {
    /// Incident the approval belongs to.
    incident_id: String,
    /// The approval request's id, as listed by `approvals list`.
    approval_id: String,
    /// `approved` or `rejected`.
    #[arg(value_enum)]
    decision: DecisionArg,
    /// Operator identity recorded against the decision.
    #[arg(long, default_value = "oncall-operator")]
    decided_by: String,
    /// Optional free-text rationale.
    #[arg(long)]
    comment: Option<String>,
}

/// Operator-facing approval decision, mapped onto `ApprovalDecision`.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum DecisionArg {
    /// The command may proceed.
    Approved,
    /// The command will not run.
    Rejected,
}

/// Audit-trail subcommands.
#[derive(Subcommand, Debug)]
enum AuditCommand {
    /// Print every `AuditRecord` for one incident, oldest first.
    Tail(AuditTailArgs),
}

/// Arguments for `audit tail`.
#[derive(Args, Debug)]
struct AuditTailArgs {
    /// Incident whose audit trail to print.
    incident_id: String,
}

/// Arguments for `emergency-stop`.
#[derive(Args, Debug)]
struct EmergencyStopArgs {
    /// `on` freezes all mutating work; `off` clears the flag.
    #[arg(value_enum)]
    state: EmergencyStopState,
}

/// The two states `emergency-stop` can set.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EmergencyStopState {
    /// Freeze all mutating work.
    On,
    /// Resume normal autonomy-gate decisions.
    Off,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Top-level CLI errors.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration failed to load or validate.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// The server failed to start or exited with an error.
    #[error("server error: {0}")]
    Server(#[from] ServerError),
    /// Reading the alert payload from disk or stdin failed.
    #[error("failed to read alert payload: {0}")]
    Io(#[from] std::io::Error),
    /// The alert payload did not parse.
    #[error("failed to parse alert payload: {0}")]
    Parse(#[from] oncall_broker::SourceError),
    /// The incident engine rejected the alert.
    #[error("failed to handle alert: {0}")]
    Engine(#[from] oncall_core::EngineError),
    /// A request against a running server's HTTP API failed.
    #[error("request to oncall server failed: {0}")]
    Http(#[from] reqwest::Error),
    /// A running server reported a non-success status for the request.
    #[error("oncall server returned {0}")]
    ServerStatus(reqwest::StatusCode),
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Dispatches the parsed CLI to its handler.
async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Serve => serve().await,
        Commands::Config { command } => {
            run_config(command)?;
            Ok(())
        }
        Commands::Alert { command } => run_alert(command).await,
        Commands::Approvals { command } => run_approvals(&cli.server, command).await,
        Commands::Audit { command } => run_audit(&cli.server, command).await,
        Commands::EmergencyStop(args) => run_emergency_stop(&cli.server, args).await,
        Commands::ResetCircuitBreaker => run_reset_circuit_breaker(&cli.server).await,
    }
}

/// `oncall serve`.
async fn serve() -> Result<(), CliError> {
    let config = EngineConfig::from_env()?;
    init_tracing(config.log_level);
    oncall_server::serve(config).await?;
    Ok(())
}

/// `oncall config ...`.
fn run_config(command: ConfigCommand) -> Result<(), CliError> {
    match command {
        ConfigCommand::Docs => println!("{}", oncall_config::config_docs_markdown()),
        ConfigCommand::Schema => {
            let schema = oncall_config::config_schema();
            #[expect(
                clippy::expect_used,
                reason = "a JSON array of string literals is always serializable"
            )]
            let rendered = serde_json::to_string_pretty(&schema).expect("schema serializes");
            println!("{rendered}");
        }
        ConfigCommand::EnvExample => println!("{}", oncall_config::env_file_example()),
        ConfigCommand::Validate => {
            let config = EngineConfig::from_env()?;
            println!("configuration is valid (autonomy mode: {:?})", config.autonomy_mode);
        }
    }
    Ok(())
}

/// `oncall alert ...`.
async fn run_alert(command: AlertCommand) -> Result<(), CliError> {
    match command {
        AlertCommand::Inject(args) => inject_alert(args).await,
    }
}

/// `oncall alert inject`: reads an `Alert`-shaped payload and routes it
/// through a freshly built engine, printing the resulting incident id.
async fn inject_alert(args: AlertInjectCommand) -> Result<(), CliError> {
    let config = EngineConfig::from_env()?;
    init_tracing(config.log_level);

    let body = match args.file {
        Some(path) => fs::read(path)?,
        None => {
            let mut buffer = Vec::new();
            stdin().read_to_end(&mut buffer)?;
            buffer
        }
    };
    let alert = InlineSource::new().parse(&body)?;

    let (engine, _store) = oncall_server::run::build_engine(&config, Arc::new(StdoutPublisher)).await?;
    let incident_id = engine.handle_alert(alert).await?;
    info!(%incident_id, "alert routed to incident");
    println!("{incident_id}");
    Ok(())
}

// ============================================================================
// SECTION: Operator HTTP Commands
// ============================================================================

/// Checks an HTTP response's status, mapping non-success into [`CliError`].
fn check_status(response: &reqwest::Response) -> Result<(), CliError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(CliError::ServerStatus(response.status()))
    }
}

/// `oncall approvals ...`.
async fn run_approvals(server: &str, command: ApprovalsCommand) -> Result<(), CliError> {
    let client = reqwest::Client::new();
    match command {
        ApprovalsCommand::List => {
            let response = client.get(format!("{server}/approvals")).send().await?;
            check_status(&response)?;
            let body = response.text().await?;
            println!("{body}");
        }
        ApprovalsCommand::Decide(args) => {
            let decision = match args.decision {
                DecisionArg::Approved => "approved",
                DecisionArg::Rejected => "rejected",
            };
            let url = format!("{server}/incidents/{}/approvals/{}/decide", args.incident_id, args.approval_id);
            let response = client
                .post(url)
                .json(&serde_json::json!({
                    "decision": decision,
                    "decided_by": args.decided_by,
                    "comment": args.comment,
                }))
                .send()
                .await?;
            check_status(&response)?;
            println!("approval {} recorded as {decision}", args.approval_id);
        }
    }
    Ok(())
}

/// `oncall audit ...`.
async fn run_audit(server: &str, command: AuditCommand) -> Result<(), CliError> {
    let AuditCommand::Tail(args) = command;
    let client = reqwest::Client::new();
    let response = client.get(format!("{server}/incidents/{}/audit", args.incident_id)).send().await?;
    check_status(&response)?;
    let body = response.text().await?;
    println!("{body}");
    Ok(())
}

/// `oncall emergency-stop ...`.
async fn run_emergency_stop(server: &str, args: EmergencyStopArgs) -> Result<(), CliError> {
    let stopped = matches!(args.state, EmergencyStopState::On);
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{server}/emergency-stop"))
        .json(&serde_json::json!({ "stopped": stopped }))
        .send()
        .await?;
    check_status(&response)?;
    println!("emergency stop is now {}", if stopped { "engaged" } else { "cleared" });
    Ok(())
}

/// `oncall reset-circuit-breaker`.
async fn run_reset_circuit_breaker(server: &str) -> Result<(), CliError> {
    let client = reqwest::Client::new();
    let response = client.post(format!("{server}/circuit-breaker/reset")).send().await?;
    check_status(&response)?;
    println!("circuit breaker reset to closed");
    Ok(())
}

// ============================================================================
// SECTION: Tracing
// ============================================================================

/// Initializes the global tracing subscriber at `level`, honoring
/// `RUST_LOG` when set.
fn init_tracing(level: oncall_config::LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter_directive()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

// ============================================================================
// SECTION: Publisher
// ============================================================================

/// Live-log publisher for one-shot CLI invocations: prints each event as one
/// JSON line to stdout rather than requiring a subscriber to be listening.
struct StdoutPublisher;

impl LiveLogPublisher for StdoutPublisher {
    fn publish(&self, event: &oncall_core::LiveLogEvent) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(err) => error!(error = %err, "failed to serialize live-log event"),
        }
    }
}
