// crates/bucket-gate-cli/src/main.rs
// ============================================================================
// Module: Bucket Gate CLI Entry Point
// Description: Command dispatcher for serving and inspecting Bucket Gate.
// Purpose: Start the MCP server and report configuration health.
// Dependencies: clap, bucket-gate-config, bucket-gate-mcp, serde_json, tokio
// ============================================================================

//! ## Overview
//! `bucket-gate serve` starts the MCP server on the configured transport.
//! `bucket-gate tools` prints the tool catalog, and `bucket-gate config
//! check` loads configuration and credential documents without serving.
//! Command-line flags override environment variables, which override the
//! config file.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use bucket_gate_config::BucketGateConfig;
use bucket_gate_config::ConfigError;
use bucket_gate_config::EnvOverrides;
use bucket_gate_config::ServerTransport;
use bucket_gate_contract::tool_definitions;
use bucket_gate_mcp::BootstrapError;
use bucket_gate_mcp::CredentialFileFactory;
use bucket_gate_mcp::McpNoopAuditSink;
use bucket_gate_mcp::McpServer;
use bucket_gate_mcp::TenantClientFactory;
use bucket_gate_mcp::build_registry;
use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "bucket-gate", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Bucket Gate MCP server.
    Serve(ServeCommand),
    /// Print the tool catalog as JSON.
    Tools,
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to `BUCKET_GATE_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Transport override.
    #[arg(long, value_enum, value_name = "TRANSPORT")]
    transport: Option<TransportArg>,
    /// HTTP bind address override.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load configuration and credentials, then report tenant status.
    Check(ConfigCheckCommand),
}

/// Configuration for the `config check` command.
#[derive(Args, Debug)]
struct ConfigCheckCommand {
    /// Optional config file path (defaults to `BUCKET_GATE_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Transport selection flag.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum TransportArg {
    /// Stdin/stdout JSON-RPC.
    Stdio,
    /// HTTP `POST /rpc`.
    Http,
}

impl TransportArg {
    /// Maps the flag to the config transport.
    const fn transport(self) -> ServerTransport {
        match self {
            Self::Stdio => ServerTransport::Stdio,
            Self::Http => ServerTransport::Http,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        write_stdout_line(&format!("bucket-gate {}", env!("CARGO_PKG_VERSION")))?;
        return Ok(ExitCode::SUCCESS);
    }
    let Some(command) = cli.command else {
        write_stdout_line(&Cli::command().render_help().to_string())?;
        return Ok(ExitCode::SUCCESS);
    };
    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Tools => command_tools(),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config =
        load_config(command.config.as_deref(), command.transport, command.bind.as_deref())
            .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    let server = tokio::task::spawn_blocking(move || McpServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("server init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads configuration with command-line flags layered over the environment.
fn load_config(
    path: Option<&Path>,
    transport: Option<TransportArg>,
    bind: Option<&str>,
) -> Result<BucketGateConfig, ConfigError> {
    let overrides = cli_overrides(EnvOverrides::from_process(), transport, bind);
    BucketGateConfig::from_sources(path, &overrides)
}

/// Replaces environment overrides with command-line flags where given.
fn cli_overrides(
    mut overrides: EnvOverrides,
    transport: Option<TransportArg>,
    bind: Option<&str>,
) -> EnvOverrides {
    if let Some(transport) = transport {
        overrides.transport = Some(transport.transport().as_str().to_string());
    }
    if let Some(bind) = bind {
        overrides.bind = Some(bind.to_string());
    }
    overrides
}

// ============================================================================
// SECTION: Tools Command
// ============================================================================

/// Prints the tool catalog.
fn command_tools() -> CliResult<ExitCode> {
    let catalog = serde_json::to_string_pretty(&tool_definitions())
        .map_err(|err| CliError::new(format!("catalog serialization failed: {err}")))?;
    write_stdout_line(&catalog)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Check(command) => command_config_check(&command),
    }
}

/// Executes the config check command.
fn command_config_check(command: &ConfigCheckCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref(), None, None)
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    let factory = CredentialFileFactory::new(config.tenants.keys_dir.clone());
    let (report, healthy) = config_report(&config, &factory);
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|err| CliError::new(format!("report serialization failed: {err}")))?;
    write_stdout_line(&rendered)?;
    Ok(if healthy { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Builds the tenant status report. The flag is false when start-up would fail.
fn config_report(config: &BucketGateConfig, factory: &dyn TenantClientFactory) -> (Value, bool) {
    let base = json!({
        "transport": config.server.transport.as_str(),
        "bind": config.server.bind,
        "keysDir": config.tenants.keys_dir.display().to_string(),
        "raw": config.tenants.raw_project_ids(),
    });
    let (status, healthy) = match build_registry(&config.tenants, factory, &McpNoopAuditSink) {
        Ok(registry) => {
            let snapshot = registry.snapshot();
            let status = json!({
                "configured": snapshot.configured,
                "default": snapshot.default,
                "registered": snapshot.registered,
                "failed": snapshot.failed,
            });
            (status, true)
        }
        Err(BootstrapError::NoTenantsRegistered {
            failed,
        }) => {
            let configured = config.tenants.tenant_ids();
            let status = json!({
                "configured": configured,
                "default": configured.first(),
                "registered": [],
                "failed": failed,
            });
            (status, false)
        }
        Err(err) => (json!({ "error": err.to_string() }), false),
    };
    let mut report = base;
    if let (Value::Object(fields), Value::Object(status)) = (&mut report, status) {
        fields.extend(status);
    }
    (report, healthy)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write to stdout: {err}")))
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
