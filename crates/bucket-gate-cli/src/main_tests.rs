// crates/bucket-gate-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing, overrides, and reports.
// Purpose: Ensure flags layer over the environment and reports are accurate.
// Dependencies: bucket-gate-cli main helpers, tempfile
// ============================================================================

#![allow(
    clippy::use_debug,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;

use bucket_gate_config::BucketGateConfig;
use bucket_gate_config::EnvOverrides;
use bucket_gate_config::ServerTransport;
use bucket_gate_mcp::CredentialFileFactory;
use clap::Parser;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::TransportArg;
use super::cli_overrides;
use super::config_report;

const CREDENTIALS: &str = r#"{"access_key_id":"GOOG1EXAMPLE","secret_access_key":"c2VjcmV0"}"#;

#[test]
fn serve_flags_parse() {
    let args = ["bucket-gate", "serve", "--transport", "http", "--bind", "127.0.0.1:9000"];
    let cli = Cli::try_parse_from(args).expect("parse");
    match cli.command {
        Some(Commands::Serve(command)) => {
            assert_eq!(command.transport, Some(TransportArg::Http));
            assert_eq!(command.bind.as_deref(), Some("127.0.0.1:9000"));
            assert!(command.config.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn config_check_parses() {
    let cli = Cli::try_parse_from(["bucket-gate", "config", "check", "--config", "gate.toml"])
        .expect("parse");
    assert!(matches!(
        cli.command,
        Some(Commands::Config {
            command: ConfigCommand::Check(_),
        })
    ));
}

#[test]
fn unknown_transport_is_rejected() {
    assert!(Cli::try_parse_from(["bucket-gate", "serve", "--transport", "sse"]).is_err());
}

#[test]
fn flags_override_environment() {
    let env = EnvOverrides {
        transport: Some("stdio".to_string()),
        bind: Some("127.0.0.1:1".to_string()),
        project_ids: Some("alpha".to_string()),
        ..EnvOverrides::default()
    };
    let merged = cli_overrides(env, Some(TransportArg::Http), Some("127.0.0.1:2"));
    assert_eq!(merged.transport.as_deref(), Some("http"));
    assert_eq!(merged.bind.as_deref(), Some("127.0.0.1:2"));
    assert_eq!(merged.project_ids.as_deref(), Some("alpha"));

    let config = BucketGateConfig::from_sources(None, &merged).expect("config");
    assert_eq!(config.server.transport, ServerTransport::Http);
}

#[test]
fn report_lists_registered_and_failed_tenants() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("alpha.json"), CREDENTIALS).expect("write");
    let mut config = BucketGateConfig::default();
    config.tenants.set_raw_project_ids("alpha,beta");
    let (report, healthy) = config_report(&config, &CredentialFileFactory::new(dir.path()));
    assert!(healthy);
    assert_eq!(report["registered"], serde_json::json!(["alpha"]));
    assert_eq!(report["failed"][0]["projectId"], "beta");
    assert_eq!(report["default"], "alpha");
    assert_eq!(report["transport"], "stdio");
}

#[test]
fn report_is_unhealthy_when_nothing_registers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = BucketGateConfig::default();
    config.tenants.set_raw_project_ids("alpha");
    let (report, healthy) = config_report(&config, &CredentialFileFactory::new(dir.path()));
    assert!(!healthy);
    assert_eq!(report["registered"], serde_json::json!([]));
    assert_eq!(report["failed"][0]["projectId"], "alpha");
}
