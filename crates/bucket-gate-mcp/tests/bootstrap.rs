// crates/bucket-gate-mcp/tests/bootstrap.rs
// ============================================================================
// Module: Bootstrap Tests
// Description: Registry construction from configuration and credentials.
// Purpose: Verify per-tenant failure isolation and the fatal start-up rule.
// Dependencies: bucket-gate-mcp, tempfile
// ============================================================================

//! ## Overview
//! Start-up must register every tenant it can, record why the others failed,
//! and only refuse to serve when nothing registered.

#![allow(
    clippy::use_debug,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;

use bucket_gate_contract::TenantId;
use bucket_gate_mcp::BootstrapError;
use bucket_gate_mcp::CredentialFileFactory;
use bucket_gate_mcp::McpNoopAuditSink;
use bucket_gate_mcp::McpServer;
use bucket_gate_mcp::build_registry;
use common::MemoryFactory;
use common::RecordingAuditSink;
use common::TestResult;
use common::ensure;

mod common;

fn tenant(raw: &str) -> TenantId {
    TenantId::parse(raw).expect("tenant")
}

#[test]
fn registers_what_it_can_and_records_the_rest() -> TestResult {
    let factory = MemoryFactory::default().with_tenant("alpha", &["data"]);
    let audit = RecordingAuditSink::default();
    let registry = build_registry(&common::tenants("alpha,beta"), &factory, &audit)
        .map_err(|err| err.to_string())?;

    let snapshot = registry.snapshot();
    ensure(snapshot.registered == vec![tenant("alpha")], "alpha registered")?;
    ensure(snapshot.failed.len() == 1, "beta failed")?;
    ensure(snapshot.failed[0].project_id == tenant("beta"), "failure names beta")?;
    ensure(snapshot.default == Some(tenant("alpha")), "default is first configured")?;
    ensure(
        audit.startup_kinds() == ["tenant_registered", "tenant_failed", "default_tenant"],
        format!("unexpected startup events: {:?}", audit.startup_kinds()),
    )
}

#[test]
fn empty_configuration_is_a_warning_not_an_error() -> TestResult {
    let audit = RecordingAuditSink::default();
    let registry = build_registry(&common::tenants(""), &MemoryFactory::default(), &audit)
        .map_err(|err| err.to_string())?;
    ensure(registry.default_tenant().is_none(), "no default tenant")?;
    ensure(audit.startup_kinds() == ["warning"], "warning emitted")
}

#[test]
fn zero_registered_tenants_is_fatal() -> TestResult {
    let audit = RecordingAuditSink::default();
    let result = build_registry(&common::tenants("alpha,beta"), &MemoryFactory::default(), &audit);
    match result {
        Err(BootstrapError::NoTenantsRegistered {
            failed,
        }) => {
            ensure(failed.len() == 2, "both failures reported")?;
            ensure(audit.startup_kinds().last().map(String::as_str) == Some("fatal"), "fatal event")
        }
        Err(other) => Err(format!("unexpected error: {other}")),
        Ok(_) => Err("expected fatal bootstrap".to_string()),
    }
}

#[test]
fn duplicate_identifiers_are_initialised_once() -> TestResult {
    let factory = MemoryFactory::default().with_tenant("alpha", &[]);
    let registry = build_registry(&common::tenants("alpha, alpha ,"), &factory, &McpNoopAuditSink)
        .map_err(|err| err.to_string())?;
    ensure(registry.configured() == [tenant("alpha")], "duplicates collapsed")?;
    ensure(registry.snapshot().raw == "alpha, alpha ,", "raw string preserved")
}

#[test]
fn credential_files_fail_per_tenant() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    fs::write(
        dir.path().join("good.json"),
        r#"{"access_key_id":"GOOG1EXAMPLE","secret_access_key":"c2VjcmV0"}"#,
    )
    .map_err(|err| err.to_string())?;
    fs::write(dir.path().join("broken.json"), "{not json").map_err(|err| err.to_string())?;
    fs::write(
        dir.path().join("extra.json"),
        r#"{"access_key_id":"a","secret_access_key":"b","private_key":"c"}"#,
    )
    .map_err(|err| err.to_string())?;

    let factory = CredentialFileFactory::new(dir.path());
    let registry =
        build_registry(&common::tenants("good,broken,extra,missing"), &factory, &McpNoopAuditSink)
            .map_err(|err| err.to_string())?;
    let snapshot = registry.snapshot();
    ensure(snapshot.registered == vec![tenant("good")], "only good registered")?;
    let failed: Vec<&str> =
        snapshot.failed.iter().map(|failure| failure.project_id.as_str()).collect();
    ensure(failed == ["broken", "extra", "missing"], format!("failed: {failed:?}"))?;
    let missing = &snapshot.failed[2].reason;
    ensure(missing.contains("not found"), format!("missing reason: {missing}"))
}

#[test]
fn server_refuses_to_start_without_tenants() -> TestResult {
    let result =
        McpServer::from_config_with_factory(common::config("alpha"), &MemoryFactory::default());
    ensure(result.is_err(), "server start must fail")
}

#[test]
fn unsafe_identifiers_fail_only_their_own_tenant() -> TestResult {
    let factory =
        MemoryFactory::default().with_tenant("good", &["data"]).with_tenant("bad/id", &["data"]);
    let audit = RecordingAuditSink::default();
    let registry = build_registry(&common::tenants("good,bad/id"), &factory, &audit)
        .map_err(|err| err.to_string())?;
    let snapshot = registry.snapshot();
    ensure(snapshot.registered == vec![tenant("good")], "good registered")?;
    ensure(snapshot.failed.len() == 1, "unsafe identifier failed")?;
    let reason = &snapshot.failed[0].reason;
    ensure(
        reason.starts_with("invalid project identifier:"),
        format!("unexpected reason: {reason}"),
    )?;
    ensure(
        audit.startup_kinds() == ["tenant_registered", "tenant_failed", "default_tenant"],
        format!("unexpected startup events: {:?}", audit.startup_kinds()),
    )
}

#[test]
fn only_unsafe_identifiers_is_fatal() -> TestResult {
    let factory = MemoryFactory::default().with_tenant("..", &[]);
    match build_registry(&common::tenants(".."), &factory, &McpNoopAuditSink) {
        Err(BootstrapError::NoTenantsRegistered {
            failed,
        }) => ensure(failed.len() == 1, "single failure reported"),
        Err(other) => Err(format!("unexpected error: {other}")),
        Ok(_) => Err("expected fatal bootstrap".to_string()),
    }
}

#[test]
fn server_starts_with_one_tenant() -> TestResult {
    let factory = MemoryFactory::default().with_tenant("alpha", &["data"]);
    let server = McpServer::from_config_with_factory(common::config("alpha"), &factory)
        .map_err(|err| err.to_string())?;
    ensure(server.handler().router().registry().registered_count() == 1, "one tenant registered")
}
