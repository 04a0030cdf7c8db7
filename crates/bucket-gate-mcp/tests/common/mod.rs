// crates/bucket-gate-mcp/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared fixtures for Bucket Gate MCP integration tests.
// Purpose: Recording sinks, in-memory tenant factories, and config builders.
// Dependencies: bucket-gate-config, bucket-gate-contract, bucket-gate-mcp
// ============================================================================

//! ## Overview
//! Tenants are backed by [`InMemoryStorageClient`] through a test
//! [`TenantClientFactory`], so nothing here touches the network.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::unwrap_in_result,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use bucket_gate_config::BucketGateConfig;
use bucket_gate_config::TenantsConfig;
use bucket_gate_contract::TenantId;
use bucket_gate_mcp::InMemoryStorageClient;
use bucket_gate_mcp::McpAuditEvent;
use bucket_gate_mcp::McpAuditSink;
use bucket_gate_mcp::StartupAuditEvent;
use bucket_gate_mcp::StorageClient;
use bucket_gate_mcp::TenantClientFactory;
use bucket_gate_mcp::TenantInitError;
use bucket_gate_mcp::ToolCallAuditEvent;
use serde_json::Value;

// ============================================================================
// SECTION: Results
// ============================================================================

/// Result type used by test functions.
pub type TestResult = Result<(), String>;

/// Fails with `message` unless `condition` holds.
pub fn ensure(condition: bool, message: impl Into<String>) -> TestResult {
    if condition { Ok(()) } else { Err(message.into()) }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink that keeps every event as JSON.
#[derive(Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<Value>>,
}

impl RecordingAuditSink {
    /// Returns recorded events whose `event` field equals `name`.
    pub fn events(&self, name: &str) -> Vec<Value> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event["event"] == name)
            .cloned()
            .collect()
    }

    /// Returns the `kind` labels of recorded start-up events.
    pub fn startup_kinds(&self) -> Vec<String> {
        self.events("startup")
            .iter()
            .filter_map(|event| event["kind"].as_str().map(str::to_string))
            .collect()
    }

    fn push(&self, event: Value) {
        self.events.lock().unwrap().push(event);
    }
}

impl McpAuditSink for RecordingAuditSink {
    fn record(&self, event: &McpAuditEvent) {
        self.push(serde_json::to_value(event).unwrap());
    }

    fn record_tool_call(&self, event: &ToolCallAuditEvent) {
        self.push(serde_json::to_value(event).unwrap());
    }

    fn record_startup(&self, event: &StartupAuditEvent) {
        self.push(serde_json::to_value(event).unwrap());
    }
}

// ============================================================================
// SECTION: Tenant Factory
// ============================================================================

/// Factory handing out pre-built in-memory clients.
#[derive(Default)]
pub struct MemoryFactory {
    clients: BTreeMap<String, Arc<InMemoryStorageClient>>,
}

impl MemoryFactory {
    /// Adds a tenant backed by a fresh store containing `buckets`.
    pub fn with_tenant(mut self, tenant: &str, buckets: &[&str]) -> Self {
        let store = InMemoryStorageClient::new();
        for bucket in buckets {
            store.create_bucket(bucket).unwrap();
        }
        self.clients.insert(tenant.to_string(), Arc::new(store));
        self
    }

    /// Returns the store for a tenant.
    pub fn store(&self, tenant: &str) -> Arc<InMemoryStorageClient> {
        Arc::clone(self.clients.get(tenant).expect("tenant store"))
    }
}

impl TenantClientFactory for MemoryFactory {
    fn create(&self, tenant: &TenantId) -> Result<Arc<dyn StorageClient>, TenantInitError> {
        self.clients
            .get(tenant.as_str())
            .map(|store| Arc::clone(store) as Arc<dyn StorageClient>)
            .ok_or_else(|| TenantInitError::Client(format!("no fixture for {tenant}")))
    }
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Builds a tenants section from a comma-separated identifier list.
pub fn tenants(raw: &str) -> TenantsConfig {
    let mut config = TenantsConfig::default();
    config.set_raw_project_ids(raw);
    config
}

/// Builds a full configuration with audit disabled.
pub fn config(raw: &str) -> BucketGateConfig {
    let mut config = BucketGateConfig::default();
    config.tenants = tenants(raw);
    config.audit.enabled = false;
    config
}
