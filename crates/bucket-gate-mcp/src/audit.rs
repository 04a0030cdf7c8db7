// crates/bucket-gate-mcp/src/audit.rs
// ============================================================================
// Module: MCP Audit Logging
// Description: Structured audit events for start-up, requests, and tools.
// Purpose: Emit redacted JSON-line logs without hard dependencies.
// Dependencies: bucket-gate-config, serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines audit event payloads and sinks. Events are written
//! as one JSON object per line. Stdout is reserved for the stdio transport,
//! so the default sink writes to stderr.
//!
//! Events never carry credential contents or object payloads; tool events
//! record the tool, tenant, outcome, and error classification only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use bucket_gate_config::ServerTransport;
use serde::Serialize;

use crate::telemetry::McpMethod;
use crate::telemetry::McpOutcome;

// ============================================================================
// SECTION: Types
// ============================================================================

/// JSON-RPC request audit event.
#[derive(Debug, Clone, Serialize)]
pub struct McpAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Request identifier when provided.
    pub request_id: Option<String>,
    /// Transport used for the request.
    pub transport: ServerTransport,
    /// JSON-RPC method classification.
    pub method: McpMethod,
    /// Request outcome.
    pub outcome: McpOutcome,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

/// Inputs required to construct a request audit event.
pub struct McpAuditEventParams {
    /// Request identifier when provided.
    pub request_id: Option<String>,
    /// Transport type used for the request.
    pub transport: ServerTransport,
    /// JSON-RPC method classification.
    pub method: McpMethod,
    /// Request outcome.
    pub outcome: McpOutcome,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

impl McpAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: McpAuditEventParams) -> Self {
        Self {
            event: "mcp_request",
            timestamp_ms: now_ms(),
            request_id: params.request_id,
            transport: params.transport,
            method: params.method,
            outcome: params.outcome,
            error_code: params.error_code,
            request_bytes: params.request_bytes,
            response_bytes: params.response_bytes,
        }
    }
}

/// Tool call audit event.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Tool name as requested.
    pub tool: String,
    /// Resolved tenant identifier, when validation got that far.
    pub tenant: Option<String>,
    /// Call outcome.
    pub outcome: McpOutcome,
    /// Envelope error kind on failure.
    pub error_kind: Option<&'static str>,
    /// Envelope error category on failure.
    pub error_category: Option<String>,
    /// Wall-clock latency in milliseconds.
    pub latency_ms: u128,
}

/// Inputs required to construct a tool call audit event.
pub struct ToolCallAuditEventParams {
    /// Tool name as requested.
    pub tool: String,
    /// Resolved tenant identifier.
    pub tenant: Option<String>,
    /// Call outcome.
    pub outcome: McpOutcome,
    /// Envelope error kind on failure.
    pub error_kind: Option<&'static str>,
    /// Envelope error category on failure.
    pub error_category: Option<String>,
    /// Wall-clock latency in milliseconds.
    pub latency_ms: u128,
}

impl ToolCallAuditEvent {
    /// Creates a new tool call audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: ToolCallAuditEventParams) -> Self {
        Self {
            event: "tool_call",
            timestamp_ms: now_ms(),
            tool: params.tool,
            tenant: params.tenant,
            outcome: params.outcome,
            error_kind: params.error_kind,
            error_category: params.error_category,
            latency_ms: params.latency_ms,
        }
    }
}

/// Start-up event classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupEventKind {
    /// Tenant client created and registered.
    TenantRegistered,
    /// Tenant client could not be created.
    TenantFailed,
    /// Default tenant selected.
    DefaultTenant,
    /// Non-fatal configuration warning.
    Warning,
    /// Start-up cannot continue.
    Fatal,
    /// Server is accepting requests.
    Serving,
}

/// Start-up audit event.
#[derive(Debug, Clone, Serialize)]
pub struct StartupAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event classification.
    pub kind: StartupEventKind,
    /// Tenant the event concerns, if any.
    pub tenant: Option<String>,
    /// Human-readable detail.
    pub message: Option<String>,
}

impl StartupAuditEvent {
    /// Creates a new start-up event with a consistent timestamp.
    #[must_use]
    pub fn new(kind: StartupEventKind, tenant: Option<String>, message: Option<String>) -> Self {
        Self {
            event: "startup",
            timestamp_ms: now_ms(),
            kind,
            tenant,
            message,
        }
    }
}

/// Milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for MCP events.
pub trait McpAuditSink: Send + Sync {
    /// Record a JSON-RPC request event.
    fn record(&self, event: &McpAuditEvent);

    /// Record a tool call event.
    fn record_tool_call(&self, _event: &ToolCallAuditEvent) {}

    /// Record a start-up event.
    fn record_startup(&self, _event: &StartupAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct McpStderrAuditSink;

impl McpStderrAuditSink {
    /// Writes one serialized event line to stderr.
    fn emit(event: &impl Serialize) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

impl McpAuditSink for McpStderrAuditSink {
    fn record(&self, event: &McpAuditEvent) {
        Self::emit(event);
    }

    fn record_tool_call(&self, event: &ToolCallAuditEvent) {
        Self::emit(event);
    }

    fn record_startup(&self, event: &StartupAuditEvent) {
        Self::emit(event);
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct McpFileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl McpFileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized event line.
    fn emit(&self, event: &impl Serialize) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl McpAuditSink for McpFileAuditSink {
    fn record(&self, event: &McpAuditEvent) {
        self.emit(event);
    }

    fn record_tool_call(&self, event: &ToolCallAuditEvent) {
        self.emit(event);
    }

    fn record_startup(&self, event: &StartupAuditEvent) {
        self.emit(event);
    }
}

/// No-op audit sink.
pub struct McpNoopAuditSink;

impl McpAuditSink for McpNoopAuditSink {
    fn record(&self, _event: &McpAuditEvent) {}

    fn record_tool_call(&self, _event: &ToolCallAuditEvent) {}

    fn record_startup(&self, _event: &StartupAuditEvent) {}
}
