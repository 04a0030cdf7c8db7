// crates/bucket-gate-mcp/src/telemetry.rs
// ============================================================================
// Module: MCP Telemetry
// Description: Observability hooks for MCP transport and tool routing.
// Purpose: Provide metric events and latency buckets without hard deps.
// Dependencies: bucket-gate-config, bucket-gate-contract
// ============================================================================

//! ## Overview
//! This module exposes a thin metrics interface for request counters and
//! latency histograms. Deployments plug in their own exporter by
//! implementing [`McpMetrics`]. Labels never include tenant payloads or
//! credential material.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use bucket_gate_config::ServerTransport;
use bucket_gate_contract::ToolName;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default latency buckets in milliseconds for MCP request histograms.
pub const MCP_LATENCY_BUCKETS_MS: &[u64] =
    &[1, 2, 5, 10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000];

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// MCP request method classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum McpMethod {
    /// JSON-RPC initialize.
    Initialize,
    /// JSON-RPC ping.
    Ping,
    /// JSON-RPC tools/list.
    ToolsList,
    /// JSON-RPC tools/call.
    ToolsCall,
    /// Any notification (no response).
    Notification,
    /// Invalid or malformed JSON-RPC request.
    Invalid,
    /// Unsupported JSON-RPC method.
    Other,
}

impl McpMethod {
    /// Classifies a JSON-RPC method name.
    #[must_use]
    pub fn from_method(method: &str) -> Self {
        match method {
            "initialize" => Self::Initialize,
            "ping" => Self::Ping,
            "tools/list" => Self::ToolsList,
            "tools/call" => Self::ToolsCall,
            _ if method.starts_with("notifications/") => Self::Notification,
            _ => Self::Other,
        }
    }

    /// Returns a stable label for the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Ping => "ping",
            Self::ToolsList => "tools/list",
            Self::ToolsCall => "tools/call",
            Self::Notification => "notification",
            Self::Invalid => "invalid",
            Self::Other => "other",
        }
    }
}

/// MCP request outcome classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum McpOutcome {
    /// Successful request.
    Ok,
    /// Failed request.
    Error,
}

impl McpOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// MCP request metric event payload.
#[derive(Debug, Clone)]
pub struct McpMetricEvent {
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

/// Tool call metric event payload.
#[derive(Debug, Clone)]
pub struct ToolMetricEvent {
    /// Tool name, when the call named a known tool.
    pub tool: Option<ToolName>,
    /// Call outcome.
    pub outcome: McpOutcome,
    /// Envelope error kind label on failure.
    pub error_kind: Option<&'static str>,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for MCP requests and latencies.
pub trait McpMetrics: Send + Sync {
    /// Records a request counter event.
    fn record_request(&self, event: McpMetricEvent);
    /// Records a latency observation for the request.
    fn record_latency(&self, event: McpMetricEvent, latency: Duration);
    /// Records a completed tool call and its latency.
    fn record_tool_call(&self, event: ToolMetricEvent, latency: Duration);
}

/// No-op metrics sink.
///
/// # Invariants
/// - Metrics are intentionally discarded.
pub struct NoopMetrics;

impl McpMetrics for NoopMetrics {
    fn record_request(&self, _event: McpMetricEvent) {}

    fn record_latency(&self, _event: McpMetricEvent, _latency: Duration) {}

    fn record_tool_call(&self, _event: ToolMetricEvent, _latency: Duration) {}
}
