// crates/bucket-gate-mcp/src/lib.rs
// ============================================================================
// Module: Bucket Gate MCP
// Description: MCP server exposing multi-tenant object storage tools.
// Purpose: Route agent tool calls to per-tenant storage clients.
// Dependencies: bucket-gate-config, bucket-gate-contract, aws-sdk-s3, axum, tokio
// ============================================================================

//! ## Overview
//! Bucket Gate MCP serves the tool catalog from `bucket-gate-contract` over
//! JSON-RPC 2.0. Every tool call flows through [`tools::ToolRouter`], which
//! validates arguments, resolves the tenant's storage client from the
//! immutable [`registry::TenantRegistry`], invokes the backend adapter, and
//! wraps the result in a uniform [`envelope::ToolEnvelope`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod adapters;
pub mod audit;
pub mod bootstrap;
pub mod encoding;
pub mod envelope;
pub mod registry;
pub mod server;
pub mod storage;
pub mod telemetry;
pub mod tools;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::McpAuditEvent;
pub use audit::McpAuditSink;
pub use audit::McpFileAuditSink;
pub use audit::McpNoopAuditSink;
pub use audit::McpStderrAuditSink;
pub use audit::StartupAuditEvent;
pub use audit::StartupEventKind;
pub use audit::ToolCallAuditEvent;
pub use bootstrap::BootstrapError;
pub use bootstrap::CredentialFileFactory;
pub use bootstrap::TenantClientFactory;
pub use bootstrap::TenantInitError;
pub use bootstrap::build_registry;
pub use envelope::ErrorKind;
pub use envelope::ToolEnvelope;
pub use envelope::ToolFailure;
pub use registry::RegistrySnapshot;
pub use registry::TenantRegistry;
pub use server::McpHandler;
pub use server::McpServer;
pub use server::McpServerError;
pub use storage::InMemoryStorageClient;
pub use storage::S3StorageClient;
pub use storage::StorageClient;
pub use storage::StorageError;
pub use telemetry::MCP_LATENCY_BUCKETS_MS;
pub use telemetry::McpMethod;
pub use telemetry::McpMetricEvent;
pub use telemetry::McpMetrics;
pub use telemetry::McpOutcome;
pub use telemetry::NoopMetrics;
pub use tools::ToolError;
pub use tools::ToolRouter;
