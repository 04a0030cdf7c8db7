// crates/bucket-gate-mcp/src/tools.rs
// ============================================================================
// Module: MCP Tool Router
// Description: Tool dispatch for the Bucket Gate MCP server.
// Purpose: Validate, resolve, invoke, and wrap every tool call uniformly.
// Dependencies: bucket-gate-contract, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The tool router is the single entry point for tool calls. Each call runs
//! the same pipeline: look up the tool, validate its arguments, resolve the
//! tenant's storage client, invoke the adapter, and wrap the outcome in a
//! [`ToolEnvelope`].
//!
//! ## Invariants
//! - [`ToolRouter::handle_tool_call`] is total: it returns an envelope for
//!   every input and never panics or ends the process.
//! - Internal [`ToolError`] values become envelopes in exactly one place.
//! - Every call emits one audit event and one metric observation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use bucket_gate_contract::TenantId;
use bucket_gate_contract::ToolDefinition;
use bucket_gate_contract::ToolName;
use bucket_gate_contract::tool_definitions;
use serde_json::Value;
use thiserror::Error;

use crate::adapters;
use crate::audit::McpAuditSink;
use crate::audit::McpNoopAuditSink;
use crate::audit::ToolCallAuditEvent;
use crate::audit::ToolCallAuditEventParams;
use crate::envelope::ErrorKind;
use crate::envelope::ToolEnvelope;
use crate::registry::ResolutionError;
use crate::registry::TenantRegistry;
use crate::storage::StorageClient;
use crate::storage::StorageError;
use crate::telemetry::McpMetrics;
use crate::telemetry::McpOutcome;
use crate::telemetry::NoopMetrics;
use crate::telemetry::ToolMetricEvent;
use crate::validation;
use crate::validation::ValidationError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Internal tool failure, converted to an envelope before leaving the router.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool name not recognized.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// Arguments failed validation.
    #[error(transparent)]
    InvalidArguments(#[from] ValidationError),
    /// Tenant has no usable client.
    #[error(transparent)]
    UnconfiguredTenant(#[from] ResolutionError),
    /// Backend call failed.
    #[error("{category}: {source}")]
    Backend {
        /// Tool-specific error category.
        category: &'static str,
        /// Underlying storage failure.
        source: StorageError,
    },
}

impl ToolError {
    /// Returns the envelope error kind for this failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTool(_) => ErrorKind::UnknownTool,
            Self::InvalidArguments(_) => ErrorKind::InvalidArguments,
            Self::UnconfiguredTenant(_) => ErrorKind::UnconfiguredTenant,
            Self::Backend { .. } => ErrorKind::BackendOperationFailed,
        }
    }

    /// Converts the failure into its envelope form.
    #[must_use]
    pub fn into_envelope(self) -> ToolEnvelope {
        let kind = self.kind();
        match self {
            Self::UnknownTool(name) => {
                ToolEnvelope::error(kind, "unknown tool", format!("unknown tool: {name}"))
            }
            Self::InvalidArguments(err) => {
                ToolEnvelope::error(kind, "invalid arguments", err.to_string())
            }
            Self::UnconfiguredTenant(err) => {
                ToolEnvelope::error(kind, "project not configured", err.to_string())
            }
            Self::Backend {
                category,
                source,
            } => ToolEnvelope::error(kind, category, storage_message(source)),
        }
    }
}

/// Extracts the backend message carried by a storage error.
fn storage_message(error: StorageError) -> String {
    match error {
        StorageError::NotFound(message)
        | StorageError::AccessDenied(message)
        | StorageError::Backend(message)
        | StorageError::Io(message) => message,
        err @ StorageError::TooLarge { .. } => err.to_string(),
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Tool router backed by an immutable tenant registry.
#[derive(Clone)]
pub struct ToolRouter {
    /// Tenant registry shared across calls.
    registry: Arc<TenantRegistry>,
    /// Audit sink for tool call events.
    audit: Arc<dyn McpAuditSink>,
    /// Metrics sink for tool call observations.
    metrics: Arc<dyn McpMetrics>,
}

impl ToolRouter {
    /// Creates a router with no-op audit and metrics sinks.
    #[must_use]
    pub fn new(registry: Arc<TenantRegistry>) -> Self {
        Self {
            registry,
            audit: Arc::new(McpNoopAuditSink),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn McpAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Replaces the metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn McpMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns the tenant registry.
    #[must_use]
    pub fn registry(&self) -> &TenantRegistry {
        &self.registry
    }

    /// Returns the tool catalog.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        tool_definitions()
    }

    /// Handles one tool call and returns its envelope.
    pub async fn handle_tool_call(&self, name: &str, arguments: &Value) -> ToolEnvelope {
        let started = Instant::now();
        let mut tenant = None;
        let outcome = self.dispatch(name, arguments, &mut tenant).await;
        let envelope = match outcome {
            Ok(result) => ToolEnvelope::ok(result),
            Err(err) => err.into_envelope(),
        };
        self.observe(name, tenant, &envelope, started);
        envelope
    }

    /// Runs the lookup, validation, resolution, and adapter pipeline.
    async fn dispatch(
        &self,
        name: &str,
        arguments: &Value,
        tenant: &mut Option<TenantId>,
    ) -> Result<Value, ToolError> {
        let tool = ToolName::parse(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let default = self.registry.default_tenant();
        match tool {
            ToolName::ListBuckets => {
                let args = validation::parse_project_args(arguments, default)?;
                let client = self.resolve(&args.project_id, tenant)?;
                adapters::list_buckets(client.as_ref(), &args).await
            }
            ToolName::GetBucket => {
                let args = validation::parse_bucket_args(arguments, default)?;
                let client = self.resolve(&args.project_id, tenant)?;
                adapters::get_bucket(client.as_ref(), &args).await
            }
            ToolName::ListFiles => {
                let args = validation::parse_list_files_args(arguments, default)?;
                let client = self.resolve(&args.project_id, tenant)?;
                adapters::list_files(client.as_ref(), &args).await
            }
            ToolName::GetFile => {
                let args = validation::parse_file_args(arguments, default)?;
                let client = self.resolve(&args.project_id, tenant)?;
                adapters::get_file(client.as_ref(), &args).await
            }
            ToolName::UploadFile => {
                let args = validation::parse_upload_args(arguments, default)?;
                let client = self.resolve(&args.project_id, tenant)?;
                adapters::upload_file(client.as_ref(), &args).await
            }
            ToolName::DownloadFile => {
                let args = validation::parse_file_args(arguments, default)?;
                let client = self.resolve(&args.project_id, tenant)?;
                adapters::download_file(client.as_ref(), &args).await
            }
            ToolName::DeleteFile => {
                let args = validation::parse_file_args(arguments, default)?;
                let client = self.resolve(&args.project_id, tenant)?;
                adapters::delete_file(client.as_ref(), &args).await
            }
            ToolName::ListProjects => Ok(adapters::list_projects(&self.registry.snapshot())),
        }
    }

    /// Resolves a tenant client and remembers the tenant for auditing.
    fn resolve(
        &self,
        project_id: &TenantId,
        tenant: &mut Option<TenantId>,
    ) -> Result<Arc<dyn StorageClient>, ToolError> {
        *tenant = Some(project_id.clone());
        Ok(self.registry.resolve(project_id)?)
    }

    /// Emits the audit event and metric observation for a finished call.
    fn observe(
        &self,
        name: &str,
        tenant: Option<TenantId>,
        envelope: &ToolEnvelope,
        started: Instant,
    ) {
        let elapsed = started.elapsed();
        let failure = envelope.failure();
        let outcome = if failure.is_some() { McpOutcome::Error } else { McpOutcome::Ok };
        let error_kind = failure.map(|failure| failure.kind.as_str());
        self.audit.record_tool_call(&ToolCallAuditEvent::new(ToolCallAuditEventParams {
            tool: name.to_string(),
            tenant: tenant.map(|tenant| tenant.to_string()),
            outcome,
            error_kind,
            error_category: failure.map(|failure| failure.category.clone()),
            latency_ms: elapsed.as_millis(),
        }));
        self.metrics.record_tool_call(
            ToolMetricEvent {
                tool: ToolName::parse(name),
                outcome,
                error_kind,
            },
            elapsed,
        );
    }
}

#[cfg(test)]
mod tests;
