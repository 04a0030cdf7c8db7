// crates/bucket-gate-mcp/src/bootstrap.rs
// ============================================================================
// Module: Tenant Bootstrap
// Description: Builds the tenant registry from configuration at start-up.
// Purpose: Create one storage client per configured tenant, isolating failures.
// Dependencies: bucket-gate-config, bucket-gate-contract, thiserror
// ============================================================================

//! ## Overview
//! Start-up walks the configured identifiers in order. Each one either gets a
//! storage client registered or a recorded failure; a bad credential document
//! never prevents other tenants from serving, and neither does an identifier
//! that cannot name a credential file. Start-up is fatal only when
//! identifiers were configured and none of them could be registered.
//!
//! Client construction goes through [`TenantClientFactory`] so tests can swap
//! in-memory clients for the credential-file backed default.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use bucket_gate_config::CredentialDocument;
use bucket_gate_config::CredentialError;
use bucket_gate_config::TenantIdError;
use bucket_gate_config::TenantsConfig;
use bucket_gate_config::validate_tenant_id;
use bucket_gate_contract::TenantId;
use thiserror::Error;

use crate::audit::McpAuditSink;
use crate::audit::StartupAuditEvent;
use crate::audit::StartupEventKind;
use crate::registry::RegistryError;
use crate::registry::TenantFailure;
use crate::registry::TenantRegistry;
use crate::storage::S3StorageClient;
use crate::storage::StorageClient;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure to create a storage client for one tenant.
#[derive(Debug, Error)]
pub enum TenantInitError {
    /// Identifier cannot name a credential document.
    #[error("invalid project identifier: {0}")]
    InvalidIdentifier(#[from] TenantIdError),
    /// Credential document missing or unusable.
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    /// Client construction failed.
    #[error("client construction failed: {0}")]
    Client(String),
}

/// Fatal start-up errors.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Identifiers were configured but none initialised.
    #[error("no configured project could be initialized ({} failed)", .failed.len())]
    NoTenantsRegistered {
        /// Per-tenant failure reasons in configured order.
        failed: Vec<TenantFailure>,
    },
    /// Registry builder rejected an outcome.
    #[error("tenant registry error: {0}")]
    Registry(#[from] RegistryError),
}

// ============================================================================
// SECTION: Client Factory
// ============================================================================

/// Creates storage clients for tenants.
pub trait TenantClientFactory: Send + Sync {
    /// Builds the storage client for `tenant`.
    ///
    /// # Errors
    ///
    /// Returns [`TenantInitError`] when the tenant cannot be initialised.
    fn create(&self, tenant: &TenantId) -> Result<Arc<dyn StorageClient>, TenantInitError>;
}

/// Factory that reads `<keys_dir>/<tenant>.json` and builds an S3 client.
#[derive(Debug, Clone)]
pub struct CredentialFileFactory {
    /// Directory holding credential documents.
    keys_dir: PathBuf,
}

impl CredentialFileFactory {
    /// Creates a factory rooted at `keys_dir`.
    #[must_use]
    pub fn new(keys_dir: impl Into<PathBuf>) -> Self {
        Self {
            keys_dir: keys_dir.into(),
        }
    }
}

impl TenantClientFactory for CredentialFileFactory {
    fn create(&self, tenant: &TenantId) -> Result<Arc<dyn StorageClient>, TenantInitError> {
        let document = CredentialDocument::load(&self.keys_dir, tenant)?;
        Ok(Arc::new(S3StorageClient::from_credentials(&document)))
    }
}

// ============================================================================
// SECTION: Registry Construction
// ============================================================================

/// Checks the identifier, then asks the factory for a client.
fn initialize_tenant(
    tenant: &TenantId,
    factory: &dyn TenantClientFactory,
) -> Result<Arc<dyn StorageClient>, TenantInitError> {
    validate_tenant_id(tenant)?;
    factory.create(tenant)
}

/// Builds the tenant registry, emitting one start-up event per outcome.
///
/// An empty identifier list yields an empty registry and a warning.
///
/// # Errors
///
/// Returns [`BootstrapError::NoTenantsRegistered`] when identifiers were
/// configured but every one failed.
pub fn build_registry(
    tenants: &TenantsConfig,
    factory: &dyn TenantClientFactory,
    audit: &dyn McpAuditSink,
) -> Result<TenantRegistry, BootstrapError> {
    let ids = tenants.tenant_ids();
    let mut builder = TenantRegistry::configure(ids, tenants.raw_project_ids());
    if builder.configured().is_empty() {
        audit.record_startup(&StartupAuditEvent::new(
            StartupEventKind::Warning,
            None,
            Some("no project identifiers configured; tenant-scoped tools will fail".to_string()),
        ));
        return Ok(builder.build());
    }

    let configured = builder.configured().to_vec();
    let mut failed = Vec::new();
    for tenant in &configured {
        match initialize_tenant(tenant, factory) {
            Ok(client) => {
                builder.register(tenant.clone(), client)?;
                audit.record_startup(&StartupAuditEvent::new(
                    StartupEventKind::TenantRegistered,
                    Some(tenant.to_string()),
                    None,
                ));
            }
            Err(err) => {
                let reason = err.to_string();
                builder.record_failure(tenant.clone(), reason.clone())?;
                audit.record_startup(&StartupAuditEvent::new(
                    StartupEventKind::TenantFailed,
                    Some(tenant.to_string()),
                    Some(reason.clone()),
                ));
                failed.push(TenantFailure {
                    project_id: tenant.clone(),
                    reason,
                });
            }
        }
    }

    if failed.len() == configured.len() {
        audit.record_startup(&StartupAuditEvent::new(
            StartupEventKind::Fatal,
            None,
            Some("no configured project could be initialized".to_string()),
        ));
        return Err(BootstrapError::NoTenantsRegistered {
            failed,
        });
    }

    let registry = builder.build();
    if let Some(default) = registry.default_tenant() {
        audit.record_startup(&StartupAuditEvent::new(
            StartupEventKind::DefaultTenant,
            Some(default.to_string()),
            None,
        ));
    }
    Ok(registry)
}
