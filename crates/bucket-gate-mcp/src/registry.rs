// crates/bucket-gate-mcp/src/registry.rs
// ============================================================================
// Module: Tenant Registry
// Description: Immutable map from tenant identifiers to storage clients.
// Purpose: Route each call to exactly the client its tenant configured.
// Dependencies: bucket-gate-contract, serde, thiserror
// ============================================================================

//! ## Overview
//! The registry is assembled once at start-up through
//! [`TenantRegistryBuilder`] and is read-only afterwards, so concurrent
//! lookups need no locking. It remembers three things per configured
//! identifier: its position (the first is the default), its client when
//! initialisation succeeded, and the failure reason when it did not.
//!
//! Invariants:
//! - A client is held only for an identifier that was configured.
//! - Each identifier has at most one client.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use bucket_gate_contract::TenantId;
use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageClient;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Start-up registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Identifier is not in the configured list.
    #[error("project {0} is not configured")]
    NotConfigured(String),
    /// Identifier already has a client or a recorded failure.
    #[error("project {0} is already registered")]
    AlreadyRegistered(String),
}

/// Per-call lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// Identifier was never configured.
    #[error("project {0} is not configured")]
    NotConfigured(TenantId),
    /// Identifier was configured but its client could not be created.
    #[error("project {tenant} failed initialization: {reason}")]
    InitializationFailed {
        /// Tenant identifier.
        tenant: TenantId,
        /// Recorded start-up failure.
        reason: String,
    },
}

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Start-up failure for one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantFailure {
    /// Tenant identifier.
    pub project_id: TenantId,
    /// Failure reason.
    pub reason: String,
}

/// Read-only view of registry state used by `listProjects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    /// Configured identifiers in order.
    pub configured: Vec<TenantId>,
    /// Default identifier.
    pub default: Option<TenantId>,
    /// Identifiers with a live client, in configured order.
    pub registered: Vec<TenantId>,
    /// Identifiers whose initialisation failed, in configured order.
    pub failed: Vec<TenantFailure>,
    /// Identifier list as originally supplied.
    pub raw: String,
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Immutable tenant registry.
pub struct TenantRegistry {
    /// Configured identifiers in order.
    configured: Vec<TenantId>,
    /// Live clients by identifier.
    clients: BTreeMap<TenantId, Arc<dyn StorageClient>>,
    /// Start-up failures by identifier.
    failures: BTreeMap<TenantId, String>,
    /// Identifier list as originally supplied.
    raw: String,
}

impl fmt::Debug for TenantRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TenantRegistry")
            .field("configured", &self.configured)
            .field("registered", &self.clients.keys().collect::<Vec<_>>())
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}

impl TenantRegistry {
    /// Starts a registry for the configured identifiers.
    ///
    /// Duplicate identifiers keep their first position.
    #[must_use]
    pub fn configure(ids: Vec<TenantId>, raw: impl Into<String>) -> TenantRegistryBuilder {
        let mut seen = BTreeSet::new();
        let configured = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();
        TenantRegistryBuilder {
            configured,
            clients: BTreeMap::new(),
            failures: BTreeMap::new(),
            raw: raw.into(),
        }
    }

    /// Returns a registry with no configured tenants.
    #[must_use]
    pub fn empty() -> Self {
        Self::configure(Vec::new(), String::new()).build()
    }

    /// Returns the client for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] when the tenant is unknown or has no
    /// client.
    pub fn resolve(&self, tenant: &TenantId) -> Result<Arc<dyn StorageClient>, ResolutionError> {
        if let Some(client) = self.clients.get(tenant) {
            return Ok(Arc::clone(client));
        }
        if let Some(reason) = self.failures.get(tenant) {
            return Err(ResolutionError::InitializationFailed {
                tenant: tenant.clone(),
                reason: reason.clone(),
            });
        }
        if self.configured.contains(tenant) {
            return Err(ResolutionError::InitializationFailed {
                tenant: tenant.clone(),
                reason: "no client registered".to_string(),
            });
        }
        Err(ResolutionError::NotConfigured(tenant.clone()))
    }

    /// Returns the default tenant, the first configured identifier.
    #[must_use]
    pub fn default_tenant(&self) -> Option<&TenantId> {
        self.configured.first()
    }

    /// Returns configured identifiers in order.
    #[must_use]
    pub fn configured(&self) -> &[TenantId] {
        &self.configured
    }

    /// Returns the number of tenants with a live client.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.clients.len()
    }

    /// Captures registry state for reporting.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        let registered =
            self.configured.iter().filter(|id| self.clients.contains_key(*id)).cloned().collect();
        let failed = self
            .configured
            .iter()
            .filter_map(|id| {
                self.failures.get(id).map(|reason| TenantFailure {
                    project_id: id.clone(),
                    reason: reason.clone(),
                })
            })
            .collect();
        RegistrySnapshot {
            configured: self.configured.clone(),
            default: self.default_tenant().cloned(),
            registered,
            failed,
            raw: self.raw.clone(),
        }
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Mutable start-up view of a [`TenantRegistry`].
pub struct TenantRegistryBuilder {
    /// Configured identifiers in order.
    configured: Vec<TenantId>,
    /// Live clients by identifier.
    clients: BTreeMap<TenantId, Arc<dyn StorageClient>>,
    /// Start-up failures by identifier.
    failures: BTreeMap<TenantId, String>,
    /// Identifier list as originally supplied.
    raw: String,
}

impl TenantRegistryBuilder {
    /// Returns configured identifiers in order.
    #[must_use]
    pub fn configured(&self) -> &[TenantId] {
        &self.configured
    }

    /// Registers the client for a configured tenant.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the tenant is not configured or was
    /// already handled.
    pub fn register(
        &mut self,
        tenant: TenantId,
        client: Arc<dyn StorageClient>,
    ) -> Result<(), RegistryError> {
        self.ensure_open(&tenant)?;
        self.clients.insert(tenant, client);
        Ok(())
    }

    /// Records why a configured tenant has no client.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the tenant is not configured or was
    /// already handled.
    pub fn record_failure(
        &mut self,
        tenant: TenantId,
        reason: impl Into<String>,
    ) -> Result<(), RegistryError> {
        self.ensure_open(&tenant)?;
        self.failures.insert(tenant, reason.into());
        Ok(())
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> TenantRegistry {
        TenantRegistry {
            configured: self.configured,
            clients: self.clients,
            failures: self.failures,
            raw: self.raw,
        }
    }

    /// Checks that a tenant is configured and not yet handled.
    fn ensure_open(&self, tenant: &TenantId) -> Result<(), RegistryError> {
        if !self.configured.contains(tenant) {
            return Err(RegistryError::NotConfigured(tenant.to_string()));
        }
        if self.clients.contains_key(tenant) || self.failures.contains_key(tenant) {
            return Err(RegistryError::AlreadyRegistered(tenant.to_string()));
        }
        Ok(())
    }
}
