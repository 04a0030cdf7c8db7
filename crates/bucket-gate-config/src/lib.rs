// crates/bucket-gate-config/src/lib.rs
// ============================================================================
// Module: Bucket Gate Config Library
// Description: Configuration model, environment overrides, and credentials.
// Purpose: Single source of truth for server and tenant configuration.
// Dependencies: bucket-gate-contract, serde, serde_json, toml
// ============================================================================

//! ## Overview
//! `bucket-gate-config` loads the server configuration from an optional TOML
//! file plus `BUCKET_GATE_*` environment variables, and parses the per-tenant
//! credential documents kept in the keys directory. Configuration problems
//! fail closed with [`ConfigError`]; a bad credential document only affects
//! its own tenant and is reported as [`CredentialError`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod credentials;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use credentials::CredentialDocument;
pub use credentials::CredentialError;
pub use credentials::DEFAULT_ENDPOINT;
pub use credentials::DEFAULT_REGION;
pub use credentials::credential_path;
