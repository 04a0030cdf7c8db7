// crates/bucket-gate-config/src/credentials.rs
// ============================================================================
// Module: Tenant Credential Documents
// Description: Parsing and validation of per-tenant credential files.
// Purpose: Turn `<keys-dir>/<id>.json` into validated connection settings.
// Dependencies: bucket-gate-contract, serde, serde_json
// ============================================================================

//! ## Overview
//! Each configured tenant has one JSON credential document in the keys
//! directory. Documents carry static S3-compatible HMAC credentials plus an
//! optional endpoint and region. Unknown fields are rejected so typos do not
//! silently fall back to defaults.
//!
//! Secret values never appear in `Debug` output or error messages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs::File;
use std::io::ErrorKind;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use bucket_gate_contract::TenantId;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default S3-compatible endpoint (Cloud Storage XML API).
pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";
/// Default signing region.
pub const DEFAULT_REGION: &str = "auto";
/// Maximum credential document size in bytes.
const MAX_CREDENTIAL_FILE_SIZE: usize = 64 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Static credentials and connection settings for one tenant.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialDocument {
    /// HMAC access key identifier.
    pub access_key_id: String,
    /// HMAC secret.
    pub secret_access_key: String,
    /// Optional session token for temporary credentials.
    #[serde(default)]
    pub session_token: Option<String>,
    /// Optional endpoint override.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Optional signing region override.
    #[serde(default)]
    pub region: Option<String>,
    /// Use path-style bucket addressing.
    #[serde(default)]
    pub force_path_style: bool,
    /// Permit plain `http://` endpoints (local emulators).
    #[serde(default)]
    pub allow_http: bool,
}

impl fmt::Debug for CredentialDocument {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CredentialDocument")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("force_path_style", &self.force_path_style)
            .field("allow_http", &self.allow_http)
            .finish()
    }
}

impl CredentialDocument {
    /// Loads and validates the credential document for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the file is missing, unreadable,
    /// oversized, malformed, or fails validation.
    pub fn load(keys_dir: &Path, tenant: &TenantId) -> Result<Self, CredentialError> {
        let path = credential_path(keys_dir, tenant);
        let bytes = read_bounded(&path)?;
        Self::from_json_bytes(&bytes)
    }

    /// Parses and validates a credential document from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the document is oversized, malformed,
    /// or fails validation.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, CredentialError> {
        if bytes.len() > MAX_CREDENTIAL_FILE_SIZE {
            return Err(CredentialError::Invalid(
                "credential document exceeds size limit".to_string(),
            ));
        }
        let document: Self =
            serde_json::from_slice(bytes).map_err(|err| CredentialError::Parse(err.to_string()))?;
        document.validate()?;
        Ok(document)
    }

    /// Validates required fields and the endpoint scheme.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Invalid`] when a field is unusable.
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.access_key_id.trim().is_empty() {
            return Err(CredentialError::Invalid("access_key_id must be non-empty".to_string()));
        }
        if self.secret_access_key.trim().is_empty() {
            return Err(CredentialError::Invalid(
                "secret_access_key must be non-empty".to_string(),
            ));
        }
        if let Some(region) = &self.region
            && region.trim().is_empty()
        {
            return Err(CredentialError::Invalid("region must be non-empty".to_string()));
        }
        let endpoint = self.endpoint();
        if endpoint.starts_with("http://") {
            if !self.allow_http {
                return Err(CredentialError::Invalid(
                    "http endpoint requires allow_http = true".to_string(),
                ));
            }
        } else if !endpoint.starts_with("https://") {
            return Err(CredentialError::Invalid(format!(
                "endpoint must use http(s) scheme: {endpoint}"
            )));
        }
        Ok(())
    }

    /// Returns the effective endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().map_or(DEFAULT_ENDPOINT, str::trim)
    }

    /// Returns the effective signing region.
    #[must_use]
    pub fn region(&self) -> &str {
        self.region.as_deref().map_or(DEFAULT_REGION, str::trim)
    }
}

/// Returns the credential document path for a tenant.
#[must_use]
pub fn credential_path(keys_dir: &Path, tenant: &TenantId) -> PathBuf {
    keys_dir.join(format!("{}.json", tenant.as_str()))
}

/// Reads at most one byte past the size limit so oversized files are
/// rejected without being read in full.
fn read_bounded(path: &Path) -> Result<Vec<u8>, CredentialError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(CredentialError::Missing(path.display().to_string()));
        }
        Err(err) => {
            return Err(CredentialError::Io(format!("{}: {err}", path.display())));
        }
    };
    let limit = u64::try_from(MAX_CREDENTIAL_FILE_SIZE).unwrap_or(u64::MAX);
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| CredentialError::Io(format!("{}: {err}", path.display())))?;
    if bytes.len() > MAX_CREDENTIAL_FILE_SIZE {
        return Err(CredentialError::Invalid(
            "credential document exceeds size limit".to_string(),
        ));
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Credential document errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Credential file does not exist.
    #[error("credential file not found: {0}")]
    Missing(String),
    /// I/O failure while reading the credential file.
    #[error("credential io error: {0}")]
    Io(String),
    /// JSON parsing error.
    #[error("credential parse error: {0}")]
    Parse(String),
    /// Document parsed but is unusable.
    #[error("invalid credentials: {0}")]
    Invalid(String),
}
