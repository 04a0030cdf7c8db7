// crates/bucket-gate-config/src/config.rs
// ============================================================================
// Module: Bucket Gate Configuration
// Description: Configuration loading, environment overrides, and validation.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: bucket-gate-contract, serde, toml
// ============================================================================

//! ## Overview
//! Configuration comes from two sources. An optional TOML file (named by
//! `--config` or `BUCKET_GATE_CONFIG`) supplies defaults, and the
//! `BUCKET_GATE_*` environment variables override individual values. The
//! resulting [`BucketGateConfig`] is validated before use.
//!
//! Environment reads are isolated in [`EnvOverrides::from_process`] so the
//! merge logic can be exercised without touching process state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use bucket_gate_contract::TenantId;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable naming the optional TOML config file.
pub const CONFIG_ENV_VAR: &str = "BUCKET_GATE_CONFIG";
/// Environment variable holding the comma-separated project identifiers.
pub const PROJECT_IDS_ENV_VAR: &str = "BUCKET_GATE_PROJECT_IDS";
/// Environment variable naming the credential directory.
pub const KEYS_DIR_ENV_VAR: &str = "BUCKET_GATE_KEYS_DIR";
/// Environment variable overriding the transport.
pub const TRANSPORT_ENV_VAR: &str = "BUCKET_GATE_TRANSPORT";
/// Environment variable overriding the HTTP bind address.
pub const BIND_ENV_VAR: &str = "BUCKET_GATE_BIND";
/// Default credential directory.
pub const DEFAULT_KEYS_DIR: &str = "keys";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a tenant identifier in bytes.
pub const MAX_TENANT_ID_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default maximum request body size in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Bucket Gate server configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BucketGateConfig {
    /// Server transport configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Tenant configuration.
    #[serde(default)]
    pub tenants: TenantsConfig,
}

impl BucketGateConfig {
    /// Loads configuration using the process environment.
    ///
    /// `path` takes precedence over `BUCKET_GATE_CONFIG`. With neither set,
    /// defaults are used and only environment overrides apply.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources(path, &EnvOverrides::from_process())
    }

    /// Loads configuration from an optional file and explicit overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn from_sources(
        path: Option<&Path>,
        overrides: &EnvOverrides,
    ) -> Result<Self, ConfigError> {
        let resolved = path.map(Path::to_path_buf).or_else(|| overrides.config_path.clone());
        let mut config = match resolved {
            Some(path) => Self::read_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(overrides)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid config TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Reads and parses a config file with size and encoding limits.
    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Applies environment overrides on top of file values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an override value is malformed.
    pub fn apply_overrides(&mut self, overrides: &EnvOverrides) -> Result<(), ConfigError> {
        if let Some(raw) = &overrides.project_ids {
            self.tenants.set_raw_project_ids(raw);
        }
        if let Some(keys_dir) = &overrides.keys_dir {
            self.tenants.keys_dir = PathBuf::from(keys_dir);
        }
        if let Some(transport) = &overrides.transport {
            self.server.transport = ServerTransport::parse(transport)?;
        }
        if let Some(bind) = &overrides.bind {
            self.server.bind = Some(bind.clone());
        }
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.audit.validate()?;
        self.tenants.validate()?;
        Ok(())
    }
}

/// Environment-derived overrides applied after the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// Config file path (`BUCKET_GATE_CONFIG`).
    pub config_path: Option<PathBuf>,
    /// Raw project identifier list (`BUCKET_GATE_PROJECT_IDS`).
    pub project_ids: Option<String>,
    /// Credential directory (`BUCKET_GATE_KEYS_DIR`).
    pub keys_dir: Option<String>,
    /// Transport name (`BUCKET_GATE_TRANSPORT`).
    pub transport: Option<String>,
    /// HTTP bind address (`BUCKET_GATE_BIND`).
    pub bind: Option<String>,
}

impl EnvOverrides {
    /// Reads overrides from the process environment.
    ///
    /// Variables that are unset or not valid unicode are treated as absent.
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            config_path: env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from),
            project_ids: env::var(PROJECT_IDS_ENV_VAR).ok(),
            keys_dir: env::var(KEYS_DIR_ENV_VAR).ok(),
            transport: env::var(TRANSPORT_ENV_VAR).ok(),
            bind: env::var(BIND_ENV_VAR).ok(),
        }
    }
}

// ============================================================================
// SECTION: Server Configuration
// ============================================================================

/// Server transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Transport type for MCP.
    #[serde(default)]
    pub transport: ServerTransport,
    /// Bind address for the HTTP transport.
    #[serde(default)]
    pub bind: Option<String>,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: ServerTransport::Stdio,
            bind: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Validates server transport configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.transport == ServerTransport::Http {
            self.bind_addr()?;
        }
        Ok(())
    }

    /// Returns the parsed HTTP bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the bind address is missing or
    /// malformed.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let bind = self.bind.as_deref().unwrap_or_default().trim();
        if bind.is_empty() {
            return Err(ConfigError::Invalid("http transport requires bind address".to_string()));
        }
        bind.parse().map_err(|_| ConfigError::Invalid(format!("invalid bind address: {bind}")))
    }
}

/// Supported MCP transport types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerTransport {
    /// Use stdin/stdout transport.
    #[default]
    Stdio,
    /// Use HTTP JSON-RPC transport.
    Http,
}

impl ServerTransport {
    /// Parses a transport name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unknown transport names.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            other => Err(ConfigError::Invalid(format!("unsupported transport: {other}"))),
        }
    }

    /// Returns the canonical string name for the transport.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
        }
    }
}

// ============================================================================
// SECTION: Audit Configuration
// ============================================================================

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Enables audit events.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional append-only log file. Events go to stderr when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            let text = path.to_string_lossy();
            if text.trim().is_empty() {
                return Err(ConfigError::Invalid("audit.path must be non-empty".to_string()));
            }
            validate_path(path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tenant Configuration
// ============================================================================

/// Tenant identifiers and the credential directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TenantsConfig {
    /// Ordered project identifiers. The first valid entry is the default.
    #[serde(default)]
    pub project_ids: Vec<String>,
    /// Directory holding `<identifier>.json` credential documents.
    #[serde(default = "default_keys_dir")]
    pub keys_dir: PathBuf,
    /// Raw identifier list as supplied by the environment.
    #[serde(skip)]
    pub raw: Option<String>,
}

impl Default for TenantsConfig {
    fn default() -> Self {
        Self {
            project_ids: Vec::new(),
            keys_dir: default_keys_dir(),
            raw: None,
        }
    }
}

impl TenantsConfig {
    /// Replaces the identifier list from a comma-separated string.
    pub fn set_raw_project_ids(&mut self, raw: &str) {
        self.project_ids = split_project_ids(raw);
        self.raw = Some(raw.to_string());
    }

    /// Returns the normalized, de-duplicated identifiers in configured order.
    #[must_use]
    pub fn tenant_ids(&self) -> Vec<TenantId> {
        normalize_project_ids(&self.project_ids)
    }

    /// Returns the identifier list as originally configured.
    #[must_use]
    pub fn raw_project_ids(&self) -> String {
        self.raw.clone().unwrap_or_else(|| self.project_ids.join(","))
    }

    /// Validates the keys directory path.
    ///
    /// Identifier shape is checked per tenant at start-up so one unusable
    /// identifier never rejects the whole configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.keys_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("tenants.keys_dir must be non-empty".to_string()));
        }
        validate_path(&self.keys_dir)
    }
}

/// Splits a comma-separated identifier list without normalizing entries.
#[must_use]
pub fn split_project_ids(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

/// Trims entries, drops empty ones, and keeps the first occurrence of each.
#[must_use]
pub fn normalize_project_ids(entries: &[String]) -> Vec<TenantId> {
    let mut seen = BTreeSet::new();
    entries
        .iter()
        .filter_map(|entry| TenantId::parse(entry))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Validates that an identifier can be used as a credential file stem.
///
/// # Errors
///
/// Returns [`TenantIdError`] when the identifier is too long or contains
/// path syntax or control characters.
pub fn validate_tenant_id(id: &TenantId) -> Result<(), TenantIdError> {
    let value = id.as_str();
    if value.len() > MAX_TENANT_ID_LENGTH {
        return Err(TenantIdError::TooLong(value.len()));
    }
    if value.contains('/') || value.contains('\\') || value == "." || value == ".." {
        return Err(TenantIdError::PathSyntax(value.to_string()));
    }
    if value.chars().any(char::is_control) {
        return Err(TenantIdError::ControlCharacter(value.escape_default().to_string()));
    }
    Ok(())
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Identifier that cannot name a credential document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TenantIdError {
    /// Identifier longer than [`MAX_TENANT_ID_LENGTH`] bytes.
    #[error("project id is {0} bytes, max {MAX_TENANT_ID_LENGTH}")]
    TooLong(usize),
    /// Identifier contains a path separator or is a dot segment.
    #[error("project id must not contain path syntax: {0}")]
    PathSyntax(String),
    /// Identifier contains control characters.
    #[error("project id must not contain control characters: {0}")]
    ControlCharacter(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("path exceeds max length".to_string()));
    }
    Ok(())
}

/// Default maximum request body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Audit events are on unless disabled.
const fn default_audit_enabled() -> bool {
    true
}

/// Default credential directory.
fn default_keys_dir() -> PathBuf {
    PathBuf::from(DEFAULT_KEYS_DIR)
}
