// crates/bucket-gate-contract/src/types.rs
// ============================================================================
// Module: Contract Types
// Description: Tool names, tenant identifiers, and tool definition shapes.
// Purpose: Shared identifiers across the catalog, router, and config.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Canonical identifier types used by Bucket Gate. Tool names are a closed
//! enum so dispatch is checked exhaustively at compile time. Tenant
//! identifiers are opaque, trimmed, non-empty strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Tenant Identifiers
// ============================================================================

/// Opaque identifier naming one configured storage project.
///
/// # Invariants
/// - The wrapped string is trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Parses a tenant identifier, trimming surrounding whitespace.
    ///
    /// Returns `None` when the trimmed value is empty.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() { None } else { Some(Self(trimmed.to_string())) }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TenantId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom("tenant identifier must be non-empty"))
    }
}

// ============================================================================
// SECTION: Tool Names
// ============================================================================

/// Canonical tool names exposed by the Bucket Gate MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolName {
    /// List buckets visible to a project.
    ListBuckets,
    /// Fetch metadata for one bucket.
    GetBucket,
    /// List objects in a bucket.
    ListFiles,
    /// Fetch metadata for one object.
    GetFile,
    /// Upload an object.
    UploadFile,
    /// Download an object.
    DownloadFile,
    /// Delete an object.
    DeleteFile,
    /// Enumerate configured projects.
    ListProjects,
}

impl ToolName {
    /// Returns the canonical string name for the tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListBuckets => "listBuckets",
            Self::GetBucket => "getBucket",
            Self::ListFiles => "listFiles",
            Self::GetFile => "getFile",
            Self::UploadFile => "uploadFile",
            Self::DownloadFile => "downloadFile",
            Self::DeleteFile => "deleteFile",
            Self::ListProjects => "listProjects",
        }
    }

    /// Returns all tool names in canonical catalog order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ListBuckets,
            Self::GetBucket,
            Self::ListFiles,
            Self::GetFile,
            Self::UploadFile,
            Self::DownloadFile,
            Self::DeleteFile,
            Self::ListProjects,
        ]
    }

    /// Parses a tool name from its string representation.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|tool| tool.as_str() == name)
    }

    /// Returns true when the tool operates against a tenant storage client.
    #[must_use]
    pub const fn requires_tenant(self) -> bool {
        !matches!(self, Self::ListProjects)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tool Definitions
// ============================================================================

/// Tool definition used by MCP tool listing.
///
/// # Invariants
/// - `name` is a stable MCP tool identifier.
/// - `input_schema` is a JSON Schema object describing the argument shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// MCP tool name.
    pub name: ToolName,
    /// Tool description for clients.
    pub description: String,
    /// JSON schema for tool input.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}
