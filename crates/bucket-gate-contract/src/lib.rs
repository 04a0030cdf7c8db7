// crates/bucket-gate-contract/src/lib.rs
// ============================================================================
// Module: Bucket Gate Contract Library
// Description: Canonical identifiers and the MCP tool catalog.
// Purpose: Single source of truth for the tool surface exposed to agents.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! `bucket-gate-contract` defines the external contract of the Bucket Gate
//! MCP server: the closed set of tool names, the tenant identifier type and
//! the static tool catalog (names, descriptions, and JSON-Schema input
//! shapes) returned to agents for discovery.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod tooling;
pub mod types;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use tooling::tool_definitions;
pub use types::TenantId;
pub use types::ToolDefinition;
pub use types::ToolName;
