// crates/bucket-gate-mcp/src/envelope.rs
// ============================================================================
// Module: Tool Result Envelope
// Description: Uniform success/error shape returned by every tool call.
// Purpose: Give agents one structure to branch on regardless of tool.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`ToolEnvelope`] is either `{"status":"ok","result":...}` or
//! `{"status":"error","error":{"kind","category","message"}}`. The `kind`
//! is a stable machine label; `category` is the short human summary; and
//! `message` carries the detail (for backend failures, the backend's own
//! message).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Stable error classification for tool failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Arguments failed validation.
    InvalidArguments,
    /// Tenant is not configured or failed to initialise.
    UnconfiguredTenant,
    /// Tool name is not in the catalog.
    UnknownTool,
    /// Backend call failed.
    BackendOperationFailed,
}

impl ErrorKind {
    /// Returns the wire label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArguments => "invalid_arguments",
            Self::UnconfiguredTenant => "unconfigured_tenant",
            Self::UnknownTool => "unknown_tool",
            Self::BackendOperationFailed => "backend_operation_failed",
        }
    }
}

/// Error body of a failed tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolFailure {
    /// Machine-readable classification.
    pub kind: ErrorKind,
    /// Short category text.
    pub category: String,
    /// Detailed message.
    pub message: String,
}

/// Result envelope for one tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolEnvelope {
    /// Successful call.
    Ok {
        /// Tool payload.
        result: Value,
    },
    /// Failed call.
    Error {
        /// Failure details.
        error: ToolFailure,
    },
}

impl ToolEnvelope {
    /// Wraps a successful payload.
    #[must_use]
    pub const fn ok(result: Value) -> Self {
        Self::Ok {
            result,
        }
    }

    /// Builds a failure envelope.
    #[must_use]
    pub fn error(kind: ErrorKind, category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            error: ToolFailure {
                kind,
                category: category.into(),
                message: message.into(),
            },
        }
    }

    /// Returns true for failure envelopes.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Returns the failure details, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ToolFailure> {
        match self {
            Self::Ok { .. } => None,
            Self::Error {
                error,
            } => Some(error),
        }
    }

    /// Returns the success payload, if any.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        match self {
            Self::Ok {
                result,
            } => Some(result),
            Self::Error { .. } => None,
        }
    }

    /// Serializes the envelope as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when the payload cannot be serialized.
    pub fn to_json_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
