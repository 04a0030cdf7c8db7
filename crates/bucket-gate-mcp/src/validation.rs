// crates/bucket-gate-mcp/src/validation.rs
// ============================================================================
// Module: Tool Argument Validation
// Description: Typed parsing of untrusted tool arguments.
// Purpose: Reject malformed calls before any tenant or backend work runs.
// Dependencies: bucket-gate-contract, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Each tool shape has one parse function that turns a raw JSON argument
//! object into a typed struct. Parsing reports every violation it finds,
//! joined with `"; "`, so callers can fix all problems in one round trip.
//! Unknown fields are ignored.
//!
//! Tenant resolution is part of validation: an omitted or blank `projectId`
//! becomes the registry default, and the call is rejected when no default
//! exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bucket_gate_contract::TenantId;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Field Names
// ============================================================================

/// Tenant identifier field.
pub const FIELD_PROJECT_ID: &str = "projectId";
/// Bucket name field.
pub const FIELD_BUCKET: &str = "bucket";
/// Object name field for read and delete tools.
pub const FIELD_FILE_PATH: &str = "filePath";
/// Object name field for uploads.
pub const FIELD_DESTINATION: &str = "destination";
/// Upload content field.
pub const FIELD_CONTENT: &str = "content";
/// Upload content type field.
pub const FIELD_CONTENT_TYPE: &str = "contentType";
/// Listing prefix field.
pub const FIELD_PREFIX: &str = "prefix";
/// Listing delimiter field.
pub const FIELD_DELIMITER: &str = "delimiter";

// ============================================================================
// SECTION: Validated Shapes
// ============================================================================

/// Arguments carrying only a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectArgs {
    /// Resolved tenant identifier.
    pub project_id: TenantId,
}

/// Arguments naming a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketArgs {
    /// Resolved tenant identifier.
    pub project_id: TenantId,
    /// Bucket name.
    pub bucket: String,
}

/// Arguments naming an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArgs {
    /// Resolved tenant identifier.
    pub project_id: TenantId,
    /// Bucket name.
    pub bucket: String,
    /// Object name.
    pub file_path: String,
}

/// Arguments for an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadArgs {
    /// Resolved tenant identifier.
    pub project_id: TenantId,
    /// Bucket name.
    pub bucket: String,
    /// Object name to write.
    pub destination: String,
    /// Raw content string (base64 or text).
    pub content: String,
    /// Optional content type.
    pub content_type: Option<String>,
}

/// Arguments for a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilesArgs {
    /// Resolved tenant identifier.
    pub project_id: TenantId,
    /// Bucket name.
    pub bucket: String,
    /// Optional prefix; `Some("")` is distinct from `None`.
    pub prefix: Option<String>,
    /// Optional delimiter; `Some("")` is distinct from `None`.
    pub delimiter: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Validation failure listing every violated field rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .violations.join("; "))]
pub struct ValidationError {
    /// Individual violation messages in field order.
    pub violations: Vec<String>,
}

impl ValidationError {
    /// Builds an error from a single violation.
    #[must_use]
    pub fn single(violation: impl Into<String>) -> Self {
        Self {
            violations: vec![violation.into()],
        }
    }
}

// ============================================================================
// SECTION: Parse Functions
// ============================================================================

/// Parses arguments for tools that take only a tenant.
///
/// # Errors
///
/// Returns [`ValidationError`] when the arguments are malformed.
pub fn parse_project_args(
    arguments: &Value,
    default_tenant: Option<&TenantId>,
) -> Result<ProjectArgs, ValidationError> {
    let mut reader = FieldReader::new(arguments)?;
    let project_id = reader.project_id(default_tenant);
    reader.finish()?;
    Ok(ProjectArgs {
        project_id: required(project_id)?,
    })
}

/// Parses arguments for tools that address a bucket.
///
/// # Errors
///
/// Returns [`ValidationError`] when the arguments are malformed.
pub fn parse_bucket_args(
    arguments: &Value,
    default_tenant: Option<&TenantId>,
) -> Result<BucketArgs, ValidationError> {
    let mut reader = FieldReader::new(arguments)?;
    let project_id = reader.project_id(default_tenant);
    let bucket = reader.required_string(FIELD_BUCKET);
    reader.finish()?;
    Ok(BucketArgs {
        project_id: required(project_id)?,
        bucket: required(bucket)?,
    })
}

/// Parses arguments for tools that address one object.
///
/// # Errors
///
/// Returns [`ValidationError`] when the arguments are malformed.
pub fn parse_file_args(
    arguments: &Value,
    default_tenant: Option<&TenantId>,
) -> Result<FileArgs, ValidationError> {
    let mut reader = FieldReader::new(arguments)?;
    let project_id = reader.project_id(default_tenant);
    let bucket = reader.required_string(FIELD_BUCKET);
    let file_path = reader.required_string(FIELD_FILE_PATH);
    reader.finish()?;
    Ok(FileArgs {
        project_id: required(project_id)?,
        bucket: required(bucket)?,
        file_path: required(file_path)?,
    })
}

/// Parses upload arguments. Empty content is accepted; an empty content
/// type is treated as absent.
///
/// # Errors
///
/// Returns [`ValidationError`] when the arguments are malformed.
pub fn parse_upload_args(
    arguments: &Value,
    default_tenant: Option<&TenantId>,
) -> Result<UploadArgs, ValidationError> {
    let mut reader = FieldReader::new(arguments)?;
    let project_id = reader.project_id(default_tenant);
    let bucket = reader.required_string(FIELD_BUCKET);
    let destination = reader.required_string(FIELD_DESTINATION);
    let content = reader.present_string(FIELD_CONTENT);
    let content_type =
        reader.optional_string(FIELD_CONTENT_TYPE).filter(|value| !value.is_empty());
    reader.finish()?;
    Ok(UploadArgs {
        project_id: required(project_id)?,
        bucket: required(bucket)?,
        destination: required(destination)?,
        content: required(content)?,
        content_type,
    })
}

/// Parses listing arguments.
///
/// # Errors
///
/// Returns [`ValidationError`] when the arguments are malformed.
pub fn parse_list_files_args(
    arguments: &Value,
    default_tenant: Option<&TenantId>,
) -> Result<ListFilesArgs, ValidationError> {
    let mut reader = FieldReader::new(arguments)?;
    let project_id = reader.project_id(default_tenant);
    let bucket = reader.required_string(FIELD_BUCKET);
    let prefix = reader.optional_string(FIELD_PREFIX);
    let delimiter = reader.optional_string(FIELD_DELIMITER);
    reader.finish()?;
    Ok(ListFilesArgs {
        project_id: required(project_id)?,
        bucket: required(bucket)?,
        prefix,
        delimiter,
    })
}

// ============================================================================
// SECTION: Field Reader
// ============================================================================

/// Accumulates field values and violations for one argument object.
struct FieldReader<'a> {
    /// Argument object; `None` when arguments were null.
    fields: Option<&'a Map<String, Value>>,
    /// Violation messages collected so far.
    violations: Vec<String>,
}

impl<'a> FieldReader<'a> {
    /// Accepts an object or null; anything else is rejected immediately.
    fn new(arguments: &'a Value) -> Result<Self, ValidationError> {
        let fields = match arguments {
            Value::Object(map) => Some(map),
            Value::Null => None,
            _ => return Err(ValidationError::single("arguments: expected object")),
        };
        Ok(Self {
            fields,
            violations: Vec::new(),
        })
    }

    /// Returns a field value, treating JSON null as absent.
    fn get(&self, field: &str) -> Option<&'a Value> {
        self.fields.and_then(|map| map.get(field)).filter(|value| !value.is_null())
    }

    /// Reads a required, non-empty string.
    fn required_string(&mut self, field: &str) -> Option<String> {
        match self.get(field) {
            None => {
                self.violations.push(format!("{field}: required, got missing"));
                None
            }
            Some(Value::String(value)) if value.is_empty() => {
                self.violations.push(format!("{field}: required, got empty"));
                None
            }
            Some(Value::String(value)) => Some(value.clone()),
            Some(other) => {
                self.violations.push(type_violation(field, other));
                None
            }
        }
    }

    /// Reads a required string that may be empty.
    fn present_string(&mut self, field: &str) -> Option<String> {
        match self.get(field) {
            None => {
                self.violations.push(format!("{field}: required, got missing"));
                None
            }
            Some(Value::String(value)) => Some(value.clone()),
            Some(other) => {
                self.violations.push(type_violation(field, other));
                None
            }
        }
    }

    /// Reads an optional string; absent and null become `None`.
    fn optional_string(&mut self, field: &str) -> Option<String> {
        match self.get(field) {
            None => None,
            Some(Value::String(value)) => Some(value.clone()),
            Some(other) => {
                self.violations.push(type_violation(field, other));
                None
            }
        }
    }

    /// Resolves the tenant field against the registry default.
    fn project_id(&mut self, default_tenant: Option<&TenantId>) -> Option<TenantId> {
        let explicit = match self.get(FIELD_PROJECT_ID) {
            None => None,
            Some(Value::String(value)) => TenantId::parse(value),
            Some(other) => {
                self.violations.push(type_violation(FIELD_PROJECT_ID, other));
                return None;
            }
        };
        if explicit.is_some() {
            return explicit;
        }
        let resolved = default_tenant.cloned();
        if resolved.is_none() {
            self.violations
                .push(format!("{FIELD_PROJECT_ID}: required, no default project configured"));
        }
        resolved
    }

    /// Returns the collected violations as an error, if any.
    fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                violations: self.violations,
            })
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Unwraps a field that `finish` has already verified.
fn required<T>(value: Option<T>) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::single("arguments: inconsistent validation state"))
}

/// Formats a wrong-type violation.
fn type_violation(field: &str, value: &Value) -> String {
    format!("{field}: expected string, got {}", json_type_name(value))
}

/// Returns the JSON type name of a value.
const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests;
