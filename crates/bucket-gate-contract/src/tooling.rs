// crates/bucket-gate-contract/src/tooling.rs
// ============================================================================
// Module: MCP Tool Catalog
// Description: Canonical MCP tool definitions and input schemas.
// Purpose: Provide the static capability list returned by `tools/list`.
// Dependencies: serde_json, bucket-gate-contract::types
// ============================================================================

//! ## Overview
//! This module defines the canonical MCP tool surface. The catalog is pure
//! data: it performs no I/O and does not depend on registry state, so the
//! same listing is returned whether or not any tenant initialised.
//! Input schemas never mark `projectId` as required; an omitted tenant
//! resolves to the configured default at dispatch time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::types::ToolDefinition;
use crate::types::ToolName;

// ============================================================================
// SECTION: Tool Catalog
// ============================================================================

/// Returns the canonical MCP tool definitions.
///
/// The order follows [`ToolName::all`]. Append new tools at the end.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolName::all().iter().copied().map(tool_definition).collect()
}

/// Builds the definition for one tool.
fn tool_definition(name: ToolName) -> ToolDefinition {
    ToolDefinition {
        name,
        description: tool_description(name).to_string(),
        input_schema: tool_input_schema_for(name),
    }
}

/// Returns the catalog description for a tool.
const fn tool_description(name: ToolName) -> &'static str {
    match name {
        ToolName::ListBuckets => {
            "List all storage buckets visible to a project. Omit projectId to use the default \
             project."
        }
        ToolName::GetBucket => {
            "Return metadata for one bucket: location, storage class, creation time, and \
             versioning state."
        }
        ToolName::ListFiles => {
            "List objects in a bucket, optionally filtered by prefix and grouped by delimiter."
        }
        ToolName::GetFile => {
            "Return metadata for one object: size, content type, timestamps, etag, storage \
             class, and custom metadata."
        }
        ToolName::UploadFile => {
            "Upload an object. Content is decoded as standard base64 when valid; otherwise it is \
             stored as UTF-8 text."
        }
        ToolName::DownloadFile => {
            "Download an object. Textual content types are returned as UTF-8 text; everything \
             else is returned base64-encoded."
        }
        ToolName::DeleteFile => "Delete an object from a bucket.",
        ToolName::ListProjects => {
            "List configured projects, the default project, and which projects initialised \
             successfully."
        }
    }
}

/// Returns the input schema for a tool.
fn tool_input_schema_for(name: ToolName) -> Value {
    match name {
        ToolName::ListBuckets => tool_input_schema(&json!({ "projectId": schema_project() }), &[]),
        ToolName::GetBucket => tool_input_schema(
            &json!({
                "projectId": schema_project(),
                "bucket": schema_bucket(),
            }),
            &["bucket"],
        ),
        ToolName::ListFiles => tool_input_schema(
            &json!({
                "projectId": schema_project(),
                "bucket": schema_bucket(),
                "prefix": schema_optional_string(
                    "Only list objects whose names start with this prefix."
                ),
                "delimiter": schema_optional_string(
                    "Group names sharing a prefix up to this delimiter."
                ),
            }),
            &["bucket"],
        ),
        ToolName::GetFile | ToolName::DownloadFile | ToolName::DeleteFile => tool_input_schema(
            &json!({
                "projectId": schema_project(),
                "bucket": schema_bucket(),
                "filePath": schema_identifier("Object name within the bucket."),
            }),
            &["bucket", "filePath"],
        ),
        ToolName::UploadFile => tool_input_schema(
            &json!({
                "projectId": schema_project(),
                "bucket": schema_bucket(),
                "destination": schema_identifier("Object name to write."),
                "content": describe_schema(
                    json!({ "type": "string" }),
                    "Object content: standard base64, or plain text when not valid base64.",
                ),
                "contentType": schema_optional_string("MIME type stored with the object."),
            }),
            &["bucket", "destination", "content"],
        ),
        ToolName::ListProjects => tool_input_schema(&json!({}), &[]),
    }
}

// ============================================================================
// SECTION: Schema Helpers
// ============================================================================

/// Builds a standard tool input schema wrapper.
#[must_use]
fn tool_input_schema(properties: &Value, required: &[&str]) -> Value {
    with_schema(object_schema(properties, required))
}

/// Builds an object schema without the top-level `$schema` annotation.
///
/// Additional properties stay permitted; unknown argument fields are ignored
/// by the validator.
#[must_use]
fn object_schema(properties: &Value, required: &[&str]) -> Value {
    let required_values: Vec<Value> =
        required.iter().map(|value| Value::String((*value).to_string())).collect();
    json!({
        "type": "object",
        "required": required_values,
        "properties": properties,
    })
}

/// Adds a `$schema` header to a top-level JSON schema.
#[must_use]
fn with_schema(schema: Value) -> Value {
    let Value::Object(mut map) = schema else {
        return schema;
    };
    map.insert(
        String::from("$schema"),
        Value::String(String::from("https://json-schema.org/draft/2020-12/schema")),
    );
    Value::Object(map)
}

/// Returns a schema describing non-empty identifiers.
#[must_use]
fn schema_identifier(description: &str) -> Value {
    json!({
        "type": "string",
        "minLength": 1,
        "description": description
    })
}

/// Returns the schema for the optional tenant field.
fn schema_project() -> Value {
    schema_optional_string("Project identifier. Defaults to the first configured project.")
}

/// Returns the schema for the bucket field.
fn schema_bucket() -> Value {
    schema_identifier("Bucket name.")
}

/// Returns a schema for an optional string that may be null.
fn schema_optional_string(description: &str) -> Value {
    json!({
        "type": ["string", "null"],
        "description": description
    })
}

/// Attach a description to a JSON schema object when possible.
fn describe_schema(schema: Value, description: &str) -> Value {
    let Value::Object(mut map) = schema else {
        return schema;
    };
    map.insert(String::from("description"), Value::String(description.to_string()));
    Value::Object(map)
}
