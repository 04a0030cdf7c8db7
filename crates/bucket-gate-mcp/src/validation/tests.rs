// crates/bucket-gate-mcp/src/validation/tests.rs
// ============================================================================
// Module: Tool Argument Validation Unit Tests
// Description: Validates field rules, tenant defaulting, and error joining.
// Purpose: Ensure malformed tool calls fail with precise field messages.
// Dependencies: bucket-gate-mcp, serde_json
// ============================================================================

//! ## Overview
//! Covers each parse function and the cross-cutting rules shared between
//! them.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions use panic-based helpers."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use bucket_gate_contract::TenantId;
use serde_json::json;

use super::parse_bucket_args;
use super::parse_file_args;
use super::parse_list_files_args;
use super::parse_project_args;
use super::parse_upload_args;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn tenant(raw: &str) -> TenantId {
    TenantId::parse(raw).expect("tenant")
}

// ============================================================================
// SECTION: Tenant Defaulting
// ============================================================================

#[test]
fn omitted_project_uses_default() {
    let default = tenant("alpha");
    let args = parse_project_args(&json!({}), Some(&default)).expect("valid");
    assert_eq!(args.project_id, default);
}

#[test]
fn blank_project_uses_default() {
    let default = tenant("alpha");
    for value in [json!(""), json!("   "), json!(null)] {
        let args =
            parse_project_args(&json!({ "projectId": value }), Some(&default)).expect("valid");
        assert_eq!(args.project_id, default);
    }
}

#[test]
fn explicit_project_is_trimmed_and_wins() {
    let default = tenant("alpha");
    let args =
        parse_project_args(&json!({ "projectId": " beta " }), Some(&default)).expect("valid");
    assert_eq!(args.project_id, tenant("beta"));
}

#[test]
fn missing_project_without_default_is_rejected() {
    let err = parse_project_args(&json!({}), None).expect_err("invalid");
    assert_eq!(err.to_string(), "projectId: required, no default project configured");
}

#[test]
fn non_string_project_is_rejected() {
    let default = tenant("alpha");
    let err = parse_project_args(&json!({ "projectId": 7 }), Some(&default)).expect_err("invalid");
    assert_eq!(err.to_string(), "projectId: expected string, got number");
}

// ============================================================================
// SECTION: Shape Rules
// ============================================================================

#[test]
fn non_object_arguments_are_rejected() {
    let default = tenant("alpha");
    for value in [json!([]), json!("bucket"), json!(3), json!(true)] {
        let err = parse_bucket_args(&value, Some(&default)).expect_err("invalid");
        assert_eq!(err.to_string(), "arguments: expected object");
    }
}

#[test]
fn null_arguments_behave_like_empty_object() {
    let default = tenant("alpha");
    let err = parse_bucket_args(&json!(null), Some(&default)).expect_err("invalid");
    assert_eq!(err.to_string(), "bucket: required, got missing");
}

#[test]
fn empty_bucket_is_rejected() {
    let default = tenant("alpha");
    let err = parse_bucket_args(&json!({ "bucket": "" }), Some(&default)).expect_err("invalid");
    assert_eq!(err.to_string(), "bucket: required, got empty");
}

#[test]
fn wrong_type_bucket_is_rejected() {
    let default = tenant("alpha");
    let err =
        parse_bucket_args(&json!({ "bucket": ["a"] }), Some(&default)).expect_err("invalid");
    assert_eq!(err.to_string(), "bucket: expected string, got array");
}

#[test]
fn all_violations_are_reported_together() {
    let err = parse_file_args(&json!({ "bucket": 1 }), None).expect_err("invalid");
    assert_eq!(
        err.violations,
        vec![
            "projectId: required, no default project configured".to_string(),
            "bucket: expected string, got number".to_string(),
            "filePath: required, got missing".to_string(),
        ]
    );
    assert_eq!(
        err.to_string(),
        "projectId: required, no default project configured; bucket: expected string, got \
         number; filePath: required, got missing"
    );
}

#[test]
fn unknown_fields_are_ignored() {
    let default = tenant("alpha");
    let args = parse_file_args(
        &json!({ "bucket": "b", "filePath": "a/b.txt", "recursive": true }),
        Some(&default),
    )
    .expect("valid");
    assert_eq!(args.bucket, "b");
    assert_eq!(args.file_path, "a/b.txt");
}

// ============================================================================
// SECTION: Upload
// ============================================================================

#[test]
fn upload_accepts_empty_content() {
    let default = tenant("alpha");
    let args = parse_upload_args(
        &json!({ "bucket": "b", "destination": "empty.bin", "content": "" }),
        Some(&default),
    )
    .expect("valid");
    assert!(args.content.is_empty());
    assert_eq!(args.content_type, None);
}

#[test]
fn upload_treats_empty_content_type_as_absent() {
    let default = tenant("alpha");
    let args = parse_upload_args(
        &json!({ "bucket": "b", "destination": "d", "content": "x", "contentType": "" }),
        Some(&default),
    )
    .expect("valid");
    assert_eq!(args.content_type, None);
}

#[test]
fn upload_requires_content_to_be_present() {
    let default = tenant("alpha");
    let err = parse_upload_args(&json!({ "bucket": "b", "destination": "d" }), Some(&default))
        .expect_err("invalid");
    assert_eq!(err.to_string(), "content: required, got missing");
}

#[test]
fn upload_rejects_non_string_content_type() {
    let default = tenant("alpha");
    let err = parse_upload_args(
        &json!({ "bucket": "b", "destination": "d", "content": "x", "contentType": false }),
        Some(&default),
    )
    .expect_err("invalid");
    assert_eq!(err.to_string(), "contentType: expected string, got boolean");
}

#[test]
fn upload_requires_destination() {
    let default = tenant("alpha");
    let err = parse_upload_args(
        &json!({ "bucket": "b", "destination": "", "content": "x" }),
        Some(&default),
    )
    .expect_err("invalid");
    assert_eq!(err.to_string(), "destination: required, got empty");
}

// ============================================================================
// SECTION: Listing
// ============================================================================

#[test]
fn absent_prefix_differs_from_empty_prefix() {
    let default = tenant("alpha");
    let absent = parse_list_files_args(&json!({ "bucket": "b" }), Some(&default)).expect("valid");
    assert_eq!(absent.prefix, None);
    assert_eq!(absent.delimiter, None);

    let empty = parse_list_files_args(
        &json!({ "bucket": "b", "prefix": "", "delimiter": "/" }),
        Some(&default),
    )
    .expect("valid");
    assert_eq!(empty.prefix, Some(String::new()));
    assert_eq!(empty.delimiter, Some("/".to_string()));
}

#[test]
fn null_prefix_is_absent() {
    let default = tenant("alpha");
    let args = parse_list_files_args(&json!({ "bucket": "b", "prefix": null }), Some(&default))
        .expect("valid");
    assert_eq!(args.prefix, None);
}
