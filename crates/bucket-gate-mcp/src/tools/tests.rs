// crates/bucket-gate-mcp/src/tools/tests.rs
// ============================================================================
// Module: Tool Router Unit Tests
// Description: Pipeline ordering and envelope shaping for tool calls.
// Purpose: Ensure every call returns an envelope with the right kind.
// Dependencies: bucket-gate-mcp, serde_json, tokio
// ============================================================================

//! ## Overview
//! Drives [`ToolRouter`] against in-memory tenants to check the order in
//! which lookup, validation, and resolution fail, and that backend errors
//! carry tool-specific categories.

#![allow(
    clippy::use_debug,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions use panic-based helpers."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use bucket_gate_contract::TenantId;
use bucket_gate_contract::ToolName;
use serde_json::Value;
use serde_json::json;

use super::ToolRouter;
use crate::envelope::ErrorKind;
use crate::envelope::ToolEnvelope;
use crate::registry::TenantRegistry;
use crate::storage::InMemoryStorageClient;
use crate::storage::StorageError;
use crate::telemetry::McpMetricEvent;
use crate::telemetry::McpMetrics;
use crate::telemetry::McpOutcome;
use crate::telemetry::ToolMetricEvent;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn tenant(raw: &str) -> TenantId {
    TenantId::parse(raw).expect("tenant")
}

/// Router with tenant `alpha` registered and `beta` failed.
fn router_with(store: Arc<InMemoryStorageClient>) -> ToolRouter {
    let ids = vec![tenant("alpha"), tenant("beta")];
    let mut builder = TenantRegistry::configure(ids, "alpha,beta");
    builder.register(tenant("alpha"), store).expect("register");
    builder.record_failure(tenant("beta"), "credential file not found").expect("record");
    ToolRouter::new(Arc::new(builder.build()))
}

fn store_with_bucket(bucket: &str) -> Arc<InMemoryStorageClient> {
    let store = Arc::new(InMemoryStorageClient::new());
    store.create_bucket(bucket).expect("bucket");
    store
}

/// Router with `alpha` and `beta` both registered against separate stores.
fn two_tenant_router(
    alpha: Arc<InMemoryStorageClient>,
    beta: Arc<InMemoryStorageClient>,
) -> ToolRouter {
    let ids = vec![tenant("alpha"), tenant("beta")];
    let mut builder = TenantRegistry::configure(ids, "alpha,beta");
    builder.register(tenant("alpha"), alpha).expect("register alpha");
    builder.register(tenant("beta"), beta).expect("register beta");
    ToolRouter::new(Arc::new(builder.build()))
}

/// Metrics sink that keeps every tool-call observation.
#[derive(Default)]
struct RecordingMetrics {
    tool_calls: Mutex<Vec<ToolMetricEvent>>,
}

impl RecordingMetrics {
    fn tool_calls(&self) -> Vec<ToolMetricEvent> {
        self.tool_calls.lock().unwrap().clone()
    }
}

impl McpMetrics for RecordingMetrics {
    fn record_request(&self, _event: McpMetricEvent) {}

    fn record_latency(&self, _event: McpMetricEvent, _latency: Duration) {}

    fn record_tool_call(&self, event: ToolMetricEvent, _latency: Duration) {
        self.tool_calls.lock().unwrap().push(event);
    }
}

/// Arguments that satisfy every tool's required fields.
fn complete_args(project_id: Option<&str>) -> Value {
    let mut args = json!({
        "bucket": "data",
        "filePath": "f.txt",
        "destination": "f.txt",
        "content": "x!",
    });
    if let Some(project_id) = project_id {
        args["projectId"] = json!(project_id);
    }
    args
}

fn result(envelope: &ToolEnvelope) -> &Value {
    envelope.result().unwrap_or_else(|| panic!("expected ok envelope, got {envelope:?}"))
}

fn failure_kind(envelope: &ToolEnvelope) -> ErrorKind {
    envelope.failure().unwrap_or_else(|| panic!("expected error envelope, got {envelope:?}")).kind
}

// ============================================================================
// SECTION: Pipeline Order
// ============================================================================

#[tokio::test]
async fn unknown_tool_is_reported_before_validation() {
    let router = router_with(store_with_bucket("data"));
    let envelope = router.handle_tool_call("renameFile", &json!("not an object")).await;
    assert_eq!(failure_kind(&envelope), ErrorKind::UnknownTool);
    assert_eq!(envelope.failure().unwrap().category, "unknown tool");
}

#[tokio::test]
async fn invalid_arguments_are_reported_before_tenant_resolution() {
    let router = router_with(store_with_bucket("data"));
    let envelope = router.handle_tool_call("getBucket", &json!({"projectId": "unknown"})).await;
    assert_eq!(failure_kind(&envelope), ErrorKind::InvalidArguments);
    assert!(envelope.failure().unwrap().message.contains("bucket"));
}

#[tokio::test]
async fn unconfigured_and_failed_tenants_share_a_kind_with_distinct_messages() {
    let router = router_with(store_with_bucket("data"));
    let unknown = router.handle_tool_call("listBuckets", &json!({"projectId": "gamma"})).await;
    let failed = router.handle_tool_call("listBuckets", &json!({"projectId": "beta"})).await;
    assert_eq!(failure_kind(&unknown), ErrorKind::UnconfiguredTenant);
    assert_eq!(failure_kind(&failed), ErrorKind::UnconfiguredTenant);
    assert!(unknown.failure().unwrap().message.contains("not configured"));
    assert!(failed.failure().unwrap().message.contains("credential file not found"));
}

#[tokio::test]
async fn missing_project_uses_default_tenant() {
    let router = router_with(store_with_bucket("data"));
    let envelope = router.handle_tool_call("listBuckets", &json!({})).await;
    let payload = result(&envelope);
    assert_eq!(payload["projectId"], "alpha");
    assert_eq!(payload["buckets"][0]["name"], "data");
}

#[tokio::test]
async fn empty_project_id_falls_back_to_default() {
    let router = router_with(store_with_bucket("data"));
    let envelope = router.handle_tool_call("listBuckets", &json!({"projectId": ""})).await;
    assert_eq!(result(&envelope)["projectId"], "alpha");
}

#[tokio::test]
async fn no_default_tenant_rejects_missing_project() {
    let router = ToolRouter::new(Arc::new(TenantRegistry::empty()));
    let envelope = router.handle_tool_call("listBuckets", &Value::Null).await;
    assert_eq!(failure_kind(&envelope), ErrorKind::InvalidArguments);
}

#[tokio::test]
async fn every_tenant_tool_requires_a_project_without_default() {
    let router = ToolRouter::new(Arc::new(TenantRegistry::empty()));
    for tool in ToolName::all().iter().filter(|tool| tool.requires_tenant()) {
        let envelope = router.handle_tool_call(tool.as_str(), &complete_args(None)).await;
        let failure = envelope.failure().unwrap_or_else(|| panic!("{tool:?} succeeded"));
        assert_eq!(failure.kind, ErrorKind::InvalidArguments, "{tool:?}");
        assert!(failure.message.contains("projectId"), "{tool:?}: {}", failure.message);
    }
}

#[tokio::test]
async fn every_tenant_tool_rejects_unconfigured_project() {
    let router = router_with(store_with_bucket("data"));
    for tool in ToolName::all().iter().filter(|tool| tool.requires_tenant()) {
        let envelope = router.handle_tool_call(tool.as_str(), &complete_args(Some("zzz"))).await;
        assert_eq!(failure_kind(&envelope), ErrorKind::UnconfiguredTenant, "{tool:?}");
    }
}

#[tokio::test]
async fn list_projects_needs_no_tenant() {
    let router = ToolRouter::new(Arc::new(TenantRegistry::empty()));
    assert!(!ToolName::ListProjects.requires_tenant());
    let envelope = router.handle_tool_call("listProjects", &json!({"projectId": "zzz"})).await;
    assert_eq!(result(&envelope)["registered"], json!([]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_calls_stay_on_their_own_tenant() {
    let alpha = store_with_bucket("alpha-data");
    let beta = store_with_bucket("beta-data");
    let router = two_tenant_router(alpha, beta);
    let mut tasks = Vec::new();
    for round in 0 .. 16 {
        let project = if round % 2 == 0 { "alpha" } else { "beta" };
        let router = router.clone();
        tasks.push(tokio::spawn(async move {
            let args = json!({"projectId": project});
            let envelope = router.handle_tool_call("listBuckets", &args).await;
            (project, envelope)
        }));
    }
    for task in tasks {
        let (project, envelope) = task.await.expect("task");
        let payload = result(&envelope);
        assert_eq!(payload["projectId"], project);
        assert_eq!(payload["buckets"][0]["name"], format!("{project}-data"));
    }
}

#[tokio::test]
async fn joined_calls_on_two_tenants_both_succeed() {
    let alpha = store_with_bucket("shared");
    let beta = store_with_bucket("shared");
    let router = two_tenant_router(Arc::clone(&alpha), Arc::clone(&beta));
    let upload = |project: &'static str, content: &'static str| {
        let router = router.clone();
        async move {
            router
                .handle_tool_call(
                    "uploadFile",
                    &json!({
                        "projectId": project,
                        "bucket": "shared",
                        "destination": "note.txt",
                        "content": content,
                    }),
                )
                .await
        }
    };
    let (first, second) = tokio::join!(upload("alpha", "from alpha"), upload("beta", "from beta"));
    assert!(first.result().is_some(), "{first:?}");
    assert!(second.result().is_some(), "{second:?}");
    assert_eq!(alpha.object_bytes("shared", "note.txt").unwrap(), Some(b"from alpha".to_vec()));
    assert_eq!(beta.object_bytes("shared", "note.txt").unwrap(), Some(b"from beta".to_vec()));
}

// ============================================================================
// SECTION: Backend Shaping
// ============================================================================

#[tokio::test]
async fn missing_bucket_maps_to_not_found_category() {
    let router = router_with(store_with_bucket("data"));
    let envelope = router.handle_tool_call("getBucket", &json!({"bucket": "absent"})).await;
    let failure = envelope.failure().expect("failure");
    assert_eq!(failure.kind, ErrorKind::BackendOperationFailed);
    assert_eq!(failure.category, "bucket not found or access denied");
}

#[tokio::test]
async fn backend_failure_keeps_backend_message() {
    let store = store_with_bucket("data");
    store.fail_all(StorageError::Backend("SlowDown: reduce request rate".to_string())).unwrap();
    let router = router_with(store);
    let envelope = router.handle_tool_call("listBuckets", &json!({})).await;
    let failure = envelope.failure().expect("failure");
    assert_eq!(failure.category, "failed to list buckets");
    assert_eq!(failure.message, "SlowDown: reduce request rate");
}

#[tokio::test]
async fn download_of_absent_object_reports_missing_file() {
    let router = router_with(store_with_bucket("data"));
    let args = json!({"bucket": "data", "filePath": "nope.txt"});
    let download = router.handle_tool_call("downloadFile", &args).await;
    let delete = router.handle_tool_call("deleteFile", &args).await;
    let metadata = router.handle_tool_call("getFile", &args).await;
    assert_eq!(download.failure().unwrap().category, "file does not exist");
    assert_eq!(delete.failure().unwrap().category, "file does not exist");
    assert_eq!(metadata.failure().unwrap().category, "file not found or access denied");
}

#[tokio::test]
async fn missing_bucket_reads_as_missing_file() {
    let router = router_with(store_with_bucket("data"));
    let args = json!({"bucket": "absent", "filePath": "nope.txt"});
    let download = router.handle_tool_call("downloadFile", &args).await;
    let delete = router.handle_tool_call("deleteFile", &args).await;
    let metadata = router.handle_tool_call("getFile", &args).await;
    assert_eq!(download.failure().unwrap().category, "file does not exist");
    assert_eq!(delete.failure().unwrap().category, "file does not exist");
    assert_eq!(metadata.failure().unwrap().category, "file not found or access denied");
}

#[tokio::test]
async fn access_denied_bucket_maps_to_not_found_categories() {
    let store = store_with_bucket("data");
    store.fail_bucket("data", StorageError::AccessDenied("AccessDenied".to_string())).unwrap();
    let router = router_with(store);
    let bucket = router.handle_tool_call("getBucket", &json!({"bucket": "data"})).await;
    let file =
        router.handle_tool_call("getFile", &json!({"bucket": "data", "filePath": "a.txt"})).await;
    assert_eq!(bucket.failure().unwrap().category, "bucket not found or access denied");
    assert_eq!(file.failure().unwrap().category, "file not found or access denied");
    assert_eq!(failure_kind(&file), ErrorKind::BackendOperationFailed);
}

#[tokio::test]
async fn bucket_backend_failure_keeps_generic_category() {
    let store = store_with_bucket("data");
    store.fail_bucket("data", StorageError::Backend("InternalError".to_string())).unwrap();
    let router = router_with(store);
    let bucket = router.handle_tool_call("getBucket", &json!({"bucket": "data"})).await;
    let download = router
        .handle_tool_call("downloadFile", &json!({"bucket": "data", "filePath": "a.txt"}))
        .await;
    assert_eq!(bucket.failure().unwrap().category, "failed to get bucket");
    assert_eq!(bucket.failure().unwrap().message, "InternalError");
    assert_eq!(download.failure().unwrap().category, "failed to download file");
}

// ============================================================================
// SECTION: Round Trips
// ============================================================================

#[tokio::test]
async fn text_upload_downloads_as_utf8() {
    let store = store_with_bucket("data");
    let router = router_with(Arc::clone(&store));
    let upload = router
        .handle_tool_call(
            "uploadFile",
            &json!({
                "bucket": "data",
                "destination": "notes/today.txt",
                "content": "hello world!",
                "contentType": "text/plain",
            }),
        )
        .await;
    assert_eq!(result(&upload)["encoding"], "utf-8");
    assert_eq!(result(&upload)["file"]["size"], 12);

    let download = router
        .handle_tool_call("downloadFile", &json!({"bucket": "data", "filePath": "notes/today.txt"}))
        .await;
    let payload = result(&download);
    assert_eq!(payload["content"], "hello world!");
    assert_eq!(payload["encoding"], "utf-8");
    assert_eq!(payload["contentType"], "text/plain");
}

#[tokio::test]
async fn base64_upload_stores_decoded_bytes() {
    let store = store_with_bucket("data");
    let router = router_with(Arc::clone(&store));
    let upload = router
        .handle_tool_call(
            "uploadFile",
            &json!({"bucket": "data", "destination": "blob.bin", "content": "AAEC/w=="}),
        )
        .await;
    assert_eq!(result(&upload)["encoding"], "base64");
    assert_eq!(store.object_bytes("data", "blob.bin").unwrap(), Some(vec![0, 1, 2, 255]));

    let download = router
        .handle_tool_call("downloadFile", &json!({"bucket": "data", "filePath": "blob.bin"}))
        .await;
    let payload = result(&download);
    assert_eq!(payload["content"], "AAEC/w==");
    assert_eq!(payload["encoding"], "base64");
    assert_eq!(payload["contentType"], "application/octet-stream");
}

#[tokio::test]
async fn delete_removes_object() {
    let store = store_with_bucket("data");
    let router = router_with(Arc::clone(&store));
    router
        .handle_tool_call(
            "uploadFile",
            &json!({"bucket": "data", "destination": "a.txt", "content": "bye!"}),
        )
        .await;
    let delete = router
        .handle_tool_call("deleteFile", &json!({"bucket": "data", "filePath": "a.txt"}))
        .await;
    assert_eq!(result(&delete)["success"], true);
    assert_eq!(store.object_bytes("data", "a.txt").unwrap(), None);
}

#[tokio::test]
async fn list_files_groups_by_delimiter() {
    let store = store_with_bucket("data");
    let router = router_with(Arc::clone(&store));
    for key in ["logs/a.log", "logs/b.log", "readme.md"] {
        router
            .handle_tool_call(
                "uploadFile",
                &json!({"bucket": "data", "destination": key, "content": "x!"}),
            )
            .await;
    }
    let envelope =
        router.handle_tool_call("listFiles", &json!({"bucket": "data", "delimiter": "/"})).await;
    let payload = result(&envelope);
    assert_eq!(payload["prefixes"], json!(["logs/"]));
    assert_eq!(payload["files"][0]["name"], "readme.md");
    assert_eq!(payload["truncated"], false);
}

#[tokio::test]
async fn list_files_reports_truncation_at_limit() {
    let store = Arc::new(InMemoryStorageClient::new().with_list_limit(2));
    store.create_bucket("data").unwrap();
    let router = router_with(Arc::clone(&store));
    for key in ["a.txt", "b.txt", "c.txt"] {
        router
            .handle_tool_call(
                "uploadFile",
                &json!({"bucket": "data", "destination": key, "content": "x!"}),
            )
            .await;
    }
    let envelope = router.handle_tool_call("listFiles", &json!({"bucket": "data"})).await;
    let payload = result(&envelope);
    assert_eq!(payload["truncated"], true);
    assert_eq!(payload["files"].as_array().map(Vec::len), Some(2));
    assert_eq!(payload["files"][0]["name"], "a.txt");
}

#[tokio::test]
async fn empty_content_type_uploads_as_octet_stream() {
    let router = router_with(store_with_bucket("data"));
    router
        .handle_tool_call(
            "uploadFile",
            &json!({
                "bucket": "data",
                "destination": "a.txt",
                "content": "hi!",
                "contentType": "",
            }),
        )
        .await;
    let download = router
        .handle_tool_call("downloadFile", &json!({"bucket": "data", "filePath": "a.txt"}))
        .await;
    assert_eq!(result(&download)["contentType"], "application/octet-stream");
}

#[tokio::test]
async fn list_projects_reports_registry_state() {
    let router = router_with(store_with_bucket("data"));
    let envelope = router.handle_tool_call("listProjects", &json!({})).await;
    let payload = result(&envelope);
    assert_eq!(payload["configured"], json!(["alpha", "beta"]));
    assert_eq!(payload["default"], "alpha");
    assert_eq!(payload["registered"], json!(["alpha"]));
    assert_eq!(payload["failed"][0]["projectId"], "beta");
    assert_eq!(payload["raw"], "alpha,beta");
}

#[test]
fn list_tools_matches_catalog() {
    let router = ToolRouter::new(Arc::new(TenantRegistry::empty()));
    let names: Vec<&str> = router.list_tools().iter().map(|tool| tool.name.as_str()).collect();
    assert_eq!(names.len(), 8);
    assert_eq!(names[0], "listBuckets");
}

// ============================================================================
// SECTION: Metrics
// ============================================================================

#[tokio::test]
async fn tool_calls_are_recorded_with_outcome_and_kind() {
    let metrics = Arc::new(RecordingMetrics::default());
    let router = router_with(store_with_bucket("data"))
        .with_metrics(Arc::clone(&metrics) as Arc<dyn McpMetrics>);
    router.handle_tool_call("listBuckets", &json!({})).await;
    router.handle_tool_call("renameFile", &json!({})).await;
    router.handle_tool_call("getBucket", &json!({"projectId": "beta", "bucket": "data"})).await;

    let calls = metrics.tool_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].tool, Some(ToolName::ListBuckets));
    assert_eq!(calls[0].outcome, McpOutcome::Ok);
    assert_eq!(calls[0].error_kind, None);
    assert_eq!(calls[1].tool, None);
    assert_eq!(calls[1].outcome, McpOutcome::Error);
    assert_eq!(calls[1].error_kind, Some(ErrorKind::UnknownTool.as_str()));
    assert_eq!(calls[2].tool, Some(ToolName::GetBucket));
    assert_eq!(calls[2].error_kind, Some(ErrorKind::UnconfiguredTenant.as_str()));
}
