// crates/bucket-gate-mcp/src/adapters.rs
// ============================================================================
// Module: Backend Operation Adapters
// Description: Per-tool translation between validated arguments and storage.
// Purpose: Shape storage results into tool payloads and categorize failures.
// Dependencies: serde_json, bucket-gate-mcp::storage
// ============================================================================

//! ## Overview
//! One adapter per tool. Each borrows the tenant's [`StorageClient`] for a
//! single call, performs the storage operation(s), and returns the JSON
//! payload. Failures become [`ToolError::Backend`] carrying the tool's error
//! category; the backend's own message is preserved as the detail.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::encoding::decode_upload;
use crate::encoding::effective_content_type;
use crate::encoding::encode_download;
use crate::registry::RegistrySnapshot;
use crate::storage::BucketInfo;
use crate::storage::ListQuery;
use crate::storage::ObjectMetadata;
use crate::storage::StorageClient;
use crate::storage::StorageError;
use crate::tools::ToolError;
use crate::validation::BucketArgs;
use crate::validation::FileArgs;
use crate::validation::ListFilesArgs;
use crate::validation::ProjectArgs;
use crate::validation::UploadArgs;

// ============================================================================
// SECTION: Error Categories
// ============================================================================

/// Category for `listBuckets` failures.
pub const CATEGORY_LIST_BUCKETS: &str = "failed to list buckets";
/// Category for missing or inaccessible buckets.
pub const CATEGORY_BUCKET_NOT_FOUND: &str = "bucket not found or access denied";
/// Category for other `getBucket` failures.
pub const CATEGORY_GET_BUCKET: &str = "failed to get bucket";
/// Category for `listFiles` failures.
pub const CATEGORY_LIST_FILES: &str = "failed to list files";
/// Category for missing or inaccessible objects.
pub const CATEGORY_FILE_NOT_FOUND: &str = "file not found or access denied";
/// Category for other `getFile` failures.
pub const CATEGORY_GET_FILE: &str = "failed to get file";
/// Category for `uploadFile` failures.
pub const CATEGORY_UPLOAD_FILE: &str = "failed to upload file";
/// Category for download or delete of an absent object.
pub const CATEGORY_FILE_DOES_NOT_EXIST: &str = "file does not exist";
/// Category for other `downloadFile` failures.
pub const CATEGORY_DOWNLOAD_FILE: &str = "failed to download file";
/// Category for other `deleteFile` failures.
pub const CATEGORY_DELETE_FILE: &str = "failed to delete file";

// ============================================================================
// SECTION: Adapters
// ============================================================================

/// Lists buckets for a tenant.
///
/// # Errors
///
/// Returns [`ToolError::Backend`] when the listing fails.
pub async fn list_buckets(
    client: &dyn StorageClient,
    args: &ProjectArgs,
) -> Result<Value, ToolError> {
    let buckets =
        client.list_buckets().await.map_err(|err| backend(CATEGORY_LIST_BUCKETS, err))?;
    let buckets: Vec<Value> = buckets.iter().map(bucket_summary_json).collect();
    Ok(json!({
        "projectId": args.project_id,
        "buckets": buckets,
    }))
}

/// Fetches bucket metadata.
///
/// # Errors
///
/// Returns [`ToolError::Backend`] when the lookup fails.
pub async fn get_bucket(client: &dyn StorageClient, args: &BucketArgs) -> Result<Value, ToolError> {
    let info = client.get_bucket(&args.bucket).await.map_err(|err| {
        let category = if err.is_not_found_or_denied() {
            CATEGORY_BUCKET_NOT_FOUND
        } else {
            CATEGORY_GET_BUCKET
        };
        backend(category, err)
    })?;
    let mut bucket = bucket_summary_json(&info);
    if let Value::Object(map) = &mut bucket {
        map.insert(
            "versioning".to_string(),
            info.versioning_enabled.map_or(Value::Null, |enabled| json!({ "enabled": enabled })),
        );
    }
    Ok(json!({
        "projectId": args.project_id,
        "bucket": bucket,
    }))
}

/// Lists objects in a bucket.
///
/// # Errors
///
/// Returns [`ToolError::Backend`] when the listing fails.
pub async fn list_files(
    client: &dyn StorageClient,
    args: &ListFilesArgs,
) -> Result<Value, ToolError> {
    let query = ListQuery {
        prefix: args.prefix.clone(),
        delimiter: args.delimiter.clone(),
    };
    let listing = client
        .list_objects(&args.bucket, &query)
        .await
        .map_err(|err| backend(CATEGORY_LIST_FILES, err))?;
    let files: Vec<Value> = listing
        .objects
        .iter()
        .map(|object| {
            json!({
                "name": object.name,
                "size": object.size,
                "contentType": object.content_type,
                "updated": object.updated,
                "created": object.created,
            })
        })
        .collect();
    Ok(json!({
        "projectId": args.project_id,
        "bucket": args.bucket,
        "prefix": args.prefix,
        "delimiter": args.delimiter,
        "files": files,
        "prefixes": listing.prefixes,
        "truncated": listing.truncated,
    }))
}

/// Fetches object metadata.
///
/// # Errors
///
/// Returns [`ToolError::Backend`] when the object is absent or the lookup
/// fails.
pub async fn get_file(client: &dyn StorageClient, args: &FileArgs) -> Result<Value, ToolError> {
    let metadata = client.head_object(&args.bucket, &args.file_path).await.map_err(|err| {
        let category =
            if err.is_not_found_or_denied() { CATEGORY_FILE_NOT_FOUND } else { CATEGORY_GET_FILE };
        backend(category, err)
    })?;
    let metadata = metadata.ok_or_else(|| {
        backend(CATEGORY_FILE_NOT_FOUND, not_found(&args.bucket, &args.file_path))
    })?;
    Ok(json!({
        "projectId": args.project_id,
        "bucket": args.bucket,
        "file": object_metadata_json(&metadata),
    }))
}

/// Uploads an object.
///
/// # Errors
///
/// Returns [`ToolError::Backend`] when the write fails.
pub async fn upload_file(
    client: &dyn StorageClient,
    args: &UploadArgs,
) -> Result<Value, ToolError> {
    let decoded = decode_upload(&args.content);
    let metadata = client
        .put_object(&args.bucket, &args.destination, decoded.bytes, args.content_type.as_deref())
        .await
        .map_err(|err| backend(CATEGORY_UPLOAD_FILE, err))?;
    Ok(json!({
        "success": true,
        "message": format!("File uploaded to {}/{}", args.bucket, args.destination),
        "encoding": decoded.encoding.as_str(),
        "file": object_metadata_json(&metadata),
    }))
}

/// Downloads an object after confirming it exists.
///
/// # Errors
///
/// Returns [`ToolError::Backend`] when the object is absent or the read
/// fails.
pub async fn download_file(
    client: &dyn StorageClient,
    args: &FileArgs,
) -> Result<Value, ToolError> {
    let metadata = client
        .head_object(&args.bucket, &args.file_path)
        .await
        .map_err(|err| backend(CATEGORY_DOWNLOAD_FILE, err))?
        .ok_or_else(|| {
            backend(CATEGORY_FILE_DOES_NOT_EXIST, not_found(&args.bucket, &args.file_path))
        })?;
    let bytes = client
        .get_object(&args.bucket, &args.file_path)
        .await
        .map_err(|err| backend(CATEGORY_DOWNLOAD_FILE, err))?;
    let size = bytes.len();
    let content_type = effective_content_type(metadata.content_type.as_deref()).to_string();
    let encoded = encode_download(bytes, Some(&content_type));
    Ok(json!({
        "name": args.file_path,
        "contentType": content_type,
        "size": size,
        "content": encoded.content,
        "encoding": encoded.encoding.as_str(),
    }))
}

/// Deletes an object after confirming it exists.
///
/// # Errors
///
/// Returns [`ToolError::Backend`] when the object is absent or the delete
/// fails.
pub async fn delete_file(client: &dyn StorageClient, args: &FileArgs) -> Result<Value, ToolError> {
    client
        .head_object(&args.bucket, &args.file_path)
        .await
        .map_err(|err| backend(CATEGORY_DELETE_FILE, err))?
        .ok_or_else(|| {
            backend(CATEGORY_FILE_DOES_NOT_EXIST, not_found(&args.bucket, &args.file_path))
        })?;
    client
        .delete_object(&args.bucket, &args.file_path)
        .await
        .map_err(|err| backend(CATEGORY_DELETE_FILE, err))?;
    Ok(json!({
        "success": true,
        "message": format!("File {} deleted from {}", args.file_path, args.bucket),
    }))
}

/// Reports configured, default, registered, and failed tenants.
#[must_use]
pub fn list_projects(snapshot: &RegistrySnapshot) -> Value {
    json!({
        "configured": snapshot.configured,
        "default": snapshot.default,
        "registered": snapshot.registered,
        "failed": snapshot.failed,
        "raw": snapshot.raw,
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Wraps a storage error with its tool category.
const fn backend(category: &'static str, source: StorageError) -> ToolError {
    ToolError::Backend {
        category,
        source,
    }
}

/// Builds the not-found error for an absent object.
fn not_found(bucket: &str, key: &str) -> StorageError {
    StorageError::NotFound(format!("{bucket}/{key}"))
}

/// Renders the listing shape of a bucket.
fn bucket_summary_json(info: &BucketInfo) -> Value {
    json!({
        "name": info.name,
        "id": info.id,
        "location": info.location,
        "storageClass": info.storage_class,
        "created": info.created,
    })
}

/// Renders object metadata.
fn object_metadata_json(metadata: &ObjectMetadata) -> Value {
    json!({
        "name": metadata.name,
        "bucket": metadata.bucket,
        "size": metadata.size,
        "contentType": metadata.content_type,
        "updated": metadata.updated,
        "created": metadata.created,
        "etag": metadata.etag,
        "storageClass": metadata.storage_class,
        "metadata": metadata.metadata,
    })
}
