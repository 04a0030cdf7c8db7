// crates/bucket-gate-mcp/src/storage/s3.rs
// ============================================================================
// Module: S3-Compatible Storage Client
// Description: `StorageClient` backed by aws-sdk-s3 with static credentials.
// Purpose: Talk to Cloud Storage (XML API) or any S3-compatible endpoint.
// Dependencies: async-trait, aws-sdk-s3, bucket-gate-config
// ============================================================================

//! ## Overview
//! [`S3StorageClient`] wraps an `aws_sdk_s3::Client` configured from a
//! tenant credential document. Construction performs no network I/O; the
//! first tool call is the first request the backend sees. SDK errors are
//! classified into [`StorageError`] by HTTP status and service error code so
//! adapters can distinguish not-found and access-denied from other failures.
//! Downloads are capped at [`MAX_OBJECT_BYTES`] whether or not the backend
//! reports a content length.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::BehaviorVersion;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::config::RequestChecksumCalculation;
use aws_sdk_s3::config::ResponseChecksumValidation;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::primitives::DateTime;
use aws_sdk_s3::primitives::DateTimeFormat;
use aws_sdk_s3::types::BucketVersioningStatus;
use bucket_gate_config::CredentialDocument;

use super::BucketInfo;
use super::ListQuery;
use super::MAX_LIST_ENTRIES;
use super::MAX_OBJECT_BYTES;
use super::ObjectListing;
use super::ObjectMetadata;
use super::ObjectSummary;
use super::StorageClient;
use super::StorageError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Provider name attached to static credentials.
const CREDENTIALS_PROVIDER_NAME: &str = "bucket-gate-credential-file";
/// Page size requested from the listing API.
const LIST_PAGE_SIZE: i32 = 1_000;
/// HTTP status for missing resources.
const STATUS_NOT_FOUND: u16 = 404;
/// HTTP status for authorization failures.
const STATUS_FORBIDDEN: u16 = 403;

// ============================================================================
// SECTION: Client
// ============================================================================

/// S3-compatible storage client for one tenant.
#[derive(Debug, Clone)]
pub struct S3StorageClient {
    /// Underlying SDK client.
    client: Client,
}

impl S3StorageClient {
    /// Wraps an existing SDK client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self {
            client,
        }
    }

    /// Builds a client from a validated credential document.
    #[must_use]
    pub fn from_credentials(document: &CredentialDocument) -> Self {
        let credentials = Credentials::new(
            document.access_key_id.clone(),
            document.secret_access_key.clone(),
            document.session_token.clone(),
            None,
            CREDENTIALS_PROVIDER_NAME,
        );
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(document.region().to_string()))
            .endpoint_url(document.endpoint().to_string())
            .credentials_provider(credentials)
            .force_path_style(document.force_path_style)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();
        Self::new(Client::from_conf(config))
    }
}

// ============================================================================
// SECTION: StorageClient
// ============================================================================

#[async_trait]
impl StorageClient for S3StorageClient {
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, StorageError> {
        let output = self.client.list_buckets().send().await.map_err(classify_sdk_error)?;
        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| {
                let name = bucket.name()?.to_string();
                Some(BucketInfo {
                    id: Some(name.clone()),
                    name,
                    location: bucket.bucket_region().map(str::to_string),
                    storage_class: None,
                    created: bucket.creation_date().and_then(format_datetime),
                    versioning_enabled: None,
                })
            })
            .collect())
    }

    async fn get_bucket(&self, bucket: &str) -> Result<BucketInfo, StorageError> {
        let head =
            self.client.head_bucket().bucket(bucket).send().await.map_err(classify_sdk_error)?;
        // Versioning is reported when the backend supports the query.
        let versioning_enabled =
            self.client.get_bucket_versioning().bucket(bucket).send().await.ok().map(|output| {
                matches!(output.status(), Some(BucketVersioningStatus::Enabled))
            });
        Ok(BucketInfo {
            name: bucket.to_string(),
            id: Some(bucket.to_string()),
            location: head.bucket_region().map(str::to_string),
            storage_class: None,
            created: None,
            versioning_enabled,
        })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        query: &ListQuery,
    ) -> Result<ObjectListing, StorageError> {
        let mut listing = ObjectListing::default();
        let mut continuation: Option<String> = None;
        'pages: loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .set_prefix(query.prefix.clone())
                .set_delimiter(query.delimiter.clone())
                .set_continuation_token(continuation.take())
                .max_keys(LIST_PAGE_SIZE)
                .send()
                .await
                .map_err(classify_sdk_error)?;
            for object in output.contents() {
                if listing.objects.len() + listing.prefixes.len() >= MAX_LIST_ENTRIES {
                    listing.truncated = true;
                    break 'pages;
                }
                let Some(name) = object.key() else {
                    continue;
                };
                listing.objects.push(ObjectSummary {
                    name: name.to_string(),
                    size: object.size().map_or(0, clamp_size),
                    content_type: None,
                    updated: object.last_modified().and_then(format_datetime),
                    created: None,
                });
            }
            for common in output.common_prefixes() {
                if listing.objects.len() + listing.prefixes.len() >= MAX_LIST_ENTRIES {
                    listing.truncated = true;
                    break 'pages;
                }
                if let Some(prefix) = common.prefix() {
                    listing.prefixes.push(prefix.to_string());
                }
            }
            match (output.is_truncated(), output.next_continuation_token()) {
                (Some(true), Some(token)) => {
                    if listing.objects.len() + listing.prefixes.len() >= MAX_LIST_ENTRIES {
                        listing.truncated = true;
                        break;
                    }
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }
        listing.prefixes.sort();
        listing.prefixes.dedup();
        Ok(listing)
    }

    async fn head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<ObjectMetadata>, StorageError> {
        let output = match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(err) => {
                return match classify_sdk_error(err) {
                    StorageError::NotFound(_) => Ok(None),
                    other => Err(other),
                };
            }
        };
        let metadata: BTreeMap<String, String> = output
            .metadata()
            .map(|values| values.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        Ok(Some(ObjectMetadata {
            name: key.to_string(),
            bucket: bucket.to_string(),
            size: output.content_length().map_or(0, clamp_size),
            content_type: output.content_type().map(str::to_string),
            updated: output.last_modified().and_then(format_datetime),
            created: None,
            etag: output.e_tag().map(str::to_string),
            storage_class: output.storage_class().map(|class| class.as_str().to_string()),
            metadata,
        }))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(classify_sdk_error)?;
        if let Some(length) = output.content_length() {
            let actual_bytes = clamp_size(length);
            if actual_bytes > MAX_OBJECT_BYTES as u64 {
                return Err(StorageError::TooLarge {
                    max_bytes: MAX_OBJECT_BYTES,
                    actual_bytes,
                });
            }
        }
        collect_bounded(output.body, MAX_OBJECT_BYTES).await
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<ObjectMetadata, StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(classify_sdk_error)?;
        self.head_object(bucket, key).await?.ok_or_else(|| {
            StorageError::Backend(format!("uploaded object {key} is not visible in {bucket}"))
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(classify_sdk_error)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Classifies an SDK error by HTTP status and service error code.
fn classify_sdk_error<E>(err: SdkError<E, HttpResponse>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let status = err.raw_response().map(|response| response.status().as_u16());
    let code = err.as_service_error().and_then(ProvideErrorMetadata::code).map(str::to_string);
    let message = DisplayErrorContext(&err).to_string();
    if matches!(err, SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)) {
        return StorageError::Io(message);
    }
    match (code.as_deref(), status) {
        (Some("NoSuchBucket" | "NoSuchKey" | "NotFound"), _) | (_, Some(STATUS_NOT_FOUND)) => {
            StorageError::NotFound(message)
        }
        (Some("AccessDenied" | "Forbidden"), _) | (_, Some(STATUS_FORBIDDEN)) => {
            StorageError::AccessDenied(message)
        }
        _ => StorageError::Backend(message),
    }
}

/// Drains a response body, failing once it grows past `max_bytes`.
async fn collect_bounded(mut body: ByteStream, max_bytes: usize) -> Result<Vec<u8>, StorageError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|err| StorageError::Io(err.to_string()))?;
        let total = bytes.len().saturating_add(chunk.len());
        if total > max_bytes {
            return Err(StorageError::TooLarge {
                max_bytes,
                actual_bytes: u64::try_from(total).unwrap_or(u64::MAX),
            });
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Formats an SDK timestamp as RFC 3339.
fn format_datetime(value: &DateTime) -> Option<String> {
    value.fmt(DateTimeFormat::DateTime).ok()
}

/// Converts a signed SDK size into an unsigned byte count.
fn clamp_size(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
