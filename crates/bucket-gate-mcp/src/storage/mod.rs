// crates/bucket-gate-mcp/src/storage/mod.rs
// ============================================================================
// Module: Storage Client Seam
// Description: Narrow async capability contract for tenant object storage.
// Purpose: Decouple tool adapters from the concrete storage SDK.
// Dependencies: async-trait, serde, thiserror
// ============================================================================

//! ## Overview
//! A [`StorageClient`] is the authenticated handle for one tenant. Adapters
//! borrow it for the duration of a call and translate its normalized
//! results into tool payloads. Two implementations exist: an S3-compatible
//! client for real deployments and an in-memory client for tests and local
//! development.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod memory;
pub mod s3;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use memory::InMemoryStorageClient;
pub use s3::S3StorageClient;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum entries returned by a single listing.
pub const MAX_LIST_ENTRIES: usize = 10_000;
/// Maximum object size accepted for download in bytes.
pub const MAX_OBJECT_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Normalized bucket metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketInfo {
    /// Bucket name.
    pub name: String,
    /// Backend bucket identifier.
    pub id: Option<String>,
    /// Bucket location or region.
    pub location: Option<String>,
    /// Default storage class.
    pub storage_class: Option<String>,
    /// Creation time (RFC 3339).
    pub created: Option<String>,
    /// Object versioning state, when known.
    pub versioning_enabled: Option<bool>,
}

/// Listing filter passed through to the backend.
///
/// `None` means the filter was not supplied; `Some("")` is passed through
/// as an explicit empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Object name prefix filter.
    pub prefix: Option<String>,
    /// Hierarchy delimiter.
    pub delimiter: Option<String>,
}

/// Normalized object listing entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Object name.
    pub name: String,
    /// Object size in bytes.
    pub size: u64,
    /// Content type when the listing API reports it.
    pub content_type: Option<String>,
    /// Last modification time (RFC 3339).
    pub updated: Option<String>,
    /// Creation time (RFC 3339).
    pub created: Option<String>,
}

/// One page-merged object listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    /// Objects in name order.
    pub objects: Vec<ObjectSummary>,
    /// Common prefixes when a delimiter was supplied.
    pub prefixes: Vec<String>,
    /// True when more entries exist than were returned.
    pub truncated: bool,
}

/// Normalized object metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Object name.
    pub name: String,
    /// Containing bucket.
    pub bucket: String,
    /// Object size in bytes.
    pub size: u64,
    /// Stored content type.
    pub content_type: Option<String>,
    /// Last modification time (RFC 3339).
    pub updated: Option<String>,
    /// Creation time (RFC 3339).
    pub created: Option<String>,
    /// Entity tag.
    pub etag: Option<String>,
    /// Storage class.
    pub storage_class: Option<String>,
    /// Custom object metadata.
    pub metadata: BTreeMap<String, String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Storage backend errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Bucket or object does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Credentials lack access to the resource.
    #[error("access denied: {0}")]
    AccessDenied(String),
    /// Backend returned an error.
    #[error("storage backend error: {0}")]
    Backend(String),
    /// Transport or body I/O failure.
    #[error("storage io error: {0}")]
    Io(String),
    /// Object exceeds the download size limit.
    #[error("object too large: {actual_bytes} > {max_bytes} bytes")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Reported size in bytes.
        actual_bytes: u64,
    },
}

impl StorageError {
    /// Returns true for not-found and access-denied failures.
    #[must_use]
    pub const fn is_not_found_or_denied(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::AccessDenied(_))
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Authenticated object-storage handle for one tenant.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Lists buckets visible to the tenant.
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, StorageError>;

    /// Fetches metadata for one bucket.
    async fn get_bucket(&self, bucket: &str) -> Result<BucketInfo, StorageError>;

    /// Lists objects, returning at most [`MAX_LIST_ENTRIES`] entries.
    async fn list_objects(
        &self,
        bucket: &str,
        query: &ListQuery,
    ) -> Result<ObjectListing, StorageError>;

    /// Fetches object metadata.
    ///
    /// Returns `None` when the object or its bucket is absent. HEAD
    /// responses carry no error body, so a missing bucket cannot be told
    /// apart from a missing key.
    async fn head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<ObjectMetadata>, StorageError>;

    /// Downloads object bytes.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Uploads object bytes and returns the resulting metadata.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<ObjectMetadata, StorageError>;

    /// Deletes an object.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}
