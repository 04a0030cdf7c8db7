// crates/bucket-gate-mcp/src/storage/memory.rs
// ============================================================================
// Module: In-Memory Storage Client
// Description: Process-local object store implementing `StorageClient`.
// Purpose: Exercise tool routing without network access.
// Dependencies: async-trait, std
// ============================================================================

//! ## Overview
//! [`InMemoryStorageClient`] keeps buckets and objects in a mutex-guarded
//! map. It follows the listing semantics of S3-compatible backends (prefix
//! filtering, delimiter grouping, name ordering, truncation) and supports
//! injected failures so error shaping can be tested deterministically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_trait::async_trait;

use super::BucketInfo;
use super::ListQuery;
use super::MAX_LIST_ENTRIES;
use super::ObjectListing;
use super::ObjectMetadata;
use super::ObjectSummary;
use super::StorageClient;
use super::StorageError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Stored object payload.
#[derive(Debug, Clone)]
struct MemoryObject {
    /// Object bytes.
    bytes: Vec<u8>,
    /// Stored content type.
    content_type: Option<String>,
    /// Monotonic write generation, used for etags.
    generation: u64,
}

/// Stored bucket.
#[derive(Debug, Clone, Default)]
struct MemoryBucket {
    /// Bucket metadata.
    info: BucketInfo,
    /// Objects keyed by name.
    objects: BTreeMap<String, MemoryObject>,
}

/// Mutable store state.
#[derive(Debug, Default)]
struct MemoryState {
    /// Buckets keyed by name.
    buckets: BTreeMap<String, MemoryBucket>,
    /// Injected per-bucket failures.
    bucket_failures: BTreeMap<String, StorageError>,
    /// Injected failure for every operation.
    global_failure: Option<StorageError>,
    /// Next write generation.
    next_generation: u64,
}

/// In-memory storage client.
#[derive(Debug)]
pub struct InMemoryStorageClient {
    /// Guarded store state.
    state: Mutex<MemoryState>,
    /// Maximum entries returned per listing.
    list_limit: usize,
}

impl Default for InMemoryStorageClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorageClient {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            list_limit: MAX_LIST_ENTRIES,
        }
    }

    /// Overrides the listing limit.
    #[must_use]
    pub const fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit;
        self
    }

    /// Creates a bucket with default metadata.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when the state lock is poisoned.
    pub fn create_bucket(&self, name: &str) -> Result<(), StorageError> {
        self.insert_bucket(BucketInfo {
            name: name.to_string(),
            id: Some(name.to_string()),
            location: Some("US".to_string()),
            storage_class: Some("STANDARD".to_string()),
            created: None,
            versioning_enabled: Some(false),
        })
    }

    /// Creates or replaces a bucket with explicit metadata.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when the state lock is poisoned.
    pub fn insert_bucket(&self, info: BucketInfo) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        let entry = state.buckets.entry(info.name.clone()).or_default();
        entry.info = info;
        Ok(())
    }

    /// Makes every operation on `bucket` fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when the state lock is poisoned.
    pub fn fail_bucket(&self, bucket: &str, error: StorageError) -> Result<(), StorageError> {
        self.lock()?.bucket_failures.insert(bucket.to_string(), error);
        Ok(())
    }

    /// Makes every operation fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when the state lock is poisoned.
    pub fn fail_all(&self, error: StorageError) -> Result<(), StorageError> {
        self.lock()?.global_failure = Some(error);
        Ok(())
    }

    /// Returns the stored bytes for an object, bypassing failure injection.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when the state lock is poisoned.
    pub fn object_bytes(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let state = self.lock()?;
        Ok(state
            .buckets
            .get(bucket)
            .and_then(|entry| entry.objects.get(key))
            .map(|object| object.bytes.clone()))
    }

    /// Locks the store state.
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state.lock().map_err(|_| StorageError::Io("memory store lock poisoned".to_string()))
    }

    /// Locks the store and applies injected failures for `bucket`.
    fn checked(&self, bucket: Option<&str>) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        let state = self.lock()?;
        if let Some(error) = &state.global_failure {
            return Err(error.clone());
        }
        if let Some(bucket) = bucket
            && let Some(error) = state.bucket_failures.get(bucket)
        {
            return Err(error.clone());
        }
        Ok(state)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Looks up a bucket or reports it missing.
fn bucket_ref<'a>(state: &'a MemoryState, bucket: &str) -> Result<&'a MemoryBucket, StorageError> {
    state
        .buckets
        .get(bucket)
        .ok_or_else(|| StorageError::NotFound(format!("bucket {bucket} does not exist")))
}

/// Builds object metadata for a stored object.
fn metadata_for(bucket: &str, key: &str, object: &MemoryObject) -> ObjectMetadata {
    ObjectMetadata {
        name: key.to_string(),
        bucket: bucket.to_string(),
        size: object.bytes.len() as u64,
        content_type: object.content_type.clone(),
        updated: None,
        created: None,
        etag: Some(format!("\"{}\"", object.generation)),
        storage_class: Some("STANDARD".to_string()),
        metadata: BTreeMap::new(),
    }
}

// ============================================================================
// SECTION: StorageClient
// ============================================================================

#[async_trait]
impl StorageClient for InMemoryStorageClient {
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, StorageError> {
        let state = self.checked(None)?;
        Ok(state.buckets.values().map(|entry| entry.info.clone()).collect())
    }

    async fn get_bucket(&self, bucket: &str) -> Result<BucketInfo, StorageError> {
        let state = self.checked(Some(bucket))?;
        Ok(bucket_ref(&state, bucket)?.info.clone())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        query: &ListQuery,
    ) -> Result<ObjectListing, StorageError> {
        let state = self.checked(Some(bucket))?;
        let entry = bucket_ref(&state, bucket)?;
        let prefix = query.prefix.as_deref().unwrap_or("");
        let delimiter = query.delimiter.as_deref().filter(|value| !value.is_empty());
        let mut listing = ObjectListing::default();
        let mut prefixes = BTreeSet::new();
        for (key, object) in entry.objects.range(prefix.to_string() ..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };
            if let Some(delimiter) = delimiter
                && let Some(index) = rest.find(delimiter)
            {
                let common = format!("{prefix}{}", &rest[.. index + delimiter.len()]);
                if !prefixes.contains(&common) {
                    if listing.objects.len() + prefixes.len() >= self.list_limit {
                        listing.truncated = true;
                        break;
                    }
                    prefixes.insert(common);
                }
                continue;
            }
            if listing.objects.len() + prefixes.len() >= self.list_limit {
                listing.truncated = true;
                break;
            }
            listing.objects.push(ObjectSummary {
                name: key.clone(),
                size: object.bytes.len() as u64,
                content_type: object.content_type.clone(),
                updated: None,
                created: None,
            });
        }
        listing.prefixes = prefixes.into_iter().collect();
        Ok(listing)
    }

    async fn head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<ObjectMetadata>, StorageError> {
        let state = self.checked(Some(bucket))?;
        Ok(state
            .buckets
            .get(bucket)
            .and_then(|entry| entry.objects.get(key))
            .map(|object| metadata_for(bucket, key, object)))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let state = self.checked(Some(bucket))?;
        let entry = bucket_ref(&state, bucket)?;
        entry
            .objects
            .get(key)
            .map(|object| object.bytes.clone())
            .ok_or_else(|| StorageError::NotFound(format!("object {key} does not exist")))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<ObjectMetadata, StorageError> {
        let mut state = self.checked(Some(bucket))?;
        state.next_generation += 1;
        let generation = state.next_generation;
        let entry = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::NotFound(format!("bucket {bucket} does not exist")))?;
        let object = MemoryObject {
            bytes,
            content_type: content_type.map(str::to_string),
            generation,
        };
        let metadata = metadata_for(bucket, key, &object);
        entry.objects.insert(key.to_string(), object);
        Ok(metadata)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let mut state = self.checked(Some(bucket))?;
        let entry = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::NotFound(format!("bucket {bucket} does not exist")))?;
        entry
            .objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(format!("object {key} does not exist")))
    }
}
