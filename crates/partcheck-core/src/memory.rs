//! In-memory object store with S3 multipart semantics.
//!
//! [`InMemoryObjectStore`] behaves like an S3-compatible service for the
//! operations of [`ObjectStore`]: parts are stored by `(upload_id,
//! part_number)` with MD5 ETags, completion requires an ascending part list
//! whose ETags match what was uploaded, and the assembled object keeps its
//! part boundaries so individual parts can be fetched back.
//!
//! The store is thread-safe and uses [`DashMap`] for uploads and objects.

use std::collections::BTreeMap;
use std::ops::Range;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::assembler::Manifest;
use crate::checksums;
use crate::config::MAX_PART_NUMBER;
use crate::store::{CompletedUpload, ObjectStore, StoreError, StoreResult};

/// Composite key identifying a stored object: `(bucket, key)`.
type ObjectKey = (String, String);

/// An upload that has been initiated but not completed or aborted.
#[derive(Debug)]
struct PendingUpload {
    bucket: String,
    key: String,
    initiated: DateTime<Utc>,
    /// Parts uploaded so far, keyed by part number.
    parts: BTreeMap<u32, StoredPart>,
}

#[derive(Debug, Clone)]
struct StoredPart {
    etag: String,
    data: Bytes,
}

/// A completed multipart object.
#[derive(Debug)]
struct StoredObject {
    data: Bytes,
    etag: String,
    /// Byte range of part `i + 1` within `data`.
    part_ranges: Vec<Range<usize>>,
}

/// An in-memory [`ObjectStore`].
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use partcheck_core::{InMemoryObjectStore, ObjectStore};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryObjectStore::new();
/// let upload_id = store.initiate_multipart_upload("bucket", "key").await.unwrap();
/// let etag = store
///     .upload_part("bucket", "key", &upload_id, 1, Bytes::from_static(b"hello"))
///     .await
///     .unwrap();
/// assert_eq!(etag, "\"5d41402abc4b2a76b9719d911017c592\"");
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    /// In-progress uploads keyed by upload ID.
    uploads: DashMap<String, PendingUpload>,
    /// Completed objects keyed by `(bucket, key)`.
    objects: DashMap<ObjectKey, StoredObject>,
}

impl InMemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of uploads that have been initiated and not yet completed or
    /// aborted.
    #[must_use]
    pub fn pending_uploads(&self) -> usize {
        self.uploads.len()
    }

    /// Part numbers uploaded so far for `upload_id`, ascending.
    pub fn uploaded_parts(&self, upload_id: &str) -> StoreResult<Vec<u32>> {
        let upload = self.pending(upload_id)?;
        Ok(upload.parts.keys().copied().collect())
    }

    /// Read a whole completed object.
    pub fn get_object(&self, bucket: &str, key: &str) -> StoreResult<Bytes> {
        let object = self.object(bucket, key)?;
        Ok(object.data.clone())
    }

    /// ETag of a completed object.
    pub fn object_etag(&self, bucket: &str, key: &str) -> StoreResult<String> {
        let object = self.object(bucket, key)?;
        Ok(object.etag.clone())
    }

    fn pending(
        &self,
        upload_id: &str,
    ) -> StoreResult<dashmap::mapref::one::Ref<'_, String, PendingUpload>> {
        self.uploads
            .get(upload_id)
            .ok_or_else(|| StoreError::NoSuchUpload {
                upload_id: upload_id.to_owned(),
            })
    }

    fn object(
        &self,
        bucket: &str,
        key: &str,
    ) -> StoreResult<dashmap::mapref::one::Ref<'_, ObjectKey, StoredObject>> {
        self.objects
            .get(&(bucket.to_owned(), key.to_owned()))
            .ok_or_else(|| StoreError::NoSuchKey {
                key: key.to_owned(),
            })
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn initiate_multipart_upload(&self, bucket: &str, key: &str) -> StoreResult<String> {
        let upload_id = uuid::Uuid::new_v4().simple().to_string();
        self.uploads.insert(
            upload_id.clone(),
            PendingUpload {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                initiated: Utc::now(),
                parts: BTreeMap::new(),
            },
        );
        debug!(bucket, key, upload_id = %upload_id, "initiated multipart upload");
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> StoreResult<String> {
        if !(1..=MAX_PART_NUMBER).contains(&part_number) {
            return Err(StoreError::InvalidPart { part_number });
        }

        let mut upload = self
            .uploads
            .get_mut(upload_id)
            .filter(|u| u.bucket == bucket && u.key == key)
            .ok_or_else(|| StoreError::NoSuchUpload {
                upload_id: upload_id.to_owned(),
            })?;

        let etag = checksums::compute_etag(&body);
        trace!(upload_id, part_number, size = body.len(), "stored part data");
        upload.parts.insert(
            part_number,
            StoredPart {
                etag: etag.clone(),
                data: body,
            },
        );
        Ok(etag)
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        manifest: &Manifest,
    ) -> StoreResult<CompletedUpload> {
        let (data, part_ranges, etag, initiated) = {
            let upload = self
                .pending(upload_id)
                .ok()
                .filter(|u| u.bucket == bucket && u.key == key)
                .ok_or_else(|| StoreError::NoSuchUpload {
                    upload_id: upload_id.to_owned(),
                })?;

            let mut combined = BytesMut::with_capacity(
                usize::try_from(manifest.total_size()).unwrap_or_default(),
            );
            let mut part_ranges = Vec::with_capacity(manifest.len());
            let mut part_md5s = Vec::with_capacity(manifest.len());
            let mut last = 0;

            for requested in manifest.parts() {
                if requested.part_number <= last {
                    return Err(StoreError::InvalidPartOrder);
                }
                last = requested.part_number;

                let stored = upload
                    .parts
                    .get(&requested.part_number)
                    .filter(|p| p.etag.trim_matches('"') == requested.etag.trim_matches('"'))
                    .ok_or(StoreError::InvalidPart {
                        part_number: requested.part_number,
                    })?;

                let start = combined.len();
                combined.extend_from_slice(&stored.data);
                part_ranges.push(start..combined.len());
                part_md5s.push(stored.etag.clone());
            }

            (
                combined.freeze(),
                part_ranges,
                checksums::compute_multipart_etag(&part_md5s),
                upload.initiated,
            )
        };

        self.uploads.remove(upload_id);
        debug!(
            bucket,
            key,
            upload_id,
            size = data.len(),
            parts = part_ranges.len(),
            initiated = %initiated,
            "completed multipart upload"
        );
        self.objects.insert(
            (bucket.to_owned(), key.to_owned()),
            StoredObject {
                data,
                etag: etag.clone(),
                part_ranges,
            },
        );

        Ok(CompletedUpload {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            etag,
            location: None,
            version_id: None,
        })
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> StoreResult<()> {
        let removed = self
            .uploads
            .remove_if(upload_id, |_, u| u.bucket == bucket && u.key == key);
        match removed {
            Some((_, upload)) => {
                debug!(
                    bucket,
                    key,
                    upload_id,
                    parts = upload.parts.len(),
                    "aborted multipart upload"
                );
                Ok(())
            }
            None => Err(StoreError::NoSuchUpload {
                upload_id: upload_id.to_owned(),
            }),
        }
    }

    async fn get_object_part(
        &self,
        bucket: &str,
        key: &str,
        part_number: u32,
    ) -> StoreResult<Bytes> {
        let object = self.object(bucket, key)?;
        let range = part_number
            .checked_sub(1)
            .and_then(|i| object.part_ranges.get(i as usize))
            .ok_or(StoreError::InvalidPart { part_number })?;
        Ok(object.data.slice(range.clone()))
    }
}
