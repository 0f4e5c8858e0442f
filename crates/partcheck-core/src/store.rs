//! The object store seam.
//!
//! An [`ObjectStore`] is the storage service a session talks to. The
//! coordinator never performs network I/O itself; production code plugs in the
//! S3 implementation from `partcheck-s3`, tests use
//! [`InMemoryObjectStore`](crate::InMemoryObjectStore).

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::assembler::Manifest;

/// Errors raised by an [`ObjectStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The multipart upload does not exist (never created, completed or aborted).
    #[error("the specified upload does not exist: {upload_id}")]
    NoSuchUpload {
        /// The upload ID that was not found.
        upload_id: String,
    },

    /// The object does not exist.
    #[error("the specified key does not exist: {key}")]
    NoSuchKey {
        /// The key that was not found.
        key: String,
    },

    /// A part is missing, has a mismatched ETag or lies outside the object.
    #[error("invalid part {part_number}")]
    InvalidPart {
        /// The offending part number.
        part_number: u32,
    },

    /// The manifest parts were not in ascending order.
    #[error("the list of parts was not in ascending order")]
    InvalidPartOrder,

    /// Any other backend failure.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result of finalizing a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedUpload {
    /// Bucket holding the object.
    pub bucket: String,
    /// Key of the assembled object.
    pub key: String,
    /// ETag of the assembled object.
    pub etag: String,
    /// Location URL, if the store reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Version ID, if the bucket is versioned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

/// A storage service exposing the multipart upload API.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Start a multipart upload and return its upload ID.
    async fn initiate_multipart_upload(&self, bucket: &str, key: &str) -> StoreResult<String>;

    /// Upload one part and return its ETag.
    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> StoreResult<String>;

    /// Assemble the uploaded parts listed in `manifest` into the final object.
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        manifest: &Manifest,
    ) -> StoreResult<CompletedUpload>;

    /// Discard an in-progress upload and its parts.
    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> StoreResult<()>;

    /// Download one part of a completed multipart object.
    async fn get_object_part(&self, bucket: &str, key: &str, part_number: u32)
    -> StoreResult<Bytes>;
}
