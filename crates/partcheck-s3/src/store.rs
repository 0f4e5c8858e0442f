//! [`ObjectStore`] over `aws-sdk-s3`.

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::Bytes;
use tracing::debug;

use partcheck_core::checksums::compute_content_md5;
use partcheck_core::store::StoreResult;
use partcheck_core::{CompletedUpload, Manifest, ObjectStore, StoreError};

use crate::config::{S3ClientConfig, build_client};

/// Object store backed by a real (or S3-compatible) service.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Build a client from `config` and wrap it.
    pub async fn from_config(config: &S3ClientConfig) -> Self {
        Self::new(build_client(config).await)
    }

    /// The underlying SDK client.
    #[must_use]
    pub fn client(&self) -> &aws_sdk_s3::Client {
        &self.client
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn initiate_multipart_upload(&self, bucket: &str, key: &str) -> StoreResult<String> {
        let output = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &ErrorScope::key(key)))?;

        let upload_id = output
            .upload_id()
            .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("response has no upload ID")))?
            .to_owned();

        debug!(bucket, key, upload_id = %upload_id, "create_multipart_upload completed");
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
        let size = body.len();
        let content_length = i64::try_from(size).map_err(|e| StoreError::Backend(e.into()))?;
        let content_md5 = compute_content_md5(&body);

        let output = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(sdk_part_number(part_number)?)
            .content_length(content_length)
            .content_md5(content_md5)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &ErrorScope::part(key, upload_id, part_number)))?;

        let etag = output
            .e_tag()
            .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("response has no ETag")))?
            .to_owned();

        debug!(
            bucket,
            key,
            upload_id,
            part_number,
            size,
            etag = %etag,
            "upload_part completed"
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
        let parts = completed_parts(manifest)?;

        let output = self
            .client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &ErrorScope::upload(key, upload_id)))?;

        let completed = CompletedUpload {
            bucket: output.bucket().unwrap_or(bucket).to_owned(),
            key: output.key().unwrap_or(key).to_owned(),
            etag: output.e_tag().unwrap_or_default().to_owned(),
            location: output.location().map(ToOwned::to_owned),
            version_id: output.version_id().map(ToOwned::to_owned),
        };

        debug!(
            bucket,
            key,
            upload_id,
            part_count = manifest.len(),
            etag = %completed.etag,
            "complete_multipart_upload completed"
        );
        Ok(completed)
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> StoreResult<()> {
        self.client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &ErrorScope::upload(key, upload_id)))?;

        debug!(bucket, key, upload_id, "abort_multipart_upload completed");
        Ok(())
    }

    async fn get_object_part(&self, bucket: &str, key: &str, part_number: u32) -> StoreResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .part_number(sdk_part_number(part_number)?)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &ErrorScope::part(key, "", part_number)))?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Backend(e.into()))?
            .into_bytes();

        debug!(bucket, key, part_number, size = body.len(), "get_object part completed");
        Ok(body)
    }
}

/// Convert a manifest into the SDK's completed-part list, preserving order.
fn completed_parts(manifest: &Manifest) -> StoreResult<Vec<CompletedPart>> {
    manifest
        .parts()
        .iter()
        .map(|p| {
            Ok(CompletedPart::builder()
                .part_number(sdk_part_number(p.part_number)?)
                .e_tag(p.etag.clone())
                .build())
        })
        .collect()
}

fn sdk_part_number(part_number: u32) -> StoreResult<i32> {
    i32::try_from(part_number).map_err(|_| StoreError::InvalidPart { part_number })
}

/// Identifiers used to build typed errors from S3 error codes.
#[derive(Debug, Default)]
struct ErrorScope<'a> {
    key: &'a str,
    upload_id: &'a str,
    part_number: Option<u32>,
}

impl<'a> ErrorScope<'a> {
    fn key(key: &'a str) -> Self {
        Self {
            key,
            ..Self::default()
        }
    }

    fn upload(key: &'a str, upload_id: &'a str) -> Self {
        Self {
            key,
            upload_id,
            part_number: None,
        }
    }

    fn part(key: &'a str, upload_id: &'a str, part_number: u32) -> Self {
        Self {
            key,
            upload_id,
            part_number: Some(part_number),
        }
    }

    /// Map a service error code onto a [`StoreError`] variant, if one fits.
    fn classify(&self, code: Option<&str>) -> Option<StoreError> {
        match code? {
            "NoSuchUpload" => Some(StoreError::NoSuchUpload {
                upload_id: self.upload_id.to_owned(),
            }),
            "NoSuchKey" => Some(StoreError::NoSuchKey {
                key: self.key.to_owned(),
            }),
            "InvalidPart" | "InvalidPartNumber" => Some(StoreError::InvalidPart {
                part_number: self.part_number.unwrap_or_default(),
            }),
            "InvalidPartOrder" => Some(StoreError::InvalidPartOrder),
            _ => None,
        }
    }
}

fn map_sdk_error<E>(err: E, scope: &ErrorScope<'_>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    scope
        .classify(err.code())
        .unwrap_or_else(|| StoreError::Backend(anyhow::anyhow!("{}", DisplayErrorContext(&err))))
}
