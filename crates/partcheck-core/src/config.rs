//! Upload session configuration.
//!
//! Provides [`SessionConfig`], the explicit set of values a session is
//! constructed with: target bucket and key, the declared part count, and the
//! size of each produced part.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{UploadError, UploadResult};

/// Largest part number S3-compatible services accept.
pub const MAX_PART_NUMBER: u32 = 10_000;

/// Largest part size S3-compatible services accept: 5 GiB.
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Default part size: 5 MiB, the S3 minimum for every part but the last.
pub const DEFAULT_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Configuration for a single multipart upload session.
///
/// # Examples
///
/// ```
/// use partcheck_core::SessionConfig;
///
/// let config = SessionConfig::default();
/// assert_eq!(config.bucket, "zhongyi-multipart-test");
/// assert_eq!(config.key, "seq001");
/// assert_eq!(config.total_parts, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Target bucket.
    #[builder(default = String::from("zhongyi-multipart-test"), setter(into))]
    pub bucket: String,

    /// Object key the upload will create.
    #[builder(default = String::from("seq001"), setter(into))]
    pub key: String,

    /// Number of parts the upload is declared to have.
    #[builder(default = 4)]
    pub total_parts: u32,

    /// Size in bytes passed to the part source for each part.
    #[builder(default = DEFAULT_PART_SIZE)]
    pub part_size: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bucket: String::from("zhongyi-multipart-test"),
            key: String::from("seq001"),
            total_parts: 4,
            part_size: DEFAULT_PART_SIZE,
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `S3_BUCKET` | `zhongyi-multipart-test` |
    /// | `S3_KEY` | `seq001` |
    /// | `TOTAL_PARTS` | `4` |
    /// | `PART_SIZE` | `5242880` |
    ///
    /// Unparseable numeric values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("S3_BUCKET") {
            config.bucket = v;
        }
        if let Ok(v) = std::env::var("S3_KEY") {
            config.key = v;
        }
        if let Ok(v) = std::env::var("TOTAL_PARTS") {
            if let Ok(n) = v.parse::<u32>() {
                config.total_parts = n;
            }
        }
        if let Ok(v) = std::env::var("PART_SIZE") {
            if let Ok(n) = v.parse::<u64>() {
                config.part_size = n;
            }
        }

        config
    }

    /// Check that the configuration describes a valid multipart upload.
    pub fn validate(&self) -> UploadResult<()> {
        if self.bucket.is_empty() {
            return Err(UploadError::InvalidConfig("bucket must not be empty".to_owned()));
        }
        if self.key.is_empty() {
            return Err(UploadError::InvalidConfig("key must not be empty".to_owned()));
        }
        if !(1..=MAX_PART_NUMBER).contains(&self.total_parts) {
            return Err(UploadError::InvalidConfig(format!(
                "total_parts must be between 1 and {MAX_PART_NUMBER}, got {}",
                self.total_parts
            )));
        }
        if !(1..=MAX_PART_SIZE).contains(&self.part_size) {
            return Err(UploadError::InvalidConfig(format!(
                "part_size must be between 1 and {MAX_PART_SIZE}, got {}",
                self.part_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.bucket, "zhongyi-multipart-test");
        assert_eq!(config.key, "seq001");
        assert_eq!(config.total_parts, 4);
        assert_eq!(config.part_size, 5 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_should_match_builder_defaults() {
        assert_eq!(SessionConfig::builder().build(), SessionConfig::default());
    }

    #[test]
    fn test_should_build_with_typed_builder() {
        let config = SessionConfig::builder()
            .bucket("other-bucket")
            .key("objects/big.bin")
            .total_parts(12)
            .part_size(1024)
            .build();

        assert_eq!(config.bucket, "other-bucket");
        assert_eq!(config.key, "objects/big.bin");
        assert_eq!(config.total_parts, 12);
        assert_eq!(config.part_size, 1024);
    }

    #[test]
    fn test_should_load_from_env() {
        let config = SessionConfig::from_env();
        assert!(!config.bucket.is_empty());
    }

    #[test]
    fn test_should_reject_out_of_range_part_counts() {
        for total_parts in [0, MAX_PART_NUMBER + 1] {
            let config = SessionConfig::builder().total_parts(total_parts).build();
            assert!(matches!(
                config.validate(),
                Err(UploadError::InvalidConfig(_))
            ));
        }
        let config = SessionConfig::builder().total_parts(MAX_PART_NUMBER).build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_should_reject_zero_part_size_and_empty_names() {
        let zero = SessionConfig::builder().part_size(0).build();
        assert!(zero.validate().is_err());
        let no_bucket = SessionConfig::builder().bucket("").build();
        assert!(no_bucket.validate().is_err());
        let no_key = SessionConfig::builder().key("").build();
        assert!(no_key.validate().is_err());
    }

    #[test]
    fn test_should_reject_oversized_part_size() {
        for part_size in [MAX_PART_SIZE + 1, u64::MAX] {
            let config = SessionConfig::builder()
                .total_parts(1)
                .part_size(part_size)
                .build();
            assert!(matches!(
                config.validate(),
                Err(UploadError::InvalidConfig(_))
            ));
        }
        let largest = SessionConfig::builder().part_size(MAX_PART_SIZE).build();
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn test_should_serialize_to_camel_case_json() {
        let config = SessionConfig::default();
        let json = serde_json::to_string(&config).expect("test serialization");
        assert!(json.contains("totalParts"));
        assert!(json.contains("partSize"));
    }
}
