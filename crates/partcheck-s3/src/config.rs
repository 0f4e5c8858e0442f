//! S3 client configuration.
//!
//! Credentials are not configured here; the client uses the AWS SDK default
//! provider chain.

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use serde::{Deserialize, Serialize};
use tracing::debug;
use typed_builder::TypedBuilder;

/// Connection settings for the S3 client.
///
/// # Examples
///
/// ```
/// use partcheck_s3::S3ClientConfig;
///
/// let config = S3ClientConfig::default();
/// assert_eq!(config.region, "us-west-1");
/// assert!(config.endpoint_url.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct S3ClientConfig {
    /// AWS region of the bucket.
    #[builder(default = String::from("us-west-1"), setter(into))]
    pub region: String,

    /// Custom endpoint for S3-compatible services (e.g. `http://localhost:4566`).
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,

    /// Use path-style addressing (`endpoint/bucket/key`).
    #[builder(default = false)]
    pub force_path_style: bool,
}

impl Default for S3ClientConfig {
    fn default() -> Self {
        Self {
            region: String::from("us-west-1"),
            endpoint_url: None,
            force_path_style: false,
        }
    }
}

impl S3ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `AWS_REGION`, then `DEFAULT_REGION` | `us-west-1` |
    /// | `S3_ENDPOINT_URL` | *(unset)* |
    /// | `S3_FORCE_PATH_STYLE` | `true` when an endpoint is set, else `false` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("AWS_REGION").or_else(|_| std::env::var("DEFAULT_REGION")) {
            config.region = v;
        }
        if let Ok(v) = std::env::var("S3_ENDPOINT_URL") {
            config.endpoint_url = Some(v);
            config.force_path_style = true;
        }
        if let Ok(v) = std::env::var("S3_FORCE_PATH_STYLE") {
            config.force_path_style = parse_bool(&v);
        }

        config
    }
}

/// Build an S3 client from `config` and the SDK's default credential chain.
pub async fn build_client(config: &S3ClientConfig) -> aws_sdk_s3::Client {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await;

    let mut builder =
        aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(config.force_path_style);
    if let Some(url) = &config.endpoint_url {
        builder = builder.endpoint_url(url);
    }

    debug!(
        region = %config.region,
        endpoint_url = ?config.endpoint_url,
        force_path_style = config.force_path_style,
        "built S3 client"
    );
    aws_sdk_s3::Client::from_conf(builder.build())
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
