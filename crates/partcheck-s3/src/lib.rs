//! `aws-sdk-s3` backend for the partcheck upload coordinator.
//!
//! [`S3ObjectStore`] implements [`partcheck_core::ObjectStore`] on top of an
//! [`aws_sdk_s3::Client`]. Build the client from an [`S3ClientConfig`] with
//! [`build_client`], or hand in an existing one.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use partcheck_core::{DigitPattern, ReorderScenario, SessionConfig};
//! use partcheck_s3::{S3ClientConfig, S3ObjectStore};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = S3ObjectStore::from_config(&S3ClientConfig::from_env()).await;
//! let report = ReorderScenario::default()
//!     .run(Arc::new(store), SessionConfig::from_env(), &DigitPattern)
//!     .await?;
//! println!("{:?}", report.first_bytes);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod store;

pub use config::{S3ClientConfig, build_client};
pub use store::S3ObjectStore;
