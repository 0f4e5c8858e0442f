//! Provider-agnostic multipart upload coordinator.
//!
//! This crate drives a single large-object upload that is split into
//! independently uploadable parts. Parts may be uploaded in any order; the
//! coordinator tracks them by part number and emits an ascending manifest for
//! the finalize call. After completion, parts can be fetched back one at a
//! time to verify that the storage service reassembled them correctly.
//!
//! # Architecture
//!
//! ```text
//!   ReorderScenario (upload order / download order check)
//!        |
//!        v
//!   UploadSession (Open -> Completing -> Completed | Aborted)
//!     |        |            |
//!     v        v            v
//! PartSource  PartTracker  assemble() -> Manifest
//!        |
//!        v
//!   ObjectStore (S3, in-memory, ...)
//! ```

pub mod assembler;
pub mod checksums;
pub mod config;
pub mod error;
pub mod memory;
pub mod producer;
pub mod scenario;
pub mod session;
pub mod store;
pub mod tracker;

pub use assembler::{CompletedPart, Manifest, assemble};
pub use config::SessionConfig;
pub use error::{UploadError, UploadResult};
pub use memory::InMemoryObjectStore;
pub use producer::{BytesSource, DigitPattern, FileSource, PartSource};
pub use scenario::{ReorderScenario, ScenarioReport};
pub use session::{SessionState, UploadSession};
pub use store::{CompletedUpload, ObjectStore, StoreError};
pub use tracker::{PartRecord, PartStatus, PartTracker};
