//! Error types for the upload coordinator.
//!
//! Every failure surfaces to the caller immediately. Nothing in this crate
//! retries or cleans up on its own; a caller that wants remote resources
//! released must call [`UploadSession::abort`](crate::UploadSession::abort).
//!
//! # Usage
//!
//! ```
//! use partcheck_core::UploadError;
//!
//! let err = UploadError::IncompleteUpload { missing: vec![1, 3] };
//! assert_eq!(err.to_string(), "multipart upload is incomplete, missing parts: [1, 3]");
//! ```

use crate::session::SessionState;
use crate::store::StoreError;

/// Coordinator error type.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The part source could not produce the bytes for a part.
    #[error("part source unavailable for part {part_number}: {source}")]
    SourceUnavailable {
        /// The part that could not be produced.
        part_number: u32,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A part number outside `[1, total_parts]`.
    #[error("invalid part number {part_number}, expected 1..={total_parts}")]
    InvalidPartNumber {
        /// The rejected part number.
        part_number: u32,
        /// The number of parts declared for the session.
        total_parts: u32,
    },

    /// Completion was attempted while some parts are still pending.
    #[error("multipart upload is incomplete, missing parts: {missing:?}")]
    IncompleteUpload {
        /// Pending part numbers, ascending.
        missing: Vec<u32>,
    },

    /// A call into the object store failed.
    #[error("{operation} failed: {source}")]
    TransportFailure {
        /// The store operation that failed (e.g. `"upload_part"`).
        operation: &'static str,
        /// The store error.
        #[source]
        source: StoreError,
    },

    /// An operation was invoked in a session state that does not allow it.
    #[error("{operation} is not allowed while the session is {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The state the session was in.
        state: SessionState,
    },

    /// Configuration or scenario parameters are invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A fetched part did not match the bytes originally produced for it.
    #[error("content mismatch for part {part_number}")]
    ContentMismatch {
        /// The part whose content differed.
        part_number: u32,
    },
}

impl UploadError {
    /// Wrap a [`StoreError`] raised by `operation`.
    #[must_use]
    pub fn transport(operation: &'static str, source: StoreError) -> Self {
        Self::TransportFailure { operation, source }
    }
}

/// Convenience result type for coordinator operations.
pub type UploadResult<T> = Result<T, UploadError>;
