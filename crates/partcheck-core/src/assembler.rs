//! Completion manifest assembly.
//!
//! [`assemble`] turns a fully uploaded [`PartTracker`] into the ordered
//! [`Manifest`] sent with the finalize call. It reads one snapshot and has no
//! side effects, so a failed assembly leaves the tracker untouched.

use serde::{Deserialize, Serialize};

use crate::checksums;
use crate::error::{UploadError, UploadResult};
use crate::tracker::{PartTracker, missing_parts};

/// One entry of a completion manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPart {
    /// The part number (1-based).
    pub part_number: u32,
    /// The ETag the store returned for this part.
    pub etag: String,
    /// Size of the part in bytes.
    pub size: u64,
}

/// The ordered part list that finalizes a multipart upload.
///
/// Parts are ascending by part number with no gaps or duplicates. Only
/// [`assemble`] builds one, so it is serialize-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    parts: Vec<CompletedPart>,
}

impl Manifest {
    /// The manifest entries, ascending by part number.
    #[must_use]
    pub fn parts(&self) -> &[CompletedPart] {
        &self.parts
    }

    /// Number of parts in the manifest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the manifest has no parts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The part numbers in manifest order.
    #[must_use]
    pub fn part_numbers(&self) -> Vec<u32> {
        self.parts.iter().map(|p| p.part_number).collect()
    }

    /// Sum of all part sizes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.parts.iter().map(|p| p.size).sum()
    }

    /// The composite ETag an S3-compatible store should assign to the
    /// assembled object, if every part ETag is a plain MD5 digest.
    #[must_use]
    pub fn expected_etag(&self) -> Option<String> {
        let hexes = self
            .parts
            .iter()
            .map(|p| checksums::md5_hex_from_etag(&p.etag))
            .collect::<Option<Vec<_>>>()?;
        Some(checksums::compute_multipart_etag(&hexes))
    }
}

/// Build the completion manifest from `tracker`.
///
/// # Errors
///
/// Returns [`UploadError::IncompleteUpload`] listing every pending part if
/// any declared part has not been uploaded.
pub fn assemble(tracker: &PartTracker) -> UploadResult<Manifest> {
    let records = tracker.snapshot();
    let missing = missing_parts(&records);
    if !missing.is_empty() {
        return Err(UploadError::IncompleteUpload { missing });
    }

    let parts = records
        .into_iter()
        .map(|r| CompletedPart {
            part_number: r.part_number,
            etag: r.checksum,
            size: r.size,
        })
        .collect();
    Ok(Manifest { parts })
}
