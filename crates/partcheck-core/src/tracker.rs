//! Per-part upload state.
//!
//! [`PartTracker`] holds one [`PartRecord`] per declared part, indexed by part
//! number. Records are never ordered by arrival: a snapshot is always
//! ascending by part number, whatever order the uploads finished in.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{UploadError, UploadResult};

/// Upload status of a single part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartStatus {
    /// Not uploaded yet.
    Pending,
    /// Uploaded at least once; the record holds the latest upload.
    Uploaded,
}

/// State of one part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartRecord {
    /// The part number (1-based).
    pub part_number: u32,
    /// ETag returned by the store for the latest upload. Empty while pending.
    pub checksum: String,
    /// Size of the latest upload in bytes.
    pub size: u64,
    /// Whether the part has been uploaded.
    pub status: PartStatus,
    /// When the latest upload was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl PartRecord {
    fn pending(part_number: u32) -> Self {
        Self {
            part_number,
            checksum: String::new(),
            size: 0,
            status: PartStatus::Pending,
            uploaded_at: None,
        }
    }

    /// Whether this part has been uploaded.
    #[must_use]
    pub fn is_uploaded(&self) -> bool {
        self.status == PartStatus::Uploaded
    }
}

/// Tracks the upload state of every declared part of one session.
///
/// Writes take the lock only long enough to replace one record. Readers see
/// either the state before or after a write, never a partially updated
/// record.
///
/// # Examples
///
/// ```
/// use partcheck_core::PartTracker;
///
/// let tracker = PartTracker::new(2);
/// tracker.record_upload(2, "\"b\"", 10).unwrap();
/// tracker.record_upload(1, "\"a\"", 10).unwrap();
///
/// assert!(tracker.all_uploaded());
/// let numbers: Vec<u32> = tracker.snapshot().iter().map(|r| r.part_number).collect();
/// assert_eq!(numbers, [1, 2]);
/// ```
#[derive(Debug)]
pub struct PartTracker {
    total_parts: u32,
    /// Index `i` holds part `i + 1`.
    records: RwLock<Vec<PartRecord>>,
}

impl PartTracker {
    /// Create a tracker with `total_parts` pending records.
    #[must_use]
    pub fn new(total_parts: u32) -> Self {
        Self {
            total_parts,
            records: RwLock::new((1..=total_parts).map(PartRecord::pending).collect()),
        }
    }

    /// The declared number of parts.
    #[must_use]
    pub fn total_parts(&self) -> u32 {
        self.total_parts
    }

    /// Check that `part_number` lies in `[1, total_parts]`.
    pub fn check_part_number(&self, part_number: u32) -> UploadResult<()> {
        if part_number == 0 || part_number > self.total_parts {
            return Err(UploadError::InvalidPartNumber {
                part_number,
                total_parts: self.total_parts,
            });
        }
        Ok(())
    }

    /// Record a successful upload of `part_number`, replacing any earlier
    /// upload of the same part.
    pub fn record_upload(
        &self,
        part_number: u32,
        checksum: impl Into<String>,
        size: u64,
    ) -> UploadResult<()> {
        self.check_part_number(part_number)?;
        let record = PartRecord {
            part_number,
            checksum: checksum.into(),
            size,
            status: PartStatus::Uploaded,
            uploaded_at: Some(Utc::now()),
        };

        let mut records = self.records.write();
        let slot = &mut records[(part_number - 1) as usize];
        if slot.is_uploaded() {
            debug!(
                part_number,
                previous = %slot.checksum,
                replacement = %record.checksum,
                "replacing previously uploaded part"
            );
        }
        *slot = record;
        Ok(())
    }

    /// Whether every declared part has been uploaded.
    #[must_use]
    pub fn all_uploaded(&self) -> bool {
        self.records.read().iter().all(PartRecord::is_uploaded)
    }

    /// Number of parts uploaded so far.
    #[must_use]
    pub fn uploaded_count(&self) -> usize {
        self.records
            .read()
            .iter()
            .filter(|r| r.is_uploaded())
            .count()
    }

    /// Pending part numbers, ascending.
    #[must_use]
    pub fn missing(&self) -> Vec<u32> {
        missing_parts(&self.records.read())
    }

    /// A consistent copy of all records, ascending by part number.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PartRecord> {
        self.records.read().clone()
    }
}

/// Pending part numbers in `records`, ascending.
pub(crate) fn missing_parts(records: &[PartRecord]) -> Vec<u32> {
    records
        .iter()
        .filter(|r| !r.is_uploaded())
        .map(|r| r.part_number)
        .collect()
}
