//! Part body producers.
//!
//! A [`PartSource`] yields the bytes of one part on demand. Sources never
//! materialize the whole object: each call reads or generates only the range
//! belonging to the requested part, so parts can be produced in any order and
//! produced again later to verify a download.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};

use crate::error::{UploadError, UploadResult};

/// Produces the body of a part by part number.
///
/// Implementations must be deterministic: producing the same part twice with
/// the same size yields identical bytes.
pub trait PartSource: Send + Sync {
    /// Return the bytes of part `part_number` (1-based) for parts of
    /// `part_size` bytes.
    fn produce(&self, part_number: u32, part_size: u64) -> UploadResult<Bytes>;
}

/// Generates each part as its decimal part number repeated, plus a newline.
///
/// ```text
/// part 1: 1111...1111\n
/// part 2: 2222...2222\n
/// ```
///
/// The repeated run is exactly `part_size` bytes long, so each body is
/// `part_size + 1` bytes.
///
/// # Examples
///
/// ```
/// use partcheck_core::{DigitPattern, PartSource};
///
/// let body = DigitPattern.produce(3, 4).unwrap();
/// assert_eq!(body.as_ref(), b"3333\n");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitPattern;

impl PartSource for DigitPattern {
    fn produce(&self, part_number: u32, part_size: u64) -> UploadResult<Bytes> {
        check_part_number(part_number)?;
        let too_large = || {
            unavailable(
                part_number,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("part size {part_size} does not fit in memory"),
                ),
            )
        };
        let len = usize::try_from(part_size).map_err(|_| too_large())?;
        let capacity = len.checked_add(1).ok_or_else(too_large)?;

        let pattern = part_number.to_string();
        let mut body = BytesMut::with_capacity(capacity);
        body.extend(pattern.bytes().cycle().take(len));
        body.extend_from_slice(b"\n");
        Ok(body.freeze())
    }
}

/// Reads part ranges from a local file.
///
/// Part `n` covers bytes `[(n - 1) * part_size, n * part_size)`; the last part
/// may be shorter. Each call opens the file, seeks to the range and reads at
/// most `part_size` bytes.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of `part_size` parts needed to cover the whole file.
    pub fn part_count(&self, part_size: u64) -> UploadResult<u32> {
        if part_size == 0 {
            return Err(UploadError::InvalidConfig(
                "part_size must be greater than zero".to_owned(),
            ));
        }
        let len = std::fs::metadata(&self.path)
            .map_err(|e| {
                UploadError::InvalidConfig(format!("cannot stat {}: {e}", self.path.display()))
            })?
            .len();
        u32::try_from(len.div_ceil(part_size)).map_err(|_| {
            UploadError::InvalidConfig(format!(
                "{} needs too many parts of {part_size} bytes",
                self.path.display()
            ))
        })
    }
}

impl PartSource for FileSource {
    fn produce(&self, part_number: u32, part_size: u64) -> UploadResult<Bytes> {
        check_part_number(part_number)?;
        let offset = range_start(part_number, part_size)?;

        let mut file = File::open(&self.path).map_err(|e| unavailable(part_number, e))?;
        let len = file
            .metadata()
            .map_err(|e| unavailable(part_number, e))?
            .len();
        if offset >= len {
            return Err(past_end(part_number, offset, len));
        }

        file.seek(SeekFrom::Start(offset))
            .map_err(|e| unavailable(part_number, e))?;
        let capacity = usize::try_from(part_size.min(len - offset)).unwrap_or_default();
        let mut buf = Vec::with_capacity(capacity);
        file.take(part_size)
            .read_to_end(&mut buf)
            .map_err(|e| unavailable(part_number, e))?;

        Ok(Bytes::from(buf))
    }
}

/// Slices part ranges out of an in-memory buffer without copying.
#[derive(Debug, Clone)]
pub struct BytesSource {
    data: Bytes,
}

impl BytesSource {
    /// Create a source over `data`.
    #[must_use]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

impl PartSource for BytesSource {
    fn produce(&self, part_number: u32, part_size: u64) -> UploadResult<Bytes> {
        check_part_number(part_number)?;
        let offset = range_start(part_number, part_size)?;
        let len = self.data.len() as u64;
        if offset >= len {
            return Err(past_end(part_number, offset, len));
        }

        let end = offset.saturating_add(part_size).min(len);
        // Both bounds are at most `self.data.len()`.
        #[allow(clippy::cast_possible_truncation)]
        Ok(self.data.slice(offset as usize..end as usize))
    }
}

fn check_part_number(part_number: u32) -> UploadResult<()> {
    if part_number == 0 {
        return Err(unavailable(
            0,
            io::Error::new(io::ErrorKind::InvalidInput, "part numbers start at 1"),
        ));
    }
    Ok(())
}

fn range_start(part_number: u32, part_size: u64) -> UploadResult<u64> {
    (u64::from(part_number) - 1)
        .checked_mul(part_size)
        .ok_or_else(|| {
            unavailable(
                part_number,
                io::Error::new(io::ErrorKind::InvalidInput, "part offset overflows"),
            )
        })
}

fn past_end(part_number: u32, offset: u64, len: u64) -> UploadError {
    unavailable(
        part_number,
        io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("part starts at byte {offset}, source is {len} bytes"),
        ),
    )
}

fn unavailable(part_number: u32, source: io::Error) -> UploadError {
    UploadError::SourceUnavailable {
        part_number,
        source,
    }
}
