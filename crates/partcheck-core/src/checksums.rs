//! Checksum helpers for part ETags.
//!
//! S3-compatible services return the quoted hex MD5 of a part body as its
//! ETag, and a composite `"<md5-of-md5s>-<N>"` ETag for the assembled object.
//! These helpers compute both, plus the base64 `Content-MD5` header value sent
//! alongside uploads.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use digest::Digest;

/// Compute the hex-encoded MD5 digest of `data`.
///
/// # Examples
///
/// ```
/// use partcheck_core::checksums::compute_md5;
///
/// let digest = compute_md5(b"hello");
/// assert_eq!(digest, "5d41402abc4b2a76b9719d911017c592");
/// ```
#[must_use]
pub fn compute_md5(data: &[u8]) -> String {
    let hash = md5::Md5::digest(data);
    hex::encode(hash)
}

/// Compute the quoted hex MD5 of `data`, formatted as an ETag.
///
/// # Examples
///
/// ```
/// use partcheck_core::checksums::compute_etag;
///
/// let etag = compute_etag(b"");
/// assert_eq!(etag, "\"d41d8cd98f00b204e9800998ecf8427e\"");
/// ```
#[must_use]
pub fn compute_etag(data: &[u8]) -> String {
    let md5_hex = compute_md5(data);
    format!("\"{md5_hex}\"")
}

/// Compute the base64-encoded binary MD5 of `data`, the value of a
/// `Content-MD5` request header.
#[must_use]
pub fn compute_content_md5(data: &[u8]) -> String {
    BASE64_STANDARD.encode(md5::Md5::digest(data))
}

/// Return the hex digest inside an MD5 ETag, or `None` if `etag` is not one.
///
/// Multipart ETags (with a `-N` suffix) and ETags produced by encrypted
/// uploads are not plain MD5 digests and yield `None`.
///
/// # Examples
///
/// ```
/// use partcheck_core::checksums::md5_hex_from_etag;
///
/// assert_eq!(
///     md5_hex_from_etag("\"5d41402abc4b2a76b9719d911017c592\""),
///     Some("5d41402abc4b2a76b9719d911017c592"),
/// );
/// assert_eq!(md5_hex_from_etag("\"abc-2\""), None);
/// ```
#[must_use]
pub fn md5_hex_from_etag(etag: &str) -> Option<&str> {
    let hex_str = etag.trim_matches('"');
    (hex_str.len() == 32 && hex_str.chars().all(|c| c.is_ascii_hexdigit())).then_some(hex_str)
}

/// Compute the composite ETag of a multipart object.
///
/// The composite ETag is the MD5 of the concatenated binary MD5 digests of
/// each part, formatted as `"<hex>-<part_count>"`. Entries may be quoted or
/// unquoted, but each must be a 32-character MD5 hex digest (see
/// [`md5_hex_from_etag`]). Debug builds assert this; release builds skip
/// entries that do not decode.
///
/// # Examples
///
/// ```
/// use partcheck_core::checksums::compute_multipart_etag;
///
/// let etag = compute_multipart_etag(&["5d41402abc4b2a76b9719d911017c592"]);
/// assert!(etag.ends_with("-1\""));
/// ```
#[must_use]
pub fn compute_multipart_etag(part_md5_hexes: &[impl AsRef<str>]) -> String {
    let mut combined = Vec::with_capacity(part_md5_hexes.len() * 16);
    for hex_str in part_md5_hexes {
        let hex_str = hex_str.as_ref();
        debug_assert!(
            md5_hex_from_etag(hex_str).is_some(),
            "not an MD5 hex digest: {hex_str}"
        );
        if let Ok(bytes) = hex::decode(hex_str.trim_matches('"')) {
            combined.extend_from_slice(&bytes);
        }
    }
    let final_md5 = hex::encode(md5::Md5::digest(&combined));
    format!("\"{final_md5}-{}\"", part_md5_hexes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_compute_md5_hello() {
        assert_eq!(compute_md5(b"hello"), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn test_should_compute_etag_with_quotes() {
        let etag = compute_etag(b"hello");
        assert_eq!(etag, "\"5d41402abc4b2a76b9719d911017c592\"");
    }

    #[test]
    fn test_should_compute_content_md5() {
        assert_eq!(compute_content_md5(b"hello"), "XUFAKrxLKna5cZ2REBfFkg==");
    }

    #[test]
    fn test_should_reject_non_md5_etags() {
        assert!(md5_hex_from_etag("\"d41d8cd98f00b204e9800998ecf8427e-4\"").is_none());
        assert!(md5_hex_from_etag("\"not-hex\"").is_none());
        assert!(md5_hex_from_etag("").is_none());
    }

    #[test]
    fn test_should_compute_multipart_etag_independent_of_quoting() {
        let quoted = [compute_etag(b"a"), compute_etag(b"b")];
        let unquoted = [compute_md5(b"a"), compute_md5(b"b")];
        let etag = compute_multipart_etag(&quoted);
        assert_eq!(etag, compute_multipart_etag(&unquoted));
        assert!(etag.ends_with("-2\""), "unexpected etag {etag}");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not an MD5 hex digest")]
    fn test_should_assert_md5_entries_in_debug_builds() {
        let _ = compute_multipart_etag(&["\"d41d8cd98f00b204e9800998ecf8427e-4\""]);
    }

    #[test]
    fn test_should_depend_on_part_order() {
        let forward = compute_multipart_etag(&[compute_md5(b"a"), compute_md5(b"b")]);
        let reverse = compute_multipart_etag(&[compute_md5(b"b"), compute_md5(b"a")]);
        assert_ne!(forward, reverse);
    }
}
