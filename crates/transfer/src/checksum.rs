use md5::{Digest, Md5};

/// Computes MD5 of `data` and returns the lowercase hex digest.
pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Strips the quoting and weak-validator prefix storage puts around ETags.
pub fn normalize_etag(etag: &str) -> &str {
    let etag = etag.trim();
    let etag = etag.strip_prefix("W/").unwrap_or(etag);
    etag.trim_matches('"')
}

/// Checks an ETag against the bytes that were sent.
///
/// Returns `None` when the ETag is not a plain MD5 digest (server-side
/// encryption and composite uploads produce opaque tags), otherwise whether
/// the digest matches.
pub fn etag_matches(etag: &str, data: &[u8]) -> Option<bool> {
    let tag = normalize_etag(etag);
    let plain_md5 = tag.len() == 32 && tag.bytes().all(|b| b.is_ascii_hexdigit());
    if !plain_md5 {
        return None;
    }
    Some(tag.eq_ignore_ascii_case(&md5_hex(data)))
}
