//! Protocol constants shared by client and fixtures.

/// Backend endpoint paths, relative to the API base URL.
pub mod endpoints {
    /// Opens a multipart upload session.
    pub const MULTIPART_INITIATE: &str = "/videos/multipart/initiate";
    /// Issues presigned part URLs for a session.
    pub const MULTIPART_GET_URLS: &str = "/videos/multipart/get-urls";
    /// Assembles the uploaded parts into the final object.
    pub const MULTIPART_COMPLETE: &str = "/videos/multipart/complete";
}

/// Response header carrying a stored part's completion token.
pub const ETAG_HEADER: &str = "etag";

/// Largest part number object storage accepts in one upload.
pub const MAX_PARTS: u32 = 10_000;
