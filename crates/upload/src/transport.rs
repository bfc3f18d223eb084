//! Part transfer: moves one part's bytes to its presigned URL.

use streamvod_protocol::constants::ETAG_HEADER;
use streamvod_transfer::{PartSource, etag_matches};
use tracing::{debug, warn};

use crate::client::BoxFuture;
use crate::error::UploadError;
use crate::types::{PartResult, PartSpec};

/// Abstract storage endpoint parts are written to.
pub trait PartTransport: Send + Sync {
    /// Uploads `body` to the part's URL and returns the raw `ETag` header.
    fn put_part<'a>(&'a self, spec: &'a PartSpec, body: Vec<u8>) -> BoxFuture<'a, String>;
}

/// `PartTransport` that issues `PUT` requests against presigned URLs.
///
/// The request carries the raw bytes and nothing else: the URL was signed
/// without a content type, so adding one would break the signature.
#[derive(Clone, Default)]
pub struct HttpPartTransport {
    http: reqwest::Client,
}

impl HttpPartTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl PartTransport for HttpPartTransport {
    fn put_part<'a>(&'a self, spec: &'a PartSpec, body: Vec<u8>) -> BoxFuture<'a, String> {
        Box::pin(async move {
            let part_number = spec.part_number();
            let response = self
                .http
                .put(&spec.url)
                .body(body)
                .send()
                .await
                .map_err(|e| UploadError::part(part_number, format!("request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let snippet: String = body.chars().take(200).collect();
                return Err(UploadError::part(
                    part_number,
                    format!("storage returned {status}: {}", snippet.trim()),
                ));
            }

            response
                .headers()
                .get(ETAG_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| UploadError::part(part_number, "response carried no ETag"))
        })
    }
}

/// Reads a part from `source`, uploads it and returns its completion token.
///
/// With `verify_etag`, a plain-MD5 ETag must match the bytes that were sent.
/// Opaque ETags (multipart or encrypted objects) are accepted as-is.
pub async fn transfer_part(
    source: &dyn PartSource,
    transport: &dyn PartTransport,
    spec: &PartSpec,
    verify_etag: bool,
) -> Result<PartResult, UploadError> {
    let part_number = spec.part_number();
    let data = source
        .read_part(spec.range)
        .await
        .map_err(|e| UploadError::part(part_number, format!("read failed: {e}")))?;

    // Keep a copy for the digest check only when it is needed.
    let sent = verify_etag.then(|| data.clone());
    let len = data.len();

    let etag = transport.put_part(spec, data).await?;

    if let Some(sent) = sent {
        match etag_matches(&etag, &sent) {
            Some(false) => {
                warn!(part = part_number, etag = %etag, "ETag does not match part digest");
                return Err(UploadError::part(
                    part_number,
                    format!("ETag {etag} does not match the MD5 of the uploaded bytes"),
                ));
            }
            Some(true) => {}
            None => debug!(part = part_number, etag = %etag, "opaque ETag, digest not checked"),
        }
    }

    debug!(part = part_number, bytes = len, "part stored");
    Ok(PartResult {
        part_number,
        completion_token: etag,
    })
}
