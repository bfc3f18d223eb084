use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Requests presigned URLs for every part of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartUrlsRequest {
    pub video_id: String,
    pub upload_id: String,
    pub num_parts: u32,
}

/// One stored part, as reported back to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPart {
    pub part_number: u32,
    pub etag: String,
}

/// Finalizes a session. `parts` must be sorted ascending by part number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteUploadRequest {
    pub video_id: String,
    pub upload_id: String,
    pub parts: Vec<CompletedPart>,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Returned when a session is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiateUploadResponse {
    pub video_id: String,
    pub upload_id: String,
    /// Object key the parts are assembled into.
    pub key: String,
}

/// A presigned URL authorizing the upload of one part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartUrl {
    pub part_number: u32,
    pub url: String,
}

/// Presigned URLs, one per requested part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartUrlsResponse {
    pub parts: Vec<PartUrl>,
}

/// Returned once the object has been assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteUploadResponse {
    pub video_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// Error body returned with non-success statuses.
///
/// `detail` is a plain string for application errors and a list of
/// objects for request validation failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// Flattens `detail` into a single human-readable line.
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| match item.get("msg").and_then(|m| m.as_str()) {
                    Some(msg) => msg.to_string(),
                    None => item.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}
