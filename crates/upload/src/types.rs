//! Data types for the upload flow.

use streamvod_protocol::messages::CompletedPart;
use streamvod_transfer::{DEFAULT_PART_SIZE, PartRange};

use crate::error::UploadError;

/// Lifecycle state of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Initiated,
    PartsAuthorized,
    Uploading,
    AllPartsComplete,
    Finalized,
    Failed,
    Aborted,
}

impl UploadState {
    /// Returns `true` for states that accept no further mutation.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized | Self::Failed | Self::Aborted)
    }
}

/// Identifies an upload session opened by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    /// Catalog entry the upload belongs to.
    pub video_id: String,
    /// Storage-side multipart upload id.
    pub upload_id: String,
    /// Object key the parts are assembled into.
    pub object_key: String,
}

/// Presigned URL for one part, as issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartAuthorization {
    pub part_number: u32,
    pub url: String,
}

/// A planned part bound to its authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartSpec {
    pub range: PartRange,
    pub url: String,
}

impl PartSpec {
    pub fn part_number(&self) -> u32 {
        self.range.part_number
    }
}

/// A part storage confirmed, with its completion token (ETag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartResult {
    pub part_number: u32,
    pub completion_token: String,
}

/// Part results ordered ascending by part number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    parts: Vec<PartResult>,
}

impl Manifest {
    /// Orders `results` by part number without checking completeness.
    pub fn sorted(mut results: Vec<PartResult>) -> Self {
        results.sort_by_key(|r| r.part_number);
        Self { parts: results }
    }

    /// Orders `results` and checks they cover exactly `1..=num_parts`.
    pub fn assemble(results: Vec<PartResult>, num_parts: u32) -> Result<Self, UploadError> {
        let manifest = Self::sorted(results);

        for (expected, part) in (1..=num_parts).zip(&manifest.parts) {
            if part.part_number < expected {
                return Err(UploadError::Manifest(format!(
                    "duplicate result for part {}",
                    part.part_number
                )));
            }
            if part.part_number > expected {
                return Err(UploadError::Manifest(format!("missing part {expected}")));
            }
        }

        let len = manifest.parts.len() as u64;
        if len < u64::from(num_parts) {
            return Err(UploadError::Manifest(format!("missing part {}", len + 1)));
        }
        if len > u64::from(num_parts) {
            return Err(UploadError::Manifest(format!(
                "{len} results for {num_parts} parts"
            )));
        }
        Ok(manifest)
    }

    pub fn parts(&self) -> &[PartResult] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Wire form of the manifest, in part order.
    pub fn to_completed_parts(&self) -> Vec<CompletedPart> {
        self.parts
            .iter()
            .map(|p| CompletedPart {
                part_number: p.part_number,
                etag: p.completion_token.clone(),
            })
            .collect()
    }
}

/// The assembled object, as reported by finalize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedObject {
    pub video_id: String,
    pub object_key: String,
    /// Backend processing status, e.g. `processing` while transcoding.
    pub status: String,
    pub message: String,
}

/// Progress after each stored part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub completed_parts: u32,
    pub total_parts: u32,
    pub bytes_uploaded: u64,
    pub total_bytes: u64,
}

/// Tunables supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Bytes per part (the last part may be shorter).
    pub part_size: u64,
    /// Upper bound on simultaneously in-flight part transfers.
    pub max_concurrency: usize,
    /// Compare plain-MD5 ETags against the bytes sent.
    pub verify_etag: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            max_concurrency: 5,
            verify_etag: false,
        }
    }
}

impl UploadOptions {
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.part_size == 0 {
            return Err(UploadError::Validation(
                "part size must be greater than zero".into(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(UploadError::Validation(
                "max concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
