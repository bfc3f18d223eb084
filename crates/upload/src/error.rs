//! Upload error types.

use std::fmt;

use crate::types::UploadState;

/// Backend step a session error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    Initiate,
    Authorize,
    Finalize,
}

impl fmt::Display for SessionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initiate => "initiate",
            Self::Authorize => "authorize parts",
            Self::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// Errors produced during a multipart upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("validation error: {0}")]
    Validation(String),

    /// The backend refused or failed a session step. `status` is `None`
    /// when no HTTP response was received.
    #[error("{step} failed: {message}")]
    Session {
        step: SessionStep,
        status: Option<u16>,
        message: String,
    },

    #[error("part {part_number} transfer failed: {reason}")]
    PartTransfer { part_number: u32, reason: String },

    #[error("manifest rejected: {0}")]
    Manifest(String),

    #[error("cancelled")]
    Cancelled,

    #[error("transfer task aborted: {0}")]
    TaskAborted(String),

    #[error("invalid session transition: {from:?} -> {to:?}")]
    InvalidTransition { from: UploadState, to: UploadState },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub(crate) fn session(step: SessionStep, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Session {
            step,
            status,
            message: message.into(),
        }
    }

    pub(crate) fn part(part_number: u32, reason: impl Into<String>) -> Self {
        Self::PartTransfer {
            part_number,
            reason: reason.into(),
        }
    }
}

impl From<streamvod_transfer::TransferError> for UploadError {
    fn from(err: streamvod_transfer::TransferError) -> Self {
        match err {
            streamvod_transfer::TransferError::Io(e) => Self::Io(e),
            other => Self::Validation(other.to_string()),
        }
    }
}
