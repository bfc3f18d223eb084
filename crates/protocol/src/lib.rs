//! Wire types for the StreamVOD multipart upload session protocol.
//!
//! The backend issues an upload session, hands out one presigned URL per
//! part and assembles the object once the client reports every part's ETag.
//! This crate only describes the JSON bodies and endpoint paths; it has no
//! transport dependencies.

pub mod constants;
pub mod messages;

pub use constants::endpoints;
pub use messages::{
    CompleteUploadRequest, CompleteUploadResponse, CompletedPart, ErrorBody,
    InitiateUploadResponse, PartUrl, PartUrlsRequest, PartUrlsResponse,
};
