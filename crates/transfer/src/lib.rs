//! Part planning, part byte sources and checksums for multipart uploads.
//!
//! Nothing in this crate knows about upload sessions: it splits a byte
//! length into parts, reads a part's bytes back from a source and helps
//! verify what storage acknowledged.

mod checksum;
mod plan;
mod progress;
mod source;

pub use checksum::{etag_matches, md5_hex, normalize_etag};
pub use plan::{PartRange, part_count, plan_parts};
pub use progress::SpeedCalculator;
pub use source::{FileSource, MemorySource, PartSource, ReadFuture};

/// Default part size: 10 MiB.
pub const DEFAULT_PART_SIZE: u64 = 10 * 1024 * 1024;

/// Smallest part size storage accepts for any part but the last: 5 MiB.
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Largest single part storage accepts: 5 GiB.
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("part {part_number} ends at byte {end} but the source holds {size} bytes")]
    OutOfRange {
        part_number: u32,
        end: u64,
        size: u64,
    },
}
