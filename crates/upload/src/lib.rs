//! Multipart upload orchestration for large media files.
//!
//! The bytes go straight from the client to object storage through
//! presigned part URLs; the application backend only opens the session,
//! signs the parts and assembles the object. Callers talk to
//! [`UploadOrchestrator`]; the session backend and the storage transport are
//! trait seams so the flow can be driven against mocks.
//!
//! # Pipeline
//!
//! 1. **Plan**: split the source into fixed-size parts
//! 2. **Initiate**: open an upload session with the backend
//! 3. **Authorize**: obtain one presigned URL per part
//! 4. **Transfer**: `PUT` parts with bounded concurrency, collecting ETags
//! 5. **Finalize**: submit the part-ordered manifest

pub mod client;
pub mod error;
pub mod media;
pub mod orchestrator;
pub mod scheduler;
pub mod session;
pub mod transport;
pub mod types;

// Re-export primary types for convenience.
pub use client::{HttpSessionClient, SessionClient};
pub use error::{SessionStep, UploadError};
pub use media::{
    MAX_FILE_SIZE, SUPPORTED_EXTENSIONS, format_name, supported_formats, validate_media_file,
};
pub use orchestrator::{ProgressCallback, UploadOrchestrator};
pub use scheduler::{Scheduler, SchedulerError, SchedulerProgress};
pub use session::UploadSession;
pub use transport::{HttpPartTransport, PartTransport, transfer_part};
pub use types::{
    FinalizedObject, Manifest, PartAuthorization, PartResult, PartSpec, SessionHandle,
    UploadOptions, UploadProgress, UploadState,
};
