//! Upload session state machine.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use crate::error::UploadError;
use crate::types::{PartResult, SessionHandle, UploadState};

/// Tracks one multipart upload session (thread-safe).
///
/// Only the orchestrator drives state transitions; completed part
/// transfers add results while the session is `Uploading`. Once the session
/// reaches a terminal state every mutation is rejected.
pub struct UploadSession {
    handle: SessionHandle,
    total_size: u64,
    part_size: u64,
    num_parts: u32,
    inner: RwLock<SessionInner>,
}

struct SessionInner {
    state: UploadState,
    results: BTreeMap<u32, PartResult>,
    error: String,
    started_at: Instant,
    updated_at: Instant,
}

impl UploadSession {
    /// Creates a session in the `Initiated` state.
    pub fn new(handle: SessionHandle, total_size: u64, part_size: u64, num_parts: u32) -> Self {
        let now = Instant::now();
        Self {
            handle,
            total_size,
            part_size,
            num_parts,
            inner: RwLock::new(SessionInner {
                state: UploadState::Initiated,
                results: BTreeMap::new(),
                error: String::new(),
                started_at: now,
                updated_at: now,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves the session forward along the success path.
    ///
    /// Allowed: `Initiated -> PartsAuthorized -> Uploading -> AllPartsComplete
    /// -> Finalized`. `AllPartsComplete` additionally requires a result for
    /// every part.
    pub fn advance(&self, to: UploadState) -> Result<(), UploadError> {
        let mut s = self.write();
        let from = s.state;
        let allowed = matches!(
            (from, to),
            (UploadState::Initiated, UploadState::PartsAuthorized)
                | (UploadState::PartsAuthorized, UploadState::Uploading)
                | (UploadState::Uploading, UploadState::AllPartsComplete)
                | (UploadState::AllPartsComplete, UploadState::Finalized)
        );
        if !allowed {
            return Err(UploadError::InvalidTransition { from, to });
        }
        if to == UploadState::AllPartsComplete && s.results.len() != self.num_parts as usize {
            return Err(UploadError::Manifest(format!(
                "{} of {} parts stored",
                s.results.len(),
                self.num_parts
            )));
        }
        s.state = to;
        s.updated_at = Instant::now();
        Ok(())
    }

    /// Records a stored part. Only valid while `Uploading`.
    pub fn record_part(&self, result: PartResult) -> Result<(), UploadError> {
        let mut s = self.write();
        if s.state != UploadState::Uploading {
            return Err(UploadError::InvalidTransition {
                from: s.state,
                to: UploadState::Uploading,
            });
        }
        if result.part_number == 0 || result.part_number > self.num_parts {
            return Err(UploadError::Manifest(format!(
                "part {} outside 1..={}",
                result.part_number, self.num_parts
            )));
        }
        if s.results.contains_key(&result.part_number) {
            return Err(UploadError::Manifest(format!(
                "duplicate result for part {}",
                result.part_number
            )));
        }
        s.results.insert(result.part_number, result);
        s.updated_at = Instant::now();
        Ok(())
    }

    /// Marks the session as failed. No-op once terminal.
    pub fn fail(&self, err: &str) {
        let mut s = self.write();
        if s.state.is_terminal() {
            return;
        }
        s.state = UploadState::Failed;
        s.error = err.to_string();
        s.updated_at = Instant::now();
    }

    /// Marks the session as aborted. No-op once terminal.
    pub fn abort(&self) {
        let mut s = self.write();
        if s.state.is_terminal() {
            return;
        }
        s.state = UploadState::Aborted;
        s.updated_at = Instant::now();
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Storage-side upload id.
    pub fn id(&self) -> &str {
        &self.handle.upload_id
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn part_size(&self) -> u64 {
        self.part_size
    }

    pub fn num_parts(&self) -> u32 {
        self.num_parts
    }

    pub fn state(&self) -> UploadState {
        self.read().state
    }

    /// Number of parts recorded so far.
    pub fn completed_parts(&self) -> u32 {
        self.read().results.len() as u32
    }

    /// Recorded results in part order.
    pub fn results(&self) -> Vec<PartResult> {
        self.read().results.values().cloned().collect()
    }

    /// Error message recorded by [`fail`](Self::fail), empty otherwise.
    pub fn error(&self) -> String {
        self.read().error.clone()
    }

    /// Time since the session was opened, as of the last update.
    pub fn elapsed(&self) -> std::time::Duration {
        let s = self.read();
        s.updated_at.duration_since(s.started_at)
    }
}
