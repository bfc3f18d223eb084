//! Upload orchestrator: drives one file through the multipart pipeline.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use streamvod_transfer::{FileSource, PartRange, PartSource, plan_parts};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{BoxFuture, SessionClient};
use crate::error::{SessionStep, UploadError};
use crate::scheduler::{Scheduler, SchedulerError, SchedulerProgress};
use crate::session::UploadSession;
use crate::transport::{PartTransport, transfer_part};
use crate::types::{
    FinalizedObject, Manifest, PartAuthorization, PartResult, PartSpec, UploadOptions,
    UploadProgress, UploadState,
};

/// Callback invoked after each stored part.
pub type ProgressCallback = Box<dyn Fn(UploadProgress) + Send + Sync>;

/// Uploads media through a session backend and a storage transport.
///
/// One orchestrator may run several uploads one after the other; the most
/// recent session stays inspectable through [`session`](Self::session).
/// Cancellation is final: once the token fires, every later upload on this
/// orchestrator fails with [`UploadError::Cancelled`] before opening a
/// session. Build a new orchestrator to upload again.
pub struct UploadOrchestrator {
    client: Arc<dyn SessionClient>,
    transport: Arc<dyn PartTransport>,
    options: UploadOptions,
    cancel: CancellationToken,
    callbacks: Vec<ProgressCallback>,
    session: RwLock<Option<Arc<UploadSession>>>,
}

impl UploadOrchestrator {
    pub fn new(
        client: Arc<dyn SessionClient>,
        transport: Arc<dyn PartTransport>,
        options: UploadOptions,
    ) -> Self {
        Self {
            client,
            transport,
            options,
            cancel: CancellationToken::new(),
            callbacks: Vec::new(),
            session: RwLock::new(None),
        }
    }

    /// Replaces the cancellation token, e.g. with a child of an app-wide one.
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Registers a progress callback.
    pub fn on_progress<F>(&mut self, callback: F)
    where
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Token that cancels the running upload and all later ones.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    /// Session of the current or last upload, if one was opened.
    pub fn session(&self) -> Option<Arc<UploadSession>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Uploads the file at `path`, reading parts from disk as they are sent.
    pub async fn upload_file(&self, path: &Path) -> Result<FinalizedObject, UploadError> {
        let source = FileSource::open(path).await?;
        if source.size() == 0 {
            return Err(UploadError::Validation(format!(
                "file is empty: {}",
                path.display()
            )));
        }
        debug!(path = %path.display(), bytes = source.size(), "source opened");
        self.upload(Arc::new(source)).await
    }

    /// Uploads `source` and returns the finalized object.
    ///
    /// Planning happens before the session is opened, so invalid input
    /// never reaches the backend. Once a session exists, any error leaves it
    /// `Failed`, or `Aborted` when caused by cancellation.
    pub async fn upload(&self, source: Arc<dyn PartSource>) -> Result<FinalizedObject, UploadError> {
        self.options.validate()?;
        self.check_cancelled()?;

        let total_bytes = source.size();
        let plan = plan_parts(total_bytes, self.options.part_size)?;
        let num_parts = plan.len() as u32;

        info!(
            total_bytes,
            part_size = self.options.part_size,
            parts = num_parts,
            concurrency = self.options.max_concurrency,
            "starting upload"
        );

        let handle = self.guarded(self.client.initiate()).await?;
        let session = Arc::new(UploadSession::new(
            handle,
            total_bytes,
            self.options.part_size,
            num_parts,
        ));
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&session));

        let result = self.run_session(&session, source, plan).await;
        match &result {
            Ok(object) => info!(
                video_id = %object.video_id,
                upload_id = %session.id(),
                elapsed_ms = session.elapsed().as_millis() as u64,
                "upload finalized"
            ),
            Err(UploadError::Cancelled) => {
                warn!(upload_id = %session.id(), "upload cancelled");
                session.abort();
            }
            Err(e) => {
                warn!(upload_id = %session.id(), error = %e, "upload failed");
                session.fail(&e.to_string());
            }
        }
        result
    }

    async fn run_session(
        &self,
        session: &UploadSession,
        source: Arc<dyn PartSource>,
        plan: Vec<PartRange>,
    ) -> Result<FinalizedObject, UploadError> {
        let num_parts = session.num_parts();
        let total_bytes = session.total_size();

        let authorizations = self
            .guarded(self.client.authorize_parts(session.handle(), num_parts))
            .await?;
        let part_sizes: Vec<u64> = plan.iter().map(PartRange::size).collect();
        let specs = bind_authorizations(plan, authorizations)?;
        session.advance(UploadState::PartsAuthorized)?;

        session.advance(UploadState::Uploading)?;
        let limit = NonZeroUsize::new(self.options.max_concurrency).ok_or_else(|| {
            UploadError::Validation("max concurrency must be at least 1".into())
        })?;
        let scheduler = Scheduler::new(limit, self.cancel.clone());
        let verify_etag = self.options.verify_etag;

        let work = |spec: PartSpec| {
            let source = Arc::clone(&source);
            let transport = Arc::clone(&self.transport);
            async move { transfer_part(source.as_ref(), transport.as_ref(), &spec, verify_etag).await }
        };

        let mut bytes_uploaded = 0u64;
        let on_complete = |result: &PartResult, progress: SchedulerProgress| {
            if let Err(e) = session.record_part(result.clone()) {
                warn!(part = result.part_number, error = %e, "part result not recorded");
            }
            let index = result.part_number as usize - 1;
            bytes_uploaded += part_sizes.get(index).copied().unwrap_or(0);
            self.emit(UploadProgress {
                completed_parts: progress.completed as u32,
                total_parts: progress.total as u32,
                bytes_uploaded,
                total_bytes,
            });
        };

        let results = scheduler
            .run(specs, work, on_complete)
            .await
            .map_err(|e| match e {
                SchedulerError::Task(e) => e,
                SchedulerError::Cancelled => UploadError::Cancelled,
                SchedulerError::Panicked(msg) => UploadError::TaskAborted(msg),
            })?;

        session.advance(UploadState::AllPartsComplete)?;
        let manifest = Manifest::assemble(results, num_parts)?;
        debug!(upload_id = %session.id(), parts = manifest.len(), "submitting manifest");

        let object = self
            .guarded(self.client.finalize(session.handle(), &manifest))
            .await?;
        session.advance(UploadState::Finalized)?;
        Ok(object)
    }

    /// Awaits a backend call unless the upload is cancelled first.
    async fn guarded<T>(&self, call: BoxFuture<'_, T>) -> Result<T, UploadError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(UploadError::Cancelled),
            result = call => result,
        }
    }

    fn check_cancelled(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }
        Ok(())
    }

    fn emit(&self, progress: UploadProgress) {
        for callback in &self.callbacks {
            callback(progress);
        }
    }
}

/// Pairs each planned part with its presigned URL.
///
/// The backend must return exactly one URL per part number in
/// `1..=plan.len()`.
fn bind_authorizations(
    plan: Vec<PartRange>,
    authorizations: Vec<PartAuthorization>,
) -> Result<Vec<PartSpec>, UploadError> {
    let invalid = |message: String| UploadError::session(SessionStep::Authorize, None, message);

    if authorizations.len() != plan.len() {
        return Err(invalid(format!(
            "backend returned {} part URLs for {} parts",
            authorizations.len(),
            plan.len()
        )));
    }

    let mut urls: HashMap<u32, String> = HashMap::with_capacity(authorizations.len());
    for auth in authorizations {
        if urls.insert(auth.part_number, auth.url).is_some() {
            return Err(invalid(format!("duplicate URL for part {}", auth.part_number)));
        }
    }

    plan.into_iter()
        .map(|range| {
            let url = urls
                .remove(&range.part_number)
                .ok_or_else(|| invalid(format!("no URL for part {}", range.part_number)))?;
            Ok(PartSpec { range, url })
        })
        .collect()
}
