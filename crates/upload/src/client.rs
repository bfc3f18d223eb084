//! Session client: the backend side of a multipart upload.
//!
//! `SessionClient` is the seam between the orchestrator and the
//! application backend. `HttpSessionClient` speaks the backend's JSON
//! protocol over reqwest; tests drive the orchestrator with mocks.

use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use streamvod_protocol::endpoints;
use streamvod_protocol::messages::{
    CompleteUploadRequest, CompleteUploadResponse, ErrorBody, InitiateUploadResponse,
    PartUrlsRequest, PartUrlsResponse,
};
use tracing::debug;

use crate::error::{SessionStep, UploadError};
use crate::types::{FinalizedObject, Manifest, PartAuthorization, SessionHandle};

/// Boxed future returned by the upload trait seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UploadError>> + Send + 'a>>;

/// Abstract upload session backend.
///
/// The three calls are made in order, once each, for a single upload.
pub trait SessionClient: Send + Sync {
    /// Opens a session and returns its handle.
    fn initiate(&self) -> BoxFuture<'_, SessionHandle>;

    /// Requests presigned URLs for parts `1..=num_parts`.
    fn authorize_parts<'a>(
        &'a self,
        handle: &'a SessionHandle,
        num_parts: u32,
    ) -> BoxFuture<'a, Vec<PartAuthorization>>;

    /// Submits the ordered manifest so storage assembles the object.
    fn finalize<'a>(
        &'a self,
        handle: &'a SessionHandle,
        manifest: &'a Manifest,
    ) -> BoxFuture<'a, FinalizedObject>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// `SessionClient` backed by the StreamVOD REST API.
#[derive(Clone)]
pub struct HttpSessionClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpSessionClient {
    /// Creates a client for the API rooted at `base_url`.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, UploadError> {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    /// Creates a client reusing an existing reqwest client.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        token: Option<String>,
    ) -> Result<Self, UploadError> {
        reqwest::Url::parse(base_url).map_err(|e| {
            UploadError::Validation(format!("invalid backend URL {base_url:?}: {e}"))
        })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        step: SessionStep,
        req: reqwest::RequestBuilder,
    ) -> Result<T, UploadError> {
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };

        let response = req
            .send()
            .await
            .map_err(|e| UploadError::session(step, None, format!("request failed: {e}")))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            UploadError::session(step, Some(status), format!("failed to read response: {e}"))
        })?;

        if !(200..300).contains(&status) {
            return Err(rejection(step, status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            UploadError::session(step, Some(status), format!("invalid response body: {e}"))
        })
    }
}

impl SessionClient for HttpSessionClient {
    fn initiate(&self) -> BoxFuture<'_, SessionHandle> {
        Box::pin(async move {
            let req = self.http.post(self.url(endpoints::MULTIPART_INITIATE));
            let resp: InitiateUploadResponse = self.send_json(SessionStep::Initiate, req).await?;
            debug!(video_id = %resp.video_id, upload_id = %resp.upload_id, "session opened");
            Ok(SessionHandle {
                video_id: resp.video_id,
                upload_id: resp.upload_id,
                object_key: resp.key,
            })
        })
    }

    fn authorize_parts<'a>(
        &'a self,
        handle: &'a SessionHandle,
        num_parts: u32,
    ) -> BoxFuture<'a, Vec<PartAuthorization>> {
        Box::pin(async move {
            let body = PartUrlsRequest {
                video_id: handle.video_id.clone(),
                upload_id: handle.upload_id.clone(),
                num_parts,
            };
            let req = self.http.post(self.url(endpoints::MULTIPART_GET_URLS)).json(&body);
            let resp: PartUrlsResponse = self.send_json(SessionStep::Authorize, req).await?;
            debug!(upload_id = %handle.upload_id, urls = resp.parts.len(), "parts authorized");
            Ok(resp
                .parts
                .into_iter()
                .map(|p| PartAuthorization {
                    part_number: p.part_number,
                    url: p.url,
                })
                .collect())
        })
    }

    fn finalize<'a>(
        &'a self,
        handle: &'a SessionHandle,
        manifest: &'a Manifest,
    ) -> BoxFuture<'a, FinalizedObject> {
        Box::pin(async move {
            let body = CompleteUploadRequest {
                video_id: handle.video_id.clone(),
                upload_id: handle.upload_id.clone(),
                parts: manifest.to_completed_parts(),
            };
            let req = self.http.post(self.url(endpoints::MULTIPART_COMPLETE)).json(&body);
            let resp: CompleteUploadResponse = self.send_json(SessionStep::Finalize, req).await?;
            debug!(video_id = %resp.video_id, status = %resp.status, "upload finalized");
            Ok(FinalizedObject {
                video_id: resp.video_id,
                object_key: handle.object_key.clone(),
                status: resp.status,
                message: resp.message,
            })
        })
    }
}

/// Maps a non-success backend response to an error.
///
/// Finalize rejections that blame the part list are manifest errors, all
/// others are session errors for `step`.
fn rejection(step: SessionStep, status: u16, body: &str) -> UploadError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => err.message(),
        Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
        Err(_) => body.trim().to_string(),
    };

    let manifest_rejected =
        matches!(status, 400 | 409 | 422) || message.contains("InvalidPart");
    if step == SessionStep::Finalize && manifest_rejected {
        return UploadError::Manifest(message);
    }
    UploadError::session(step, Some(status), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = HttpSessionClient::new("https://api.example.com/", None).unwrap();
        assert_eq!(
            client.url(endpoints::MULTIPART_INITIATE),
            "https://api.example.com/videos/multipart/initiate"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let client = HttpSessionClient::new("https://example.com/api", None).unwrap();
        assert_eq!(
            client.url(endpoints::MULTIPART_COMPLETE),
            "https://example.com/api/videos/multipart/complete"
        );
    }

    #[test]
    fn invalid_base_url_rejected() {
        let err = HttpSessionClient::new("not a url", None).err().unwrap();
        assert!(matches!(err, UploadError::Validation(_)));
    }

    #[test]
    fn rejection_uses_detail() {
        let err = rejection(SessionStep::Authorize, 403, r#"{"detail":"Not authorized"}"#);
        match err {
            UploadError::Session {
                step,
                status,
                message,
            } => {
                assert_eq!(step, SessionStep::Authorize);
                assert_eq!(status, Some(403));
                assert_eq!(message, "Not authorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejection_without_body() {
        let err = rejection(SessionStep::Initiate, 502, "");
        assert_eq!(err.to_string(), "initiate failed: HTTP 502");
    }

    #[test]
    fn rejection_with_plain_text_body() {
        let err = rejection(SessionStep::Initiate, 500, "Internal Server Error\n");
        assert_eq!(err.to_string(), "initiate failed: Internal Server Error");
    }

    #[test]
    fn finalize_invalid_part_is_manifest_error() {
        let body = r#"{"detail":"Failed to complete multipart upload: An error occurred (InvalidPart) when calling the CompleteMultipartUpload operation"}"#;
        let err = rejection(SessionStep::Finalize, 500, body);
        assert!(matches!(err, UploadError::Manifest(msg) if msg.contains("InvalidPart")));
    }

    #[test]
    fn finalize_validation_status_is_manifest_error() {
        let body = r#"{"detail":[{"loc":["body","parts"],"msg":"field required","type":"value_error.missing"}]}"#;
        let err = rejection(SessionStep::Finalize, 422, body);
        assert!(matches!(err, UploadError::Manifest(msg) if msg == "field required"));
    }

    #[test]
    fn finalize_auth_failure_is_session_error() {
        let err = rejection(SessionStep::Finalize, 403, r#"{"detail":"Not authorized"}"#);
        assert!(matches!(
            err,
            UploadError::Session {
                step: SessionStep::Finalize,
                status: Some(403),
                ..
            }
        ));
    }

    #[test]
    fn authorize_validation_status_stays_session_error() {
        let err = rejection(SessionStep::Authorize, 422, r#"{"detail":"bad"}"#);
        assert!(matches!(err, UploadError::Session { .. }));
    }
}
