//! Typed client for the `documents` resource and direct uploads.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/documents` | Request a presigned upload URL |
//! | GET    | `/documents?DocumentType&ApplicationId` | Short-lived signed read URL |
//! | DELETE | `/documents?DocumentType&ApplicationId` | Remove a stored document |
//!
//! The bytes themselves never pass through the API: [`DocumentClient::upload`]
//! PUTs them straight to the presigned URL, reporting progress per chunk.
//! Uploads are never retried.

use std::sync::Arc;

use futures::stream;
use pyro_core::ApplicationId;
use reqwest::Method;

use crate::cache::CacheTag;
use crate::error::ClientError;
use crate::notify::RequestOptions;
use crate::transport::Transport;
use crate::types::{DocumentQuery, PresignRequest, PresignedUpload, SignedUrl};

/// Bytes per streamed chunk (and per progress event).
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Progress of one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    /// Whole percent, 100 for an empty file.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.sent.min(self.total) * 100) / self.total) as u8
    }
}

/// Progress callback, invoked once per chunk as it is handed to the socket.
pub type ProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Client for the documents resource.
#[derive(Debug, Clone)]
pub struct DocumentClient {
    transport: Transport,
}

impl DocumentClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Ask the backend for a presigned upload URL.
    pub async fn presign(
        &self,
        request: &PresignRequest,
        options: RequestOptions,
    ) -> Result<PresignedUpload, ClientError> {
        self.transport
            .json(
                Method::POST,
                "documents",
                "POST /documents",
                options,
                |rb| rb.json(request),
            )
            .await
    }

    /// PUT `bytes` to a presigned URL.
    ///
    /// Errors are returned to the caller without a toast; upload failures
    /// are shown against their own document slot.
    pub async fn upload(
        &self,
        presigned: &PresignedUpload,
        bytes: Vec<u8>,
        content_type: &str,
        on_progress: ProgressFn,
    ) -> Result<(), ClientError> {
        let endpoint = "PUT <presigned upload>";
        let total = bytes.len() as u64;
        let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();

        let mut sent = 0u64;
        let body_stream = stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            on_progress(UploadProgress { sent, total });
            tracing::debug!(sent, total, "upload progress");
            Ok::<_, std::io::Error>(chunk)
        }));

        let resp = self
            .transport
            .http()
            .put(&presigned.upload_url)
            .header(reqwest::header::CONTENT_LENGTH, total)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(reqwest::Body::wrap_stream(body_stream))
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::from_response(endpoint.into(), status, body));
        }
        tracing::info!(key = %presigned.key, bytes = total, "document uploaded");
        Ok(())
    }

    /// Short-lived read URL for a stored document.
    pub async fn signed_url(
        &self,
        query: &DocumentQuery,
        options: RequestOptions,
    ) -> Result<SignedUrl, ClientError> {
        self.transport
            .json(
                Method::GET,
                "documents",
                "GET /documents",
                options,
                |rb| rb.query(query),
            )
            .await
    }

    pub async fn delete(&self, query: &DocumentQuery) -> Result<(), ClientError> {
        let result = self
            .transport
            .execute(
                Method::DELETE,
                "documents",
                "DELETE /documents",
                RequestOptions::default(),
                |rb| rb.query(query),
            )
            .await;
        self.uploaded(query.application_id.as_ref());
        result.map(|_| ())
    }

    /// Invalidate cached reads of the owning application after its document
    /// set changed.
    pub fn uploaded(&self, application_id: Option<&ApplicationId>) {
        let mut tags = vec![CacheTag::ApplicationList];
        if let Some(id) = application_id {
            tags.push(CacheTag::Application(id.clone()));
        }
        self.transport.invalidate(&tags);
    }
}
