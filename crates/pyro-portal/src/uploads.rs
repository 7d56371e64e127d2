//! # Document Upload Pipeline
//!
//! One upload is: presign → PUT the bytes to the presigned URL → record the
//! outcome. Each document type has its own [`UploadState`]; a failure is
//! shown against that document only and never as a global toast.
//!
//! ```text
//!          upload()              PUT 200
//!  idle ─────────────▶ loading ─────────▶ uploaded
//!                        │  ▲                 │
//!                 failure│  └─────────────────┘ replace (upload() again)
//!                        ▼
//!                      error ──upload()──▶ loading
//! ```
//!
//! There is no automatic retry; the user replaces the file to try again.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use pyro_client::{
    ClientError, DocumentQuery, PortalClient, PresignRequest, RequestOptions, UploadProgress,
};
use pyro_core::{ApplicationId, DocumentType};
use serde::{Deserialize, Serialize};

use crate::store::PortalEvent;

/// Upload status of one document slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum UploadState {
    #[default]
    Idle,
    Loading {
        percent: u8,
    },
    Uploaded {
        display_name: String,
    },
    Error {
        message: String,
    },
}

impl UploadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

/// Which viewer can show a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerKind {
    Image,
    Pdf,
    /// Offered as a download only.
    Download,
}

impl ViewerKind {
    /// Chosen by file extension, case-insensitively.
    pub fn for_file_name(file_name: &str) -> Self {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Self::Pdf,
            Some("png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp") => Self::Image,
            _ => Self::Download,
        }
    }
}

/// `Content-Type` sent with the upload.
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{document_type} is already uploading")]
    InProgress { document_type: DocumentType },
    #[error("file name is required")]
    MissingFileName,
    #[error("could not prepare upload of {document_type}: {source}")]
    Presign {
        document_type: DocumentType,
        source: ClientError,
    },
    #[error("upload of {document_type} failed: {source}")]
    Transfer {
        document_type: DocumentType,
        source: ClientError,
    },
    #[error("could not open {document_type}: {source}")]
    View {
        document_type: DocumentType,
        source: ClientError,
    },
}

impl UploadError {
    /// Text shown in the document slot.
    pub fn user_message(&self) -> String {
        match self {
            Self::Presign { source, .. } | Self::Transfer { source, .. } => {
                format!("Upload failed: {}", source.user_message())
            }
            Self::View { source, .. } => {
                format!("Could not open document: {}", source.user_message())
            }
            other => other.to_string(),
        }
    }
}

/// A stored document ready to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentView {
    pub url: String,
    pub file_name: String,
    pub viewer: ViewerKind,
}

/// Receives every upload state change, e.g. to feed the portal store.
pub type EventSink = Arc<dyn Fn(PortalEvent) + Send + Sync>;

/// Drives uploads for one form.
#[derive(Clone)]
pub struct UploadPipeline {
    client: PortalClient,
    states: Arc<Mutex<BTreeMap<DocumentType, UploadState>>>,
    sink: Option<EventSink>,
}

impl std::fmt::Debug for UploadPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadPipeline")
            .field("states", &*self.states.lock())
            .finish_non_exhaustive()
    }
}

impl UploadPipeline {
    pub fn new(client: PortalClient) -> Self {
        Self {
            client,
            states: Arc::default(),
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: EventSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn state(&self, document_type: DocumentType) -> UploadState {
        self.states
            .lock()
            .get(&document_type)
            .cloned()
            .unwrap_or_default()
    }

    fn set(&self, document_type: DocumentType, state: UploadState) {
        Self::publish(&self.states, self.sink.as_ref(), document_type, state);
    }

    fn publish(
        states: &Mutex<BTreeMap<DocumentType, UploadState>>,
        sink: Option<&EventSink>,
        document_type: DocumentType,
        state: UploadState,
    ) {
        states.lock().insert(document_type, state.clone());
        if let Some(sink) = sink {
            sink(PortalEvent::UploadChanged {
                document_type,
                state,
            });
        }
    }

    /// Upload (or replace) one document.
    ///
    /// Refused while the same slot is already loading. On success the slot
    /// shows `file_name` and cached reads of the application are invalidated.
    pub async fn upload(
        &self,
        document_type: DocumentType,
        application_id: Option<&ApplicationId>,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), UploadError> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(UploadError::MissingFileName);
        }
        {
            let mut states = self.states.lock();
            if states.get(&document_type).is_some_and(UploadState::is_loading) {
                return Err(UploadError::InProgress { document_type });
            }
            states.insert(document_type, UploadState::Loading { percent: 0 });
        }
        if let Some(sink) = &self.sink {
            sink(PortalEvent::UploadChanged {
                document_type,
                state: UploadState::Loading { percent: 0 },
            });
        }

        let result = self
            .transfer(document_type, application_id, file_name, bytes)
            .await;
        match &result {
            Ok(()) => {
                tracing::info!(%document_type, file_name, "document uploaded");
                self.client.documents().uploaded(application_id);
                self.set(
                    document_type,
                    UploadState::Uploaded {
                        display_name: file_name.to_string(),
                    },
                );
            }
            Err(e) => {
                tracing::warn!(%document_type, error = %e, "document upload failed");
                self.set(
                    document_type,
                    UploadState::Error {
                        message: e.user_message(),
                    },
                );
            }
        }
        result
    }

    async fn transfer(
        &self,
        document_type: DocumentType,
        application_id: Option<&ApplicationId>,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), UploadError> {
        let request = PresignRequest {
            document_type,
            file_name: file_name.to_string(),
            application_id: application_id.cloned(),
        };
        let presigned = self
            .client
            .documents()
            .presign(&request, RequestOptions::silent())
            .await
            .map_err(|source| UploadError::Presign {
                document_type,
                source,
            })?;

        let states = self.states.clone();
        let sink = self.sink.clone();
        let on_progress = Arc::new(move |progress: UploadProgress| {
            let percent = progress.percent();
            // 100% is reported as `uploaded` once the server has answered.
            if percent < 100 {
                Self::publish(&states, sink.as_ref(), document_type, UploadState::Loading { percent });
            }
        });

        self.client
            .documents()
            .upload(&presigned, bytes, content_type_for(file_name), on_progress)
            .await
            .map_err(|source| UploadError::Transfer {
                document_type,
                source,
            })
    }

    /// Signed URL and viewer for a stored document.
    pub async fn view(
        &self,
        document_type: DocumentType,
        application_id: Option<&ApplicationId>,
    ) -> Result<DocumentView, UploadError> {
        let query = DocumentQuery {
            document_type,
            application_id: application_id.cloned(),
        };
        let signed = self
            .client
            .documents()
            .signed_url(&query, RequestOptions::silent())
            .await
            .map_err(|source| UploadError::View {
                document_type,
                source,
            })?;
        Ok(DocumentView {
            viewer: ViewerKind::for_file_name(&signed.file_name),
            url: signed.url,
            file_name: signed.file_name,
        })
    }

    /// Forget every slot, e.g. when leaving the form.
    pub fn reset(&self) {
        self.states.lock().clear();
        if let Some(sink) = &self.sink {
            sink(PortalEvent::UploadsReset);
        }
    }
}
