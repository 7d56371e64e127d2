//! # pyro-portal: Portal Orchestration
//!
//! Everything between the typed client and a user interface:
//!
//! - [`store`]: one explicit [`PortalState`] changed only through
//!   [`PortalEvent`]s and the pure [`reduce`] function.
//! - [`persist`]: the allow-listed subset of state that survives restarts.
//! - [`sync`]: broadcast of allow-listed events between open instances.
//! - [`workflow`]: offered actions, approve/deny dialogs, and the review
//!   controller.
//! - [`uploads`]: per-document upload state and the presign/upload pipeline.
//! - [`submission`]: validated submits and unvalidated draft saves.
//!
//! Workflow rules are checked here before any request; the backend checks
//! them again.

pub mod persist;
pub mod store;
pub mod submission;
pub mod sync;
pub mod uploads;
pub mod workflow;

pub use persist::{
    clear_persisted, load_persisted, save_persisted, FileStore, KeyValueStore, MemoryStore,
    PersistError, PERSISTED_SLICES, PERSIST_NAMESPACE,
};
pub use store::{reduce, AccountState, AuthState, CommonState, LoadStatus, PortalEvent, PortalState, Slice};
pub use submission::{save_draft, submit_application, SubmissionContext, SubmissionError};
pub use sync::{SyncChannel, SyncParticipant, SYNCED_SLICES};
pub use uploads::{DocumentView, EventSink, UploadError, UploadPipeline, UploadState, ViewerKind};
pub use workflow::{ActionPanel, ApproveDialog, DenyDialog, Workflow, WorkflowError};
