//! Common imports for typical session usage.
//!
//! Exports the types most callers need so examples and application code need
//! fewer import lines.
pub use crate::{
    AbortHandle, FilePayload, SessionEvent, SessionFailure, SessionOptions, SessionRun,
    SessionState, SessionView, TransportError, UploadError, UploadSession, Uploader,
};
