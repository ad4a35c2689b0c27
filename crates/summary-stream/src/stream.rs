use crate::errors::SessionFailure;
use crate::upload::ResponseMeta;

/// Normalized events exposed by `SessionRun`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// First event for every run; the file is being submitted.
    Submitting {
        run_id: uuid::Uuid,
        session_id: uuid::Uuid,
        file_name: String,
    },
    /// The server accepted the file and a readable body is open.
    Streaming {
        run_id: uuid::Uuid,
        metadata: ResponseMeta,
    },
    /// A chunk was consumed; `output` is the full aggregate so far.
    Snapshot {
        run_id: uuid::Uuid,
        seq: u64,
        output: String,
    },
    /// Terminal success event with the finished output.
    Completed { run_id: uuid::Uuid, output: String },
    /// Terminal failure event with the output gathered before the failure.
    Failed {
        run_id: uuid::Uuid,
        error: SessionFailure,
        partial: String,
    },
}

impl SessionEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}
