use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::content::FilePayload;
use crate::errors::{SessionFailure, UploadError};
use crate::run::{self, SessionRun};
use crate::upload::Uploader;

/// Where a session is in its submit-stream-aggregate lifecycle.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SessionState {
    Idle,
    Submitting,
    Streaming,
    Completed,
    Failed(SessionFailure),
}

impl SessionState {
    /// True while a submission or its stream is in progress.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Submitting | Self::Streaming)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

/// Observable session state together with the latest aggregate output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionView {
    pub state: SessionState,
    pub output: String,
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            output: String::new(),
        }
    }
}

/// Options used to create an `UploadSession`.
#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// Human-readable session name, used in logs.
    pub name: String,
    /// Bounded event buffer size between the driver task and `SessionRun`.
    pub event_buffer_capacity: usize,
}

impl SessionOptions {
    /// Creates named options with the default buffer size.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Overrides the event buffer size.
    pub fn event_buffer_capacity(mut self, capacity: usize) -> Self {
        self.event_buffer_capacity = capacity;
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            name: "upload".to_string(),
            event_buffer_capacity: 128,
        }
    }
}

pub(crate) struct SessionInner {
    pub(crate) id: uuid::Uuid,
    pub(crate) name: String,
    pub(crate) uploader: Arc<dyn Uploader>,
    pub(crate) event_buffer_capacity: usize,
    pub(crate) view: watch::Sender<SessionView>,
}

impl SessionInner {
    /// Moves an in-flight session to `Streaming`.
    pub(crate) fn mark_streaming(&self) {
        self.view.send_modify(|view| view.state = SessionState::Streaming);
        info!(session_id = %self.id, session = %self.name, "session streaming");
    }

    /// Publishes a new aggregate snapshot. Ignored unless streaming.
    pub(crate) fn publish_output(&self, output: &str) {
        self.view.send_if_modified(|view| {
            if view.state != SessionState::Streaming {
                return false;
            }
            view.output.clear();
            view.output.push_str(output);
            true
        });
    }

    pub(crate) fn mark_completed(&self, output: &str) {
        self.view.send_modify(|view| {
            view.output.clear();
            view.output.push_str(output);
            view.state = SessionState::Completed;
        });
        info!(session_id = %self.id, session = %self.name, output_chars = output.chars().count(), "session completed");
    }

    /// Moves the session to `Failed`, keeping whatever output was published.
    pub(crate) fn mark_failed(&self, failure: &SessionFailure) {
        self.view
            .send_modify(|view| view.state = SessionState::Failed(failure.clone()));
        warn!(session_id = %self.id, session = %self.name, error = %failure, "session failed");
    }
}

/// Orchestrates upload-and-consume cycles against one `Uploader`.
///
/// At most one submission is in flight at a time; a second `submit` while
/// submitting or streaming is rejected with `UploadError::Busy` and leaves the
/// running cycle untouched. Clones share the same state.
#[derive(Clone)]
pub struct UploadSession {
    inner: Arc<SessionInner>,
}

impl UploadSession {
    /// Creates an idle session with default options.
    pub fn new(uploader: Arc<dyn Uploader>) -> Self {
        Self::build(uploader, SessionOptions::default())
    }

    /// Creates an idle session after validating `options`.
    pub fn with_options(
        uploader: Arc<dyn Uploader>,
        options: SessionOptions,
    ) -> Result<Self, UploadError> {
        if options.event_buffer_capacity == 0 {
            return Err(UploadError::Validation(
                "event_buffer_capacity must be greater than 0".into(),
            ));
        }
        Ok(Self::build(uploader, options))
    }

    fn build(uploader: Arc<dyn Uploader>, options: SessionOptions) -> Self {
        let (view, _) = watch::channel(SessionView::default());
        Self {
            inner: Arc::new(SessionInner {
                id: uuid::Uuid::new_v4(),
                name: options.name,
                uploader,
                event_buffer_capacity: options.event_buffer_capacity,
                view,
            }),
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.inner.id
    }

    pub fn state(&self) -> SessionState {
        self.inner.view.borrow().state.clone()
    }

    /// Latest published aggregate output.
    pub fn output(&self) -> String {
        self.inner.view.borrow().output.clone()
    }

    pub fn view(&self) -> SessionView {
        self.inner.view.borrow().clone()
    }

    /// Subscribes to state and output changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.inner.view.subscribe()
    }

    /// Submits `payload` and starts streaming the response in a background
    /// task.
    ///
    /// Clears the previous output on success. Must be called from within a
    /// tokio runtime.
    pub async fn submit(&self, payload: FilePayload) -> Result<SessionRun, UploadError> {
        payload.validate()?;
        self.begin_submission()?;
        info!(
            session_id = %self.inner.id,
            session = %self.inner.name,
            file_name = %payload.file_name,
            bytes = payload.len(),
            "session submitting"
        );
        Ok(run::start(self.inner.clone(), payload))
    }

    /// Returns an idle session with empty output. Rejected while in flight.
    pub fn clear(&self) -> Result<(), UploadError> {
        let mut cleared = false;
        self.inner.view.send_if_modified(|view| {
            if view.state.is_in_flight() {
                return false;
            }
            *view = SessionView::default();
            cleared = true;
            true
        });
        if cleared { Ok(()) } else { Err(UploadError::Busy) }
    }

    fn begin_submission(&self) -> Result<(), UploadError> {
        let mut accepted = false;
        self.inner.view.send_if_modified(|view| {
            if view.state.is_in_flight() {
                return false;
            }
            view.state = SessionState::Submitting;
            view.output.clear();
            accepted = true;
            true
        });
        if accepted {
            Ok(())
        } else {
            warn!(session_id = %self.inner.id, "rejected submission while another is in flight");
            Err(UploadError::Busy)
        }
    }
}
