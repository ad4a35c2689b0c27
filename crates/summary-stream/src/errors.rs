/// Errors returned by an uploader before they are normalized for the public
/// session stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The submission could not be sent or no response arrived.
    #[error("upload request failed: {message}")]
    Request { message: String },
    /// The server answered, but not with a usable streamed body.
    #[error("upload rejected with status {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body broke off or became unreadable mid-stream.
    #[error("response body read failed: {message}")]
    Body { message: String },
}

impl TransportError {
    /// Creates a submission-level error.
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    /// Creates an unusable-response error.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Creates a mid-stream read error.
    pub fn body(message: impl Into<String>) -> Self {
        Self::Body {
            message: message.into(),
        }
    }

    /// Returns the HTTP status associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request { .. } | Self::Body { .. } => None,
        }
    }
}

/// Terminal session failure carried by `SessionEvent::Failed` and
/// `SessionState::Failed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum SessionFailure {
    /// Submitting the file failed or the response had no usable body.
    #[error("network failure: {message}")]
    Network { message: String },
    /// The response stream failed after streaming began.
    #[error("stream failure: {message}")]
    Stream { message: String },
    /// The session was cancelled by the caller.
    #[error("session cancelled")]
    Cancelled,
}

/// Top-level error type for the public session API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// Invalid uploader configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid caller input (empty payload, bad options).
    #[error("validation error: {0}")]
    Validation(String),
    /// A submission is already in flight on this session.
    #[error("session busy: a submission is already in flight")]
    Busy,
    /// Terminal failure of a started session, with the output gathered so far.
    #[error("{failure}")]
    SessionFailed {
        failure: SessionFailure,
        partial: String,
    },
    /// Internal protocol misuse or invariant violation.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl UploadError {
    pub(crate) fn protocol_msg(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Returns the partial output retained by a failed session.
    pub fn partial_output(&self) -> Option<&str> {
        match self {
            Self::SessionFailed { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

pub(crate) fn network_failure(err: &TransportError) -> SessionFailure {
    SessionFailure::Network {
        message: err.to_string(),
    }
}

pub(crate) fn stream_failure(err: &TransportError) -> SessionFailure {
    SessionFailure::Stream {
        message: err.to_string(),
    }
}
