use std::pin::Pin;

use crate::content::FilePayload;
use crate::errors::TransportError;

/// Raw response chunks as delivered by the transport, in arrival order.
pub type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, TransportError>> + Send + 'static>>;

/// Response metadata captured when the stream is established.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    /// HTTP status, when the transport has one.
    pub status: Option<u16>,
    /// `Content-Type` header, when present.
    pub content_type: Option<String>,
}

/// Readable response body returned by a successful submission.
///
/// Dropping it releases the underlying connection.
pub struct ResponseBody {
    pub stream: ByteStream,
    pub metadata: ResponseMeta,
}

impl ResponseBody {
    /// Wraps a byte stream with empty metadata.
    pub fn new(stream: ByteStream) -> Self {
        Self {
            stream,
            metadata: ResponseMeta::default(),
        }
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseBody")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Submission boundary: sends one file and returns the streamed response.
#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// Submits `payload`. Succeeds only with a readable body; a submission
    /// failure or an unusable response is an error with no stream.
    async fn submit(&self, payload: FilePayload) -> Result<ResponseBody, TransportError>;
}
