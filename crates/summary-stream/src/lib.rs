//! Uploads a file and aggregates the loosely framed text stream the server
//! answers with.
//!
//! Each response chunk is decoded incrementally as UTF-8, then classified on
//! its own: a JSON object with a string `summary` field contributes that
//! string, anything else (plain text, fragments of a JSON object split across
//! chunks) is appended verbatim. The growing output is published after every
//! chunk.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use summary_stream::prelude::*;
//! use summary_stream::vendors::http::{HttpUploader, HttpUploaderConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), UploadError> {
//! let uploader = HttpUploader::new(HttpUploaderConfig::new("http://127.0.0.1:8000/upload"))?;
//! let session = UploadSession::new(Arc::new(uploader));
//!
//! let payload = FilePayload::from_path("talk.mp4").await?.mime_type("video/mp4");
//! let script = session
//!     .submit(payload)
//!     .await?
//!     .for_each_snapshot(|so_far| println!("{so_far}"))
//!     .await?;
//!
//! println!("{script}");
//! # Ok(())
//! # }
//! ```

/// Running output owner.
pub mod aggregate;
/// Per-unit classification of decoded text.
pub mod classify;
/// Read loop over an open response body.
pub mod consumer;
/// File payload submitted by a session.
pub mod content;
/// Incremental UTF-8 decoding.
pub mod decoder;
/// Public error types.
pub mod errors;
/// Logging setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Session run handle and cancellation.
pub mod run;
/// Upload session state machine.
pub mod session;
/// Normalized public session events.
pub mod stream;
/// Submission boundary contract.
pub mod upload;
/// Transport integrations.
pub mod vendors;

pub use aggregate::Aggregator;
pub use classify::{ChunkClassifier, ClassifiedContent};
pub use consumer::{ConsumerEvent, ConsumerState, StreamConsumer, consume};
pub use content::FilePayload;
pub use decoder::ByteDecoder;
pub use errors::{SessionFailure, TransportError, UploadError};
pub use observability::init_observability;
pub use run::{AbortHandle, SessionRun};
pub use session::{SessionOptions, SessionState, SessionView, UploadSession};
pub use stream::SessionEvent;
pub use upload::{ByteStream, ResponseBody, ResponseMeta, Uploader};
