//! HTTP integration: multipart upload with a streamed response body.
//!
//! Transport-specific configuration lives here so the session API stays
//! independent of how the file reaches the server.
mod adapter;
mod config;

pub use adapter::HttpUploader;
pub use config::{DEFAULT_ENDPOINT, DEFAULT_FIELD_NAME, HttpUploaderConfig};
