use std::path::Path;

use bytes::Bytes;

use crate::errors::UploadError;

/// One binary file to submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePayload {
    /// File name sent with the multipart part.
    pub file_name: String,
    /// Optional MIME type (for example `video/mp4`).
    pub mime_type: Option<String>,
    /// File contents.
    pub bytes: Bytes,
}

impl FilePayload {
    /// Creates a payload from in-memory bytes.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: None,
            bytes: bytes.into(),
        }
    }

    /// Sets the MIME type sent with the file part.
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Reads a file from disk, keeping its file name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                UploadError::Validation(format!("path has no file name: {}", path.display()))
            })?
            .to_owned();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            UploadError::Validation(format!("failed to read {}: {e}", path.display()))
        })?;
        Ok(Self::new(file_name, bytes))
    }

    /// Size of the file contents in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn validate(&self) -> Result<(), UploadError> {
        if self.file_name.trim().is_empty() {
            return Err(UploadError::Validation(
                "file name must not be empty".into(),
            ));
        }
        if self.bytes.is_empty() {
            return Err(UploadError::Validation(
                "file payload must not be empty".into(),
            ));
        }
        Ok(())
    }
}
