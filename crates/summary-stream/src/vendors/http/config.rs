use std::time::Duration;

use crate::errors::UploadError;

/// Endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/upload";
/// Multipart field carrying the file.
pub const DEFAULT_FIELD_NAME: &str = "video";

const ENDPOINT_ENV: &str = "SUMMARY_STREAM_UPLOAD_URL";
const FIELD_NAME_ENV: &str = "SUMMARY_STREAM_FIELD_NAME";

/// Configuration for the HTTP uploader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpUploaderConfig {
    /// Upload endpoint receiving the multipart `POST`.
    pub endpoint: String,
    /// Multipart form field name for the file part.
    pub field_name: String,
    /// Limit on connection establishment.
    ///
    /// No whole-request timeout is applied; the response stream runs until
    /// the server ends it or the caller aborts.
    pub connect_timeout: Duration,
}

impl Default for HttpUploaderConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl HttpUploaderConfig {
    /// Creates a config for `endpoint` with default field name and timeout.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Builds a config from `SUMMARY_STREAM_UPLOAD_URL` and
    /// `SUMMARY_STREAM_FIELD_NAME`, falling back to defaults.
    pub fn from_env() -> Result<Self, UploadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, UploadError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        if let Some(endpoint) = non_empty(ENDPOINT_ENV) {
            config.endpoint = endpoint.trim().to_string();
        }
        if let Some(field_name) = non_empty(FIELD_NAME_ENV) {
            config.field_name = field_name.trim().to_string();
        }
        config.endpoint_url()?;
        Ok(config)
    }

    /// Overrides the multipart field name.
    pub fn field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    /// Overrides the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub(crate) fn endpoint_url(&self) -> Result<reqwest::Url, UploadError> {
        let url = reqwest::Url::parse(self.endpoint.trim())
            .map_err(|e| UploadError::Config(format!("invalid upload endpoint {:?}: {e}", self.endpoint)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(UploadError::Config(format!(
                "upload endpoint must use http or https, got {}",
                url.scheme()
            )));
        }
        if self.field_name.trim().is_empty() {
            return Err(UploadError::Config("field_name must not be empty".into()));
        }
        Ok(url)
    }
}
