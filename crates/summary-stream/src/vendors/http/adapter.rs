use futures::StreamExt as _;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::content::FilePayload;
use crate::errors::{TransportError, UploadError};
use crate::upload::{ResponseBody, ResponseMeta, Uploader};

use super::config::HttpUploaderConfig;

/// Uploader posting the file as a multipart form and streaming the response
/// body back chunk by chunk.
pub struct HttpUploader {
    client: reqwest::Client,
    url: reqwest::Url,
    config: HttpUploaderConfig,
}

impl HttpUploader {
    /// Creates an uploader from explicit configuration.
    pub fn new(config: HttpUploaderConfig) -> Result<Self, UploadError> {
        let url = config.endpoint_url()?;
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| UploadError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url,
            config,
        })
    }

    /// Creates an uploader configured from the environment.
    pub fn from_env() -> Result<Self, UploadError> {
        Self::new(HttpUploaderConfig::from_env()?)
    }

    pub fn config(&self) -> &HttpUploaderConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Uploader for HttpUploader {
    async fn submit(&self, payload: FilePayload) -> Result<ResponseBody, TransportError> {
        let form = build_form(&self.config.field_name, payload)?;
        debug!(url = %self.url, field = %self.config.field_name, "posting upload");

        let response = self
            .client
            .post(self.url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::request(format!("{} unreachable: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransportError::status(status.as_u16(), body));
        }

        let metadata = ResponseMeta {
            status: Some(status.as_u16()),
            content_type: response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned),
        };
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::body(e.to_string())));

        Ok(ResponseBody {
            stream: Box::pin(stream),
            metadata,
        })
    }
}

fn build_form(field_name: &str, payload: FilePayload) -> Result<Form, TransportError> {
    let len = payload.bytes.len() as u64;
    let mut part = Part::stream_with_length(reqwest::Body::from(payload.bytes), len)
        .file_name(payload.file_name);
    if let Some(mime_type) = payload.mime_type.as_deref() {
        part = part
            .mime_str(mime_type)
            .map_err(|e| TransportError::request(format!("invalid MIME type {mime_type:?}: {e}")))?;
    }
    Ok(Form::new().part(field_name.to_owned(), part))
}
