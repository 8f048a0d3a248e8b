//! Rentify storage client
//!
//! Uploads listing media to a storage bucket and resolves durable download
//! URLs. Small files go up in one request; large ones use the resumable
//! protocol, sent in chunks with progress reported after each chunk.

use bytes::Bytes;
use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Default resumable chunk size; the server requires multiples of 256 KiB
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

const UPLOAD_PROTOCOL: &str = "X-Goog-Upload-Protocol";
const UPLOAD_COMMAND: &str = "X-Goog-Upload-Command";
const UPLOAD_OFFSET: &str = "X-Goog-Upload-Offset";
const UPLOAD_STATUS: &str = "X-Goog-Upload-Status";
const UPLOAD_URL: &str = "X-Goog-Upload-URL";

/// Errors returned by the storage client
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("No download token for {0}")]
    MissingDownloadToken(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),
}

/// Upload options
#[derive(Debug, Clone, Default)]
pub struct FileOptions {
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
}

impl FileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn with_cache_control(mut self, cache_control: &str) -> Self {
        self.cache_control = Some(cache_control.to_string());
        self
    }

    fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or("application/octet-stream")
    }
}

/// Object metadata as returned by the storage API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileObject {
    pub name: String,
    pub bucket: Option<String>,
    pub content_type: Option<String>,
    pub size: Option<String>,
    pub time_created: Option<String>,
    pub download_tokens: Option<String>,
}

/// Bytes sent so far for one upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Completed fraction in `[0, 1]`
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_transferred as f64 / self.total_bytes as f64).clamp(0.0, 1.0)
    }
}

/// Event reported by a running [`UploadTask`]
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Progress(UploadProgress),
    Completed { url: String },
    Failed { message: String },
}

/// Handle to a background upload.
///
/// The upload keeps running when the handle is dropped; there is no cancel.
pub struct UploadTask {
    events: mpsc::Receiver<UploadEvent>,
}

impl UploadTask {
    /// Wrap an event channel; the sender side must end with a terminal event
    pub fn from_receiver(events: mpsc::Receiver<UploadEvent>) -> Self {
        Self { events }
    }

    /// Next event, `None` once the upload has finished and all events were read
    pub async fn next_event(&mut self) -> Option<UploadEvent> {
        self.events.recv().await
    }

    /// Skip progress events and return the durable URL
    pub async fn wait(mut self) -> Result<String> {
        while let Some(event) = self.events.recv().await {
            match event {
                UploadEvent::Progress(_) => continue,
                UploadEvent::Completed { url } => return Ok(url),
                UploadEvent::Failed { message } => return Err(StorageError::UploadFailed(message)),
            }
        }
        Err(StorageError::UploadFailed(
            "upload ended without a result".to_string(),
        ))
    }
}

/// Client for one storage endpoint
#[derive(Debug, Clone)]
pub struct StorageClient {
    base_url: String,
    http_client: Client,
    auth: Option<String>,
    chunk_size: usize,
}

/// Client bound to one bucket
pub struct StorageBucketClient<'a> {
    parent: &'a StorageClient,
    bucket_id: String,
}

impl StorageClient {
    pub fn new(base_url: &str, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            auth: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// A copy of this client that authorizes requests with `token`
    pub fn with_auth(&self, token: Option<&str>) -> Self {
        Self {
            auth: token.map(str::to_string),
            ..self.clone()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn from<'a>(&'a self, bucket_id: &str) -> StorageBucketClient<'a> {
        StorageBucketClient {
            parent: self,
            bucket_id: bucket_id.to_string(),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some(token) => request.header("Authorization", format!("Firebase {}", token)),
            None => request,
        }
    }
}

async fn api_error(response: reqwest::Response) -> StorageError {
    let status = response.status().as_u16();
    match response.text().await {
        Ok(message) => StorageError::ApiError { status, message },
        Err(e) => StorageError::NetworkError(e),
    }
}

impl<'a> StorageBucketClient<'a> {
    fn objects_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}/v0/b/{}/o",
            self.parent.base_url, self.bucket_id
        ))?)
    }

    /// Object paths are a single, fully percent-encoded segment
    fn object_url(&self, path: &str) -> Result<Url> {
        if path.is_empty() {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        let mut url = self.objects_url()?;
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidPath(path.to_string()))?
            .push(path);
        Ok(url)
    }

    /// Upload `data` in a single request
    pub async fn upload(&self, path: &str, data: Bytes, options: Option<FileOptions>) -> Result<FileObject> {
        if path.is_empty() {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        let options = options.unwrap_or_default();
        let mut url = self.objects_url()?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", path);

        debug!("uploading {} ({} bytes)", path, data.len());
        let mut request = self
            .parent
            .http_client
            .post(url)
            .header("Content-Type", options.content_type());
        if let Some(cache_control) = &options.cache_control {
            request = request.header("Cache-Control", cache_control);
        }
        let response = self.parent.authorize(request).body(data).send().await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response.json::<FileObject>().await?)
    }

    /// Metadata of a stored object
    pub async fn get_metadata(&self, path: &str) -> Result<FileObject> {
        let url = self.object_url(path)?;
        let request = self.parent.http_client.get(url);
        let response = self.parent.authorize(request).send().await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response.json::<FileObject>().await?)
    }

    /// Durable URL built from an object's first download token
    pub fn download_url(&self, object: &FileObject) -> Result<String> {
        let token = object
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| StorageError::MissingDownloadToken(object.name.clone()))?;

        let mut url = self.object_url(&object.name)?;
        url.query_pairs_mut()
            .append_pair("alt", "media")
            .append_pair("token", token);
        Ok(url.to_string())
    }

    /// Look up an object and return its durable URL
    pub async fn get_download_url(&self, path: &str) -> Result<String> {
        let object = self.get_metadata(path).await?;
        self.download_url(&object)
    }

    /// Open a resumable session and return the URL chunks are sent to
    pub async fn start_resumable_upload(
        &self,
        path: &str,
        total_bytes: u64,
        options: &FileOptions,
    ) -> Result<String> {
        if path.is_empty() {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        let mut url = self.objects_url()?;
        url.query_pairs_mut()
            .append_pair("uploadType", "resumable")
            .append_pair("name", path);

        let metadata = serde_json::json!({
            "name": path,
            "contentType": options.content_type(),
        });

        let request = self
            .parent
            .http_client
            .post(url)
            .header(UPLOAD_PROTOCOL, "resumable")
            .header(UPLOAD_COMMAND, "start")
            .header("X-Goog-Upload-Header-Content-Length", total_bytes.to_string())
            .header("X-Goog-Upload-Header-Content-Type", options.content_type())
            .json(&metadata);
        let response = self.parent.authorize(request).send().await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let upload_url = response
            .headers()
            .get(UPLOAD_URL)
            .ok_or_else(|| StorageError::UploadFailed("no upload URL in response".to_string()))?
            .to_str()
            .map_err(|e| StorageError::UploadFailed(format!("invalid upload URL header: {}", e)))?
            .to_string();

        Ok(upload_url)
    }

    /// Send one chunk; returns the object metadata once the upload is finalized
    pub async fn upload_chunk(
        &self,
        upload_url: &str,
        offset: u64,
        chunk: Bytes,
        finalize: bool,
    ) -> Result<Option<FileObject>> {
        let command = if finalize { "upload, finalize" } else { "upload" };
        let request = self
            .parent
            .http_client
            .post(upload_url)
            .header(UPLOAD_PROTOCOL, "resumable")
            .header(UPLOAD_COMMAND, command)
            .header(UPLOAD_OFFSET, offset.to_string())
            .body(chunk);
        let response = self.parent.authorize(request).send().await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let status = response
            .headers()
            .get(UPLOAD_STATUS)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if status == "final" {
            return Ok(Some(response.json::<FileObject>().await?));
        }
        if finalize {
            return Err(StorageError::UploadFailed(format!(
                "server did not finalize upload (status {:?})",
                status
            )));
        }
        Ok(None)
    }

    /// Resumable upload in chunks, sending progress after every chunk.
    ///
    /// Progress never holds the upload back: an event that does not fit in
    /// the channel is skipped.
    pub async fn upload_resumable_with_progress(
        &self,
        path: &str,
        data: Bytes,
        options: Option<FileOptions>,
        progress: &mpsc::Sender<UploadEvent>,
    ) -> Result<FileObject> {
        let options = options.unwrap_or_default();
        let total = data.len();
        let upload_url = self.start_resumable_upload(path, total as u64, &options).await?;

        let mut offset = 0usize;
        loop {
            let end = (offset + self.parent.chunk_size).min(total);
            let finalize = end == total;
            let chunk = data.slice(offset..end);

            let object = self
                .upload_chunk(&upload_url, offset as u64, chunk, finalize)
                .await?;
            offset = end;

            let event = UploadEvent::Progress(UploadProgress {
                bytes_transferred: offset as u64,
                total_bytes: total as u64,
            });
            match progress.try_send(event) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!("progress for {} not read yet, skipping event", path);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("progress receiver for {} dropped, upload continues", path);
                }
            }

            if let Some(object) = object {
                info!("resumable upload of {} finished ({} bytes)", path, total);
                return Ok(object);
            }
        }
    }

    /// Start a resumable upload on a background task and return its handle
    pub fn upload_resumable(&self, path: &str, data: Bytes, options: Option<FileOptions>) -> UploadTask {
        let (tx, rx) = mpsc::channel(32);
        let client = self.parent.clone();
        let bucket_id = self.bucket_id.clone();
        let path = path.to_string();

        tokio::spawn(async move {
            let bucket = client.from(&bucket_id);
            let outcome = match bucket
                .upload_resumable_with_progress(&path, data, options, &tx)
                .await
            {
                Ok(object) => bucket.download_url(&object),
                Err(e) => Err(e),
            };
            let terminal = match outcome {
                Ok(url) => UploadEvent::Completed { url },
                Err(e) => {
                    warn!("resumable upload of {} failed: {}", path, e);
                    UploadEvent::Failed {
                        message: e.to_string(),
                    }
                }
            };
            // waits for room so the terminal event is never lost
            let _ = tx.send(terminal).await;
        });

        UploadTask::from_receiver(rx)
    }
}
