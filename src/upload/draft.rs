//! Client-side state of a listing that has not been submitted yet

use std::path::Path;

use bytes::Bytes;
use log::debug;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::property::PropertyForm;

/// A file picked by the user, held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct LocalFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl LocalFile {
    pub fn new(name: &str, content_type: &str, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.to_string(),
            content_type: content_type.to_string(),
            data: data.into(),
        }
    }

    /// Read a file from disk; the content type is guessed from its extension
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::InvalidArgument(format!("not a file name: {}", path.display())))?;
        let data = tokio::fs::read(path).await?;
        Ok(Self::new(name, guess_content_type(name), data))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn guess_content_type(name: &str) -> &'static str {
    let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

/// Where a staged image can be shown from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Local preview, not uploaded yet
    Local(Uuid),
    /// Durable URL from the blob store
    Remote(String),
}

#[derive(Debug, Clone)]
pub struct StagedImage {
    pub file: LocalFile,
    pub source: ImageSource,
    preview_id: Uuid,
}

impl StagedImage {
    fn new(file: LocalFile) -> Self {
        let preview_id = Uuid::new_v4();
        Self {
            file,
            source: ImageSource::Local(preview_id),
            preview_id,
        }
    }

    pub fn preview_id(&self) -> Uuid {
        self.preview_id
    }

    pub fn url(&self) -> Option<&str> {
        match &self.source {
            ImageSource::Remote(url) => Some(url),
            ImageSource::Local(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StagedVideo {
    pub file: LocalFile,
    pub preview_id: Uuid,
    /// Set once a background upload of this file finished
    pub url: Option<String>,
}

/// Outcome of one image upload started by `add_images`
#[derive(Debug)]
pub struct ResolvedImage {
    pub preview_id: Uuid,
    pub result: Result<String>,
}

/// Uploads started by `add_images`, one per retained file, in add order
pub struct PendingImages {
    tasks: Vec<(Uuid, JoinHandle<Result<String>>)>,
}

impl PendingImages {
    pub(crate) fn new(tasks: Vec<(Uuid, JoinHandle<Result<String>>)>) -> Self {
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every upload. Results come back in add order whatever order
    /// the uploads finished in.
    pub async fn join(self) -> Vec<ResolvedImage> {
        let mut resolved = Vec::with_capacity(self.tasks.len());
        for (preview_id, task) in self.tasks {
            let result = match task.await {
                Ok(result) => result,
                Err(err) => Err(Error::upload(format!("image upload task failed: {}", err))),
            };
            resolved.push(ResolvedImage { preview_id, result });
        }
        resolved
    }
}

/// Form fields plus staged media
#[derive(Debug, Clone, Default)]
pub struct UploadDraft {
    pub form: PropertyForm,
    images: Vec<StagedImage>,
    video: Option<StagedVideo>,
}

impl UploadDraft {
    pub fn new(form: PropertyForm) -> Self {
        Self {
            form,
            images: Vec::new(),
            video: None,
        }
    }

    pub fn images(&self) -> &[StagedImage] {
        &self.images
    }

    pub fn video(&self) -> Option<&StagedVideo> {
        self.video.as_ref()
    }

    /// Stage previews for `files` without uploading them, keeping at most
    /// `max` images overall. Submitting uploads every staged image.
    pub fn stage_images(&mut self, files: Vec<LocalFile>, max: usize) -> Vec<Uuid> {
        self.stage(files, max).into_iter().map(|(preview_id, _)| preview_id).collect()
    }

    /// Like `stage_images`, also returning the retained files for upload
    pub(crate) fn stage(&mut self, files: Vec<LocalFile>, max: usize) -> Vec<(Uuid, LocalFile)> {
        let room = max.saturating_sub(self.images.len());
        if files.len() > room {
            debug!("dropping {} images over the limit of {}", files.len() - room, max);
        }
        files
            .into_iter()
            .take(room)
            .map(|file| {
                let image = StagedImage::new(file);
                let staged = (image.preview_id, image.file.clone());
                self.images.push(image);
                staged
            })
            .collect()
    }

    /// Swap previews for durable URLs. Images removed in the meantime are
    /// ignored; failed uploads keep their preview and are returned.
    pub fn apply_resolved(&mut self, resolved: Vec<ResolvedImage>) -> Vec<ResolvedImage> {
        let mut failures = Vec::new();
        for image in resolved {
            match image.result {
                Ok(url) => {
                    if let Some(staged) = self.images.iter_mut().find(|s| s.preview_id == image.preview_id) {
                        staged.source = ImageSource::Remote(url);
                    }
                }
                Err(_) => failures.push(image),
            }
        }
        failures
    }

    /// Remove the image at `index`; out of range is a no-op
    pub fn remove_image(&mut self, index: usize) -> Option<StagedImage> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }

    /// Stage `file` as the video, replacing any previous one
    pub fn set_video(&mut self, file: LocalFile) -> Uuid {
        let preview_id = Uuid::new_v4();
        self.video = Some(StagedVideo {
            file,
            preview_id,
            url: None,
        });
        preview_id
    }

    /// Record the durable URL of the staged video; false when none is staged
    pub fn set_video_url(&mut self, url: &str) -> bool {
        match self.video.as_mut() {
            Some(video) => {
                video.url = Some(url.to_string());
                true
            }
            None => false,
        }
    }

    pub fn clear_video(&mut self) -> Option<StagedVideo> {
        self.video.take()
    }
}
