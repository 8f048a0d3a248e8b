//! Asset upload pipeline
//!
//! A seller stages a [`UploadDraft`], images are uploaded in the background as
//! they are added, and [`UploadPipeline::submit`] uploads every asset and
//! commits one record under the signed-in owner.

mod draft;

pub use draft::{ImageSource, LocalFile, PendingImages, ResolvedImage, StagedImage, StagedVideo, UploadDraft};
pub use rentify_storage::{UploadEvent, UploadProgress, UploadTask};

use std::sync::Arc;

use futures::future::try_join_all;
use log::{debug, error, info, warn};
use validator::Validate;

use crate::error::{Error, Result};
use crate::listing::properties_path;
use crate::property::PropertyRecord;
use crate::services::{BlobStore, DocumentStore};
use crate::session::SessionContext;

pub const UPLOAD_SUCCESS: &str = "Property uploaded successfully!";
pub const VIDEO_UPLOAD_SUCCESS: &str = "Video uploaded successfully!";

pub fn image_path(name: &str) -> String {
    format!("properties/images/{}", name)
}

pub fn video_path(name: &str) -> String {
    format!("properties/videos/{}", name)
}

fn as_upload_error(err: Error) -> Error {
    match err {
        Error::Upload(_) => err,
        other => Error::upload(other),
    }
}

pub struct UploadPipeline {
    blobs: Arc<dyn BlobStore>,
    store: Arc<dyn DocumentStore>,
    max_images: usize,
}

impl UploadPipeline {
    pub fn new(blobs: Arc<dyn BlobStore>, store: Arc<dyn DocumentStore>, max_images: usize) -> Self {
        Self {
            blobs,
            store,
            max_images,
        }
    }

    pub fn max_images(&self) -> usize {
        self.max_images
    }

    /// Stage previews for `files` right away and start one upload per
    /// retained file. Files over the image limit are dropped silently.
    ///
    /// The draft is not touched by the uploads themselves; pass the joined
    /// results to [`UploadDraft::apply_resolved`].
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime, since each upload is
    /// spawned onto the current runtime.
    pub fn add_images(&self, draft: &mut UploadDraft, files: Vec<LocalFile>) -> PendingImages {
        let staged = draft.stage(files, self.max_images);
        let tasks = staged
            .into_iter()
            .map(|(preview_id, file)| {
                let blobs = Arc::clone(&self.blobs);
                let task = tokio::spawn(async move {
                    let path = image_path(&file.name);
                    let result = blobs.upload(&path, &file).await.map_err(as_upload_error);
                    if let Err(err) = &result {
                        warn!("image upload {} failed: {}", path, err);
                    }
                    result
                });
                (preview_id, task)
            })
            .collect();
        PendingImages::new(tasks)
    }

    /// Start a resumable upload of the staged video, if any.
    ///
    /// Runs on its own task and cannot be cancelled. Record the final URL
    /// with [`UploadDraft::set_video_url`].
    pub async fn upload_video_resumable(&self, draft: &UploadDraft) -> Option<UploadTask> {
        let video = draft.video()?;
        let path = video_path(&video.file.name);
        info!("starting resumable upload of {}", path);
        Some(self.blobs.upload_resumable(&path, &video.file).await)
    }

    /// Upload the video and images of `draft` and commit the listing.
    ///
    /// Nothing is sent without a signed-in owner or with an invalid form.
    /// A failed upload aborts before the record write; blobs uploaded up to
    /// that point stay in storage. The draft is left as it was.
    pub async fn submit(&self, session: &SessionContext, draft: &UploadDraft) -> Result<PropertyRecord> {
        let owner = session.require()?;
        draft.form.validate()?;

        let video_url = match draft.video() {
            Some(video) => {
                let path = video_path(&video.file.name);
                let url = self.blobs.upload(&path, &video.file).await.map_err(|err| {
                    error!("video upload {} failed: {}", path, err);
                    as_upload_error(err)
                })?;
                Some(url)
            }
            None => None,
        };

        let uploads = draft.images().iter().map(|image| {
            let path = image_path(&image.file.name);
            async move {
                self.blobs.upload(&path, &image.file).await.map_err(|err| {
                    error!("image upload {} failed: {}", path, err);
                    as_upload_error(err)
                })
            }
        });
        let images = try_join_all(uploads).await?;
        debug!("uploaded {} images", images.len());

        let record = PropertyRecord::new(draft.form.clone(), images, video_url);
        let document = record.to_document()?;
        let property_id = self
            .store
            .push(&properties_path(&owner.id), &document)
            .await
            .map_err(|err| {
                error!("failed to commit listing: {}", err);
                match err {
                    Error::Database(_) => err,
                    other => Error::database(other),
                }
            })?;

        info!("listing {}/{} committed", owner.id, property_id);
        Ok(record.with_ids(&owner.id, &property_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_paths() {
        assert_eq!(image_path("front.jpg"), "properties/images/front.jpg");
        assert_eq!(video_path("tour.mp4"), "properties/videos/tour.mp4");
    }
}
