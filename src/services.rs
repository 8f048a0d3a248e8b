//! Seams to the hosted services
//!
//! Listing and upload logic only talks to these traits. [`FirebaseBackend`]
//! implements all three on top of the REST clients.
//!
//! [`FirebaseBackend`]: crate::backend::FirebaseBackend

use async_trait::async_trait;
use rentify_auth::{AuthStateChange, User};
use rentify_storage::UploadTask;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::upload::LocalFile;

/// The signed-in person as the rest of the crate sees them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            email: None,
            display_name: None,
        }
    }
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
        }
    }
}

/// Authentication service
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;

    /// Session changes made after this call
    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;

    async fn set_display_name(&self, display_name: &str) -> Result<Identity>;

    fn sign_out(&self) -> Result<()>;
}

/// Path-addressed JSON document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// `None` when nothing is stored at `path`
    async fn read(&self, path: &str) -> Result<Option<Value>>;

    async fn write(&self, path: &str, value: &Value) -> Result<()>;

    /// Store `value` under a new generated child key of `path` and return the key
    async fn push(&self, path: &str, value: &Value) -> Result<String>;

    async fn update(&self, path: &str, changes: &Value) -> Result<()>;

    async fn remove(&self, path: &str) -> Result<()>;
}

/// Path-addressed binary object store
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// One-shot upload, resolved to a durable URL
    async fn upload(&self, path: &str, file: &LocalFile) -> Result<String>;

    /// Chunked upload on a background task
    async fn upload_resumable(&self, path: &str, file: &LocalFile) -> UploadTask;
}
