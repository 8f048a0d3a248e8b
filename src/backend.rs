//! Service traits backed by the hosted REST APIs

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use rentify_auth::{AuthClient, AuthError, AuthOptions, AuthStateChange};
use rentify_database::DatabaseClient;
use rentify_storage::{FileOptions, StorageClient, UploadTask};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::config::{ClientOptions, FirebaseConfig};
use crate::error::{Error, Result};
use crate::services::{BlobStore, DocumentStore, Identity, IdentityProvider};
use crate::upload::LocalFile;

/// Auth, database and storage clients for one project.
///
/// Database and storage calls carry the id token of whatever session the
/// auth client holds at the moment of the call.
pub struct FirebaseBackend {
    auth: AuthClient,
    database: DatabaseClient,
    storage: StorageClient,
    bucket: String,
}

impl FirebaseBackend {
    pub fn new(config: &FirebaseConfig, options: &ClientOptions, http_client: Client) -> Self {
        let auth_options = AuthOptions {
            identity_url: options.identity_url.clone(),
            token_url: options.token_url.clone(),
        };
        Self {
            auth: AuthClient::new(&config.api_key, http_client.clone(), auth_options),
            database: DatabaseClient::new(&config.database_url, http_client.clone()),
            storage: StorageClient::new(&options.storage_url, http_client).with_chunk_size(options.chunk_size),
            bucket: config.storage_bucket.clone(),
        }
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// Token of the current session, refreshed first when it has expired.
    /// A failed refresh falls back to the stale token and the call is left
    /// to the server to reject.
    async fn id_token(&self) -> Option<String> {
        let session = self.auth.get_session()?;
        if !session.is_expired() {
            return Some(session.id_token);
        }
        debug!("id token of {} expired, refreshing", session.user.id);
        match self.auth.refresh_session().await {
            Ok(refreshed) => Some(refreshed.id_token),
            Err(err) => {
                warn!("token refresh failed: {}", err);
                Some(session.id_token)
            }
        }
    }

    async fn database(&self) -> DatabaseClient {
        self.database.with_auth(self.id_token().await.as_deref())
    }

    async fn storage(&self) -> StorageClient {
        self.storage.with_auth(self.id_token().await.as_deref())
    }
}

fn sign_in_error(email: &str, err: AuthError) -> Error {
    if err.is_email_exists() {
        return Error::DuplicateIdentity(email.to_string());
    }
    error!("authentication failed: {}", err);
    Error::auth(err)
}

#[async_trait]
impl IdentityProvider for FirebaseBackend {
    fn current_identity(&self) -> Option<Identity> {
        self.auth.current_user().map(Identity::from)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.auth.on_auth_state_change()
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let session = self
            .auth
            .sign_up(email, password)
            .await
            .map_err(|e| sign_in_error(email, e))?;
        Ok(session.user.into())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let session = self
            .auth
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| sign_in_error(email, e))?;
        Ok(session.user.into())
    }

    async fn set_display_name(&self, display_name: &str) -> Result<Identity> {
        let user = self.auth.update_profile(display_name).await.map_err(|e| match e {
            AuthError::MissingSession => Error::Unauthenticated,
            other => Error::auth(other),
        })?;
        Ok(user.into())
    }

    fn sign_out(&self) -> Result<()> {
        self.auth.sign_out().map_err(|e| match e {
            AuthError::MissingSession => Error::Unauthenticated,
            other => Error::auth(other),
        })
    }
}

#[async_trait]
impl DocumentStore for FirebaseBackend {
    async fn read(&self, path: &str) -> Result<Option<Value>> {
        let database = self.database().await;
        let reference = database.reference(path).map_err(Error::fetch)?;
        match reference.get_value().await.map_err(Error::fetch)? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    async fn write(&self, path: &str, value: &Value) -> Result<()> {
        let database = self.database().await;
        let reference = database.reference(path).map_err(Error::database)?;
        reference.set(value).await.map_err(Error::database)
    }

    async fn push(&self, path: &str, value: &Value) -> Result<String> {
        let database = self.database().await;
        let reference = database.reference(path).map_err(Error::database)?;
        let key = reference.push(value).await.map_err(Error::database)?;
        debug!("pushed {}/{}", path, key);
        Ok(key)
    }

    async fn update(&self, path: &str, changes: &Value) -> Result<()> {
        let database = self.database().await;
        let reference = database.reference(path).map_err(Error::database)?;
        reference.update(changes).await.map_err(Error::database)
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let database = self.database().await;
        let reference = database.reference(path).map_err(Error::database)?;
        reference.remove().await.map_err(Error::database)
    }
}

#[async_trait]
impl BlobStore for FirebaseBackend {
    async fn upload(&self, path: &str, file: &LocalFile) -> Result<String> {
        let storage = self.storage().await;
        let bucket = storage.from(&self.bucket);
        let options = FileOptions::new().with_content_type(&file.content_type);
        let object = bucket
            .upload(path, file.data.clone(), Some(options))
            .await
            .map_err(Error::upload)?;
        // the upload response already carries the download token
        match bucket.download_url(&object) {
            Ok(url) => Ok(url),
            Err(_) => bucket.get_download_url(path).await.map_err(Error::upload),
        }
    }

    async fn upload_resumable(&self, path: &str, file: &LocalFile) -> UploadTask {
        let storage = self.storage().await;
        let options = FileOptions::new().with_content_type(&file.content_type);
        storage
            .from(&self.bucket)
            .upload_resumable(path, file.data.clone(), Some(options))
    }
}
