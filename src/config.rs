//! Configuration for the Rentify client

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Error;

/// Web app configuration of the hosted project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseConfig {
    pub api_key: String,
    #[serde(default)]
    pub auth_domain: String,
    #[serde(alias = "databaseURL")]
    pub database_url: String,
    pub project_id: String,
    pub storage_bucket: String,
    #[serde(default)]
    pub messaging_sender_id: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
}

impl FirebaseConfig {
    /// Load from `RENTIFY_*` environment variables, reading `.env` first if present
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        fn required(name: &str) -> Result<String, Error> {
            std::env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| Error::config(format!("{} environment variable not found", name)))
        }

        let project_id = required("RENTIFY_PROJECT_ID")?;
        let auth_domain = std::env::var("RENTIFY_AUTH_DOMAIN")
            .unwrap_or_else(|_| format!("{}.firebaseapp.com", project_id));

        Ok(Self {
            api_key: required("RENTIFY_API_KEY")?,
            auth_domain,
            database_url: required("RENTIFY_DATABASE_URL")?,
            storage_bucket: required("RENTIFY_STORAGE_BUCKET")?,
            project_id,
            messaging_sender_id: std::env::var("RENTIFY_MESSAGING_SENDER_ID").ok(),
            app_id: std::env::var("RENTIFY_APP_ID").ok(),
        })
    }

    /// Parse the JSON object a web app is configured with
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

/// What detail resolution returns for a listing that does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingRecordPolicy {
    /// An all-empty record, as the listing page always did
    #[default]
    EmptyDefaults,
    /// `Error::NotFound`
    NotFound,
}

/// Client behaviour and service endpoints
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// HTTP request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,

    /// Listings per page
    pub page_size: usize,

    /// Images a draft may hold
    pub max_images: usize,

    /// Chunk size for resumable uploads
    pub chunk_size: usize,

    pub identity_url: String,
    pub token_url: String,
    pub storage_url: String,

    pub missing_record_policy: MissingRecordPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: None,
            page_size: 12,
            max_images: 6,
            chunk_size: rentify_storage::DEFAULT_CHUNK_SIZE,
            identity_url: "https://identitytoolkit.googleapis.com".to_string(),
            token_url: "https://securetoken.googleapis.com".to_string(),
            storage_url: "https://firebasestorage.googleapis.com".to_string(),
            missing_record_policy: MissingRecordPolicy::EmptyDefaults,
        }
    }
}

impl ClientOptions {
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    pub fn with_page_size(mut self, value: usize) -> Self {
        self.page_size = value.max(1);
        self
    }

    pub fn with_max_images(mut self, value: usize) -> Self {
        self.max_images = value;
        self
    }

    pub fn with_chunk_size(mut self, value: usize) -> Self {
        self.chunk_size = value.max(1);
        self
    }

    /// Point identity, token and storage endpoints at one host (emulators, tests)
    pub fn with_service_host(mut self, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        self.identity_url = base_url.to_string();
        self.token_url = base_url.to_string();
        self.storage_url = base_url.to_string();
        self
    }

    pub fn with_identity_url(mut self, value: &str) -> Self {
        self.identity_url = value.to_string();
        self
    }

    pub fn with_storage_url(mut self, value: &str) -> Self {
        self.storage_url = value.to_string();
        self
    }

    pub fn with_missing_record_policy(mut self, value: MissingRecordPolicy) -> Self {
        self.missing_record_policy = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_config_json() {
        let config = FirebaseConfig::from_json(
            r#"{
                "apiKey": "key",
                "authDomain": "rentify-demo.firebaseapp.com",
                "databaseURL": "https://rentify-demo-default-rtdb.firebaseio.com",
                "projectId": "rentify-demo",
                "storageBucket": "rentify-demo.appspot.com",
                "appId": "1:2:web:3"
            }"#,
        )
        .unwrap();
        assert_eq!(config.database_url, "https://rentify-demo-default-rtdb.firebaseio.com");
        assert_eq!(config.app_id.as_deref(), Some("1:2:web:3"));

        let config = FirebaseConfig::from_json(
            r#"{
                "apiKey": "key",
                "databaseUrl": "https://rentify-demo-default-rtdb.firebaseio.com",
                "projectId": "rentify-demo",
                "storageBucket": "rentify-demo.appspot.com"
            }"#,
        )
        .unwrap();
        assert_eq!(config.storage_bucket, "rentify-demo.appspot.com");
        assert!(config.auth_domain.is_empty());
        assert!(config.app_id.is_none());
    }

    #[test]
    fn test_options_builder() {
        let options = ClientOptions::default()
            .with_page_size(0)
            .with_service_host("http://127.0.0.1:9099/")
            .with_missing_record_policy(MissingRecordPolicy::NotFound);
        assert_eq!(options.page_size, 1);
        assert_eq!(options.identity_url, "http://127.0.0.1:9099");
        assert_eq!(options.storage_url, "http://127.0.0.1:9099");
        assert_eq!(options.max_images, 6);
        assert!(options.request_timeout.is_none());
    }
}
