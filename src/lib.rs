//! Rentify client library
//!
//! Client-side logic of a rental listing application running on a hosted
//! backend: browsing and filtering every listing, the seller's asset upload
//! pipeline, listing details, accounts and the seller's own listings.

pub mod account;
pub mod backend;
pub mod config;
pub mod details;
pub mod error;
pub mod interest;
pub mod listing;
pub mod property;
pub mod seller;
pub mod services;
pub mod session;
pub mod upload;

use std::sync::Arc;

use log::debug;
use reqwest::Client;
use url::Url;

use crate::account::AccountService;
use crate::backend::FirebaseBackend;
use crate::config::{ClientOptions, FirebaseConfig};
use crate::details::DetailService;
use crate::error::{Error, Result};
use crate::listing::ListingService;
use crate::seller::SellerListings;
use crate::session::SessionContext;
use crate::upload::UploadPipeline;

pub use rentify_auth::AuthClient;

/// The main entry point of the client
pub struct Rentify {
    /// Project configuration
    pub config: FirebaseConfig,
    /// HTTP client shared by every service
    pub http_client: Client,
    /// Client options
    pub options: ClientOptions,
    backend: Arc<FirebaseBackend>,
}

impl Rentify {
    /// Create a client with default options
    ///
    /// # Example
    ///
    /// ```
    /// use rentify::{config::FirebaseConfig, Rentify};
    ///
    /// let config = FirebaseConfig::from_json(r#"{
    ///     "apiKey": "your-api-key",
    ///     "databaseURL": "https://your-project-default-rtdb.firebaseio.com",
    ///     "projectId": "your-project",
    ///     "storageBucket": "your-project.appspot.com"
    /// }"#).unwrap();
    /// let rentify = Rentify::new(config).unwrap();
    /// ```
    pub fn new(config: FirebaseConfig) -> Result<Self> {
        Self::new_with_options(config, ClientOptions::default())
    }

    /// Create a client with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use rentify::{config::{ClientOptions, FirebaseConfig}, Rentify};
    ///
    /// let config = FirebaseConfig::from_json(r#"{
    ///     "apiKey": "your-api-key",
    ///     "databaseURL": "http://127.0.0.1:9000",
    ///     "projectId": "demo-rentify",
    ///     "storageBucket": "demo-rentify.appspot.com"
    /// }"#).unwrap();
    /// let options = ClientOptions::default()
    ///     .with_service_host("http://127.0.0.1:9099")
    ///     .with_page_size(24);
    /// let rentify = Rentify::new_with_options(config, options).unwrap();
    /// ```
    pub fn new_with_options(config: FirebaseConfig, options: ClientOptions) -> Result<Self> {
        Url::parse(&config.database_url).map_err(|e| Error::config(format!("invalid database URL: {}", e)))?;
        if config.api_key.is_empty() {
            return Err(Error::config("API key is empty"));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(Error::config)?;

        let backend = Arc::new(FirebaseBackend::new(&config, &options, http_client.clone()));
        debug!("client ready for project {}", config.project_id);

        Ok(Self {
            config,
            http_client,
            options,
            backend,
        })
    }

    /// Create a client from `RENTIFY_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(FirebaseConfig::from_env()?)
    }

    /// Get a reference to the auth client
    pub fn auth(&self) -> &AuthClient {
        self.backend.auth()
    }

    /// The backend implementing every service trait
    pub fn backend(&self) -> Arc<FirebaseBackend> {
        Arc::clone(&self.backend)
    }

    /// A session that follows sign-in and sign-out on this client
    pub fn session(&self) -> SessionContext {
        SessionContext::new(self.backend.as_ref())
    }

    pub fn listings(&self) -> ListingService {
        ListingService::new(self.backend.clone(), self.options.page_size)
    }

    pub fn uploads(&self) -> UploadPipeline {
        UploadPipeline::new(self.backend.clone(), self.backend.clone(), self.options.max_images)
    }

    pub fn details(&self) -> DetailService {
        DetailService::new(self.backend.clone(), self.options.missing_record_policy)
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.backend.clone(), self.backend.clone())
    }

    pub fn seller(&self) -> SellerListings {
        SellerListings::new(self.backend.clone())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::account::{Landing, LoginForm, RegistrationForm, Role};
    pub use crate::config::{ClientOptions, FirebaseConfig, MissingRecordPolicy};
    pub use crate::details::{format_price, ListingCard, PropertyDetails};
    pub use crate::error::{Error, Notice, NoticeLevel};
    pub use crate::interest::{express_interest, InterestRequest};
    pub use crate::listing::{FilterField, FilterState, ListingQuery, PriceRange};
    pub use crate::property::{PropertyForm, PropertyRecord};
    pub use crate::seller::PropertyUpdate;
    pub use crate::services::{BlobStore, DocumentStore, Identity, IdentityProvider};
    pub use crate::session::SessionContext;
    pub use crate::upload::{LocalFile, UploadDraft, UploadEvent};
    pub use crate::Rentify;
}
