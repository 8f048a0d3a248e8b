//! Rentify authentication client
//!
//! Email/password accounts on top of the Identity Toolkit REST API: sign up,
//! sign in, profile updates, token refresh and local sign out. The current
//! session is kept in memory and every change is broadcast to subscribers.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;
use url::Url;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors returned by [`AuthClient`]
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Missing session")]
    MissingSession,

    #[error("Invalid token response: {0}")]
    InvalidToken(String),
}

impl AuthError {
    /// The Identity Toolkit error code, e.g. `EMAIL_EXISTS`
    pub fn code(&self) -> Option<&str> {
        match self {
            // Messages look like "WEAK_PASSWORD : Password should be at least 6 characters"
            Self::ApiError { message, .. } => message.split(|c: char| c == ' ' || c == ':').next(),
            _ => None,
        }
    }

    pub fn is_email_exists(&self) -> bool {
        self.code() == Some("EMAIL_EXISTS")
    }

    pub fn is_invalid_credentials(&self) -> bool {
        matches!(
            self.code(),
            Some("EMAIL_NOT_FOUND") | Some("INVALID_PASSWORD") | Some("INVALID_LOGIN_CREDENTIALS")
        )
    }
}

/// A signed-in account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Tokens for the signed-in user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Notification sent whenever the current session changes
#[derive(Debug, Clone, PartialEq)]
pub enum AuthStateChange {
    SignedIn(User),
    UserUpdated(User),
    SignedOut,
}

/// Endpoints used by the client
#[derive(Debug, Clone)]
pub struct AuthOptions {
    pub identity_url: String,
    pub token_url: String,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            identity_url: "https://identitytoolkit.googleapis.com".to_string(),
            token_url: "https://securetoken.googleapis.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<ProfileResponse>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn expires_at(expires_in: &str) -> Result<DateTime<Utc>> {
    let seconds: i64 = expires_in
        .parse()
        .map_err(|_| AuthError::InvalidToken(format!("bad expiresIn: {}", expires_in)))?;
    Ok(Utc::now() + Duration::seconds(seconds))
}

/// Identity Toolkit client
pub struct AuthClient {
    api_key: String,
    http_client: Client,
    options: AuthOptions,
    current_session: Arc<RwLock<Option<Session>>>,
    state_change: broadcast::Sender<AuthStateChange>,
}

impl AuthClient {
    pub fn new(api_key: &str, http_client: Client, options: AuthOptions) -> Self {
        let (state_change, _) = broadcast::channel(16);
        Self {
            api_key: api_key.to_string(),
            http_client,
            options,
            current_session: Arc::new(RwLock::new(None)),
            state_change,
        }
    }

    fn accounts_url(&self, action: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/v1/accounts:{}", self.options.identity_url, action))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn post_json<T: DeserializeOwned>(&self, url: Url, payload: &serde_json::Value) -> Result<T> {
        debug!("POST {}", url.path());
        let response = self.http_client.post(url).json(payload).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            let message = serde_json::from_str::<ErrorEnvelope>(&error_text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(error_text);
            return Err(AuthError::ApiError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }

    fn store_session(&self, session: Session, event: AuthStateChange) {
        {
            let mut write_guard = self.current_session.write().unwrap_or_else(|e| e.into_inner());
            *write_guard = Some(session);
        }
        self.notify(event);
    }

    fn notify(&self, event: AuthStateChange) {
        // No receivers is fine: nobody is watching the session yet
        if self.state_change.send(event).is_err() {
            debug!("auth state change dropped, no subscribers");
        }
    }

    fn session_from_tokens(tokens: TokenResponse) -> Result<Session> {
        Ok(Session {
            expires_at: expires_at(&tokens.expires_in)?,
            id_token: tokens.id_token,
            refresh_token: tokens.refresh_token,
            user: User {
                id: tokens.local_id,
                email: tokens.email,
                display_name: tokens.display_name.filter(|name| !name.is_empty()),
            },
        })
    }

    /// Create an account and sign it in
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let url = self.accounts_url("signUp")?;
        let payload = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let tokens: TokenResponse = self.post_json(url, &payload).await?;
        let session = Self::session_from_tokens(tokens)?;
        info!("signed up {}", session.user.id);
        self.store_session(session.clone(), AuthStateChange::SignedIn(session.user.clone()));
        Ok(session)
    }

    /// Sign in with email and password
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let url = self.accounts_url("signInWithPassword")?;
        let payload = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let tokens: TokenResponse = self.post_json(url, &payload).await?;
        let session = Self::session_from_tokens(tokens)?;
        info!("signed in {}", session.user.id);
        self.store_session(session.clone(), AuthStateChange::SignedIn(session.user.clone()));
        Ok(session)
    }

    /// Set the display name of the signed-in user
    pub async fn update_profile(&self, display_name: &str) -> Result<User> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;
        let url = self.accounts_url("update")?;
        let payload = serde_json::json!({
            "idToken": session.id_token,
            "displayName": display_name,
            "returnSecureToken": true,
        });

        let profile: ProfileResponse = self.post_json(url, &payload).await?;
        let user = User {
            id: profile.local_id,
            email: profile.email.or(session.user.email.clone()),
            display_name: profile.display_name.filter(|name| !name.is_empty()),
        };

        let mut updated = session;
        updated.user = user.clone();
        if let (Some(id_token), Some(refresh_token), Some(expires_in)) =
            (profile.id_token, profile.refresh_token, profile.expires_in)
        {
            updated.expires_at = expires_at(&expires_in)?;
            updated.id_token = id_token;
            updated.refresh_token = refresh_token;
        }
        self.store_session(updated, AuthStateChange::UserUpdated(user.clone()));
        Ok(user)
    }

    /// Fetch the signed-in user's account from the server
    pub async fn get_user(&self) -> Result<User> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;
        let url = self.accounts_url("lookup")?;
        let payload = serde_json::json!({ "idToken": session.id_token });

        let lookup: LookupResponse = self.post_json(url, &payload).await?;
        let profile = lookup
            .users
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::InvalidToken("lookup returned no users".to_string()))?;

        Ok(User {
            id: profile.local_id,
            email: profile.email,
            display_name: profile.display_name.filter(|name| !name.is_empty()),
        })
    }

    /// Exchange the refresh token for a new id token
    pub async fn refresh_session(&self) -> Result<Session> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;
        let mut url = Url::parse(&format!("{}/v1/token", self.options.token_url))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);

        debug!("POST {}", url.path());
        let response = self
            .http_client
            .post(url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ])
            .send()
            .await?;
        let refreshed: RefreshResponse = Self::decode(response).await?;

        let new_session = Session {
            expires_at: expires_at(&refreshed.expires_in)?,
            id_token: refreshed.id_token,
            refresh_token: refreshed.refresh_token,
            user: session.user,
        };

        let mut write_guard = self.current_session.write().unwrap_or_else(|e| e.into_inner());
        *write_guard = Some(new_session.clone());
        Ok(new_session)
    }

    /// Forget the current session. Identity Toolkit has no server-side logout.
    pub fn sign_out(&self) -> Result<()> {
        let previous = {
            let mut write_guard = self.current_session.write().unwrap_or_else(|e| e.into_inner());
            write_guard.take()
        };
        match previous {
            Some(session) => {
                info!("signed out {}", session.user.id);
                self.notify(AuthStateChange::SignedOut);
                Ok(())
            }
            None => {
                warn!("sign out without a session");
                Err(AuthError::MissingSession)
            }
        }
    }

    pub fn get_session(&self) -> Option<Session> {
        let read_guard = self.current_session.read().unwrap_or_else(|e| e.into_inner());
        read_guard.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.get_session().map(|session| session.user)
    }

    /// Install a session obtained elsewhere (restored from disk, tests)
    pub fn set_session(&self, session: Session) {
        let user = session.user.clone();
        self.store_session(session, AuthStateChange::SignedIn(user));
    }

    /// Receiver for session changes made after this call
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthStateChange> {
        self.state_change.subscribe()
    }
}
