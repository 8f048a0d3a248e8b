//! Rentify document store client
//!
//! Thin client for the Realtime Database REST API. Every location in the JSON
//! tree is addressed by a slash-separated path and read or written through
//! `{database_url}/{path}.json`.

use log::debug;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Errors returned by [`DatabaseClient`]
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

const FORBIDDEN_KEY_CHARS: [char; 5] = ['.', '#', '$', '[', ']'];

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Client for one database instance
#[derive(Debug, Clone)]
pub struct DatabaseClient {
    base_url: String,
    http_client: Client,
    auth: Option<String>,
}

/// A location in the database
pub struct DatabaseReference<'a> {
    parent: &'a DatabaseClient,
    path: String,
}

impl DatabaseClient {
    pub fn new(database_url: &str, http_client: Client) -> Self {
        Self {
            base_url: database_url.trim_end_matches('/').to_string(),
            http_client,
            auth: None,
        }
    }

    /// A copy of this client that sends `token` as the `auth` parameter
    pub fn with_auth(&self, token: Option<&str>) -> Self {
        Self {
            base_url: self.base_url.clone(),
            http_client: self.http_client.clone(),
            auth: token.map(str::to_string),
        }
    }

    /// Reference a location, e.g. `users/{uid}/properties`
    pub fn reference(&self, path: &str) -> Result<DatabaseReference<'_>> {
        let path = normalize_path(path)?;
        Ok(DatabaseReference { parent: self, path })
    }

    /// Each key is percent-encoded on its own; the last one carries `.json`
    fn url_for(&self, path: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| DatabaseError::InvalidPath(self.base_url.clone()))?;
            segments.pop_if_empty();
            match path.rsplit_once('/') {
                Some((parents, last)) => {
                    segments.extend(parents.split('/'));
                    segments.push(&format!("{}.json", last));
                }
                None => {
                    segments.push(&format!("{}.json", path));
                }
            }
        }
        if let Some(token) = &self.auth {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }

    async fn send(&self, method: Method, path: &str, body: Option<&serde_json::Value>) -> Result<reqwest::Response> {
        let url = self.url_for(path)?;
        debug!("{} /{}.json", method, path);

        let mut request = self.http_client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await?;
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);
            return Err(DatabaseError::ApiError { status, message });
        }

        Ok(response)
    }
}

fn normalize_path(path: &str) -> Result<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for segment in &segments {
        if segment.contains(&FORBIDDEN_KEY_CHARS[..]) {
            return Err(DatabaseError::InvalidPath(path.to_string()));
        }
    }
    Ok(segments.join("/"))
}

impl<'a> DatabaseReference<'a> {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment, `None` at the root
    pub fn key(&self) -> Option<&str> {
        self.path.rsplit('/').next().filter(|k| !k.is_empty())
    }

    /// Reference a descendant location
    pub fn child(&self, path: &str) -> Result<DatabaseReference<'a>> {
        let child = normalize_path(path)?;
        let path = if self.path.is_empty() {
            child
        } else {
            format!("{}/{}", self.path, child)
        };
        Ok(DatabaseReference {
            parent: self.parent,
            path,
        })
    }

    /// Raw JSON at this location; `Value::Null` when nothing is stored
    pub async fn get_value(&self) -> Result<serde_json::Value> {
        let response = self.parent.send(Method::GET, &self.path, None).await?;
        Ok(response.json::<serde_json::Value>().await?)
    }

    /// Typed read; `None` when nothing is stored
    pub async fn get<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self.get_value().await? {
            serde_json::Value::Null => Ok(None),
            value => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    /// Replace the data at this location
    pub async fn set<T: Serialize>(&self, value: &T) -> Result<()> {
        let body = serde_json::to_value(value)?;
        self.parent.send(Method::PUT, &self.path, Some(&body)).await?;
        Ok(())
    }

    /// Append under a server-generated, chronologically ordered key and return the key
    pub async fn push<T: Serialize>(&self, value: &T) -> Result<String> {
        let body = serde_json::to_value(value)?;
        let response = self.parent.send(Method::POST, &self.path, Some(&body)).await?;
        let pushed = response.json::<PushResponse>().await?;
        Ok(pushed.name)
    }

    /// Merge the given children into this location
    pub async fn update(&self, changes: &serde_json::Value) -> Result<()> {
        if !changes.is_object() {
            return Err(DatabaseError::InvalidPath(format!(
                "update at {} needs an object",
                self.path
            )));
        }
        self.parent.send(Method::PATCH, &self.path, Some(changes)).await?;
        Ok(())
    }

    /// Delete the data at this location
    pub async fn remove(&self) -> Result<()> {
        self.parent.send(Method::DELETE, &self.path, None).await?;
        Ok(())
    }
}
