//! Error handling for the Rentify client

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for listing, upload and account operations
#[derive(Error, Debug)]
pub enum Error {
    /// Collection or point read failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The operation needs a signed-in identity
    #[error("Not signed in")]
    Unauthenticated,

    /// Local form validation failed; nothing was sent
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A blob upload or download-URL resolution failed
    #[error("Upload error: {0}")]
    Upload(String),

    /// Sign-up with an email that is already registered
    #[error("Email already in use: {0}")]
    DuplicateIdentity(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// A record write, update or delete failed
    #[error("Database error: {0}")]
    Database(String),

    #[error("Listing {owner_id}/{property_id} not found")]
    NotFound { owner_id: String, property_id: String },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn fetch<T: fmt::Display>(msg: T) -> Self {
        Error::Fetch(msg.to_string())
    }

    pub fn upload<T: fmt::Display>(msg: T) -> Self {
        Error::Upload(msg.to_string())
    }

    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    pub fn database<T: fmt::Display>(msg: T) -> Self {
        Error::Database(msg.to_string())
    }

    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// The notification a user sees for this error
    pub fn notice(&self) -> Notice {
        let message = match self {
            Error::Unauthenticated => "You must be logged in to upload properties.".to_string(),
            Error::Upload(_) | Error::Database(_) => "Upload failed. Please try again.".to_string(),
            Error::DuplicateIdentity(_) => {
                "Email is already in use. Please use a different email.".to_string()
            }
            Error::Auth(_) => "User doesn't exist. Please get registered first.".to_string(),
            Error::Validation(errors) => first_validation_message(errors)
                .unwrap_or_else(|| "Please check the highlighted fields.".to_string()),
            Error::NotFound { .. } => "This listing is no longer available.".to_string(),
            Error::Fetch(msg) => format!("Error: {}", msg),
            other => other.to_string(),
        };
        Notice::error(message)
    }
}

fn first_validation_message(errors: &validator::ValidationErrors) -> Option<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);
    fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
}

/// Severity of a [`Notice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A toast-style message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success<T: Into<String>>(message: T) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error<T: Into<String>>(message: T) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices() {
        assert_eq!(
            Error::upload("boom").notice(),
            Notice::error("Upload failed. Please try again.")
        );
        assert_eq!(
            Error::DuplicateIdentity("a@b.co".into()).notice().message,
            "Email is already in use. Please use a different email."
        );
        assert_eq!(Error::Unauthenticated.notice().level, NoticeLevel::Error);
        assert_eq!(Notice::success("Property uploaded successfully!").to_string(), "Property uploaded successfully!");
    }

    #[test]
    fn test_validation_notice_uses_field_message() {
        let mut errors = validator::ValidationErrors::new();
        let mut err = validator::ValidationError::new("length");
        err.message = Some("Title is required".into());
        errors.add("title", err);
        assert_eq!(Error::from(errors).notice().message, "Title is required");
    }
}
