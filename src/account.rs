//! Registration, sign-in and the role stored with each user

use std::fmt;
use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::error::{Error, Result};
use crate::listing::USERS_PATH;
use crate::property::is_phone_number;
use crate::services::{DocumentStore, Identity, IdentityProvider};

pub const REGISTRATION_SUCCESS: &str = "Registration successful!";
pub const LOGIN_SUCCESS: &str = "Login successful!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Buyer,
    Seller,
    /// Anything else found in the store
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
            Role::Unknown => "unknown",
        }
    }

    fn from_value(value: Option<Value>) -> Self {
        match value.as_ref().and_then(Value::as_str) {
            Some("buyer") => Role::Buyer,
            Some("seller") => Role::Seller,
            _ => Role::Unknown,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(
        length(min = 1, message = "Phone number is required"),
        custom = "validate_phone_number"
    )]
    pub phone_number: String,
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email address is invalid")
    )]
    pub email: String,
    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email address is invalid")
    )]
    pub email: String,
    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,
}

fn validate_phone_number(value: &str) -> std::result::Result<(), ValidationError> {
    // emptiness is reported by the length check
    if value.is_empty() || is_phone_number(value) {
        return Ok(());
    }
    let mut err = ValidationError::new("phone");
    err.message = Some("Phone number is invalid".into());
    Err(err)
}

/// Profile document at `users/{uid}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: Role,
}

/// Where a freshly signed-in user goes
#[derive(Debug, Clone, PartialEq)]
pub struct Landing {
    pub identity: Identity,
    pub role: Role,
}

impl Landing {
    /// `None` when the stored role is not recognised
    pub fn route(&self) -> Option<&'static str> {
        match self.role {
            Role::Buyer => Some("/"),
            Role::Seller => Some("/seller"),
            Role::Unknown => None,
        }
    }
}

pub struct AccountService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
}

impl AccountService {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self { identity, store }
    }

    /// Create the account, set its display name and store the profile.
    ///
    /// Invalid forms are rejected before anything is sent.
    pub async fn register(&self, form: &RegistrationForm) -> Result<UserProfile> {
        form.validate()?;

        let identity = self.identity.sign_up(&form.email, &form.password).await?;
        let display_name = format!("{} {}", form.first_name, form.last_name);
        self.identity.set_display_name(&display_name).await?;

        let profile = UserProfile {
            uid: identity.id.clone(),
            email: form.email.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            phone_number: form.phone_number.clone(),
            role: form.role,
        };
        let path = format!("{}/{}", USERS_PATH, identity.id);
        self.store.write(&path, &serde_json::to_value(&profile)?).await?;

        info!("registered {} as {}", identity.id, profile.role);
        Ok(profile)
    }

    /// Sign in and look up the stored role
    pub async fn sign_in(&self, form: &LoginForm) -> Result<Landing> {
        form.validate()?;

        let identity = self.identity.sign_in(&form.email, &form.password).await?;
        let path = format!("{}/{}/role", USERS_PATH, identity.id);
        let role = Role::from_value(self.store.read(&path).await?);
        if role == Role::Unknown {
            warn!("user {} has no known role", identity.id);
        }
        Ok(Landing { identity, role })
    }

    pub fn sign_out(&self) -> Result<()> {
        self.identity.sign_out()
    }

    /// The stored profile, `None` for accounts without one
    pub async fn profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        let path = format!("{}/{}", USERS_PATH, uid);
        match self.store.read(&path).await? {
            Some(value) => Ok(Some(
                serde_json::from_value(value).map_err(|err| Error::fetch(format!("malformed profile: {}", err)))?,
            )),
            None => Ok(None),
        }
    }
}
