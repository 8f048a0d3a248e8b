//! The signed-in seller's own listings

use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::listing::{owner_records, properties_path};
use crate::property::PropertyRecord;
use crate::services::DocumentStore;
use crate::session::SessionContext;

/// Scalar fields to change on an existing listing; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub furnished: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_friendly: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amenities: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}

impl PropertyUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, value: &str) -> Self {
        self.title = Some(value.to_string());
        self
    }

    pub fn with_rent_price(mut self, value: &str) -> Self {
        self.rent_price = Some(value.to_string());
        self
    }

    pub fn with_furnished(mut self, value: &str) -> Self {
        self.furnished = Some(value.to_string());
        self
    }

    pub fn with_pet_friendly(mut self, value: &str) -> Self {
        self.pet_friendly = Some(value.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub struct SellerListings {
    store: Arc<dyn DocumentStore>,
}

impl SellerListings {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Listings of the signed-in owner
    pub async fn mine(&self, session: &SessionContext) -> Result<Vec<PropertyRecord>> {
        let owner = session.require()?;
        let properties = self.store.read(&properties_path(&owner.id)).await.map_err(|err| match err {
            Error::Fetch(_) => err,
            other => Error::fetch(other),
        })?;
        Ok(properties
            .map(|properties| owner_records(&owner.id, properties))
            .unwrap_or_default())
    }

    pub async fn update(&self, session: &SessionContext, property_id: &str, changes: &PropertyUpdate) -> Result<()> {
        let owner = session.require()?;
        if property_id.is_empty() {
            return Err(Error::InvalidArgument("property id is required".to_string()));
        }
        if changes.is_empty() {
            return Ok(());
        }
        let path = format!("{}/{}", properties_path(&owner.id), property_id);
        self.store.update(&path, &serde_json::to_value(changes)?).await?;
        info!("updated listing {}", path);
        Ok(())
    }

    /// Remove the listing record. Its images and video stay in storage.
    pub async fn delete(&self, session: &SessionContext, property_id: &str) -> Result<()> {
        let owner = session.require()?;
        if property_id.is_empty() {
            return Err(Error::InvalidArgument("property id is required".to_string()));
        }
        let path = format!("{}/{}", properties_path(&owner.id), property_id);
        self.store.remove(&path).await?;
        info!("deleted listing {}", path);
        Ok(())
    }
}
