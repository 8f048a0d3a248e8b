//! Listing query engine
//!
//! Every listing lives under its owner's node, so browsing reads the whole
//! `users` collection once, flattens it and filters on the client.

mod filter;
mod pagination;
mod query;

pub use filter::{
    apply_filters, FilterField, FilterState, PriceRange, LEASE_DURATIONS, PRICE_OPTIONS, PROPERTY_TYPES,
    ROOM_OPTIONS, YES_NO_OPTIONS,
};
pub use pagination::{paginate, total_pages, PaginationState};
pub use query::ListingQuery;

use std::sync::Arc;

use log::{debug, error, info, warn};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::property::PropertyRecord;
use crate::services::DocumentStore;

pub(crate) const USERS_PATH: &str = "users";

pub(crate) fn properties_path(owner_id: &str) -> String {
    format!("{}/{}/properties", USERS_PATH, owner_id)
}

/// Reads listings of every owner
pub struct ListingService {
    store: Arc<dyn DocumentStore>,
    page_size: usize,
}

impl ListingService {
    pub fn new(store: Arc<dyn DocumentStore>, page_size: usize) -> Self {
        Self { store, page_size }
    }

    /// All records of all owners, in the store's key order
    pub async fn load_all(&self) -> Result<Vec<PropertyRecord>> {
        let users = self.store.read(USERS_PATH).await.map_err(|err| {
            error!("failed to read listings: {}", err);
            match err {
                Error::Fetch(_) => err,
                other => Error::fetch(other),
            }
        })?;

        let Some(users) = users else {
            info!("no users stored yet");
            return Ok(Vec::new());
        };
        if !users.is_object() && !users.is_array() {
            return Err(Error::fetch(format!("unexpected users collection: {}", users)));
        }

        let records = flatten_users(users);
        debug!("loaded {} listings", records.len());
        Ok(records)
    }

    /// Load everything into a fresh [`ListingQuery`] with no filters
    pub async fn query(&self) -> Result<ListingQuery> {
        Ok(ListingQuery::with_records(self.page_size, self.load_all().await?))
    }
}

/// Flatten `users/{owner}/properties/{id}` into records tagged with both ids.
/// Documents that do not decode are skipped.
pub(crate) fn flatten_users(users: Value) -> Vec<PropertyRecord> {
    let mut records = Vec::new();
    for (owner_id, mut user) in children(users) {
        let Some(properties) = user.get_mut("properties").map(Value::take) else {
            continue;
        };
        records.extend(owner_records(&owner_id, properties));
    }
    records
}

pub(crate) fn owner_records(owner_id: &str, properties: Value) -> Vec<PropertyRecord> {
    children(properties)
        .into_iter()
        .filter_map(|(property_id, document)| {
            match PropertyRecord::from_document(owner_id, &property_id, document) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!("skipping listing {}/{}: {}", owner_id, property_id, err);
                    None
                }
            }
        })
        .collect()
}

// Objects keep their key order; arrays are keyed by index with holes skipped
fn children(value: Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, item)| !item.is_null())
            .map(|(index, item)| (index.to_string(), item))
            .collect(),
        _ => Vec::new(),
    }
}
