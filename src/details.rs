//! Single listing lookups for the detail page and listing cards

use std::sync::Arc;

use log::{debug, error, info};

use crate::config::MissingRecordPolicy;
use crate::error::{Error, Result};
use crate::listing::properties_path;
use crate::property::{parse_number, PropertyRecord};
use crate::services::DocumentStore;

/// What the detail page shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDetails {
    pub owner_id: String,
    pub property_id: String,
    pub title: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub area: String,
    pub rent_price: String,
    pub amenities: Vec<String>,
    pub seller_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub images: Vec<String>,
    pub video_url: Option<String>,
}

impl PropertyDetails {
    /// True for the placeholder returned when a listing does not exist
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<PropertyRecord> for PropertyDetails {
    fn from(record: PropertyRecord) -> Self {
        let amenities = record.form.amenity_list();
        let form = record.form;
        Self {
            owner_id: record.owner_id,
            property_id: record.property_id,
            title: form.title,
            description: form.description,
            address: form.address,
            city: form.city,
            state: form.state,
            zip: form.zip,
            bedrooms: form.bedrooms,
            bathrooms: form.bathrooms,
            area: form.area,
            rent_price: form.rent_price,
            amenities,
            seller_name: form.seller_name,
            contact_email: form.contact_email,
            contact_phone: form.contact_phone,
            images: record.images,
            video_url: record.video_url,
        }
    }
}

/// Summary shown on a listing card
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingCard {
    pub owner_id: String,
    pub property_id: String,
    pub images: Vec<String>,
    pub rent_price: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub area: String,
    pub address: String,
    pub zip: String,
    pub city: String,
    pub state: String,
}

impl ListingCard {
    pub fn price_label(&self) -> String {
        format_price(&self.rent_price)
    }

    /// Route of the detail page for this card
    pub fn details_route(&self) -> String {
        format!("/details/{}/{}", self.owner_id, self.property_id)
    }
}

impl From<PropertyRecord> for ListingCard {
    fn from(record: PropertyRecord) -> Self {
        let form = record.form;
        Self {
            owner_id: record.owner_id,
            property_id: record.property_id,
            images: record.images,
            rent_price: form.rent_price,
            bedrooms: form.bedrooms,
            bathrooms: form.bathrooms,
            area: form.area,
            address: form.address,
            zip: form.zip,
            city: form.city,
            state: form.state,
        }
    }
}

pub struct DetailService {
    store: Arc<dyn DocumentStore>,
    policy: MissingRecordPolicy,
}

impl DetailService {
    pub fn new(store: Arc<dyn DocumentStore>, policy: MissingRecordPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> MissingRecordPolicy {
        self.policy
    }

    /// Point read of one listing
    pub async fn resolve(&self, owner_id: &str, property_id: &str) -> Result<PropertyDetails> {
        Ok(self.read(owner_id, property_id).await?.into())
    }

    /// Same read, reduced to the card fields
    pub async fn card(&self, owner_id: &str, property_id: &str) -> Result<ListingCard> {
        Ok(self.read(owner_id, property_id).await?.into())
    }

    async fn read(&self, owner_id: &str, property_id: &str) -> Result<PropertyRecord> {
        if owner_id.is_empty() || property_id.is_empty() {
            return Err(Error::InvalidArgument("owner id and property id are required".to_string()));
        }

        let path = format!("{}/{}", properties_path(owner_id), property_id);
        debug!("reading {}", path);
        let document = self.store.read(&path).await.map_err(|err| {
            error!("failed to read {}: {}", path, err);
            match err {
                Error::Fetch(_) => err,
                other => Error::fetch(other),
            }
        })?;

        match document {
            Some(document) => Ok(PropertyRecord::from_document(owner_id, property_id, document)
                .map_err(|err| Error::fetch(format!("malformed listing {}: {}", path, err)))?),
            None => match self.policy {
                MissingRecordPolicy::EmptyDefaults => {
                    info!("No data available at {}", path);
                    Ok(PropertyRecord::default())
                }
                MissingRecordPolicy::NotFound => Err(Error::NotFound {
                    owner_id: owner_id.to_string(),
                    property_id: property_id.to_string(),
                }),
            },
        }
    }
}

/// Indian digit grouping with at most three significant digits.
///
/// `"1500"` gives `"1,500"`, `"123456"` gives `"1,23,000"`, text that is not a
/// number gives `"NaN"`.
pub fn format_price(price: &str) -> String {
    let value = if price.trim().is_empty() { 0.0 } else { parse_number(price) };
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-∞" } else { "∞" }.to_string();
    }

    let rounded = round_significant(value, 3);
    let text = format!("{}", rounded.abs());
    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut formatted = String::new();
    if rounded < 0.0 {
        formatted.push('-');
    }
    formatted.push_str(&group_indian(integer));
    if let Some(fraction) = fraction {
        formatted.push('.');
        formatted.push_str(fraction);
    }
    formatted
}

fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    // exponent of the leading digit, from the exact scientific rendering
    let exponent: i32 = format!("{:e}", value.abs())
        .split_once('e')
        .and_then(|(_, exp)| exp.parse().ok())
        .unwrap_or(0);
    let decimals = digits - 1 - exponent;
    if decimals >= 0 {
        let factor = 10f64.powi(decimals);
        (value * factor).round() / factor
    } else {
        let factor = 10f64.powi(-decimals);
        (value / factor).round() * factor
    }
}

// last three digits, then groups of two
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price("1500"), "1,500");
        assert_eq!(format_price("123456"), "1,23,000");
        assert_eq!(format_price("1235"), "1,240");
        assert_eq!(format_price("999999"), "10,00,000");
        assert_eq!(format_price("12.345"), "12.3");
        assert_eq!(format_price("950"), "950");
        assert_eq!(format_price("-2500"), "-2,500");
        assert_eq!(format_price(" 800 "), "800");
        assert_eq!(format_price("0"), "0");
        assert_eq!(format_price(""), "0");
        assert_eq!(format_price("abc"), "NaN");
    }

    #[test]
    fn test_group_indian() {
        assert_eq!(group_indian("1000"), "1,000");
        assert_eq!(group_indian("10000000"), "1,00,00,000");
        assert_eq!(group_indian("12"), "12");
    }

    #[test]
    fn test_details_from_record() {
        let mut record = PropertyRecord::default().with_ids("o1", "p1");
        record.form.amenities = "Gym, Pool".into();
        record.form.rent_price = "1500".into();
        record.images = vec!["a".into()];

        let details = PropertyDetails::from(record.clone());
        assert_eq!(details.amenities, vec!["Gym", "Pool"]);
        assert!(!details.is_empty());
        assert!(PropertyDetails::from(PropertyRecord::default()).is_empty());

        let card = ListingCard::from(record);
        assert_eq!(card.price_label(), "1,500");
        assert_eq!(card.details_route(), "/details/o1/p1");
    }
}
