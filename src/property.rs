//! Property listing documents as stored under `users/{ownerId}/properties`

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

/// Scalar fields of a listing, as entered on the upload form.
///
/// Numbers and yes/no answers are kept as the strings the seller typed.
/// Reading is lenient so documents written by other clients still load:
/// JSON numbers and booleans become their string form, `null` becomes empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyForm {
    #[validate(length(min = 1, message = "Title is required"))]
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[validate(length(min = 1, message = "Address is required"))]
    #[serde(deserialize_with = "lenient_string")]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    #[serde(deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(deserialize_with = "lenient_string")]
    pub state: String,
    #[serde(deserialize_with = "lenient_string")]
    pub zip: String,
    #[serde(deserialize_with = "lenient_string")]
    pub neighborhood: String,
    #[validate(length(min = 1, message = "Property type is required"))]
    #[serde(deserialize_with = "lenient_string")]
    pub property_type: String,

    #[serde(deserialize_with = "lenient_string")]
    pub area: String,
    #[serde(deserialize_with = "lenient_string")]
    pub bedrooms: String,
    #[serde(deserialize_with = "lenient_string")]
    pub bathrooms: String,
    #[serde(deserialize_with = "lenient_string")]
    pub parking: String,
    #[serde(deserialize_with = "lenient_string")]
    pub floor_number: String,
    #[serde(deserialize_with = "lenient_string")]
    pub total_floors: String,
    #[validate(custom = "validate_amount")]
    #[serde(deserialize_with = "lenient_string")]
    pub rent_price: String,
    #[serde(deserialize_with = "lenient_string")]
    pub deposit_amount: String,

    #[serde(deserialize_with = "lenient_string")]
    pub furnished: String,
    #[serde(deserialize_with = "lenient_string")]
    pub pet_friendly: String,
    #[serde(deserialize_with = "lenient_string")]
    pub lease_duration: String,
    #[serde(deserialize_with = "lenient_string")]
    pub availability_date: String,

    #[serde(deserialize_with = "lenient_string")]
    pub nearby_schools: String,
    #[serde(deserialize_with = "lenient_string")]
    pub nearby_transport: String,
    #[serde(deserialize_with = "lenient_string")]
    pub nearby_hospitals: String,
    /// Comma separated
    #[serde(deserialize_with = "lenient_string")]
    pub amenities: String,

    #[serde(deserialize_with = "lenient_string")]
    pub seller_name: String,
    #[validate(custom = "validate_optional_email")]
    #[serde(deserialize_with = "lenient_string")]
    pub contact_email: String,
    #[validate(custom = "validate_optional_phone")]
    #[serde(deserialize_with = "lenient_string")]
    pub contact_phone: String,
}

impl PropertyForm {
    /// Amenities split on commas, trimmed, empty entries dropped
    pub fn amenity_list(&self) -> Vec<String> {
        self.amenities
            .split(',')
            .map(str::trim)
            .filter(|amenity| !amenity.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// `None` when the date is empty or not `YYYY-MM-DD`
    pub fn availability_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.availability_date.trim(), "%Y-%m-%d").ok()
    }

    /// Monthly rent as a number; NaN when the stored text is not numeric
    pub fn price(&self) -> f64 {
        parse_number(&self.rent_price)
    }
}

/// One committed listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    /// Filled from the key path, never stored in the document
    #[serde(skip)]
    pub owner_id: String,
    #[serde(skip)]
    pub property_id: String,

    #[serde(flatten)]
    pub form: PropertyForm,

    #[serde(default, deserialize_with = "lenient_urls")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_optional_string")]
    pub video_url: Option<String>,
}

impl PropertyRecord {
    pub fn new(form: PropertyForm, images: Vec<String>, video_url: Option<String>) -> Self {
        Self {
            owner_id: String::new(),
            property_id: String::new(),
            form,
            images,
            video_url,
        }
    }

    /// Decode a stored document and tag it with its key path
    pub fn from_document(owner_id: &str, property_id: &str, document: Value) -> serde_json::Result<Self> {
        let mut record: PropertyRecord = serde_json::from_value(document)?;
        record.owner_id = owner_id.to_string();
        record.property_id = property_id.to_string();
        Ok(record)
    }

    /// The document body to store; ids are not part of it
    pub fn to_document(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn with_ids(mut self, owner_id: &str, property_id: &str) -> Self {
        self.owner_id = owner_id.to_string();
        self.property_id = property_id.to_string();
        self
    }
}

/// Leading and trailing whitespace is ignored; anything else non-numeric is NaN
pub(crate) fn parse_number(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_optional_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(value_to_string(Value::deserialize(deserializer)?).filter(|s| !s.is_empty()))
}

// The database turns arrays into objects keyed by index once an element is removed
fn lenient_urls<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let urls = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(value_to_string).collect(),
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by_key(|(key, _)| key.parse::<usize>().unwrap_or(usize::MAX));
            entries.into_iter().filter_map(|(_, v)| value_to_string(v)).collect()
        }
        other => value_to_string(other).into_iter().collect(),
    };
    Ok(urls)
}

fn validate_amount(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Rent price is required".into());
        return Err(err);
    }
    if parse_number(value).is_nan() {
        let mut err = ValidationError::new("number");
        err.message = Some("Rent price must be a number".into());
        return Err(err);
    }
    Ok(())
}

fn validate_optional_email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || validator::validate_email(value) {
        return Ok(());
    }
    let mut err = ValidationError::new("email");
    err.message = Some("Contact email is invalid".into());
    Err(err)
}

fn validate_optional_phone(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || is_phone_number(value) {
        return Ok(());
    }
    let mut err = ValidationError::new("phone");
    err.message = Some("Contact phone must be 10 digits".into());
    Err(err)
}

/// Exactly ten ASCII digits
pub(crate) fn is_phone_number(value: &str) -> bool {
    value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit())
}
