//! Listing filters

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::property::{PropertyForm, PropertyRecord};

pub const PROPERTY_TYPES: [&str; 10] = [
    "Apartment",
    "House",
    "Condo",
    "Townhouse",
    "Studio",
    "Loft",
    "Duplex",
    "Villa",
    "Penthouse",
    "Commercial Property",
];

pub const ROOM_OPTIONS: [&str; 5] = ["1", "2", "3", "4", "5+"];

pub const PRICE_OPTIONS: [&str; 4] = ["0-1000", "1000-2000", "2000-3000", "3000+"];

pub const YES_NO_OPTIONS: [&str; 2] = ["Yes", "No"];

pub const LEASE_DURATIONS: [&str; 6] = ["1 Month", "3 Months", "6 Months", "1 Year", "2 Years", "Flexible"];

/// Inclusive rent bounds; `max` is open-ended when absent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn new(min: f64, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// NaN is never contained
    pub fn contains(&self, price: f64) -> bool {
        self.min <= price && self.max.map_or(true, |max| price <= max)
    }
}

impl FromStr for PriceRange {
    type Err = Error;

    /// Accepts `"min-max"` and `"min+"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bound = |text: &str| {
            text.trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| Error::InvalidFilter(format!("invalid price range: {}", s)))
        };

        if let Some(min) = s.strip_suffix('+') {
            return Ok(Self::new(bound(min)?, None));
        }
        match s.split_once('-') {
            Some((min, max)) => {
                let (min, max) = (bound(min)?, bound(max)?);
                if min > max {
                    return Err(Error::InvalidFilter(format!("invalid price range: {}", s)));
                }
                Ok(Self::new(min, Some(max)))
            }
            None => Err(Error::InvalidFilter(format!("invalid price range: {}", s))),
        }
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}-{}", self.min, max),
            None => write!(f, "{}+", self.min),
        }
    }
}

/// The dropdowns above the listing grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    PropertyType,
    Bedrooms,
    Price,
    Furnished,
    PetFriendly,
}

impl FilterField {
    pub const ALL: [FilterField; 5] = [
        FilterField::PropertyType,
        FilterField::Bedrooms,
        FilterField::Price,
        FilterField::Furnished,
        FilterField::PetFriendly,
    ];

    /// Label shown while nothing is selected; selecting it clears the filter
    pub fn placeholder(&self) -> &'static str {
        match self {
            FilterField::PropertyType => "Property",
            FilterField::Bedrooms => "Rooms",
            FilterField::Price => "Price",
            FilterField::Furnished => "Furnished",
            FilterField::PetFriendly => "Pet Friendly",
        }
    }

    pub fn options(&self) -> &'static [&'static str] {
        match self {
            FilterField::PropertyType => &PROPERTY_TYPES,
            FilterField::Bedrooms => &ROOM_OPTIONS,
            FilterField::Price => &PRICE_OPTIONS,
            FilterField::Furnished | FilterField::PetFriendly => &YES_NO_OPTIONS,
        }
    }
}

/// Independent predicates, ANDed. `None` matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub property_type: Option<String>,
    pub bedrooms: Option<String>,
    pub price_range: Option<PriceRange>,
    pub furnished: Option<String>,
    pub pet_friendly: Option<String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property_type(mut self, value: &str) -> Self {
        self.property_type = Some(value.to_string());
        self
    }

    pub fn with_bedrooms(mut self, value: &str) -> Self {
        self.bedrooms = Some(value.to_string());
        self
    }

    pub fn with_price_range(mut self, range: PriceRange) -> Self {
        self.price_range = Some(range);
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

    /// Apply a dropdown selection. The placeholder or an empty value clears
    /// the predicate. Returns whether the state changed.
    pub fn select(&mut self, field: FilterField, value: &str) -> Result<bool, Error> {
        let cleared = value.is_empty() || value == field.placeholder();
        let text = (!cleared).then(|| value.to_string());

        let changed = match field {
            FilterField::Price => {
                let range = if cleared { None } else { Some(value.parse::<PriceRange>()?) };
                replace(&mut self.price_range, range)
            }
            FilterField::PropertyType => replace(&mut self.property_type, text),
            FilterField::Bedrooms => replace(&mut self.bedrooms, text),
            FilterField::Furnished => replace(&mut self.furnished, text),
            FilterField::PetFriendly => replace(&mut self.pet_friendly, text),
        };
        Ok(changed)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, record: &PropertyRecord) -> bool {
        let form: &PropertyForm = &record.form;
        exact(&self.property_type, &form.property_type)
            && exact(&self.bedrooms, &form.bedrooms)
            && exact(&self.furnished, &form.furnished)
            && exact(&self.pet_friendly, &form.pet_friendly)
            && self.price_range.map_or(true, |range| range.contains(form.price()))
    }
}

fn replace<T: PartialEq>(slot: &mut Option<T>, value: Option<T>) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn exact(wanted: &Option<String>, actual: &str) -> bool {
    wanted.as_deref().map_or(true, |wanted| wanted == actual)
}

/// Records passing every predicate, in input order
pub fn apply_filters<'a>(records: &'a [PropertyRecord], filters: &FilterState) -> Vec<&'a PropertyRecord> {
    records.iter().filter(|record| filters.matches(record)).collect()
}
