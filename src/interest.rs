//! "I'm interested" requests on the detail page

use validator::{Validate, ValidationError};

use crate::details::{format_price, PropertyDetails};
use crate::error::Result;
use crate::session::SessionContext;

/// Tour slots offered on every listing
pub const TOUR_TIMES: [&str; 4] = ["10:00 AM", "12:00 PM", "02:00 PM", "04:00 PM"];

#[derive(Debug, Clone, Default, Validate)]
pub struct InterestRequest {
    #[validate(custom = "validate_tour_time")]
    pub time: String,
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    #[validate(custom = "validate_not_blank")]
    pub phone: String,
    #[validate(custom = "validate_not_blank")]
    pub email: String,
    /// Meeting in person rather than virtually
    #[validate(custom = "validate_in_person")]
    pub in_person: bool,
}

impl InterestRequest {
    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }
}

fn validate_tour_time(value: &str) -> std::result::Result<(), ValidationError> {
    if TOUR_TIMES.contains(&value) {
        return Ok(());
    }
    let mut err = ValidationError::new("tour_time");
    err.message = Some("Choose a time".into());
    Err(err)
}

fn validate_not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required".into());
        return Err(err);
    }
    Ok(())
}

fn validate_in_person(value: &bool) -> std::result::Result<(), ValidationError> {
    if *value {
        return Ok(());
    }
    let mut err = ValidationError::new("in_person");
    err.message = Some("Only in-person tours can be booked".into());
    Err(err)
}

/// Seller details revealed once a request was accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerContact {
    pub seller_name: String,
    /// Avatar letter
    pub initial: Option<char>,
    pub contact_phone: String,
    pub contact_email: String,
    pub rent_label: String,
}

impl From<&PropertyDetails> for SellerContact {
    fn from(details: &PropertyDetails) -> Self {
        Self {
            seller_name: details.seller_name.clone(),
            initial: details.seller_name.chars().next(),
            contact_phone: details.contact_phone.clone(),
            contact_email: details.contact_email.clone(),
            rent_label: format_price(&details.rent_price),
        }
    }
}

/// Check the request and reveal how to reach the seller.
///
/// Anonymous visitors get `Error::Unauthenticated` and should be sent to the
/// sign-in page.
pub fn express_interest(
    session: &SessionContext,
    details: &PropertyDetails,
    request: &InterestRequest,
) -> Result<SellerContact> {
    session.require()?;
    request.validate()?;
    Ok(SellerContact::from(details))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::services::Identity;

    fn request() -> InterestRequest {
        InterestRequest {
            time: "02:00 PM".into(),
            name: "Ravi".into(),
            phone: "9999999999".into(),
            email: "ravi@example.com".into(),
            in_person: true,
        }
    }

    fn details() -> PropertyDetails {
        PropertyDetails {
            seller_name: "Meera".into(),
            contact_phone: "9123456780".into(),
            rent_price: "25000".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_identity() {
        let result = express_interest(&SessionContext::anonymous(), &details(), &request());
        assert!(matches!(result, Err(Error::Unauthenticated)));
    }

    #[test]
    fn test_reveals_contact() {
        let session = SessionContext::signed_in(Identity::new("buyer-1"));
        let contact = express_interest(&session, &details(), &request()).unwrap();
        assert_eq!(contact.initial, Some('M'));
        assert_eq!(contact.contact_phone, "9123456780");
        assert_eq!(contact.rent_label, "25,000");
    }

    #[test]
    fn test_incomplete_requests() {
        let session = SessionContext::signed_in(Identity::new("buyer-1"));

        let mut virtual_tour = request();
        virtual_tour.in_person = false;
        assert!(matches!(
            express_interest(&session, &details(), &virtual_tour),
            Err(Error::Validation(_))
        ));

        let mut blank = request();
        blank.name = "   ".into();
        assert!(!blank.is_complete());

        let mut odd_time = request();
        odd_time.time = "11:00 PM".into();
        assert!(!odd_time.is_complete());
        assert!(request().is_complete());
    }
}
