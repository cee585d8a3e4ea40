use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Identifier of a user account
pub type UserId = i32;
/// Identifier of a campspot
pub type SpotId = i32;
/// Identifier of a location
pub type LocationId = i32;
/// Identifier of a booking
pub type BookingId = i32;
/// Identifier of an amenity
pub type AmenityId = i32;
/// Identifier of a review
pub type ReviewId = i32;

lazy_static! {
    /// Postal codes: letters, digits, spaces and dashes, 2 to 10 characters
    pub static ref POSTAL_CODE_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 \-]{1,9}$").expect("postal code pattern compiles");
}

/// Coordinates must be real numbers; `range` lets NaN through.
fn finite_coordinate(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("finite")
            .with_message("Coordinates must be finite numbers".into()))
    }
}

/// The verified caller of an authorized request.
///
/// Produced by the authentication middleware and passed into every
/// mutating core operation, so the core never sees tokens or sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// ID of the authenticated user
    pub user_id: UserId,
}

impl Identity {
    /// Creates an identity for the given user
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

/// Lifecycle status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    /// Awaiting a decision from the spot owner
    Pending,
    /// Accepted by the spot owner
    Confirmed,
    /// Declined by the spot owner
    Cancelled,
}

/// A reservation of a spot for a range of nights
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Booking {
    /// Unique identifier for the booking
    pub id: BookingId,
    /// Spot being booked
    pub spot_id: SpotId,
    /// User who made the booking
    pub renter_id: UserId,
    /// First night of the stay
    pub start_date: NaiveDate,
    /// Checkout date
    pub end_date: NaiveDate,
    /// Current lifecycle status
    pub status: BookingStatus,
    /// Price for the whole stay
    pub total_price: f64,
    /// When the booking was created
    pub created_at: DateTime<Utc>,
}

/// Data for a booking about to be inserted. Status is always PENDING.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    /// Spot being booked
    pub spot_id: SpotId,
    /// User making the booking
    pub renter_id: UserId,
    /// First night of the stay
    pub start_date: NaiveDate,
    /// Checkout date
    pub end_date: NaiveDate,
    /// Price computed from the spot's nightly rate
    pub total_price: f64,
}

/// A rentable camping spot
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Spot {
    /// Unique identifier for the spot
    pub id: SpotId,
    /// Owner of the spot
    pub owner_id: UserId,
    /// Location the spot belongs to
    pub location_id: LocationId,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Price per night
    pub nightly_rate: f64,
    /// Maximum number of guests
    pub capacity: i32,
    /// When the spot was created
    pub created_at: DateTime<Utc>,
}

/// A physical place that hosts one or more spots
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Location {
    /// Unique identifier for the location
    pub id: LocationId,
    /// Owner of the location
    pub owner_id: UserId,
    /// Street address
    pub address: String,
    /// City
    pub city: String,
    /// Province or state
    pub province_or_state: String,
    /// Country
    pub country: String,
    /// Postal code
    pub postal_code: String,
    /// Latitude in degrees, if geocoded
    pub latitude: Option<f64>,
    /// Longitude in degrees, if geocoded
    pub longitude: Option<f64>,
    /// When the location was created
    pub created_at: DateTime<Utc>,
}

/// A named facility offered by a spot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Amenity {
    /// Unique identifier for the amenity
    pub id: AmenityId,
    /// Spot offering the amenity
    pub spot_id: SpotId,
    /// Amenity name, unique per spot
    pub name: String,
}

/// A rating and comment left on a spot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Review {
    /// Unique identifier for the review
    pub id: ReviewId,
    /// Reviewed spot
    pub spot_id: SpotId,
    /// Author of the review
    pub author_id: UserId,
    /// Rating from 1 to 5
    pub rating: i32,
    /// Review text
    pub comment: String,
    /// When the review was posted
    pub date_posted: DateTime<Utc>,
}

/// A spot as returned by search, with its location and amenities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotListing {
    /// The spot itself
    #[serde(flatten)]
    pub spot: Spot,
    /// Location of the spot
    pub location: Location,
    /// Amenities offered by the spot
    pub amenities: Vec<Amenity>,
    /// Distance from the search origin in kilometres, for geo searches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Full view of a spot for its owner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotDetail {
    /// The spot itself
    #[serde(flatten)]
    pub spot: Spot,
    /// Location of the spot
    pub location: Location,
    /// Amenities offered by the spot
    pub amenities: Vec<Amenity>,
    /// Reviews of the spot, newest first
    pub reviews: Vec<Review>,
}

/// A location together with how many spots it hosts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopularLocation {
    /// The location itself
    #[serde(flatten)]
    pub location: Location,
    /// Number of spots at this location
    pub spot_count: i64,
}

/// Availability and price for a prospective stay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    /// Spot being quoted
    pub spot_id: SpotId,
    /// First night of the stay
    pub start_date: NaiveDate,
    /// Checkout date
    pub end_date: NaiveDate,
    /// Number of nights
    pub nights: i64,
    /// Price for the whole stay
    pub total_price: f64,
    /// Whether a booking for these dates would currently be accepted
    pub available: bool,
}

/// Request structure for creating or updating a location
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationRequest {
    /// Street address
    #[validate(length(min = 1, max = 255, message = "Address is required"))]
    pub address: String,

    /// City
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,

    /// Province or state
    #[validate(length(min = 1, max = 100, message = "Province or state is required"))]
    pub province_or_state: String,

    /// Country
    #[validate(length(min = 1, max = 100, message = "Country is required"))]
    pub country: String,

    /// Postal code
    #[validate(regex(path = *POSTAL_CODE_REGEX, message = "Invalid postal code"))]
    pub postal_code: String,

    /// Latitude in degrees
    #[validate(
        range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"),
        custom(function = "finite_coordinate")
    )]
    pub latitude: Option<f64>,

    /// Longitude in degrees
    #[validate(
        range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"),
        custom(function = "finite_coordinate")
    )]
    pub longitude: Option<f64>,
}

impl LocationRequest {
    /// Copy with surrounding whitespace removed from every text field
    pub fn trimmed(&self) -> Self {
        Self {
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            province_or_state: self.province_or_state.trim().to_string(),
            country: self.country.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            ..self.clone()
        }
    }
}

/// Request structure for creating a spot
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSpotRequest {
    /// Location that will host the spot
    pub location_id: LocationId,

    /// Display name
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    /// Free-form description
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: Option<String>,

    /// Price per night
    #[validate(range(exclusive_min = 0.0, message = "Nightly rate must be positive"))]
    pub nightly_rate: f64,

    /// Maximum number of guests
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: i32,
}

impl CreateSpotRequest {
    /// Copy with the name trimmed
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            ..self.clone()
        }
    }
}

/// Request structure for adding an amenity to a spot
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAmenityRequest {
    /// Spot receiving the amenity
    pub spot_id: SpotId,

    /// Amenity name
    #[validate(length(min = 1, max = 100, message = "Amenity name is required"))]
    pub name: String,
}

/// Request structure for reviewing a spot
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReviewRequest {
    /// Spot being reviewed
    pub spot_id: SpotId,

    /// Rating from 1 to 5
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    /// Review text
    #[validate(length(min = 1, max = 5000, message = "Comment is required"))]
    pub comment: String,
}

impl CreateReviewRequest {
    /// Copy with the comment trimmed
    pub fn trimmed(&self) -> Self {
        Self {
            comment: self.comment.trim().to_string(),
            ..self.clone()
        }
    }
}

/// Request structure for booking a spot.
///
/// Any status or price sent by the client is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    /// Spot to book
    pub spot_id: SpotId,
    /// First night of the stay
    pub start_date: NaiveDate,
    /// Checkout date
    pub end_date: NaiveDate,
}

/// Request structure for confirming or cancelling a booking
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBookingStatusRequest {
    /// Target status
    pub status: BookingStatus,
}

/// Query parameters for spot search
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SpotSearchQuery {
    /// City or country substring
    pub location: Option<String>,
    /// Latitude of the search origin
    #[validate(
        range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"),
        custom(function = "finite_coordinate")
    )]
    pub lat: Option<f64>,
    /// Longitude of the search origin
    #[validate(
        range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"),
        custom(function = "finite_coordinate")
    )]
    pub lng: Option<f64>,
}

/// Query parameters for a price and availability quote
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteQuery {
    /// First night of the stay
    pub start_date: NaiveDate,
    /// Checkout date
    pub end_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location_request(postal_code: &str) -> LocationRequest {
        LocationRequest {
            address: "1 Lakeshore Rd".to_string(),
            city: "Banff".to_string(),
            province_or_state: "AB".to_string(),
            country: "Canada".to_string(),
            postal_code: postal_code.to_string(),
            latitude: Some(51.17),
            longitude: Some(-115.57),
        }
    }

    #[test]
    fn test_postal_code_validation() {
        assert!(location_request("T1L 1A1").validate().is_ok());
        assert!(location_request("90210").validate().is_ok());
        assert!(location_request("").validate().is_err());
        assert!(location_request("#123").validate().is_err());
    }

    #[test]
    fn test_search_origin_must_be_a_real_coordinate() {
        let search = |lat, lng| SpotSearchQuery {
            location: None,
            lat: Some(lat),
            lng: Some(lng),
        };

        assert!(search(51.17, -115.57).validate().is_ok());
        assert!(SpotSearchQuery::default().validate().is_ok());
        assert!(search(91.0, 0.0).validate().is_err());
        assert!(search(0.0, -181.0).validate().is_err());
        assert!(search(f64::NAN, 0.0).validate().is_err());
        assert!(search(0.0, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_review_rating_bounds() {
        let review = |rating| CreateReviewRequest {
            spot_id: 1,
            rating,
            comment: "Quiet and shady".to_string(),
        };

        assert!(review(1).validate().is_ok());
        assert!(review(5).validate().is_ok());
        assert!(review(0).validate().is_err());
        assert!(review(6).validate().is_err());
    }

    #[test]
    fn test_booking_request_ignores_client_status() {
        let request: CreateBookingRequest = serde_json::from_value(serde_json::json!({
            "spot_id": 3,
            "start_date": "2024-07-01",
            "end_date": "2024-07-03",
            "status": "CONFIRMED",
            "total_price": 1.0
        }))
        .unwrap();

        assert_eq!(request.spot_id, 3);
        assert_eq!(request.start_date, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
    }

    #[test]
    fn test_booking_status_wire_format() {
        assert_eq!(
            serde_json::to_value(BookingStatus::Confirmed).unwrap(),
            serde_json::json!("CONFIRMED")
        );
        let parsed: BookingStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(parsed, BookingStatus::Cancelled);
    }
}
