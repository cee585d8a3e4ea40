use std::sync::Arc;

use async_trait::async_trait;

use crate::availability::OverlapPolicy;
use crate::error::CoreResult;
use crate::types::*;

/// Storage for locations
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Inserts a location owned by `owner_id`
    async fn create_location(
        &self,
        owner_id: UserId,
        request: &LocationRequest,
    ) -> CoreResult<Location>;

    /// Finds a location by ID
    async fn find_location(&self, id: LocationId) -> CoreResult<Option<Location>>;

    /// Lists the locations owned by a user
    async fn locations_by_owner(&self, owner_id: UserId) -> CoreResult<Vec<Location>>;

    /// Overwrites the editable fields of a location
    async fn update_location(
        &self,
        id: LocationId,
        request: &LocationRequest,
    ) -> CoreResult<Location>;

    /// Deletes a location. Fails with `Conflict(LocationInUse)` while spots
    /// still reference it.
    async fn delete_location(&self, id: LocationId) -> CoreResult<()>;

    /// Number of spots hosted at a location
    async fn count_spots_at(&self, id: LocationId) -> CoreResult<i64>;

    /// Case-insensitive substring search over city, country and address,
    /// one result per distinct city and country, ordered by city then country
    async fn search_locations(&self, query: &str, limit: i64) -> CoreResult<Vec<Location>>;

    /// Locations with the most spots first
    async fn popular_locations(&self, limit: i64) -> CoreResult<Vec<PopularLocation>>;
}

/// Storage for spots
#[async_trait]
pub trait SpotRepository: Send + Sync {
    /// Inserts a spot owned by `owner_id`
    async fn create_spot(&self, owner_id: UserId, request: &CreateSpotRequest)
    -> CoreResult<Spot>;

    /// Finds a spot by ID
    async fn find_spot(&self, id: SpotId) -> CoreResult<Option<Spot>>;

    /// Lists the spots owned by a user
    async fn spots_by_owner(&self, owner_id: UserId) -> CoreResult<Vec<Spot>>;

    /// Spots with their location and amenities. When `place` is given only
    /// spots whose city or country contains it (case-insensitively) are
    /// returned.
    async fn spot_listings(&self, place: Option<&str>) -> CoreResult<Vec<SpotListing>>;
}

/// Storage for amenities
#[async_trait]
pub trait AmenityRepository: Send + Sync {
    /// Inserts an amenity. Fails with `Conflict(DuplicateAmenity)` when the
    /// spot already has one with the same name.
    async fn create_amenity(&self, request: &CreateAmenityRequest) -> CoreResult<Amenity>;

    /// Finds an amenity by ID
    async fn find_amenity(&self, id: AmenityId) -> CoreResult<Option<Amenity>>;

    /// Lists amenities, optionally restricted to one spot
    async fn amenities(&self, spot_id: Option<SpotId>) -> CoreResult<Vec<Amenity>>;

    /// Deletes an amenity
    async fn delete_amenity(&self, id: AmenityId) -> CoreResult<()>;
}

/// Storage for reviews
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Inserts a review. Fails with `Conflict(DuplicateReview)` when the
    /// author already reviewed the spot.
    async fn create_review(
        &self,
        author_id: UserId,
        request: &CreateReviewRequest,
    ) -> CoreResult<Review>;

    /// Finds a review by ID
    async fn find_review(&self, id: ReviewId) -> CoreResult<Option<Review>>;

    /// Reviews of a spot, newest first
    async fn reviews_for_spot(&self, spot_id: SpotId) -> CoreResult<Vec<Review>>;

    /// Deletes a review
    async fn delete_review(&self, id: ReviewId) -> CoreResult<()>;
}

/// Storage for bookings
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts a PENDING booking if no active booking on the same spot
    /// overlaps it under `policy`, otherwise fails with `Conflict(Overlap)`.
    ///
    /// The check and the insert must be atomic with respect to other calls
    /// for the same spot.
    async fn insert_if_available(
        &self,
        booking: &NewBooking,
        policy: OverlapPolicy,
    ) -> CoreResult<Booking>;

    /// Finds a booking by ID
    async fn find_booking(&self, id: BookingId) -> CoreResult<Option<Booking>>;

    /// Non-cancelled bookings of a spot
    async fn active_bookings_for_spot(&self, spot_id: SpotId) -> CoreResult<Vec<Booking>>;

    /// All bookings of a spot ordered by start date
    async fn bookings_for_spot(&self, spot_id: SpotId) -> CoreResult<Vec<Booking>>;

    /// Bookings made by a renter, latest start date first
    async fn bookings_for_renter(&self, renter_id: UserId) -> CoreResult<Vec<Booking>>;

    /// Bookings on spots owned by a user, latest start date first
    async fn bookings_for_owner(&self, owner_id: UserId) -> CoreResult<Vec<Booking>>;

    /// Sets the status to `target` only if it is still `expected`.
    /// Returns `None` when the booking was not in `expected`.
    async fn update_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        target: BookingStatus,
    ) -> CoreResult<Option<Booking>>;
}

/// A backend that provides every repository
pub trait Store:
    LocationRepository + SpotRepository + AmenityRepository + ReviewRepository + BookingRepository
{
}

impl<T> Store for T where
    T: LocationRepository
        + SpotRepository
        + AmenityRepository
        + ReviewRepository
        + BookingRepository
{
}

/// Shared handles to each repository, injected into the services
#[derive(Clone)]
pub struct Repositories {
    /// Location storage
    pub locations: Arc<dyn LocationRepository>,
    /// Spot storage
    pub spots: Arc<dyn SpotRepository>,
    /// Amenity storage
    pub amenities: Arc<dyn AmenityRepository>,
    /// Review storage
    pub reviews: Arc<dyn ReviewRepository>,
    /// Booking storage
    pub bookings: Arc<dyn BookingRepository>,
}

impl Repositories {
    /// Uses one backend for every repository
    pub fn from_store<S: Store + 'static>(store: Arc<S>) -> Self {
        Self {
            locations: store.clone(),
            spots: store.clone(),
            amenities: store.clone(),
            reviews: store.clone(),
            bookings: store,
        }
    }
}
