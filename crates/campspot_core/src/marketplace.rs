use std::sync::Arc;

use crate::availability::OverlapPolicy;
use crate::booking_service::BookingService;
use crate::catalog_service::{AmenityService, LocationService, ReviewService, SpotService};
use crate::repository::{Repositories, Store};

/// Every domain service, wired to one set of repositories.
///
/// Built once at startup and shared by all request handlers.
#[derive(Clone)]
pub struct Marketplace {
    /// Booking creation, quotes and status changes
    pub bookings: BookingService,
    /// Location management and search
    pub locations: LocationService,
    /// Spot management and search
    pub spots: SpotService,
    /// Amenity management
    pub amenities: AmenityService,
    /// Review management
    pub reviews: ReviewService,
}

impl Marketplace {
    /// Wires every service to `repositories`
    pub fn new(repositories: Repositories, policy: OverlapPolicy) -> Self {
        Self {
            bookings: BookingService::new(&repositories, policy),
            locations: LocationService::new(&repositories),
            spots: SpotService::new(&repositories),
            amenities: AmenityService::new(&repositories),
            reviews: ReviewService::new(&repositories),
        }
    }

    /// Wires every service to a single backend
    pub fn with_store<S: Store + 'static>(store: Arc<S>, policy: OverlapPolicy) -> Self {
        Self::new(Repositories::from_store(store), policy)
    }
}
