use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::availability::{DateRange, OverlapPolicy, find_conflict};
use crate::error::{ConflictKind, CoreError, CoreResult, Entity};
use crate::repository::*;
use crate::types::*;

#[derive(Default)]
struct Tables {
    next_id: i32,
    locations: BTreeMap<LocationId, Location>,
    spots: BTreeMap<SpotId, Spot>,
    amenities: BTreeMap<AmenityId, Amenity>,
    reviews: BTreeMap<ReviewId, Review>,
    bookings: BTreeMap<BookingId, Booking>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn listing(&self, spot: &Spot) -> Option<SpotListing> {
        let location = self.locations.get(&spot.location_id)?.clone();
        let amenities = self
            .amenities
            .values()
            .filter(|a| a.spot_id == spot.id)
            .cloned()
            .collect();
        Some(SpotListing {
            spot: spot.clone(),
            location,
            amenities,
            distance_km: None,
        })
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Repository backed by in-process maps.
///
/// Every operation runs under one mutex, so `insert_if_available` is atomic.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creates a location and a spot at `nightly_rate`, both owned by `owner_id`
    pub async fn seed_spot(&self, owner_id: UserId, nightly_rate: f64) -> Spot {
        let mut tables = self.tables();
        let now = Utc::now();

        let location_id = tables.next_id();
        tables.locations.insert(
            location_id,
            Location {
                id: location_id,
                owner_id,
                address: "1 Campground Rd".to_string(),
                city: "Springfield".to_string(),
                province_or_state: "OR".to_string(),
                country: "USA".to_string(),
                postal_code: "97477".to_string(),
                latitude: None,
                longitude: None,
                created_at: now,
            },
        );

        let spot_id = tables.next_id();
        let spot = Spot {
            id: spot_id,
            owner_id,
            location_id,
            name: format!("Spot {spot_id}"),
            description: None,
            nightly_rate,
            capacity: 4,
            created_at: now,
        };
        tables.spots.insert(spot_id, spot.clone());
        spot
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {
    async fn create_location(
        &self,
        owner_id: UserId,
        request: &LocationRequest,
    ) -> CoreResult<Location> {
        let mut tables = self.tables();
        let id = tables.next_id();
        let location = Location {
            id,
            owner_id,
            address: request.address.clone(),
            city: request.city.clone(),
            province_or_state: request.province_or_state.clone(),
            country: request.country.clone(),
            postal_code: request.postal_code.clone(),
            latitude: request.latitude,
            longitude: request.longitude,
            created_at: Utc::now(),
        };
        tables.locations.insert(id, location.clone());
        Ok(location)
    }

    async fn find_location(&self, id: LocationId) -> CoreResult<Option<Location>> {
        Ok(self.tables().locations.get(&id).cloned())
    }

    async fn locations_by_owner(&self, owner_id: UserId) -> CoreResult<Vec<Location>> {
        Ok(self
            .tables()
            .locations
            .values()
            .filter(|l| l.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update_location(
        &self,
        id: LocationId,
        request: &LocationRequest,
    ) -> CoreResult<Location> {
        let mut tables = self.tables();
        let location = tables
            .locations
            .get_mut(&id)
            .ok_or(CoreError::NotFound(Entity::Location))?;

        location.address = request.address.clone();
        location.city = request.city.clone();
        location.province_or_state = request.province_or_state.clone();
        location.country = request.country.clone();
        location.postal_code = request.postal_code.clone();
        location.latitude = request.latitude;
        location.longitude = request.longitude;

        Ok(location.clone())
    }

    async fn delete_location(&self, id: LocationId) -> CoreResult<()> {
        let mut tables = self.tables();
        if tables.spots.values().any(|s| s.location_id == id) {
            return Err(CoreError::Conflict(ConflictKind::LocationInUse));
        }
        tables
            .locations
            .remove(&id)
            .map(|_| ())
            .ok_or(CoreError::NotFound(Entity::Location))
    }

    async fn count_spots_at(&self, id: LocationId) -> CoreResult<i64> {
        Ok(self
            .tables()
            .spots
            .values()
            .filter(|s| s.location_id == id)
            .count() as i64)
    }

    async fn search_locations(&self, query: &str, limit: i64) -> CoreResult<Vec<Location>> {
        let tables = self.tables();
        let mut matches: Vec<&Location> = tables
            .locations
            .values()
            .filter(|l| {
                contains_ignore_case(&l.city, query)
                    || contains_ignore_case(&l.country, query)
                    || contains_ignore_case(&l.address, query)
            })
            .collect();
        matches.sort_by(|a, b| (&a.city, &a.country, a.id).cmp(&(&b.city, &b.country, b.id)));

        let mut seen = BTreeSet::new();
        Ok(matches
            .into_iter()
            .filter(|l| seen.insert((l.city.clone(), l.country.clone())))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn popular_locations(&self, limit: i64) -> CoreResult<Vec<PopularLocation>> {
        let tables = self.tables();
        let mut popular: Vec<PopularLocation> = tables
            .locations
            .values()
            .map(|location| PopularLocation {
                location: location.clone(),
                spot_count: tables
                    .spots
                    .values()
                    .filter(|s| s.location_id == location.id)
                    .count() as i64,
            })
            .collect();
        popular.sort_by(|a, b| b.spot_count.cmp(&a.spot_count));
        popular.truncate(limit.max(0) as usize);
        Ok(popular)
    }
}

#[async_trait]
impl SpotRepository for InMemoryStore {
    async fn create_spot(
        &self,
        owner_id: UserId,
        request: &CreateSpotRequest,
    ) -> CoreResult<Spot> {
        let mut tables = self.tables();
        if !tables.locations.contains_key(&request.location_id) {
            return Err(CoreError::NotFound(Entity::Location));
        }
        let id = tables.next_id();
        let spot = Spot {
            id,
            owner_id,
            location_id: request.location_id,
            name: request.name.clone(),
            description: request.description.clone(),
            nightly_rate: request.nightly_rate,
            capacity: request.capacity,
            created_at: Utc::now(),
        };
        tables.spots.insert(id, spot.clone());
        Ok(spot)
    }

    async fn find_spot(&self, id: SpotId) -> CoreResult<Option<Spot>> {
        Ok(self.tables().spots.get(&id).cloned())
    }

    async fn spots_by_owner(&self, owner_id: UserId) -> CoreResult<Vec<Spot>> {
        Ok(self
            .tables()
            .spots
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn spot_listings(&self, place: Option<&str>) -> CoreResult<Vec<SpotListing>> {
        let tables = self.tables();
        Ok(tables
            .spots
            .values()
            .filter_map(|spot| tables.listing(spot))
            .filter(|listing| match place {
                Some(place) => {
                    contains_ignore_case(&listing.location.city, place)
                        || contains_ignore_case(&listing.location.country, place)
                }
                None => true,
            })
            .collect())
    }
}

#[async_trait]
impl AmenityRepository for InMemoryStore {
    async fn create_amenity(&self, request: &CreateAmenityRequest) -> CoreResult<Amenity> {
        let mut tables = self.tables();
        let duplicate = tables
            .amenities
            .values()
            .any(|a| a.spot_id == request.spot_id && a.name == request.name);
        if duplicate {
            return Err(CoreError::Conflict(ConflictKind::DuplicateAmenity));
        }
        let id = tables.next_id();
        let amenity = Amenity {
            id,
            spot_id: request.spot_id,
            name: request.name.clone(),
        };
        tables.amenities.insert(id, amenity.clone());
        Ok(amenity)
    }

    async fn find_amenity(&self, id: AmenityId) -> CoreResult<Option<Amenity>> {
        Ok(self.tables().amenities.get(&id).cloned())
    }

    async fn amenities(&self, spot_id: Option<SpotId>) -> CoreResult<Vec<Amenity>> {
        Ok(self
            .tables()
            .amenities
            .values()
            .filter(|a| spot_id.is_none_or(|id| a.spot_id == id))
            .cloned()
            .collect())
    }

    async fn delete_amenity(&self, id: AmenityId) -> CoreResult<()> {
        self.tables()
            .amenities
            .remove(&id)
            .map(|_| ())
            .ok_or(CoreError::NotFound(Entity::Amenity))
    }
}

#[async_trait]
impl ReviewRepository for InMemoryStore {
    async fn create_review(
        &self,
        author_id: UserId,
        request: &CreateReviewRequest,
    ) -> CoreResult<Review> {
        let mut tables = self.tables();
        let duplicate = tables
            .reviews
            .values()
            .any(|r| r.author_id == author_id && r.spot_id == request.spot_id);
        if duplicate {
            return Err(CoreError::Conflict(ConflictKind::DuplicateReview));
        }
        let id = tables.next_id();
        let review = Review {
            id,
            spot_id: request.spot_id,
            author_id,
            rating: request.rating,
            comment: request.comment.clone(),
            date_posted: Utc::now(),
        };
        tables.reviews.insert(id, review.clone());
        Ok(review)
    }

    async fn find_review(&self, id: ReviewId) -> CoreResult<Option<Review>> {
        Ok(self.tables().reviews.get(&id).cloned())
    }

    async fn reviews_for_spot(&self, spot_id: SpotId) -> CoreResult<Vec<Review>> {
        let mut reviews: Vec<Review> = self
            .tables()
            .reviews
            .values()
            .filter(|r| r.spot_id == spot_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| (b.date_posted, b.id).cmp(&(a.date_posted, a.id)));
        Ok(reviews)
    }

    async fn delete_review(&self, id: ReviewId) -> CoreResult<()> {
        self.tables()
            .reviews
            .remove(&id)
            .map(|_| ())
            .ok_or(CoreError::NotFound(Entity::Review))
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn insert_if_available(
        &self,
        booking: &NewBooking,
        policy: OverlapPolicy,
    ) -> CoreResult<Booking> {
        let mut tables = self.tables();
        if !tables.spots.contains_key(&booking.spot_id) {
            return Err(CoreError::NotFound(Entity::Spot));
        }

        let range = DateRange::new(booking.start_date, booking.end_date)?;
        if find_conflict(tables.bookings.values(), booking.spot_id, &range, policy).is_some() {
            return Err(CoreError::Conflict(ConflictKind::Overlap));
        }

        let id = tables.next_id();
        let booking = Booking {
            id,
            spot_id: booking.spot_id,
            renter_id: booking.renter_id,
            start_date: booking.start_date,
            end_date: booking.end_date,
            status: BookingStatus::Pending,
            total_price: booking.total_price,
            created_at: Utc::now(),
        };
        tables.bookings.insert(id, booking.clone());
        Ok(booking)
    }

    async fn find_booking(&self, id: BookingId) -> CoreResult<Option<Booking>> {
        Ok(self.tables().bookings.get(&id).cloned())
    }

    async fn active_bookings_for_spot(&self, spot_id: SpotId) -> CoreResult<Vec<Booking>> {
        Ok(self
            .tables()
            .bookings
            .values()
            .filter(|b| b.spot_id == spot_id && b.is_active())
            .cloned()
            .collect())
    }

    async fn bookings_for_spot(&self, spot_id: SpotId) -> CoreResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .tables()
            .bookings
            .values()
            .filter(|b| b.spot_id == spot_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.start_date, b.id));
        Ok(bookings)
    }

    async fn bookings_for_renter(&self, renter_id: UserId) -> CoreResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .tables()
            .bookings
            .values()
            .filter(|b| b.renter_id == renter_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(bookings)
    }

    async fn bookings_for_owner(&self, owner_id: UserId) -> CoreResult<Vec<Booking>> {
        let tables = self.tables();
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| {
                tables
                    .spots
                    .get(&b.spot_id)
                    .is_some_and(|s| s.owner_id == owner_id)
            })
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(bookings)
    }

    async fn update_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        target: BookingStatus,
    ) -> CoreResult<Option<Booking>> {
        let mut tables = self.tables();
        let booking = tables
            .bookings
            .get_mut(&id)
            .ok_or(CoreError::NotFound(Entity::Booking))?;
        if booking.status != expected {
            return Ok(None);
        }
        booking.status = target;
        Ok(Some(booking.clone()))
    }
}
