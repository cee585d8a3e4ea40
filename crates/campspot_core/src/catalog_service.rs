use std::sync::Arc;

use tracing::info;

use crate::error::{ConflictKind, CoreError, CoreResult, Entity, ForbiddenReason};
use crate::geo::{Coordinates, rank_by_distance};
use crate::repository::*;
use crate::types::*;

/// Maximum number of results from a location search
pub const LOCATION_SEARCH_LIMIT: i64 = 10;
/// Number of locations returned as popular
pub const POPULAR_LOCATION_LIMIT: i64 = 6;

/// Service for managing locations
#[derive(Clone)]
pub struct LocationService {
    locations: Arc<dyn LocationRepository>,
}

impl LocationService {
    /// Creates a new `LocationService`
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            locations: repositories.locations.clone(),
        }
    }

    /// Creates a location owned by the caller
    pub async fn create(&self, caller: &Identity, request: &LocationRequest) -> CoreResult<Location> {
        let location = self
            .locations
            .create_location(caller.user_id, &request.trimmed())
            .await?;
        info!("Location {} created by user {}", location.id, caller.user_id);
        Ok(location)
    }

    /// Locations owned by the caller
    pub async fn mine(&self, caller: &Identity) -> CoreResult<Vec<Location>> {
        self.locations.locations_by_owner(caller.user_id).await
    }

    /// Public search over city, country and address
    pub async fn search(&self, query: &str) -> CoreResult<Vec<Location>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CoreError::Validation("Search query is required".to_string()));
        }
        self.locations
            .search_locations(query, LOCATION_SEARCH_LIMIT)
            .await
    }

    /// Locations hosting the most spots
    pub async fn popular(&self) -> CoreResult<Vec<PopularLocation>> {
        self.locations
            .popular_locations(POPULAR_LOCATION_LIMIT)
            .await
    }

    /// Updates one of the caller's locations
    pub async fn update(
        &self,
        caller: &Identity,
        id: LocationId,
        request: &LocationRequest,
    ) -> CoreResult<Location> {
        self.require_owned(caller, id).await?;
        self.locations.update_location(id, &request.trimmed()).await
    }

    /// Deletes one of the caller's locations, provided it hosts no spots
    pub async fn delete(&self, caller: &Identity, id: LocationId) -> CoreResult<()> {
        self.require_owned(caller, id).await?;

        if self.locations.count_spots_at(id).await? > 0 {
            return Err(CoreError::Conflict(ConflictKind::LocationInUse));
        }

        self.locations.delete_location(id).await?;
        info!("Location {} deleted by user {}", id, caller.user_id);
        Ok(())
    }

    async fn require_owned(&self, caller: &Identity, id: LocationId) -> CoreResult<Location> {
        let location = self
            .locations
            .find_location(id)
            .await?
            .ok_or(CoreError::NotFound(Entity::Location))?;
        if location.owner_id != caller.user_id {
            return Err(CoreError::Forbidden(ForbiddenReason::NotOwner));
        }
        Ok(location)
    }
}

/// Service for managing and searching spots
#[derive(Clone)]
pub struct SpotService {
    spots: Arc<dyn SpotRepository>,
    locations: Arc<dyn LocationRepository>,
    amenities: Arc<dyn AmenityRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl SpotService {
    /// Creates a new `SpotService`
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            spots: repositories.spots.clone(),
            locations: repositories.locations.clone(),
            amenities: repositories.amenities.clone(),
            reviews: repositories.reviews.clone(),
        }
    }

    /// Adds a spot to one of the caller's locations
    pub async fn create(&self, caller: &Identity, request: &CreateSpotRequest) -> CoreResult<Spot> {
        let location = self
            .locations
            .find_location(request.location_id)
            .await?
            .ok_or(CoreError::NotFound(Entity::Location))?;

        if location.owner_id != caller.user_id {
            return Err(CoreError::Forbidden(ForbiddenReason::NotOwner));
        }

        let spot = self
            .spots
            .create_spot(caller.user_id, &request.trimmed())
            .await?;
        info!(
            "Spot {} created at location {} by user {}",
            spot.id, location.id, caller.user_id
        );
        Ok(spot)
    }

    /// Spots owned by the caller
    pub async fn mine(&self, caller: &Identity) -> CoreResult<Vec<Spot>> {
        self.spots.spots_by_owner(caller.user_id).await
    }

    /// Full view of one of the caller's spots
    pub async fn detail(&self, caller: &Identity, id: SpotId) -> CoreResult<SpotDetail> {
        let spot = self
            .spots
            .find_spot(id)
            .await?
            .ok_or(CoreError::NotFound(Entity::Spot))?;

        if spot.owner_id != caller.user_id {
            return Err(CoreError::Forbidden(ForbiddenReason::NotOwner));
        }

        let location = self
            .locations
            .find_location(spot.location_id)
            .await?
            .ok_or(CoreError::NotFound(Entity::Location))?;
        let amenities = self.amenities.amenities(Some(spot.id)).await?;
        let reviews = self.reviews.reviews_for_spot(spot.id).await?;

        Ok(SpotDetail {
            spot,
            location,
            amenities,
            reviews,
        })
    }

    /// Public search.
    ///
    /// With both `lat` and `lng` every spot is returned ranked by distance;
    /// otherwise `location` filters by city or country, and without either
    /// every spot is returned.
    pub async fn search(&self, query: &SpotSearchQuery) -> CoreResult<Vec<SpotListing>> {
        if let (Some(lat), Some(lng)) = (query.lat, query.lng) {
            let mut listings = self.spots.spot_listings(None).await?;
            rank_by_distance(&mut listings, Coordinates::new(lat, lng));
            return Ok(listings);
        }

        let place = query
            .location
            .as_deref()
            .map(str::trim)
            .filter(|place| !place.is_empty());
        self.spots.spot_listings(place).await
    }
}

/// Service for managing amenities
#[derive(Clone)]
pub struct AmenityService {
    spots: Arc<dyn SpotRepository>,
    amenities: Arc<dyn AmenityRepository>,
}

impl AmenityService {
    /// Creates a new `AmenityService`
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            spots: repositories.spots.clone(),
            amenities: repositories.amenities.clone(),
        }
    }

    /// Adds an amenity to one of the caller's spots
    pub async fn add(&self, caller: &Identity, request: &CreateAmenityRequest) -> CoreResult<Amenity> {
        self.require_owned_spot(caller, request.spot_id).await?;

        let request = CreateAmenityRequest {
            spot_id: request.spot_id,
            name: request.name.trim().to_string(),
        };
        self.amenities.create_amenity(&request).await
    }

    /// Lists amenities, optionally for a single spot
    pub async fn list(&self, spot_id: Option<SpotId>) -> CoreResult<Vec<Amenity>> {
        self.amenities.amenities(spot_id).await
    }

    /// Removes an amenity from one of the caller's spots
    pub async fn delete(&self, caller: &Identity, id: AmenityId) -> CoreResult<()> {
        let amenity = self
            .amenities
            .find_amenity(id)
            .await?
            .ok_or(CoreError::NotFound(Entity::Amenity))?;

        self.require_owned_spot(caller, amenity.spot_id).await?;
        self.amenities.delete_amenity(id).await
    }

    async fn require_owned_spot(&self, caller: &Identity, spot_id: SpotId) -> CoreResult<Spot> {
        let spot = self
            .spots
            .find_spot(spot_id)
            .await?
            .ok_or(CoreError::NotFound(Entity::Spot))?;
        if spot.owner_id != caller.user_id {
            return Err(CoreError::Forbidden(ForbiddenReason::NotOwner));
        }
        Ok(spot)
    }
}

/// Service for managing reviews
#[derive(Clone)]
pub struct ReviewService {
    spots: Arc<dyn SpotRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl ReviewService {
    /// Creates a new `ReviewService`
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            spots: repositories.spots.clone(),
            reviews: repositories.reviews.clone(),
        }
    }

    /// Posts the caller's review of a spot
    pub async fn create(&self, caller: &Identity, request: &CreateReviewRequest) -> CoreResult<Review> {
        self.spots
            .find_spot(request.spot_id)
            .await?
            .ok_or(CoreError::NotFound(Entity::Spot))?;

        self.reviews
            .create_review(caller.user_id, &request.trimmed())
            .await
    }

    /// Reviews of a spot, newest first
    pub async fn for_spot(&self, spot_id: SpotId) -> CoreResult<Vec<Review>> {
        self.reviews.reviews_for_spot(spot_id).await
    }

    /// Deletes one of the caller's reviews
    pub async fn delete(&self, caller: &Identity, id: ReviewId) -> CoreResult<()> {
        let review = self
            .reviews
            .find_review(id)
            .await?
            .ok_or(CoreError::NotFound(Entity::Review))?;

        if review.author_id != caller.user_id {
            return Err(CoreError::Forbidden(ForbiddenReason::NotAuthor));
        }

        self.reviews.delete_review(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    const OWNER: Identity = Identity { user_id: 1 };
    const GUEST: Identity = Identity { user_id: 2 };

    fn location_request(city: &str, country: &str, coordinates: Option<(f64, f64)>) -> LocationRequest {
        LocationRequest {
            address: format!("1 Main St, {city}"),
            city: city.to_string(),
            province_or_state: "N/A".to_string(),
            country: country.to_string(),
            postal_code: "12345".to_string(),
            latitude: coordinates.map(|c| c.0),
            longitude: coordinates.map(|c| c.1),
        }
    }

    fn spot_request(location_id: LocationId, name: &str) -> CreateSpotRequest {
        CreateSpotRequest {
            location_id,
            name: name.to_string(),
            description: Some("Flat tent pad".to_string()),
            nightly_rate: 30.0,
            capacity: 4,
        }
    }

    fn services() -> (LocationService, SpotService, AmenityService, ReviewService) {
        let repositories = Repositories::from_store(Arc::new(InMemoryStore::new()));
        (
            LocationService::new(&repositories),
            SpotService::new(&repositories),
            AmenityService::new(&repositories),
            ReviewService::new(&repositories),
        )
    }

    #[tokio::test]
    async fn test_location_delete_blocked_while_spots_exist() {
        let (locations, spots, _, _) = services();
        let location = locations
            .create(&OWNER, &location_request("Banff", "Canada", None))
            .await
            .unwrap();
        spots
            .create(&OWNER, &spot_request(location.id, "Bow River"))
            .await
            .unwrap();

        let blocked = locations.delete(&OWNER, location.id).await;
        assert!(matches!(
            blocked,
            Err(CoreError::Conflict(ConflictKind::LocationInUse))
        ));

        let empty = locations
            .create(&OWNER, &location_request("Canmore", "Canada", None))
            .await
            .unwrap();
        let by_guest = locations.delete(&GUEST, empty.id).await;
        assert!(matches!(
            by_guest,
            Err(CoreError::Forbidden(ForbiddenReason::NotOwner))
        ));
        locations.delete(&OWNER, empty.id).await.unwrap();
        assert!(locations.mine(&OWNER).await.unwrap().len() == 1);
    }

    #[tokio::test]
    async fn test_text_fields_are_stored_trimmed() {
        let (locations, spots, _, _) = services();
        locations
            .create(&OWNER, &location_request("Banff", "Canada", None))
            .await
            .unwrap();
        let mut padded = location_request(" Banff  ", "\tCanada ", None);
        padded.postal_code = " 12345 ".to_string();
        let location = locations.create(&GUEST, &padded).await.unwrap();
        assert_eq!(location.city, "Banff");
        assert_eq!(location.country, "Canada");
        assert_eq!(location.postal_code, "12345");

        let found = locations.search("banff").await.unwrap();
        assert_eq!(found.len(), 1);

        let updated = locations
            .update(&GUEST, location.id, &location_request("  Canmore", "Canada  ", None))
            .await
            .unwrap();
        assert_eq!(updated.city, "Canmore");
        assert_eq!(updated.country, "Canada");

        let spot = spots
            .create(&GUEST, &spot_request(location.id, "  Bow River "))
            .await
            .unwrap();
        assert_eq!(spot.name, "Bow River");
    }

    #[tokio::test]
    async fn test_spot_requires_owned_location() {
        let (locations, spots, _, _) = services();
        let location = locations
            .create(&OWNER, &location_request("Moab", "USA", None))
            .await
            .unwrap();

        let missing = spots.create(&OWNER, &spot_request(404, "Nowhere")).await;
        assert!(matches!(missing, Err(CoreError::NotFound(Entity::Location))));

        let foreign = spots.create(&GUEST, &spot_request(location.id, "Arches")).await;
        assert!(matches!(
            foreign,
            Err(CoreError::Forbidden(ForbiddenReason::NotOwner))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_amenity_and_review_conflict() {
        let (locations, spots, amenities, reviews) = services();
        let location = locations
            .create(&OWNER, &location_request("Tofino", "Canada", None))
            .await
            .unwrap();
        let spot = spots
            .create(&OWNER, &spot_request(location.id, "Cox Bay"))
            .await
            .unwrap();

        let fire_pit = CreateAmenityRequest {
            spot_id: spot.id,
            name: "Fire pit".to_string(),
        };
        amenities.add(&OWNER, &fire_pit).await.unwrap();
        assert!(matches!(
            amenities.add(&OWNER, &fire_pit).await,
            Err(CoreError::Conflict(ConflictKind::DuplicateAmenity))
        ));
        assert!(matches!(
            amenities.add(&GUEST, &fire_pit).await,
            Err(CoreError::Forbidden(ForbiddenReason::NotOwner))
        ));

        let review = CreateReviewRequest {
            spot_id: spot.id,
            rating: 5,
            comment: "Great surf".to_string(),
        };
        let posted = reviews.create(&GUEST, &review).await.unwrap();
        assert!(matches!(
            reviews.create(&GUEST, &review).await,
            Err(CoreError::Conflict(ConflictKind::DuplicateReview))
        ));
        assert!(matches!(
            reviews.delete(&OWNER, posted.id).await,
            Err(CoreError::Forbidden(ForbiddenReason::NotAuthor))
        ));

        let detail = spots.detail(&OWNER, spot.id).await.unwrap();
        assert_eq!(detail.amenities.len(), 1);
        assert_eq!(detail.reviews.len(), 1);
        assert!(matches!(
            spots.detail(&GUEST, spot.id).await,
            Err(CoreError::Forbidden(ForbiddenReason::NotOwner))
        ));

        reviews.delete(&GUEST, posted.id).await.unwrap();
        assert!(reviews.for_spot(spot.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_amenity_delete_by_owner_only() {
        let (locations, spots, amenities, _) = services();
        let location = locations
            .create(&OWNER, &location_request("Jasper", "Canada", None))
            .await
            .unwrap();
        let spot = spots
            .create(&OWNER, &spot_request(location.id, "Maligne"))
            .await
            .unwrap();
        let amenity = amenities
            .add(
                &OWNER,
                &CreateAmenityRequest {
                    spot_id: spot.id,
                    name: "  Picnic table ".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(amenity.name, "Picnic table");

        assert!(matches!(
            amenities.delete(&GUEST, amenity.id).await,
            Err(CoreError::Forbidden(ForbiddenReason::NotOwner))
        ));
        amenities.delete(&OWNER, amenity.id).await.unwrap();
        assert!(matches!(
            amenities.delete(&OWNER, amenity.id).await,
            Err(CoreError::NotFound(Entity::Amenity))
        ));
        assert!(amenities.list(Some(spot.id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_by_place_and_by_distance() {
        let (locations, spots, _, _) = services();
        let banff = locations
            .create(&OWNER, &location_request("Banff", "Canada", Some((51.18, -115.57))))
            .await
            .unwrap();
        let moab = locations
            .create(&OWNER, &location_request("Moab", "USA", Some((38.57, -109.55))))
            .await
            .unwrap();
        let unknown = locations
            .create(&OWNER, &location_request("Hidden Valley", "USA", None))
            .await
            .unwrap();
        for (location, name) in [(&moab, "Slickrock"), (&unknown, "Secret"), (&banff, "Tunnel")] {
            spots
                .create(&OWNER, &spot_request(location.id, name))
                .await
                .unwrap();
        }

        let by_place = spots
            .search(&SpotSearchQuery {
                location: Some("usa".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_place.len(), 2);

        let near_banff = spots
            .search(&SpotSearchQuery {
                location: Some("ignored when coordinates given".to_string()),
                lat: Some(51.0),
                lng: Some(-115.0),
            })
            .await
            .unwrap();
        let names: Vec<&str> = near_banff.iter().map(|l| l.spot.name.as_str()).collect();
        assert_eq!(names, vec!["Tunnel", "Slickrock", "Secret"]);
        assert!(near_banff[2].distance_km.is_none());

        let everything = spots.search(&SpotSearchQuery::default()).await.unwrap();
        assert_eq!(everything.len(), 3);
    }

    #[tokio::test]
    async fn test_location_search_and_popularity() {
        let (locations, spots, _, _) = services();
        assert!(matches!(
            locations.search("   ").await,
            Err(CoreError::Validation(_))
        ));

        let banff = locations
            .create(&OWNER, &location_request("Banff", "Canada", None))
            .await
            .unwrap();
        locations
            .create(&OWNER, &location_request("Banff", "Canada", None))
            .await
            .unwrap();
        let calgary = locations
            .create(&GUEST, &location_request("Calgary", "Canada", None))
            .await
            .unwrap();
        spots.create(&OWNER, &spot_request(banff.id, "A")).await.unwrap();
        spots.create(&OWNER, &spot_request(banff.id, "B")).await.unwrap();
        spots
            .create(&GUEST, &spot_request(calgary.id, "C"))
            .await
            .unwrap();

        let found = locations.search("canada").await.unwrap();
        let cities: Vec<&str> = found.iter().map(|l| l.city.as_str()).collect();
        assert_eq!(cities, vec!["Banff", "Calgary"]);

        let popular = locations.popular().await.unwrap();
        assert_eq!(popular[0].location.id, banff.id);
        assert_eq!(popular[0].spot_count, 2);
        assert_eq!(popular.len(), 3);
    }
}
