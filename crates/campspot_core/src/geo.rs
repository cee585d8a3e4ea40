use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::{Location, SpotListing};

/// Mean Earth radius used by the Haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the globe in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a coordinate pair
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl Location {
    /// Coordinates of the location, if both latitude and longitude are known
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.latitude?, self.longitude?))
    }
}

/// Great-circle distance in kilometres, rounded to one decimal place.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    (EARTH_RADIUS_KM * c * 10.0).round() / 10.0
}

/// Fills in `distance_km` for every listing and sorts nearest first.
///
/// Listings whose location has no coordinates keep `distance_km = None` and
/// sort last.
pub fn rank_by_distance(listings: &mut [SpotListing], origin: Coordinates) {
    for listing in listings.iter_mut() {
        listing.distance_km = listing
            .location
            .coordinates()
            .map(|point| haversine_km(origin, point));
    }

    listings.sort_by(|a, b| compare_distance(a.distance_km, b.distance_km));
}

fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.unwrap_or(f64::INFINITY)
        .total_cmp(&b.unwrap_or(f64::INFINITY))
}
