//! # Campspot Core
//!
//! Domain logic for the campspot marketplace: booking availability and pricing,
//! the booking lifecycle, geo ranking of search results, and the services that
//! enforce ownership rules on locations, spots, amenities and reviews.
//! Storage is reached only through the repository traits in [`repository`].

/// Booking overlap detection and the configurable overlap policy
pub mod availability;
pub use availability::*;

/// Typed failures returned by every core operation
pub mod error;
pub use error::*;

/// Haversine distance and distance ranking for search results
pub mod geo;
pub use geo::*;

/// Booking status state machine
pub mod lifecycle;
pub use lifecycle::*;

/// In-memory repository implementation used by tests and local runs
pub mod memory;

/// Nightly pricing
pub mod pricing;
pub use pricing::*;

/// Repository traits implemented by the persistence layer
pub mod repository;
pub use repository::*;

/// Domain records and request types
mod types;
pub use types::*;

/// Booking creation, status changes and availability quotes
mod booking_service;
pub use booking_service::*;

/// Location, spot, amenity and review operations
mod catalog_service;
pub use catalog_service::*;

/// Aggregate of all services shared by the web layer
mod marketplace;
pub use marketplace::*;
