//! # Web Handlers for the Campspot Marketplace
//!
//! HTTP handlers and route tables. Handlers only extract and validate
//! requests; every rule lives in `campspot_core` or `auth_services`.

/// Authentication handlers (signup, login, refresh, password reset)
mod auth_handlers;
pub use auth_handlers::*;

/// User profile handlers (get/update profile)
mod profile_handlers;
pub use profile_handlers::*;

/// Health checks
mod admin_handlers;
pub use admin_handlers::*;

/// Location management and search
mod location_handlers;
pub use location_handlers::*;

/// Spot management, search and quotes
mod spot_handlers;
pub use spot_handlers::*;

/// Amenity management
mod amenity_handlers;
pub use amenity_handlers::*;

/// Review handlers
mod review_handlers;
pub use review_handlers::*;

/// Booking creation, listings and status changes
mod booking_handlers;
pub use booking_handlers::*;

/// Rendering of domain errors as HTTP responses
pub mod error;
pub use error::ApiError;

/// Query string parameters shared by several handlers
pub mod params;

/// Route tables and extractor configuration
pub mod routes;
