use actix_web::{HttpResponse, Result, web};
use validator::Validate;

use auth_services::middleware::AuthenticatedUser;
use campspot_core::{LocationId, LocationRequest, Marketplace};

use crate::error::ApiError;
use crate::params::LocationSearchQuery;

/// Creates a location owned by the caller
pub async fn create_location(
    market: web::Data<Marketplace>,
    user: AuthenticatedUser,
    request: web::Json<LocationRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate().map_err(ApiError::validation)?;

    let location = market.locations.create(user.identity(), &request).await?;
    Ok(HttpResponse::Created().json(location))
}

/// Lists the caller's locations
pub async fn my_locations(
    market: web::Data<Marketplace>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let locations = market.locations.mine(user.identity()).await?;
    Ok(HttpResponse::Ok().json(locations))
}

/// Public location search for autocomplete
pub async fn search_locations(
    market: web::Data<Marketplace>,
    query: web::Query<LocationSearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let locations = market.locations.search(&query.q).await?;
    Ok(HttpResponse::Ok().json(locations))
}

/// Locations with the most spots
pub async fn popular_locations(
    market: web::Data<Marketplace>,
) -> Result<HttpResponse, ApiError> {
    let locations = market.locations.popular().await?;
    Ok(HttpResponse::Ok().json(locations))
}

/// Replaces the fields of one of the caller's locations
pub async fn update_location(
    market: web::Data<Marketplace>,
    user: AuthenticatedUser,
    path: web::Path<LocationId>,
    request: web::Json<LocationRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate().map_err(ApiError::validation)?;

    let location = market
        .locations
        .update(user.identity(), path.into_inner(), &request)
        .await?;
    Ok(HttpResponse::Ok().json(location))
}

/// Deletes one of the caller's locations once it has no spots
pub async fn delete_location(
    market: web::Data<Marketplace>,
    user: AuthenticatedUser,
    path: web::Path<LocationId>,
) -> Result<HttpResponse, ApiError> {
    market
        .locations
        .delete(user.identity(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
