use actix_web::{HttpResponse, Result, web};
use validator::Validate;

use auth_services::middleware::AuthenticatedUser;
use campspot_core::{AmenityId, CreateAmenityRequest, Marketplace};

use crate::error::ApiError;
use crate::params::SpotFilter;

/// Adds an amenity to one of the caller's spots
pub async fn add_amenity(
    market: web::Data<Marketplace>,
    user: AuthenticatedUser,
    request: web::Json<CreateAmenityRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate().map_err(ApiError::validation)?;

    let amenity = market.amenities.add(user.identity(), &request).await?;
    Ok(HttpResponse::Created().json(amenity))
}

/// Lists amenities, optionally for one spot
pub async fn list_amenities(
    market: web::Data<Marketplace>,
    _user: AuthenticatedUser,
    query: web::Query<SpotFilter>,
) -> Result<HttpResponse, ApiError> {
    let amenities = market.amenities.list(query.spot_id).await?;
    Ok(HttpResponse::Ok().json(amenities))
}

/// Removes an amenity from one of the caller's spots
pub async fn delete_amenity(
    market: web::Data<Marketplace>,
    user: AuthenticatedUser,
    path: web::Path<AmenityId>,
) -> Result<HttpResponse, ApiError> {
    market
        .amenities
        .delete(user.identity(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
