use actix_web::{HttpResponse, Result, web};
use validator::Validate;

use auth_services::middleware::AuthenticatedUser;
use campspot_core::{CreateSpotRequest, Marketplace, QuoteQuery, SpotId, SpotSearchQuery};

use crate::error::ApiError;

/// Creates a spot at one of the caller's locations
pub async fn create_spot(
    market: web::Data<Marketplace>,
    user: AuthenticatedUser,
    request: web::Json<CreateSpotRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate().map_err(ApiError::validation)?;

    let spot = market.spots.create(user.identity(), &request).await?;
    Ok(HttpResponse::Created().json(spot))
}

/// Lists the caller's spots
pub async fn my_spots(
    market: web::Data<Marketplace>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let spots = market.spots.mine(user.identity()).await?;
    Ok(HttpResponse::Ok().json(spots))
}

/// Owner view of a spot with its location, amenities and reviews
pub async fn spot_detail(
    market: web::Data<Marketplace>,
    user: AuthenticatedUser,
    path: web::Path<SpotId>,
) -> Result<HttpResponse, ApiError> {
    let detail = market.spots.detail(user.identity(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Public search by place name or by distance from `lat`/`lng`
pub async fn search_spots(
    market: web::Data<Marketplace>,
    query: web::Query<SpotSearchQuery>,
) -> Result<HttpResponse, ApiError> {
    query.validate().map_err(ApiError::validation)?;

    let listings = market.spots.search(&query).await?;
    Ok(HttpResponse::Ok().json(listings))
}

/// Price and availability for a prospective stay
pub async fn quote_spot(
    market: web::Data<Marketplace>,
    path: web::Path<SpotId>,
    query: web::Query<QuoteQuery>,
) -> Result<HttpResponse, ApiError> {
    let quote = market.bookings.quote(path.into_inner(), &query).await?;
    Ok(HttpResponse::Ok().json(quote))
}
