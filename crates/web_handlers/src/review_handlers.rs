use actix_web::{HttpResponse, Result, web};
use validator::Validate;

use auth_services::middleware::AuthenticatedUser;
use campspot_core::{CreateReviewRequest, Marketplace, ReviewId};

use crate::error::ApiError;
use crate::params::SpotQuery;

/// Posts the caller's review of a spot
pub async fn create_review(
    market: web::Data<Marketplace>,
    user: AuthenticatedUser,
    request: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate().map_err(ApiError::validation)?;

    let review = market.reviews.create(user.identity(), &request).await?;
    Ok(HttpResponse::Created().json(review))
}

/// Public list of a spot's reviews, newest first
pub async fn list_reviews(
    market: web::Data<Marketplace>,
    query: web::Query<SpotQuery>,
) -> Result<HttpResponse, ApiError> {
    let reviews = market.reviews.for_spot(query.spot_id).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

/// Deletes one of the caller's reviews
pub async fn delete_review(
    market: web::Data<Marketplace>,
    user: AuthenticatedUser,
    path: web::Path<ReviewId>,
) -> Result<HttpResponse, ApiError> {
    market
        .reviews
        .delete(user.identity(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
