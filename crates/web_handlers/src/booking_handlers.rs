use actix_web::{HttpResponse, Result, web};

use auth_services::middleware::AuthenticatedUser;
use campspot_core::{BookingId, CreateBookingRequest, Marketplace, UpdateBookingStatusRequest};

use crate::error::ApiError;
use crate::params::SpotQuery;

/// Books a spot for the caller. The booking starts out PENDING.
pub async fn create_booking(
    market: web::Data<Marketplace>,
    user: AuthenticatedUser,
    request: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse, ApiError> {
    let booking = market
        .bookings
        .create_booking(user.identity(), &request)
        .await?;
    Ok(HttpResponse::Created().json(booking))
}

/// Public list of a spot's bookings, used to grey out taken dates
pub async fn list_spot_bookings(
    market: web::Data<Marketplace>,
    query: web::Query<SpotQuery>,
) -> Result<HttpResponse, ApiError> {
    let bookings = market.bookings.bookings_for_spot(query.spot_id).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

/// Bookings made by the caller
pub async fn my_bookings(
    market: web::Data<Marketplace>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let bookings = market.bookings.my_bookings(user.identity()).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

/// Bookings on the caller's spots
pub async fn owner_bookings(
    market: web::Data<Marketplace>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let bookings = market.bookings.owner_bookings(user.identity()).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

/// Confirms or cancels a pending booking on one of the caller's spots
pub async fn update_booking_status(
    market: web::Data<Marketplace>,
    user: AuthenticatedUser,
    path: web::Path<BookingId>,
    request: web::Json<UpdateBookingStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let booking = market
        .bookings
        .update_status(user.identity(), path.into_inner(), request.status)
        .await?;
    Ok(HttpResponse::Ok().json(booking))
}
