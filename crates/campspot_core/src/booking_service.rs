use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::availability::{DateRange, OverlapPolicy, is_available};
use crate::error::{ConflictKind, CoreError, CoreResult, Entity, ForbiddenReason};
use crate::lifecycle::authorize_transition;
use crate::repository::{BookingRepository, Repositories, SpotRepository};
use crate::types::*;

/// Service for creating bookings and moving them through their lifecycle
#[derive(Clone)]
pub struct BookingService {
    spots: Arc<dyn SpotRepository>,
    bookings: Arc<dyn BookingRepository>,
    policy: OverlapPolicy,
}

impl BookingService {
    /// Creates a new `BookingService` using `policy` for overlap checks
    pub fn new(repositories: &Repositories, policy: OverlapPolicy) -> Self {
        Self {
            spots: repositories.spots.clone(),
            bookings: repositories.bookings.clone(),
            policy,
        }
    }

    /// Overlap policy in effect
    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    /// Books a spot for the caller.
    ///
    /// The booking always starts out PENDING and its price is derived from
    /// the spot's nightly rate.
    pub async fn create_booking(
        &self,
        caller: &Identity,
        request: &CreateBookingRequest,
    ) -> CoreResult<Booking> {
        let spot = self.require_spot(request.spot_id).await?;

        if spot.owner_id == caller.user_id {
            return Err(CoreError::Forbidden(ForbiddenReason::SelfBooking));
        }

        let range = DateRange::new(request.start_date, request.end_date)?;

        let new_booking = NewBooking {
            spot_id: spot.id,
            renter_id: caller.user_id,
            start_date: range.start,
            end_date: range.end,
            total_price: spot.price_for(&range),
        };

        let booking = self
            .bookings
            .insert_if_available(&new_booking, self.policy)
            .await
            .inspect_err(|e| {
                if matches!(e, CoreError::Conflict(ConflictKind::Overlap)) {
                    debug!(
                        "Spot {} already booked between {} and {}",
                        spot.id, range.start, range.end
                    );
                }
            })?;

        info!(
            "Booking {} created for spot {} by user {} ({} nights)",
            booking.id,
            spot.id,
            caller.user_id,
            range.nights()
        );

        Ok(booking)
    }

    /// Whether `spot_id` can currently be booked from `start_date` to
    /// `end_date`. The spot is assumed to exist.
    pub async fn is_available(
        &self,
        spot_id: SpotId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> CoreResult<bool> {
        let range = DateRange {
            start: start_date,
            end: end_date,
        };
        let active = self.bookings.active_bookings_for_spot(spot_id).await?;
        Ok(is_available(&active, spot_id, &range, self.policy))
    }

    /// Price and availability of a prospective stay
    pub async fn quote(&self, spot_id: SpotId, query: &QuoteQuery) -> CoreResult<Quote> {
        let spot = self.require_spot(spot_id).await?;
        let range = DateRange::new(query.start_date, query.end_date)?;
        let available = self.is_available(spot.id, range.start, range.end).await?;

        Ok(Quote {
            spot_id: spot.id,
            start_date: range.start,
            end_date: range.end,
            nights: range.nights(),
            total_price: spot.price_for(&range),
            available,
        })
    }

    /// Confirms or cancels a pending booking on one of the caller's spots
    pub async fn update_status(
        &self,
        caller: &Identity,
        booking_id: BookingId,
        target: BookingStatus,
    ) -> CoreResult<Booking> {
        let booking = self
            .bookings
            .find_booking(booking_id)
            .await?
            .ok_or(CoreError::NotFound(Entity::Booking))?;
        let spot = self.require_spot(booking.spot_id).await?;

        authorize_transition(caller, &spot, &booking, target)?;

        // Another request may have decided the booking since it was read.
        let updated = self
            .bookings
            .update_status(booking.id, booking.status, target)
            .await?
            .ok_or_else(|| {
                warn!("Booking {} changed status concurrently", booking.id);
                CoreError::Forbidden(ForbiddenReason::TerminalStatus)
            })?;

        info!(
            "Booking {} moved from {} to {} by owner {}",
            updated.id,
            booking.status.as_str(),
            updated.status.as_str(),
            caller.user_id
        );

        Ok(updated)
    }

    /// All bookings of a spot ordered by start date
    pub async fn bookings_for_spot(&self, spot_id: SpotId) -> CoreResult<Vec<Booking>> {
        self.bookings.bookings_for_spot(spot_id).await
    }

    /// Bookings made by the caller
    pub async fn my_bookings(&self, caller: &Identity) -> CoreResult<Vec<Booking>> {
        self.bookings.bookings_for_renter(caller.user_id).await
    }

    /// Bookings on spots the caller owns
    pub async fn owner_bookings(&self, caller: &Identity) -> CoreResult<Vec<Booking>> {
        self.bookings.bookings_for_owner(caller.user_id).await
    }

    async fn require_spot(&self, spot_id: SpotId) -> CoreResult<Spot> {
        self.spots
            .find_spot(spot_id)
            .await?
            .ok_or(CoreError::NotFound(Entity::Spot))
    }
}
