use crate::error::{CoreError, CoreResult, ForbiddenReason};
use crate::types::{Booking, BookingStatus, Identity, Spot};

impl BookingStatus {
    /// Whether no further transition is allowed from this status
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Cancelled)
    }

    /// Database and wire representation
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    /// Validates a move from `self` to `target`.
    ///
    /// Only `PENDING -> CONFIRMED` and `PENDING -> CANCELLED` exist.
    pub fn transition(self, target: BookingStatus) -> CoreResult<BookingStatus> {
        match (self, target) {
            (BookingStatus::Pending, BookingStatus::Confirmed | BookingStatus::Cancelled) => {
                Ok(target)
            }
            (BookingStatus::Pending, BookingStatus::Pending) => {
                Err(CoreError::Forbidden(ForbiddenReason::IllegalTransition))
            }
            _ => Err(CoreError::Forbidden(ForbiddenReason::TerminalStatus)),
        }
    }
}

/// Checks that `caller` owns `spot` and that `booking` may move to `target`.
pub fn authorize_transition(
    caller: &Identity,
    spot: &Spot,
    booking: &Booking,
    target: BookingStatus,
) -> CoreResult<BookingStatus> {
    if spot.owner_id != caller.user_id {
        return Err(CoreError::Forbidden(ForbiddenReason::NotOwner));
    }
    booking.status.transition(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    const ALL: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
    ];

    fn spot(owner_id: i32) -> Spot {
        Spot {
            id: 1,
            owner_id,
            location_id: 1,
            name: "Lakeside".to_string(),
            description: None,
            nightly_rate: 50.0,
            capacity: 4,
            created_at: Utc::now(),
        }
    }

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: 1,
            spot_id: 1,
            renter_id: 9,
            start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 7, 3).unwrap(),
            status,
            total_price: 100.0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_pending_can_be_confirmed_or_cancelled() {
        assert_eq!(
            BookingStatus::Pending.transition(BookingStatus::Confirmed).unwrap(),
            BookingStatus::Confirmed
        );
        assert_eq!(
            BookingStatus::Pending.transition(BookingStatus::Cancelled).unwrap(),
            BookingStatus::Cancelled
        );
    }

    #[test]
    fn test_terminal_states_reject_every_transition() {
        for from in [BookingStatus::Confirmed, BookingStatus::Cancelled] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(matches!(
                    from.transition(to),
                    Err(CoreError::Forbidden(ForbiddenReason::TerminalStatus))
                ));
            }
        }
    }

    #[test]
    fn test_pending_to_pending_is_not_a_transition() {
        assert!(matches!(
            BookingStatus::Pending.transition(BookingStatus::Pending),
            Err(CoreError::Forbidden(ForbiddenReason::IllegalTransition))
        ));
    }

    #[test]
    fn test_only_spot_owner_may_transition() {
        let spot = spot(5);
        let pending = booking(BookingStatus::Pending);

        assert!(authorize_transition(&Identity::new(5), &spot, &pending, BookingStatus::Confirmed).is_ok());
        assert!(matches!(
            authorize_transition(&Identity::new(9), &spot, &pending, BookingStatus::Cancelled),
            Err(CoreError::Forbidden(ForbiddenReason::NotOwner))
        ));
    }

    #[test]
    fn test_status_strings() {
        let names: Vec<_> = ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, ["PENDING", "CONFIRMED", "CANCELLED"]);
    }
}
