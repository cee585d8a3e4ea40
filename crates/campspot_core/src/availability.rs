use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Booking, BookingStatus, SpotId};

/// How two stays that touch on the checkout day are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Both ends compared inclusively: a stay ending on the 5th collides
    /// with one starting on the 5th.
    Inclusive,
    /// The checkout day is free for the next arrival.
    #[default]
    Turnover,
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inclusive" => Ok(OverlapPolicy::Inclusive),
            "turnover" | "same_day_turnover" | "same-day-turnover" => Ok(OverlapPolicy::Turnover),
            other => Err(format!("unknown overlap policy: {other}")),
        }
    }
}

/// A stay from `start` (first night) to `end` (checkout)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First night
    pub start: NaiveDate,
    /// Checkout date
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range covering at least one night, or fails with
    /// [`CoreError::InvalidRange`].
    pub fn new(start: NaiveDate, end: NaiveDate) -> CoreResult<Self> {
        if end <= start {
            return Err(CoreError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// Number of nights in the stay
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Whether the two stays collide under `policy`
    pub fn overlaps(&self, other: &DateRange, policy: OverlapPolicy) -> bool {
        match policy {
            OverlapPolicy::Inclusive => self.start <= other.end && self.end >= other.start,
            OverlapPolicy::Turnover => self.start < other.end && self.end > other.start,
        }
    }
}

impl Booking {
    /// Dates covered by this booking
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    /// Whether this booking still holds its dates
    pub fn is_active(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }
}

/// Returns the first active booking on `spot_id` that collides with `range`.
///
/// Bookings on other spots and cancelled bookings never conflict.
pub fn find_conflict<'a, I>(
    bookings: I,
    spot_id: SpotId,
    range: &DateRange,
    policy: OverlapPolicy,
) -> Option<&'a Booking>
where
    I: IntoIterator<Item = &'a Booking>,
{
    bookings.into_iter().find(|booking| {
        booking.spot_id == spot_id && booking.is_active() && booking.range().overlaps(range, policy)
    })
}

/// True when no active booking on `spot_id` collides with `range`.
pub fn is_available<'a, I>(
    bookings: I,
    spot_id: SpotId,
    range: &DateRange,
    policy: OverlapPolicy,
) -> bool
where
    I: IntoIterator<Item = &'a Booking>,
{
    find_conflict(bookings, spot_id, range, policy).is_none()
}
