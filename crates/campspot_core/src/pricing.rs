use chrono::NaiveDate;

use crate::availability::DateRange;
use crate::error::CoreResult;
use crate::types::Spot;

/// Number of nights between `start_date` and `end_date`.
///
/// Fails with [`crate::CoreError::InvalidRange`] unless the stay covers at
/// least one night.
pub fn nights(start_date: NaiveDate, end_date: NaiveDate) -> CoreResult<i64> {
    Ok(DateRange::new(start_date, end_date)?.nights())
}

/// Total price of a stay at `nightly_rate`.
pub fn price(nightly_rate: f64, start_date: NaiveDate, end_date: NaiveDate) -> CoreResult<f64> {
    let nights = nights(start_date, end_date)?;
    Ok(nights as f64 * nightly_rate)
}

impl Spot {
    /// Price of staying at this spot for `range`
    pub fn price_for(&self, range: &DateRange) -> f64 {
        range.nights() as f64 * self.nightly_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;
    use chrono::Days;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    #[test]
    fn test_price_is_nights_times_rate() {
        let start = date(7, 5);
        for n in 1..=30u64 {
            let end = start.checked_add_days(Days::new(n)).unwrap();
            assert_eq!(price(50.0, start, end).unwrap(), n as f64 * 50.0);
        }
    }

    #[test]
    fn test_price_across_month_boundary() {
        assert_eq!(nights(date(6, 29), date(7, 2)).unwrap(), 3);
        assert_eq!(price(35.5, date(6, 29), date(7, 2)).unwrap(), 106.5);
    }

    #[test]
    fn test_non_positive_nights_rejected() {
        assert!(matches!(
            price(50.0, date(7, 5), date(7, 5)),
            Err(CoreError::InvalidRange)
        ));
        assert!(matches!(
            nights(date(7, 7), date(7, 5)),
            Err(CoreError::InvalidRange)
        ));
    }
}
