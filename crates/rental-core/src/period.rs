//! # Booking Periods
//!
//! A rental occupies the half-open calendar range `[start, end)`: the end
//! date is the day the items are back, so it is free for the next booking.
//!
//! ```text
//!   Jan 10   Jan 11   Jan 12   Jan 13
//!   ├────────┼────────┤
//!   │ rental A        │                 A = [10, 12)
//!                     ├────────┼────────┤
//!                     │ rental B        │  B = [12, 14)
//!
//!   A and B share no day: back-to-back bookings never conflict.
//! ```

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;

/// A non-empty half-open range of calendar days.
///
/// Deserialization goes through [`DateRange::new`], so a payload with
/// `end <= start` is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    start: NaiveDate,
    #[ts(as = "String")]
    end: NaiveDate,
}

impl DateRange {
    /// Builds `[start, end)`. Fails unless `end > start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidDateRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    /// Builds a range from a pair of optional columns.
    ///
    /// Both absent is "no range"; exactly one absent is an error.
    pub fn from_optional(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Option<Self>, ValidationError> {
        match (start, end) {
            (Some(start), Some(end)) => DateRange::new(start, end).map(Some),
            (None, None) => Ok(None),
            _ => Err(ValidationError::MissingDates),
        }
    }

    #[inline]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// First day *not* covered.
    #[inline]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days covered (always ≥ 1).
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Returns true if `day` falls in `[start, end)`.
    #[inline]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    /// Returns true if the two ranges share at least one day.
    #[inline]
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Iterates every covered day in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.len_days()).map(move |offset| start + Duration::days(offset))
    }
}

impl<'de> Deserialize<'de> for DateRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Fields {
            start: NaiveDate,
            end: NaiveDate,
        }

        let Fields { start, end } = Fields::deserialize(deserializer)?;
        DateRange::new(start, end).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_rejects_empty_and_inverted_ranges() {
        assert_eq!(
            DateRange::new(day(10), day(10)),
            Err(ValidationError::InvalidDateRange {
                start: day(10),
                end: day(10)
            })
        );
        assert!(DateRange::new(day(12), day(10)).is_err());
    }

    #[test]
    fn test_days_excludes_end() {
        let range = DateRange::new(day(10), day(13)).unwrap();
        let days: Vec<_> = range.days().collect();
        assert_eq!(days, vec![day(10), day(11), day(12)]);
        assert_eq!(range.len_days(), 3);
        assert!(range.contains(day(12)));
        assert!(!range.contains(day(13)));
    }

    #[test]
    fn test_back_to_back_ranges_do_not_overlap() {
        let a = DateRange::new(day(10), day(12)).unwrap();
        let b = DateRange::new(day(12), day(14)).unwrap();
        let c = DateRange::new(day(11), day(13)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_from_optional() {
        assert_eq!(DateRange::from_optional(None, None), Ok(None));
        assert_eq!(
            DateRange::from_optional(Some(day(10)), None),
            Err(ValidationError::MissingDates)
        );
        assert!(DateRange::from_optional(Some(day(10)), Some(day(11)))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_deserialize_checks_order() {
        let range: DateRange =
            serde_json::from_str(r#"{"start":"2024-01-10","end":"2024-01-12"}"#).unwrap();
        assert_eq!(range.len_days(), 2);

        let err = serde_json::from_str::<DateRange>(r#"{"start":"2024-01-12","end":"2024-01-10"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("must be after start date"));
        let empty = r#"{"start":"2024-01-10","end":"2024-01-10"}"#;
        assert!(serde_json::from_str::<DateRange>(empty).is_err());
    }

    #[test]
    fn test_crosses_month_boundary() {
        let range = DateRange::new(day(31), NaiveDate::from_ymd_opt(2024, 2, 2).unwrap()).unwrap();
        assert_eq!(range.len_days(), 2);
        assert_eq!(range.to_string(), "[2024-01-31, 2024-02-02)");
    }
}
