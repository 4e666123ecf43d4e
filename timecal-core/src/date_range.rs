//! Inclusive day ranges used for syncing and summaries.

use chrono::{Datelike, Days, Duration, Local, NaiveDate};

/// Number of past days synced when no range is given.
pub const DEFAULT_SYNC_DAYS: u32 = 7;

/// Longest look-back accepted for a sync, about ten years.
pub const MAX_SYNC_DAYS: u32 = 3650;

/// An inclusive range of local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, String> {
        if from > to {
            return Err(format!("Range start {from} is after range end {to}"));
        }
        Ok(DateRange { from, to })
    }

    /// `days` days before `today` through `today`.
    pub fn last_days(today: NaiveDate, days: u32) -> Result<Self, String> {
        let from = today
            .checked_sub_days(Days::new(days.into()))
            .ok_or_else(|| format!("Cannot go back {days} days from {today}"))?;
        Ok(DateRange { from, to: today })
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        DateRange { from: date, to: date }
    }

    /// Monday through Sunday of the week containing `date`.
    pub fn week_of(date: NaiveDate) -> Self {
        let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
        DateRange {
            from: monday,
            to: monday + Duration::days(6),
        }
    }

    /// Parse optional YYYY-MM-DD bounds.
    /// - `from` defaults to `default_days` before `to`
    /// - `to` defaults to today
    pub fn from_args(
        from: Option<&str>,
        to: Option<&str>,
        default_days: u32,
    ) -> Result<Self, String> {
        let to = match to {
            Some(s) => parse_date(s)?,
            None => Local::now().date_naive(),
        };

        match from {
            Some(s) => Self::new(parse_date(s)?, to),
            None => Self::last_days(to, default_days),
        }
    }

    pub fn is_single_day(&self) -> bool {
        self.from == self.to
    }

    /// Start bound in the form the Toggl API expects.
    pub fn toggl_start(&self) -> String {
        format!("{}T00:00:00.000Z", self.from.format("%Y-%m-%d"))
    }

    /// End bound in the form the Toggl API expects.
    pub fn toggl_end(&self) -> String {
        format!("{}T23:59:59.999Z", self.to.format("%Y-%m-%d"))
    }

    /// "2025-07-30" for a single day, "2025-07-28 to 2025-08-03" otherwise.
    pub fn label(&self) -> String {
        if self.is_single_day() {
            self.from.to_string()
        } else {
            format!("{} to {}", self.from, self.to)
        }
    }
}

/// Parse YYYY-MM-DD
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_week_of_starts_on_monday() {
        // 2025-07-30 is a Wednesday
        let week = DateRange::week_of(date("2025-07-30"));
        assert_eq!(week.from, date("2025-07-28"));
        assert_eq!(week.to, date("2025-08-03"));
        assert_eq!(week.label(), "2025-07-28 to 2025-08-03");
    }

    #[test]
    fn test_toggl_bounds() {
        let range = DateRange::last_days(date("2025-07-30"), 7).unwrap();
        assert_eq!(range.toggl_start(), "2025-07-23T00:00:00.000Z");
        assert_eq!(range.toggl_end(), "2025-07-30T23:59:59.999Z");
    }

    #[test]
    fn test_from_args() {
        let range = DateRange::from_args(Some("2025-07-01"), Some("2025-07-02"), 7).unwrap();
        assert_eq!(range.from, date("2025-07-01"));
        assert!(!range.is_single_day());

        let range = DateRange::from_args(None, Some("2025-07-10"), 3).unwrap();
        assert_eq!(range.from, date("2025-07-07"));

        assert!(DateRange::from_args(Some("2025-07-03"), Some("2025-07-02"), 7).is_err());
        assert!(DateRange::from_args(Some("07/03/2025"), None, 7).is_err());
    }

    #[test]
    fn test_last_days_out_of_range_is_error() {
        assert!(DateRange::last_days(date("2025-07-30"), u32::MAX).is_err());
        assert!(DateRange::from_args(None, Some("2025-07-30"), u32::MAX).is_err());

        let range = DateRange::last_days(date("2025-07-30"), 0).unwrap();
        assert!(range.is_single_day());
    }
}
