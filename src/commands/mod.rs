pub mod calendars;
pub mod config;
pub mod projects;
pub mod summary;
pub mod sync;
pub mod wrap_up;

use anyhow::Result;
use chrono::Local;
use timecal_core::date_range::{DateRange, parse_date};

/// A single day, or the Monday-Sunday week containing it. Defaults to today.
pub fn summary_range(date: Option<&str>, weekly: bool) -> Result<DateRange> {
    let date = match date {
        Some(s) => parse_date(s).map_err(|e| anyhow::anyhow!(e))?,
        None => Local::now().date_naive(),
    };
    Ok(if weekly {
        DateRange::week_of(date)
    } else {
        DateRange::day(date)
    })
}
