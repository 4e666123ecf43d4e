//! Activity summary: planned calendar events, Toggl-tracked events and
//! reminders for a date range.

pub mod reminders;
pub mod report;

pub use reminders::{Reminder, ReminderStatus, RemindersApp};
pub use report::{ActivitySummary, split_events};

use crate::date_range::DateRange;
use crate::error::TimecalResult;
use crate::store::AppleScriptCalendar;

/// Gathers everything a summary needs from Calendar.app and Reminders.app.
pub struct Summarizer<'a> {
    calendar: &'a AppleScriptCalendar,
    reminders: &'a RemindersApp,
    calendars: Vec<String>,
    lists: Vec<String>,
}

impl<'a> Summarizer<'a> {
    pub fn new(
        calendar: &'a AppleScriptCalendar,
        reminders: &'a RemindersApp,
        calendars: Vec<String>,
        lists: Vec<String>,
    ) -> Self {
        Summarizer {
            calendar,
            reminders,
            calendars,
            lists,
        }
    }

    /// Calendar events and reminders are read concurrently.
    pub async fn summarize(&self, range: &DateRange) -> TimecalResult<ActivitySummary> {
        let (events, reminders) = tokio::join!(
            self.calendar.list_events(&self.calendars, range),
            self.reminders.fetch(&self.lists, range),
        );
        Ok(ActivitySummary::new(*range, events?, reminders))
    }
}
