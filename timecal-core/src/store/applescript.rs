//! macOS Calendar as a calendar store, driven through AppleScript.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, TimeZone};

use crate::date_range::DateRange;
use crate::error::{TimecalError, TimecalResult};
use crate::osascript::{
    self, FLATTEN_HANDLER, Osascript, ScriptLines, date_statements, day_bound_statements, quote,
    quote_list,
};
use crate::store::{CalendarStore, EventFilter, EventRef, NewEvent, StoredEvent};
use crate::time_entry::EventSpan;

/// Message scripts return when the target calendar does not exist.
const CALENDAR_MISSING: &str = "calendar not found";

/// uid|allday|start|end|title|calendar|notes
const EVENT_FIELDS: usize = 7;

/// Handlers that print one event per line. Dates are printed as local
/// `YYYY-MM-DDTHH:MM` so parsing does not depend on the system locale.
const RECORD_HANDLERS: &str = r#"
on pad(n)
    return text -2 thru -1 of ("0" & (n as text))
end pad

on isoDate(d)
    return ((year of d) as text) & "-" & my pad((month of d) as integer) & "-" & my pad(day of d) & "T" & my pad(hours of d) & ":" & my pad(minutes of d)
end isoDate

on eventRecord(theEvent, calName)
    tell application "Calendar"
        set eventUid to uid of theEvent
        set eventSummary to summary of theEvent
        set eventStart to start date of theEvent
        set eventEnd to end date of theEvent
        set isAllDay to allday event of theEvent
        try
            set eventNotes to description of theEvent
        on error
            set eventNotes to ""
        end try
    end tell
    return eventUid & "|" & (isAllDay as text) & "|" & my isoDate(eventStart) & "|" & my isoDate(eventEnd) & "|" & my flatten(eventSummary) & "|" & my flatten(calName) & "|" & my flatten(eventNotes)
end eventRecord
"#;

#[derive(Debug, Clone, Default)]
pub struct AppleScriptCalendar {
    osascript: Osascript,
}

impl AppleScriptCalendar {
    pub fn new(osascript: Osascript) -> Self {
        AppleScriptCalendar { osascript }
    }

    /// Names of every calendar Calendar.app can see.
    pub async fn list_calendars(&self) -> TimecalResult<Vec<String>> {
        let script = r#"
tell application "Calendar"
    set output to ""
    repeat with calName in (name of every calendar)
        set output to output & calName & linefeed
    end repeat
    return output
end tell
"#;
        let output = self.osascript.run(script).await?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Every event starting within `range` on the given calendars.
    ///
    /// A calendar that cannot be read is logged and skipped.
    pub async fn list_events(
        &self,
        calendars: &[String],
        range: &DateRange,
    ) -> TimecalResult<Vec<StoredEvent>> {
        let script = format!(
            r#"{FLATTEN_HANDLER}{RECORD_HANDLERS}
{start}{end}
set output to ""
tell application "Calendar"
    repeat with calName in {names}
        try
            set theCal to calendar (calName as string)
            set theEvents to every event of theCal whose start date ≥ startDate and start date ≤ endDate
            repeat with theEvent in theEvents
                try
                    set output to output & my eventRecord(theEvent, calName as string) & linefeed
                on error eventErr
                    set output to output & "ERROR processing event in " & (calName as string) & ": " & eventErr & linefeed
                end try
            end repeat
        on error calErr
            set output to output & "ERROR accessing calendar " & (calName as string) & ": " & calErr & linefeed
        end try
    end repeat
end tell
return output
"#,
            start = day_bound_statements("startDate", range.from, false),
            end = day_bound_statements("endDate", range.to, true),
            names = quote_list(calendars),
        );

        let output = self.osascript.run(&script).await?;
        let lines = ScriptLines::parse(&output, EVENT_FIELDS);
        lines.log_diagnostics("list_events");
        Ok(lines.records.iter().filter_map(|r| parse_event(r)).collect())
    }

    fn query_script(calendar: &str, filter: &EventFilter) -> String {
        let (setup, condition) = match filter {
            EventFilter::Exact { title, span } => (
                format!(
                    "{}{}",
                    date_statements("startDate", &span.start),
                    date_statements("endDate", &span.end)
                ),
                format!(
                    "summary is {} and start date is startDate and end date is endDate",
                    quote(title)
                ),
            ),
            EventFilter::NotesContain(needle) => {
                (String::new(), format!("description contains {}", quote(needle)))
            }
        };

        format!(
            r#"{FLATTEN_HANDLER}{RECORD_HANDLERS}
tell application "Calendar"
    try
        set targetCalendar to calendar {calendar}
    on error
        return "ERROR: {CALENDAR_MISSING}"
    end try
    try
{setup}
        set matches to (every event of targetCalendar whose {condition})
        set output to ""
        repeat with theEvent in matches
            set output to output & my eventRecord(theEvent, {calendar}) & linefeed
        end repeat
        return output
    on error errMsg
        return "ERROR: " & errMsg
    end try
end tell
"#,
            calendar = quote(calendar),
        )
    }

    fn create_script(request: &NewEvent) -> String {
        format!(
            r#"tell application "Calendar"
    try
        set targetCalendar to calendar {calendar}
    on error
        return "ERROR: {CALENDAR_MISSING}"
    end try
    try
{start}{end}
        set newEvent to make new event at end of events of targetCalendar with properties {{summary:{title}, start date:startDate, end date:endDate}}
        return uid of newEvent
    on error errMsg
        return "ERROR: " & errMsg
    end try
end tell
"#,
            calendar = quote(&request.calendar),
            title = quote(&request.title),
            start = date_statements("startDate", &request.span.start),
            end = date_statements("endDate", &request.span.end),
        )
    }

    fn notes_script(event: &EventRef, notes: &str) -> String {
        format!(
            r#"tell application "Calendar"
    try
        set targetCalendar to calendar {calendar}
    on error
        return "ERROR: {CALENDAR_MISSING}"
    end try
    try
        set theEvent to first event of targetCalendar whose uid is {uid}
        set description of theEvent to {notes}
        return "OK"
    on error errMsg
        return "ERROR: " & errMsg
    end try
end tell
"#,
            calendar = quote(&event.calendar),
            uid = quote(&event.uid),
            notes = quote(notes),
        )
    }
}

/// Turn a whole-output `ERROR` line into a typed error.
fn check_output(output: &str, calendar: &str) -> TimecalResult<()> {
    match osascript::error_message(output) {
        Some(CALENDAR_MISSING) => Err(TimecalError::CalendarNotFound(calendar.to_string())),
        Some(message) => Err(TimecalError::Store(message.to_string())),
        None => Ok(()),
    }
}

fn parse_event(record: &[String]) -> Option<StoredEvent> {
    let [uid, all_day, start, end, title, calendar, notes] = record else {
        return None;
    };

    let span = if all_day == "true" {
        None
    } else {
        match (parse_local(start), parse_local(end)) {
            (Some(s), Some(e)) => Some(EventSpan::new(s, e)),
            _ => {
                tracing::warn!(uid = %uid, "unparseable event dates {start} / {end}");
                return None;
            }
        }
    };

    Some(StoredEvent {
        reference: EventRef {
            calendar: calendar.clone(),
            uid: uid.clone(),
        },
        title: title.clone(),
        span,
        notes: notes.clone(),
    })
}

fn parse_local(s: &str) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

#[async_trait]
impl CalendarStore for AppleScriptCalendar {
    async fn query_events(
        &self,
        calendar: &str,
        filter: &EventFilter,
    ) -> TimecalResult<Vec<StoredEvent>> {
        let output = self
            .osascript
            .run(&Self::query_script(calendar, filter))
            .await?;
        check_output(&output, calendar)?;

        let lines = ScriptLines::parse(&output, EVENT_FIELDS);
        lines.log_diagnostics("query_events");
        Ok(lines.records.iter().filter_map(|r| parse_event(r)).collect())
    }

    async fn create_event(&self, request: &NewEvent) -> TimecalResult<EventRef> {
        let output = self.osascript.run(&Self::create_script(request)).await?;
        check_output(&output, &request.calendar)?;

        let uid = output.trim();
        if uid.is_empty() {
            return Err(TimecalError::Store("Calendar returned no event id".into()));
        }

        Ok(EventRef {
            calendar: request.calendar.clone(),
            uid: uid.to_string(),
        })
    }

    async fn set_notes(&self, event: &EventRef, notes: &str) -> TimecalResult<()> {
        let output = self
            .osascript
            .run(&Self::notes_script(event, notes))
            .await?;
        check_output(&output, &event.calendar)
    }
}
