use std::fmt::Write;

use crate::date_range::DateRange;
use crate::store::StoredEvent;
use crate::sync::IMPORT_MARKER;

use super::reminders::{Reminder, ReminderStatus};

const NOTE_PREVIEW_CHARS: usize = 50;

/// Split events into (planned, tracked). Tracked events carry the import
/// marker in their notes.
pub fn split_events(events: Vec<StoredEvent>) -> (Vec<StoredEvent>, Vec<StoredEvent>) {
    let (tracked, planned) = events
        .into_iter()
        .partition(|event| event.notes.contains(IMPORT_MARKER));
    (planned, tracked)
}

#[derive(Debug, Clone)]
pub struct ActivitySummary {
    pub range: DateRange,
    pub planned: Vec<StoredEvent>,
    pub tracked: Vec<StoredEvent>,
    pub overdue: Vec<Reminder>,
    pub completed: Vec<Reminder>,
}

impl ActivitySummary {
    pub fn new(range: DateRange, events: Vec<StoredEvent>, reminders: Vec<Reminder>) -> Self {
        let (mut planned, mut tracked) = split_events(events);
        planned.sort_by_key(|e| e.span.map(|s| s.start));
        tracked.sort_by_key(|e| e.span.map(|s| s.start));

        let (overdue, completed) = reminders
            .into_iter()
            .partition(|r| r.status == ReminderStatus::Overdue);

        ActivitySummary {
            range,
            planned,
            tracked,
            overdue,
            completed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.planned.is_empty()
            && self.tracked.is_empty()
            && self.overdue.is_empty()
            && self.completed.is_empty()
    }

    /// Plain-text report, also used as the assistant's input.
    pub fn render(&self, show_notes: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "🗓️ Comprehensive Daily Summary for {}", self.range.label());
        out.push('\n');

        self.section(&mut out, "📅 Planned Calendar Events:", &self.planned, show_notes);
        self.section(&mut out, "⏱️ Actual Events (Toggl):", &self.tracked, false);

        let _ = writeln!(out, "🚨 Overdue Reminders:");
        write_reminders(&mut out, &self.overdue, show_notes);
        let _ = writeln!(out, "✅ Completed Reminders:");
        write_reminders(&mut out, &self.completed, show_notes);

        let _ = writeln!(out, "📊 Summary:");
        let _ = writeln!(out, "  Planned events: {}", self.planned.len());
        let _ = writeln!(out, "  Tracked events: {}", self.tracked.len());
        let _ = writeln!(out, "  Overdue reminders: {}", self.overdue.len());
        let _ = writeln!(out, "  Completed reminders: {}", self.completed.len());
        out
    }

    fn section(&self, out: &mut String, heading: &str, events: &[StoredEvent], show_notes: bool) {
        let _ = writeln!(out, "{heading}");
        if events.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for event in events {
            let _ = write!(
                out,
                "  {} | {} | {}",
                self.event_time(event),
                event.title,
                event.reference.calendar
            );
            if show_notes && !event.notes.is_empty() {
                let _ = write!(out, " | Note: {}", preview(&event.notes));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    /// Multi-day ranges include the weekday and date.
    fn event_time(&self, event: &StoredEvent) -> String {
        let Some(span) = event.span else {
            return "All day".to_string();
        };
        let times = format!("{}-{}", span.start.format("%H:%M"), span.end.format("%H:%M"));
        if self.range.is_single_day() {
            times
        } else {
            format!("{} {}", span.start.format("%a %m-%d"), times)
        }
    }
}

fn write_reminders(out: &mut String, reminders: &[Reminder], show_notes: bool) {
    if reminders.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for reminder in reminders {
        let marker = reminder.priority_marker();
        let _ = write!(out, "  {} | {reminder}", reminder.due);
        if !marker.is_empty() {
            let _ = write!(out, " {marker}");
        }
        if show_notes && !reminder.body.is_empty() {
            let _ = write!(out, " | Note: {}", preview(&reminder.body));
        }
        out.push('\n');
    }
    out.push('\n');
}

fn preview(text: &str) -> String {
    if text.chars().count() > NOTE_PREVIEW_CHARS {
        let cut: String = text.chars().take(NOTE_PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
