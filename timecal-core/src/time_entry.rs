//! Toggl time entries as seen by the sync.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::date_range::DateRange;
use crate::error::TimecalResult;
use crate::fingerprint::truncate_to_minute;

/// Title used for entries without a description.
pub const NO_DESCRIPTION: &str = "No description";

/// A time entry returned by the Toggl API.
///
/// `start` and `stop` are kept as the raw strings so that one malformed entry
/// is classified on its own instead of failing the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeEntry {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_project_id")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    /// End of the entry; absent while the timer is still running
    #[serde(default)]
    pub stop: Option<String>,
    /// Seconds; negative while running
    #[serde(default)]
    pub duration: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

/// Anything that can produce the time entries of a date range.
#[async_trait]
pub trait TimeEntrySource: Send + Sync {
    async fn fetch(&self, range: &DateRange) -> TimecalResult<Vec<TimeEntry>>;
}

/// A fixed list of entries, returned whatever the range.
#[async_trait]
impl TimeEntrySource for Vec<TimeEntry> {
    async fn fetch(&self, _range: &DateRange) -> TimecalResult<Vec<TimeEntry>> {
        Ok(self.clone())
    }
}

/// Start and end of an event in the local offset, at the precision the
/// source reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSpan {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl EventSpan {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        EventSpan { start, end }
    }

    /// The span as a calendar holds it: seconds dropped.
    pub fn to_minutes(&self) -> Self {
        EventSpan {
            start: truncate_to_minute(self.start),
            end: truncate_to_minute(self.end),
        }
    }

    /// Parse RFC 3339 bounds and move them to the local offset.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        let start = DateTime::parse_from_rfc3339(start).ok()?;
        let end = DateTime::parse_from_rfc3339(end).ok()?;
        if end < start {
            return None;
        }
        Some(Self::new(to_local(start), to_local(end)))
    }
}

impl TimeEntry {
    pub fn new(description: &str, project_id: Option<&str>, start: &str, stop: &str) -> Self {
        TimeEntry {
            description: Some(description.to_string()),
            project_id: project_id.map(str::to_string),
            start: Some(start.to_string()),
            stop: Some(stop.to_string()),
            ..Default::default()
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Event title for this entry.
    pub fn title(&self) -> &str {
        match self.description.as_deref() {
            Some(d) if !d.trim().is_empty() => d,
            _ => NO_DESCRIPTION,
        }
    }

    /// `None` when start or stop is missing, malformed, or reversed.
    pub fn span(&self) -> Option<EventSpan> {
        EventSpan::parse(self.start.as_deref()?, self.stop.as_deref()?)
    }

    /// Tags as `#a, #b`, empty when untagged.
    pub fn tag_string(&self) -> String {
        self.tags
            .iter()
            .map(|t| format!("#{t}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// "1h 5m" or "42m"
    pub fn duration_label(&self) -> String {
        let seconds = self.duration.max(0);
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        if hours > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{minutes}m")
        }
    }
}

pub fn to_local(dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    dt.with_timezone(&Local).fixed_offset()
}

/// Toggl sends project ids as numbers; configs key them as strings.
fn lenient_project_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(d)?.unwrap_or_default())
}
