//! Calendar store capability.
//!
//! The sync only needs three operations from a calendar store: find events,
//! create an event, and write an event's notes. `AppleScriptCalendar` drives
//! macOS Calendar; `MemoryStore` keeps everything in memory for tests.

pub mod applescript;
pub mod memory;

use async_trait::async_trait;

use crate::error::TimecalResult;
use crate::time_entry::EventSpan;

pub use applescript::AppleScriptCalendar;
pub use memory::MemoryStore;

/// Handle to an event inside the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventRef {
    pub calendar: String,
    pub uid: String,
}

/// Which events a query should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    /// Same title, same start and same end, compared to the minute
    Exact { title: String, span: EventSpan },
    /// Notes contain the given text
    NotesContain(String),
}

impl EventFilter {
    pub fn matches(&self, event: &StoredEvent) -> bool {
        match self {
            EventFilter::Exact { title, span } => {
                event.title == *title
                    && event.span.map(|s| s.to_minutes()) == Some(span.to_minutes())
            }
            EventFilter::NotesContain(needle) => event.notes.contains(needle.as_str()),
        }
    }
}

/// Request to create an event. Text fields are raw; encoding them for the
/// target store is the adapter's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub calendar: String,
    pub title: String,
    pub span: EventSpan,
}

/// An event read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    pub reference: EventRef,
    pub title: String,
    /// `None` for all-day events
    pub span: Option<EventSpan>,
    pub notes: String,
}

#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn query_events(&self, calendar: &str, filter: &EventFilter)
    -> TimecalResult<Vec<StoredEvent>>;

    async fn create_event(&self, request: &NewEvent) -> TimecalResult<EventRef>;

    async fn set_notes(&self, event: &EventRef, notes: &str) -> TimecalResult<()>;
}
