//! In-memory calendar store.
//!
//! Behaves like the real store for the operations the sync uses, and can be
//! told to fail queries, creations or notes writes.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{TimecalError, TimecalResult};
use crate::store::{CalendarStore, EventFilter, EventRef, NewEvent, StoredEvent};
use crate::time_entry::EventSpan;

#[derive(Default)]
struct State {
    calendars: BTreeMap<String, Vec<StoredEvent>>,
    next_uid: u64,
    fail_queries: bool,
    reject_notes: bool,
    failing_titles: HashSet<String>,
    queries: usize,
    creates: usize,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// A store holding the given (empty) calendars.
    pub fn with_calendars(names: &[&str]) -> Self {
        let store = MemoryStore::default();
        {
            let mut state = store.state.lock();
            for name in names {
                state.calendars.insert(name.to_string(), Vec::new());
            }
        }
        store
    }

    /// Make every query fail as if the store were unreachable.
    pub fn fail_queries(&self, fail: bool) {
        self.state.lock().fail_queries = fail;
    }

    /// Make every notes write fail.
    pub fn reject_notes(&self, reject: bool) {
        self.state.lock().reject_notes = reject;
    }

    /// Make creation of events with this title fail.
    pub fn fail_create_for(&self, title: &str) {
        self.state.lock().failing_titles.insert(title.to_string());
    }

    /// Add an event that was not created by timecal.
    pub fn insert(&self, calendar: &str, title: &str, span: EventSpan, notes: &str) -> EventRef {
        let mut state = self.state.lock();
        let reference = EventRef {
            calendar: calendar.to_string(),
            uid: next_uid(&mut state),
        };
        state
            .calendars
            .entry(calendar.to_string())
            .or_default()
            .push(StoredEvent {
                reference: reference.clone(),
                title: title.to_string(),
                span: Some(span.to_minutes()),
                notes: notes.to_string(),
            });
        reference
    }

    pub fn events(&self, calendar: &str) -> Vec<StoredEvent> {
        self.state
            .lock()
            .calendars
            .get(calendar)
            .cloned()
            .unwrap_or_default()
    }

    pub fn event_count(&self) -> usize {
        self.state.lock().calendars.values().map(Vec::len).sum()
    }

    pub fn query_count(&self) -> usize {
        self.state.lock().queries
    }

    pub fn create_count(&self) -> usize {
        self.state.lock().creates
    }
}

fn next_uid(state: &mut State) -> String {
    state.next_uid += 1;
    format!("MEM-{:04}", state.next_uid)
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn query_events(
        &self,
        calendar: &str,
        filter: &EventFilter,
    ) -> TimecalResult<Vec<StoredEvent>> {
        let mut state = self.state.lock();
        state.queries += 1;

        if state.fail_queries {
            return Err(TimecalError::Store("store unreachable".into()));
        }

        let events = state
            .calendars
            .get(calendar)
            .ok_or_else(|| TimecalError::CalendarNotFound(calendar.to_string()))?;

        Ok(events.iter().filter(|e| filter.matches(e)).cloned().collect())
    }

    async fn create_event(&self, request: &NewEvent) -> TimecalResult<EventRef> {
        let mut state = self.state.lock();
        state.creates += 1;

        if state.failing_titles.contains(&request.title) {
            return Err(TimecalError::Store(format!(
                "rejected event '{}'",
                request.title
            )));
        }
        if !state.calendars.contains_key(&request.calendar) {
            return Err(TimecalError::CalendarNotFound(request.calendar.clone()));
        }

        let reference = EventRef {
            calendar: request.calendar.clone(),
            uid: next_uid(&mut state),
        };
        let event = StoredEvent {
            reference: reference.clone(),
            title: request.title.clone(),
            span: Some(request.span.to_minutes()),
            notes: String::new(),
        };
        if let Some(events) = state.calendars.get_mut(&request.calendar) {
            events.push(event);
        }

        Ok(reference)
    }

    async fn set_notes(&self, event: &EventRef, notes: &str) -> TimecalResult<()> {
        let mut state = self.state.lock();

        if state.reject_notes {
            return Err(TimecalError::Store("notes are read-only".into()));
        }

        let stored = state
            .calendars
            .get_mut(&event.calendar)
            .and_then(|events| events.iter_mut().find(|e| e.reference == *event))
            .ok_or_else(|| TimecalError::Store(format!("no event with uid {}", event.uid)))?;

        stored.notes = notes.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: &str, end: &str) -> EventSpan {
        EventSpan::parse(start, end).unwrap()
    }

    #[tokio::test]
    async fn test_exact_and_notes_queries() {
        let store = MemoryStore::with_calendars(&["Work"]);
        let s = span("2025-07-30T09:00:00Z", "2025-07-30T09:30:00Z");
        store.insert("Work", "Standup", s, "Imported from Toggl - ID: 0badc0de");

        let exact = EventFilter::Exact { title: "Standup".into(), span: s };
        assert_eq!(store.query_events("Work", &exact).await.unwrap().len(), 1);

        let other = EventFilter::Exact {
            title: "Standup".into(),
            span: span("2025-07-30T09:00:00Z", "2025-07-30T09:31:00Z"),
        };
        assert!(store.query_events("Work", &other).await.unwrap().is_empty());

        let by_notes = EventFilter::NotesContain("0badc0de".into());
        assert_eq!(store.query_events("Work", &by_notes).await.unwrap().len(), 1);
        assert_eq!(store.query_count(), 3);
    }

    #[tokio::test]
    async fn test_unknown_calendar() {
        let store = MemoryStore::with_calendars(&["Work"]);
        let filter = EventFilter::NotesContain("x".into());
        let result = store.query_events("Nope", &filter).await;
        assert!(matches!(result, Err(TimecalError::CalendarNotFound(_))));

        let request = NewEvent {
            calendar: "Nope".into(),
            title: "x".into(),
            span: span("2025-07-30T09:00:00Z", "2025-07-30T09:30:00Z"),
        };
        assert!(store.create_event(&request).await.is_err());
        assert_eq!(store.event_count(), 0);
    }

    #[tokio::test]
    async fn test_create_then_set_notes() {
        let store = MemoryStore::with_calendars(&["Growth"]);
        let request = NewEvent {
            calendar: "Growth".into(),
            title: "Read".into(),
            span: span("2025-07-30T09:00:00Z", "2025-07-30T10:00:00Z"),
        };

        let reference = store.create_event(&request).await.unwrap();
        store.set_notes(&reference, "hello").await.unwrap();

        let events = store.events("Growth");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].notes, "hello");

        store.reject_notes(true);
        assert!(store.set_notes(&reference, "again").await.is_err());
        assert_eq!(store.events("Growth")[0].notes, "hello");
    }
}
