use crate::fingerprint::EventFingerprint;
use crate::store::{CalendarStore, EventFilter};
use crate::time_entry::EventSpan;

/// Whether a prospective event is already in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    Exists,
    NotExists,
    /// The store could not answer. Never to be read as `Exists`.
    Error(String),
}

pub struct DuplicateChecker<'a, S: CalendarStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: CalendarStore + ?Sized> DuplicateChecker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        DuplicateChecker { store }
    }

    /// Look for an event with the same title and times, or one whose notes
    /// carry the fingerprint. The second check catches events whose title
    /// was edited after import; the first catches events created by hand.
    pub async fn exists(&self, calendar: &str, title: &str, span: &EventSpan) -> Presence {
        let fingerprint = EventFingerprint::derive(title, &span.start, &span.end);

        let exact = EventFilter::Exact {
            title: title.to_string(),
            span: *span,
        };
        let exact_error = match self.store.query_events(calendar, &exact).await {
            Ok(found) if !found.is_empty() => return Presence::Exists,
            Ok(_) => None,
            Err(e) => Some(e.to_string()),
        };

        let by_notes = EventFilter::NotesContain(fingerprint.to_string());
        match self.store.query_events(calendar, &by_notes).await {
            Ok(found) if !found.is_empty() => Presence::Exists,
            Ok(_) => match exact_error {
                Some(detail) => Presence::Error(detail),
                None => Presence::NotExists,
            },
            Err(e) => Presence::Error(match exact_error {
                Some(first) if first != e.to_string() => format!("{first}; {e}"),
                _ => e.to_string(),
            }),
        }
    }
}
