use crate::error::TimecalResult;
use crate::fingerprint::EventFingerprint;
use crate::store::{CalendarStore, EventRef, NewEvent};
use crate::time_entry::EventSpan;

/// Prefix of the notes line that marks an event as imported.
pub const IMPORT_MARKER: &str = "Imported from Toggl - ID";

/// Notes text for an imported event: the fingerprint line, then the tags.
pub fn notes_for(fingerprint: &EventFingerprint, tag_string: &str) -> String {
    let marker = format!("{IMPORT_MARKER}: {fingerprint}");
    if tag_string.is_empty() {
        marker
    } else {
        format!("{marker}\n{tag_string}")
    }
}

/// Outcome of the notes write that follows event creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesOutcome {
    Written,
    /// The event exists without its fingerprint. Later runs can only
    /// recognise it by exact title and times.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Materialized {
    pub event: EventRef,
    pub fingerprint: EventFingerprint,
    pub notes: NotesOutcome,
}

pub struct EventMaterializer<'a, S: CalendarStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: CalendarStore + ?Sized> EventMaterializer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        EventMaterializer { store }
    }

    /// Create the event, then write its notes.
    ///
    /// Only the creation decides success. A rejected notes write is
    /// reported in [`Materialized::notes`]; nothing is retried.
    pub async fn create(
        &self,
        calendar: &str,
        title: &str,
        span: &EventSpan,
        tag_string: &str,
    ) -> TimecalResult<Materialized> {
        let fingerprint = EventFingerprint::derive(title, &span.start, &span.end);

        let request = NewEvent {
            calendar: calendar.to_string(),
            title: title.to_string(),
            span: *span,
        };
        let event = self.store.create_event(&request).await?;

        let notes = match self
            .store
            .set_notes(&event, &notes_for(&fingerprint, tag_string))
            .await
        {
            Ok(()) => NotesOutcome::Written,
            Err(e) => {
                tracing::warn!(uid = %event.uid, "could not write notes for '{title}': {e}");
                NotesOutcome::Failed(e.to_string())
            }
        };

        Ok(Materialized {
            event,
            fingerprint,
            notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimecalError;
    use crate::store::MemoryStore;

    fn span() -> EventSpan {
        EventSpan::parse("2025-07-30T09:00:00Z", "2025-07-30T10:00:00Z").unwrap()
    }

    #[test]
    fn test_notes_format() {
        let s = span();
        let fp = EventFingerprint::derive("Deep Work", &s.start, &s.end);
        assert_eq!(notes_for(&fp, ""), format!("Imported from Toggl - ID: {fp}"));
        assert_eq!(
            notes_for(&fp, "#focus, #writing"),
            format!("Imported from Toggl - ID: {fp}\n#focus, #writing")
        );
        assert!(notes_for(&fp, "").starts_with(IMPORT_MARKER));
    }

    #[tokio::test]
    async fn test_create_embeds_fingerprint() {
        let store = MemoryStore::with_calendars(&["Growth"]);
        let materializer = EventMaterializer::new(&store);

        let made = materializer
            .create("Growth", "Deep Work", &span(), "#focus")
            .await
            .unwrap();

        assert_eq!(made.notes, NotesOutcome::Written);
        let events = store.events("Growth");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Deep Work");
        assert!(events[0].notes.contains(made.fingerprint.as_str()));
        assert!(events[0].notes.ends_with("#focus"));
    }

    #[tokio::test]
    async fn test_notes_failure_still_creates() {
        let store = MemoryStore::with_calendars(&["Growth"]);
        store.reject_notes(true);
        let materializer = EventMaterializer::new(&store);

        let made = materializer.create("Growth", "Deep Work", &span(), "").await.unwrap();

        assert!(matches!(made.notes, NotesOutcome::Failed(_)));
        assert_eq!(store.events("Growth").len(), 1);
        assert!(store.events("Growth")[0].notes.is_empty());
    }

    #[tokio::test]
    async fn test_missing_calendar_fails() {
        let store = MemoryStore::with_calendars(&["Growth"]);
        let materializer = EventMaterializer::new(&store);

        let result = materializer.create("Work", "Deep Work", &span(), "").await;
        assert!(matches!(result, Err(TimecalError::CalendarNotFound(_))));
    }
}
