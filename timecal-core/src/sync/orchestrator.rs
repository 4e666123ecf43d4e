use std::fmt;

use crate::config::ProjectMap;
use crate::date_range::DateRange;
use crate::error::{TimecalError, TimecalResult};
use crate::fingerprint::EventFingerprint;
use crate::store::CalendarStore;
use crate::sync::{DuplicateChecker, EventMaterializer, NotesOutcome, Presence};
use crate::time_entry::{TimeEntry, TimeEntrySource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoProjectMapping,
    InvalidTime,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoProjectMapping => write!(f, "no project mapping"),
            SkipReason::InvalidTime => write!(f, "invalid time"),
        }
    }
}

/// Terminal state of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Created {
        fingerprint: EventFingerprint,
        notes: NotesOutcome,
    },
    Duplicate,
    Skipped(SkipReason),
    Errored(String),
}

/// One line of the per-entry trace.
#[derive(Debug, Clone)]
pub struct EntryReport {
    pub title: String,
    pub calendar: Option<String>,
    pub duration: String,
    /// Set when the duplicate check failed and creation went ahead anyway
    pub check_error: Option<String>,
    pub outcome: EntryOutcome,
}

/// Counters of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncRunResult {
    pub created: usize,
    pub duplicate: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl SyncRunResult {
    pub fn record(&mut self, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Created { .. } => self.created += 1,
            EntryOutcome::Duplicate => self.duplicate += 1,
            EntryOutcome::Skipped(_) => self.skipped += 1,
            EntryOutcome::Errored(_) => self.errored += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.duplicate + self.skipped + self.errored
    }
}

impl fmt::Display for SyncRunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Created: {}, Skipped: {}, Duplicates: {}, Errors: {}",
            self.created, self.skipped, self.duplicate, self.errored
        )
    }
}

#[derive(Debug, Clone)]
pub struct SyncRun {
    pub range: DateRange,
    pub result: SyncRunResult,
    pub entries: Vec<EntryReport>,
}

/// Drives the sync of one date range, one entry at a time.
///
/// Entries are processed strictly in sequence: the calendar scripting bridge
/// cannot take overlapping commands. A failing entry never stops the run.
pub struct SyncOrchestrator<'a, T: TimeEntrySource + ?Sized, S: CalendarStore + ?Sized> {
    source: &'a T,
    store: &'a S,
    projects: &'a ProjectMap,
}

impl<'a, T: TimeEntrySource + ?Sized, S: CalendarStore + ?Sized> SyncOrchestrator<'a, T, S> {
    pub fn new(source: &'a T, store: &'a S, projects: &'a ProjectMap) -> Self {
        SyncOrchestrator {
            source,
            store,
            projects,
        }
    }

    pub async fn run(&self, range: &DateRange) -> TimecalResult<SyncRun> {
        self.run_with(range, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `on_entry` as each entry finishes.
    ///
    /// Fails only when the source cannot be read, which is reported apart
    /// from a range that simply has no entries.
    pub async fn run_with<F>(&self, range: &DateRange, mut on_entry: F) -> TimecalResult<SyncRun>
    where
        F: FnMut(&EntryReport),
    {
        let entries = self.source.fetch(range).await.map_err(|e| match e {
            TimecalError::SourceUnavailable(_) => e,
            other => TimecalError::SourceUnavailable(other.to_string()),
        })?;
        tracing::info!(count = entries.len(), range = %range.label(), "fetched time entries");

        let mut result = SyncRunResult::default();
        let mut reports = Vec::with_capacity(entries.len());

        for entry in &entries {
            let report = self.process(entry).await;
            result.record(&report.outcome);
            on_entry(&report);
            reports.push(report);
        }

        tracing::info!(%result, "sync finished");

        Ok(SyncRun {
            range: *range,
            result,
            entries: reports,
        })
    }

    /// Take one entry to a terminal state.
    pub async fn process(&self, entry: &TimeEntry) -> EntryReport {
        let title = entry.title();
        let report = |calendar: Option<&str>, check_error: Option<String>, outcome: EntryOutcome| {
            EntryReport {
                title: title.to_string(),
                calendar: calendar.map(str::to_string),
                duration: entry.duration_label(),
                check_error,
                outcome,
            }
        };

        let Some(calendar) = entry
            .project_id
            .as_deref()
            .and_then(|id| self.projects.calendar_for(id))
        else {
            tracing::info!(project = ?entry.project_id, "skipping '{title}': no project mapping");
            return report(None, None, EntryOutcome::Skipped(SkipReason::NoProjectMapping));
        };

        let Some(span) = entry.span() else {
            tracing::info!(start = ?entry.start, stop = ?entry.stop, "skipping '{title}': invalid time");
            return report(Some(calendar), None, EntryOutcome::Skipped(SkipReason::InvalidTime));
        };

        let check_error = match DuplicateChecker::new(self.store)
            .exists(calendar, title, &span)
            .await
        {
            Presence::Exists => {
                tracing::info!(calendar, "'{title}' already exists");
                return report(Some(calendar), None, EntryOutcome::Duplicate);
            }
            // Unknown presence goes on to creation
            Presence::Error(detail) => {
                tracing::warn!(calendar, "duplicate check failed for '{title}': {detail}");
                Some(detail)
            }
            Presence::NotExists => None,
        };

        let outcome = match EventMaterializer::new(self.store)
            .create(calendar, title, &span, &entry.tag_string())
            .await
        {
            Ok(made) => {
                tracing::info!(calendar, fingerprint = %made.fingerprint, "created '{title}'");
                EntryOutcome::Created {
                    fingerprint: made.fingerprint,
                    notes: made.notes,
                }
            }
            Err(e) => {
                tracing::warn!(calendar, "failed to create '{title}': {e}");
                EntryOutcome::Errored(e.to_string())
            }
        };

        report(Some(calendar), check_error, outcome)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::store::MemoryStore;

    struct DownSource;

    #[async_trait]
    impl TimeEntrySource for DownSource {
        async fn fetch(&self, _range: &DateRange) -> TimecalResult<Vec<TimeEntry>> {
            Err(TimecalError::Io(std::io::Error::other("connection refused")))
        }
    }

    fn projects() -> ProjectMap {
        [("42", "Growth"), ("7", "Work")].into_iter().collect()
    }

    fn range() -> DateRange {
        DateRange::day(chrono::NaiveDate::from_ymd_opt(2025, 7, 30).unwrap())
    }

    #[tokio::test]
    async fn test_unmapped_project_never_reaches_store() {
        let store = MemoryStore::with_calendars(&["Growth", "Work"]);
        let entries = vec![
            TimeEntry::new("Side quest", Some("999"), "2025-07-30T09:00:00Z", "2025-07-30T10:00:00Z"),
            TimeEntry::new("No project", None, "2025-07-30T11:00:00Z", "2025-07-30T12:00:00Z"),
        ];
        let projects = projects();

        let run = SyncOrchestrator::new(&entries, &store, &projects)
            .run(&range())
            .await
            .unwrap();

        assert_eq!(run.result.skipped, 2);
        assert_eq!(store.query_count(), 0);
        assert_eq!(store.create_count(), 0);
        assert!(run.entries.iter().all(|e| e.outcome
            == EntryOutcome::Skipped(SkipReason::NoProjectMapping)));
    }

    #[tokio::test]
    async fn test_invalid_time_is_skipped() {
        let store = MemoryStore::with_calendars(&["Growth"]);
        let mut running = TimeEntry::new("Running", Some("42"), "2025-07-30T09:00:00Z", "");
        running.stop = None;
        let entries = vec![
            running,
            TimeEntry::new("Broken", Some("42"), "not a time", "2025-07-30T10:00:00Z"),
        ];
        let projects = projects();

        let run = SyncOrchestrator::new(&entries, &store, &projects)
            .run(&range())
            .await
            .unwrap();

        assert_eq!(run.result, SyncRunResult { skipped: 2, ..Default::default() });
        assert_eq!(run.entries[0].calendar.as_deref(), Some("Growth"));
        assert_eq!(run.entries[1].outcome, EntryOutcome::Skipped(SkipReason::InvalidTime));
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_check_error_still_attempts_creation() {
        let store = MemoryStore::with_calendars(&["Growth"]);
        store.fail_queries(true);
        let entries = vec![TimeEntry::new(
            "Deep Work",
            Some("42"),
            "2025-07-30T09:00:00Z",
            "2025-07-30T10:00:00Z",
        )];
        let projects = projects();

        let run = SyncOrchestrator::new(&entries, &store, &projects)
            .run(&range())
            .await
            .unwrap();

        assert_eq!(store.create_count(), 1);
        assert_eq!(run.result.created, 1);
        assert!(run.entries[0].check_error.is_some());
    }

    #[tokio::test]
    async fn test_creation_failure_is_isolated() {
        let store = MemoryStore::with_calendars(&["Growth", "Work"]);
        store.fail_create_for("Doomed");
        let entries = vec![
            TimeEntry::new("Doomed", Some("42"), "2025-07-30T09:00:00Z", "2025-07-30T10:00:00Z"),
            TimeEntry::new("Fine", Some("7"), "2025-07-30T10:00:00Z", "2025-07-30T11:00:00Z"),
        ];
        let projects = projects();

        let mut seen = Vec::new();
        let run = SyncOrchestrator::new(&entries, &store, &projects)
            .run_with(&range(), |report| seen.push(report.title.clone()))
            .await
            .unwrap();

        assert_eq!(run.result, SyncRunResult { created: 1, errored: 1, ..Default::default() });
        assert_eq!(seen, vec!["Doomed", "Fine"]);
        assert!(matches!(run.entries[0].outcome, EntryOutcome::Errored(_)));
        assert_eq!(store.events("Work").len(), 1);
    }

    #[tokio::test]
    async fn test_source_failure_is_distinct_from_empty() {
        let store = MemoryStore::with_calendars(&["Growth"]);
        let projects = projects();

        let result = SyncOrchestrator::new(&DownSource, &store, &projects)
            .run(&range())
            .await;
        assert!(matches!(result, Err(TimecalError::SourceUnavailable(_))));

        let empty: Vec<TimeEntry> = Vec::new();
        let run = SyncOrchestrator::new(&empty, &store, &projects)
            .run(&range())
            .await
            .unwrap();
        assert_eq!(run.result.total(), 0);
    }

    #[test]
    fn test_result_display() {
        let result = SyncRunResult { created: 3, duplicate: 2, skipped: 1, errored: 0 };
        assert_eq!(result.to_string(), "Created: 3, Skipped: 1, Duplicates: 2, Errors: 0");
        assert_eq!(result.total(), 6);
    }
}
