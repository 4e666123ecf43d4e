//! Reconciliation of time entries into calendar events.
//!
//! For each entry the orchestrator resolves the target calendar, asks the
//! duplicate checker whether the event already exists, and otherwise hands
//! it to the materializer. Re-running a sync over the same range is safe:
//! every event created earlier is found again, either by its exact title and
//! times or by the fingerprint embedded in its notes.

mod duplicate;
mod materializer;
mod orchestrator;

pub use duplicate::{DuplicateChecker, Presence};
pub use materializer::{EventMaterializer, IMPORT_MARKER, Materialized, NotesOutcome, notes_for};
pub use orchestrator::{EntryOutcome, EntryReport, SkipReason, SyncOrchestrator, SyncRun, SyncRunResult};
