//! Colored terminal rendering for timecal-core types.

use owo_colors::OwoColorize;
use timecal_core::sync::{EntryOutcome, EntryReport, NotesOutcome, SyncRunResult};

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for EntryReport {
    fn render(&self) -> String {
        let target = match &self.calendar {
            Some(calendar) => format!("→ {calendar}"),
            None => String::new(),
        };
        let line = format!("{} ({}) {}", self.title, self.duration, target);

        let mut rendered = match &self.outcome {
            EntryOutcome::Created { notes, .. } => {
                let mut text = format!("   {} {}", "+".green(), line.green());
                if let NotesOutcome::Failed(reason) = notes {
                    text.push_str(&format!("\n      {}", format!("notes not written: {reason}").yellow()));
                }
                text
            }
            EntryOutcome::Duplicate => {
                format!("   {} {} {}", "=".dimmed(), line.dimmed(), "(already in calendar)".dimmed())
            }
            EntryOutcome::Skipped(reason) => {
                format!("   {} {} {}", "·".dimmed(), line.dimmed(), format!("({reason})").dimmed())
            }
            EntryOutcome::Errored(error) => {
                format!("   {} {}\n      {}", "!".red(), line.red(), error.red())
            }
        };

        if let Some(error) = &self.check_error {
            rendered.push_str(&format!(
                "\n      {}",
                format!("duplicate check failed: {error}").yellow()
            ));
        }

        rendered
    }
}

impl Render for SyncRunResult {
    fn render(&self) -> String {
        let errors = if self.errored > 0 {
            format!("Errors: {}", self.errored).red().to_string()
        } else {
            format!("Errors: {}", self.errored)
        };
        format!(
            "{} {}, Skipped: {}, Duplicates: {}, {}",
            "Created:".bold(),
            self.created.to_string().green(),
            self.skipped,
            self.duplicate,
            errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_run_still_reports_every_counter() {
        let line = SyncRunResult::default().render();
        assert!(line.contains("Created:"));
        assert!(line.contains("Skipped: 0, Duplicates: 0, Errors: 0"));
    }

    #[test]
    fn test_errored_entry_shows_reason() {
        let report = EntryReport {
            title: "Deep Work".to_string(),
            calendar: Some("Growth".to_string()),
            duration: "1h 0m".to_string(),
            check_error: Some("store unreachable".to_string()),
            outcome: EntryOutcome::Errored("calendar not found".to_string()),
        };
        let text = report.render();
        assert!(text.contains("Deep Work (1h 0m) → Growth"));
        assert!(text.contains("calendar not found"));
        assert!(text.contains("duplicate check failed: store unreachable"));
    }
}
