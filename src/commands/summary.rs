use anyhow::Result;
use timecal_core::config::Config;
use timecal_core::date_range::DateRange;
use timecal_core::store::AppleScriptCalendar;
use timecal_core::summary::{ActivitySummary, RemindersApp, Summarizer};

use crate::utils::tui;

/// Collect the summary for a range behind a spinner.
pub async fn collect(config: &Config, range: &DateRange) -> Result<ActivitySummary> {
    let calendar = AppleScriptCalendar::default();
    let reminders = RemindersApp::default();
    let summarizer = Summarizer::new(
        &calendar,
        &reminders,
        config.summary_calendars(),
        config.summary.reminder_lists.clone(),
    );

    let spinner = tui::create_spinner(format!("Reading calendars for {}", range.label()));
    let summary = summarizer.summarize(range).await;
    spinner.finish_and_clear();

    Ok(summary?)
}

pub async fn run(config: &Config, range: DateRange, show_notes: bool) -> Result<()> {
    let summary = collect(config, &range).await?;
    print!("{}", summary.render(show_notes));
    Ok(())
}
