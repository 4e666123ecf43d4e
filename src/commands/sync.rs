use anyhow::Result;
use owo_colors::OwoColorize;
use timecal_core::config::Config;
use timecal_core::date_range::DateRange;
use timecal_core::notify::Notifier;
use timecal_core::osascript::Osascript;
use timecal_core::store::AppleScriptCalendar;
use timecal_core::sync::{SyncOrchestrator, SyncRunResult};
use timecal_core::toggl::TogglClient;

use crate::render::Render;
use crate::utils::tui;

const NOTIFICATION_TITLE: &str = "Toggl → Calendar Sync";

pub async fn run(config: &Config, range: DateRange, notify: bool) -> Result<SyncRunResult> {
    config.require_sync()?;

    let toggl = TogglClient::new(&config.toggl)?;
    let calendar = AppleScriptCalendar::default();
    let notifier = if notify && config.sync.notify {
        Notifier::new(Osascript::default())
    } else {
        Notifier::disabled()
    };

    notifier
        .notify(
            NOTIFICATION_TITLE,
            &format!("Syncing Toggl entries from 🗓️ {} to 🗓️ {}", range.from, range.to),
        )
        .await;

    println!("{}", format!("Toggl → Calendar ({})", range.label()).bold());

    let spinner = tui::create_spinner("   Syncing".to_string());
    let run = SyncOrchestrator::new(&toggl, &calendar, &config.projects)
        .run_with(&range, |report| spinner.println(report.render()))
        .await;
    spinner.finish_and_clear();

    let run = match run {
        Ok(run) => run,
        Err(e) => {
            println!("   {}", e.to_string().red());
            println!("\n{}", SyncRunResult::default().render());
            notifier
                .notify(&format!("{NOTIFICATION_TITLE} ❌"), &e.to_string())
                .await;
            return Err(e.into());
        }
    };

    if run.entries.is_empty() {
        println!("   {}", "No time entries in range".dimmed());
    }
    println!("\n{}", run.result.render());

    notifier
        .notify(&format!("{NOTIFICATION_TITLE} ✅"), &run.result.to_string())
        .await;

    Ok(run.result)
}
