use anyhow::Result;
use chrono::Local;
use owo_colors::OwoColorize;
use timecal_core::assistant::{AssistantClient, ReportPeriod};
use timecal_core::config::Config;
use timecal_core::date_range::DateRange;

use crate::commands::{summary, summary_range, sync};
use crate::utils::tui;

const RULE_WIDTH: usize = 60;

pub async fn run(config: &Config, weekly: bool) -> Result<()> {
    let now = Local::now();
    let period = if weekly {
        ReportPeriod::Weekly
    } else {
        ReportPeriod::Daily
    };

    // A failed sync still leaves a report worth reading
    let sync_range = DateRange::last_days(now.date_naive(), config.sync.days)
        .map_err(|e| anyhow::anyhow!(e))?;
    if let Err(e) = sync::run(config, sync_range, true).await {
        println!("{}", format!("Sync failed: {e}").red());
    }
    println!();

    let range = summary_range(None, weekly)?;
    let report = summary::collect(config, &range).await?.render(false);

    let spinner = tui::create_spinner("Asking the assistant".to_string());
    let analysis = match AssistantClient::new(&config.assistant) {
        Ok(client) => client.analyze(&report, period).await,
        Err(e) => Err(e),
    };
    spinner.finish_and_clear();

    let rule = "=".repeat(RULE_WIDTH);
    println!("{rule}");
    println!(
        "{}",
        format!("CALENDAR ANALYSIS REPORT - {}", period.to_string().to_uppercase()).bold()
    );
    println!("{rule}");
    println!("Period: {}", range.label());
    println!("Generated: {}", now.format("%Y-%m-%d %H:%M:%S"));
    println!("\n{} SUMMARY {}", "=".repeat(20), "=".repeat(20));
    print!("{report}");
    println!("\n{} ANALYSIS {}", "=".repeat(20), "=".repeat(19));
    match analysis {
        Ok(text) => println!("{text}"),
        Err(e) => println!("{}", format!("Error generating analysis: {e}").red()),
    }
    println!("{rule}");

    Ok(())
}
