mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use timecal_core::config::Config;
use timecal_core::date_range::DateRange;

#[derive(Parser)]
#[command(name = "timecal")]
#[command(about = "Mirror Toggl time entries into your calendar and review your day")]
struct Cli {
    /// Config file (default: <config dir>/timecal/config.toml, or $TIMECAL_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create calendar events for Toggl time entries
    Sync {
        /// Sync entries from this date (YYYY-MM-DD, default: [sync] days ago)
        #[arg(long)]
        from: Option<String>,

        /// Sync entries until this date (YYYY-MM-DD, default: today)
        #[arg(long)]
        to: Option<String>,

        /// Don't show a desktop notification
        #[arg(long)]
        no_notify: bool,
    },
    /// Planned vs tracked events and reminders
    Summary {
        /// Day to summarize (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,

        /// Summarize the Monday-Sunday week containing the date
        #[arg(long)]
        weekly: bool,

        /// Include a preview of event and reminder notes
        #[arg(long)]
        notes: bool,
    },
    /// Sync, summarize and ask the assistant for a debrief
    WrapUp {
        /// Review the current week instead of today
        #[arg(long)]
        weekly: bool,
    },
    /// List active Toggl projects and their ids
    Projects,
    /// List calendars and reminder lists
    Calendars,
    /// Show the config path, creating a default file if missing
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();
    let load = || Config::load(config_path);

    match cli.command {
        Commands::Sync {
            from,
            to,
            no_notify,
        } => {
            let config = load()?;
            let range = DateRange::from_args(from.as_deref(), to.as_deref(), config.sync.days)
                .map_err(|e| anyhow::anyhow!(e))?;
            commands::sync::run(&config, range, !no_notify).await?;
            Ok(())
        }
        Commands::Summary {
            date,
            weekly,
            notes,
        } => {
            let range = commands::summary_range(date.as_deref(), weekly)?;
            commands::summary::run(&load()?, range, notes).await
        }
        Commands::WrapUp { weekly } => commands::wrap_up::run(&load()?, weekly).await,
        Commands::Projects => commands::projects::run(&load()?).await,
        Commands::Calendars => commands::calendars::run().await,
        Commands::Config => commands::config::run(config_path),
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or info with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_flags() {
        let cli = Cli::parse_from(["timecal", "-v", "sync", "--from", "2025-07-01", "--no-notify"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Sync { from, to, no_notify } => {
                assert_eq!(from.as_deref(), Some("2025-07-01"));
                assert!(to.is_none());
                assert!(no_notify);
            }
            _ => panic!("expected sync"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from(["timecal", "calendars", "--config", "/tmp/timecal.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/timecal.toml")));
        assert!(matches!(cli.command, Commands::Calendars));
    }
}
