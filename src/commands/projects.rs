use anyhow::Result;
use owo_colors::OwoColorize;
use timecal_core::config::Config;
use timecal_core::toggl::TogglClient;

use crate::utils::tui;

pub async fn run(config: &Config) -> Result<()> {
    let Some(workspace_id) = config.toggl.workspace_id.as_deref() else {
        anyhow::bail!(
            "No Toggl workspace configured.\n\n\
            Add it to your config:\n  \
            [toggl]\n  \
            workspace_id = \"1234567\""
        );
    };

    let client = TogglClient::new(&config.toggl)?;
    let spinner = tui::create_spinner("Fetching projects".to_string());
    let projects = client.projects(workspace_id).await;
    spinner.finish_and_clear();

    let mut projects = projects?;
    projects.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    if projects.is_empty() {
        println!("{}", "No active projects".dimmed());
    }
    for project in &projects {
        let mapped = config
            .projects
            .calendar_for(&project.id.to_string())
            .map(|cal| format!("  ({cal})").dimmed().to_string())
            .unwrap_or_default();
        println!("{} --> {}{}", project.name, project.id, mapped);
    }

    Ok(())
}
