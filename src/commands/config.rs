use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use timecal_core::config::Config;

pub fn run(explicit: Option<&Path>) -> Result<()> {
    let config_path = Config::resolve_path(explicit)?;

    if !config_path.exists() {
        Config::create_default_config(&config_path)?;
        println!("{}", "Created default config".green());
    }

    println!("{}", "Paths".bold());
    println!("  Config:  {}", config_path.display());

    Ok(())
}
