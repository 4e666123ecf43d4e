//! timecal configuration.
//!
//! Loaded once at startup from `~/.config/timecal/config.toml` (or the path
//! given with `--config` / `TIMECAL_CONFIG`) and passed by reference to
//! whatever needs it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::date_range::{DEFAULT_SYNC_DAYS, MAX_SYNC_DAYS};
use crate::error::{TimecalError, TimecalResult};

pub const CONFIG_PATH_ENV: &str = "TIMECAL_CONFIG";
pub const TOGGL_TOKEN_ENV: &str = "TIMECAL_TOGGL_TOKEN";
pub const ASSISTANT_KEY_ENV: &str = "AGENT_API_KEY";

pub const DEFAULT_TOGGL_URL: &str = "https://api.track.toggl.com/api/v9";
pub const DEFAULT_ASSISTANT_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ASSISTANT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub toggl: TogglConfig,

    /// Toggl project id -> calendar name
    #[serde(default)]
    pub projects: ProjectMap,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub summary: SummaryConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TogglConfig {
    #[serde(default)]
    pub api_token: String,

    #[serde(default, deserialize_with = "optional_id")]
    pub workspace_id: Option<String>,

    #[serde(default = "default_toggl_url")]
    pub base_url: String,
}

impl Default for TogglConfig {
    fn default() -> Self {
        TogglConfig {
            api_token: String::new(),
            workspace_id: None,
            base_url: default_toggl_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Days of history pulled by a plain `timecal sync`, at most
    /// `MAX_SYNC_DAYS`
    #[serde(default = "default_sync_days")]
    pub days: u32,

    #[serde(default = "default_true")]
    pub notify: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            days: DEFAULT_SYNC_DAYS,
            notify: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Calendars read for summaries. Empty means every mapped calendar.
    #[serde(default)]
    pub calendars: Vec<String>,

    #[serde(default)]
    pub reminder_lists: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_assistant_url")]
    pub base_url: String,

    #[serde(default = "default_assistant_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        AssistantConfig {
            api_key: None,
            base_url: default_assistant_url(),
            model: default_assistant_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Mapping from Toggl project id to calendar name.
///
/// Unmapped ids resolve to `None`; callers skip those entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectMap(HashMap<String, String>);

impl ProjectMap {
    pub fn calendar_for(&self, project_id: &str) -> Option<&str> {
        self.0.get(project_id).map(String::as_str)
    }

    /// Distinct calendar names, sorted.
    pub fn calendars(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.values().cloned().collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProjectMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ProjectMap(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl Config {
    pub fn default_path() -> TimecalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TimecalError::Config("Could not determine config directory".into()))?
            .join("timecal");

        Ok(config_dir.join("config.toml"))
    }

    /// Explicit path, then `TIMECAL_CONFIG`, then the platform config dir.
    pub fn resolve_path(explicit: Option<&Path>) -> TimecalResult<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Self::default_path(),
        }
    }

    /// Load the config file and apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> TimecalResult<Self> {
        let path = Self::resolve_path(explicit)?;
        let mut config = Self::load_file(&path)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_file(path: &Path) -> TimecalResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TimecalError::Config(format!(
                "Could not read config file {}: {e}\n\nCreate one with:\n  timecal config",
                path.display()
            ))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> TimecalResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| TimecalError::Config(e.to_string()))?;
        if config.sync.days > MAX_SYNC_DAYS {
            return Err(TimecalError::Config(format!(
                "[sync] days = {} is more than the maximum of {MAX_SYNC_DAYS}",
                config.sync.days
            )));
        }
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(token) = non_empty_env(TOGGL_TOKEN_ENV) {
            self.toggl.api_token = token;
        }
        if let Some(key) = non_empty_env(ASSISTANT_KEY_ENV) {
            self.assistant.api_key = Some(key);
        }
    }

    /// Fails unless a sync can run: a Toggl token and at least one mapping.
    pub fn require_sync(&self) -> TimecalResult<()> {
        if self.toggl.api_token.trim().is_empty() {
            return Err(TimecalError::Config(format!(
                "No Toggl API token. Set [toggl] api_token or {TOGGL_TOKEN_ENV}"
            )));
        }
        if self.projects.is_empty() {
            return Err(TimecalError::Config(
                "No project mappings. Add a [projects] table (see `timecal projects`)".into(),
            ));
        }
        Ok(())
    }

    /// Calendars read by the summary.
    pub fn summary_calendars(&self) -> Vec<String> {
        if self.summary.calendars.is_empty() {
            self.projects.calendars()
        } else {
            self.summary.calendars.clone()
        }
    }

    /// Create a default config file with every option documented.
    pub fn create_default_config(path: &Path) -> TimecalResult<()> {
        let contents = format!(
            "\
# timecal configuration

[toggl]
# Token from https://track.toggl.com/profile (or set {TOGGL_TOKEN_ENV})
api_token = \"\"
# workspace_id = \"1234567\"

# Toggl project id -> calendar name. List ids with `timecal projects`.
[projects]
# \"211356119\" = \"Growth\"

[sync]
# days = {DEFAULT_SYNC_DAYS}
# notify = true

[summary]
# calendars = [\"Work\", \"Growth\"]
# reminder_lists = [\"Work\", \"Personal\"]

[assistant]
# api_key = \"\"  (or set {ASSISTANT_KEY_ENV})
# base_url = \"{DEFAULT_ASSISTANT_URL}\"
# model = \"{DEFAULT_ASSISTANT_MODEL}\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TimecalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| TimecalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn default_toggl_url() -> String {
    DEFAULT_TOGGL_URL.to_string()
}

fn default_assistant_url() -> String {
    DEFAULT_ASSISTANT_URL.to_string()
}

fn default_assistant_model() -> String {
    DEFAULT_ASSISTANT_MODEL.to_string()
}

fn default_sync_days() -> u32 {
    DEFAULT_SYNC_DAYS
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_true() -> bool {
    true
}

/// Accept ids written either as strings or as bare numbers.
fn optional_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Id>::deserialize(d)?.map(|id| match id {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[toggl]
api_token = "secret"
workspace_id = 4443420

[projects]
"211356119" = "Growth"
"211356111" = "Work"
"211356112" = "Work"

[summary]
reminder_lists = ["Work"]
"#;

    #[test]
    fn test_parse_sample() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.toggl.api_token, "secret");
        assert_eq!(config.toggl.workspace_id.as_deref(), Some("4443420"));
        assert_eq!(config.toggl.base_url, DEFAULT_TOGGL_URL);
        assert_eq!(config.projects.calendar_for("211356119"), Some("Growth"));
        assert_eq!(config.projects.calendar_for("999"), None);
        assert_eq!(config.sync.days, DEFAULT_SYNC_DAYS);
        assert!(config.sync.notify);
        assert_eq!(config.assistant.model, DEFAULT_ASSISTANT_MODEL);
        assert!(config.require_sync().is_ok());
    }

    #[test]
    fn test_sync_days_bounds() {
        let config = Config::parse("[sync]\ndays = 30\n").unwrap();
        assert_eq!(config.sync.days, 30);

        let too_many = Config::parse(&format!("[sync]\ndays = {}\n", MAX_SYNC_DAYS + 1));
        assert!(matches!(too_many, Err(TimecalError::Config(_))));

        let huge = Config::parse("[sync]\ndays = 9000000000000000\n");
        assert!(matches!(huge, Err(TimecalError::Config(_))));

        let negative = Config::parse("[sync]\ndays = -3\n");
        assert!(matches!(negative, Err(TimecalError::Config(_))));
    }

    #[test]
    fn test_summary_calendars_default_to_mapped_calendars() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.summary_calendars(), vec!["Growth", "Work"]);
    }

    #[test]
    fn test_require_sync_rejects_missing_token() {
        let config = Config::parse("[projects]\n\"1\" = \"Work\"\n").unwrap();
        assert!(matches!(config.require_sync(), Err(TimecalError::Config(_))));
    }

    #[test]
    fn test_default_config_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::create_default_config(&path).unwrap();
        let config = Config::load_file(&path).unwrap();

        assert!(config.projects.is_empty());
        assert_eq!(config.assistant.base_url, DEFAULT_ASSISTANT_URL);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(TimecalError::Config(_))));
    }
}
