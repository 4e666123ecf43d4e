//! Toggl Track API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::TogglConfig;
use crate::date_range::DateRange;
use crate::error::{TimecalError, TimecalResult};
use crate::time_entry::{TimeEntry, TimeEntrySource};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A Toggl project, as listed by `timecal projects`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

pub struct TogglClient {
    client: reqwest::Client,
    api_token: String,
    base_url: String,
}

impl TogglClient {
    pub fn new(config: &TogglConfig) -> TimecalResult<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_token: config.api_token.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Time entries that started within the range.
    #[instrument(skip(self), level = "info")]
    pub async fn time_entries(&self, range: &DateRange) -> TimecalResult<Vec<TimeEntry>> {
        let url = format!("{}/me/time_entries", self.base_url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.api_token, Some("api_token"))
            .query(&[("start_date", range.toggl_start()), ("end_date", range.toggl_end())])
            .send()
            .await
            .map_err(unavailable)?;

        self.handle_response(response).await
    }

    /// Active projects of a workspace.
    #[instrument(skip(self), level = "info")]
    pub async fn projects(&self, workspace_id: &str) -> TimecalResult<Vec<Project>> {
        let url = format!("{}/workspaces/{}/projects", self.base_url, workspace_id);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.api_token, Some("api_token"))
            .query(&[("active", "true")])
            .send()
            .await
            .map_err(unavailable)?;

        // Toggl answers `null` when a workspace has no projects
        let projects: Option<Vec<Project>> = self.handle_response(response).await?;
        Ok(projects.unwrap_or_default())
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> TimecalResult<T> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                TimecalError::SourceUnavailable(format!("Malformed Toggl response: {e}"))
            })
        } else if status.as_u16() == 401 || status.as_u16() == 403 {
            Err(TimecalError::SourceUnavailable(format!(
                "Toggl rejected the API token ({status})"
            )))
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(TimecalError::SourceUnavailable(format!("{status}: {text}")))
        }
    }
}

fn unavailable(e: reqwest::Error) -> TimecalError {
    TimecalError::SourceUnavailable(e.to_string())
}

#[async_trait]
impl TimeEntrySource for TogglClient {
    async fn fetch(&self, range: &DateRange) -> TimecalResult<Vec<TimeEntry>> {
        self.time_entries(range).await
    }
}
