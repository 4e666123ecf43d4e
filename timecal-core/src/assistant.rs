//! LLM debrief of an activity report via an OpenAI-compatible
//! chat-completions endpoint.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::AssistantConfig;
use crate::error::{TimecalError, TimecalResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Daily,
    Weekly,
}

impl ReportPeriod {
    fn subject(self) -> &'static str {
        match self {
            ReportPeriod::Daily => "Today",
            ReportPeriod::Weekly => "This week",
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportPeriod::Daily => write!(f, "daily"),
            ReportPeriod::Weekly => write!(f, "weekly"),
        }
    }
}

/// Review prompt wrapping a rendered activity report.
pub fn build_prompt(report: &str, period: ReportPeriod) -> String {
    let subject = period.subject();
    format!(
        r#"Please analyze the following {period} calendar and time tracking summary. Your job is to simulate a fast, focused evening performance review that helps the user understand:

1. Whether they followed their plan
2. If they were overworking, underworking, or in balance
3. What reminders need cleanup or rescheduling
4. General patterns and tactical recommendations

---

📋 Calendar Summary:
{report}

---

🧭 Plan vs. Reality
- Did the user follow their plan? Answer Yes / Partially / No.
- Did they overwork, slack off, or work at a sustainable pace?

🔍 Reminders Check
- Highlight completed vs. overdue reminders.
- Comment on the backlog status: Clean / Manageable / Needs triage.

⚖️ Judgment Summary Table
| Aspect        | Status       | Comment                              |
|---------------|--------------|--------------------------------------|
| Execution     | ✅/⚠️/✖️      | e.g., "Solid & goal-aligned"         |
| Effort        | ✅/⚠️/✖️      | e.g., "Sustainable deep work"        |
| Planning      | ✅/⚠️/✖️      | e.g., "No structure → drift risk"    |
| Wellbeing     | ✅/⚠️/✖️      | e.g., "No evidence of physical care" |

🧠 One-Line Debrief (optional)
- "{subject} felt ______ because ______."

🎯 Tactical Recommendations
- Provide 1-3 practical tips for improving scheduling, workload balance, or clarity tomorrow.
"#
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct AssistantClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AssistantClient {
    /// Fails when no API key is configured.
    pub fn new(config: &AssistantConfig) -> TimecalResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                TimecalError::Config(
                    "No assistant API key. Set assistant.api_key or AGENT_API_KEY.".to_string(),
                )
            })?;

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Send a single user message and return the first reply.
    #[instrument(skip_all, level = "info")]
    pub async fn query(&self, prompt: &str) -> TimecalResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TimecalError::Assistant(format!("API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(%status, "assistant request failed: {text}");
            return Err(TimecalError::Assistant(format!("API request failed: {status}")));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| TimecalError::Assistant(format!("Invalid API response format: {e}")))?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TimecalError::Assistant("Invalid API response format: no choices".into()))
    }

    pub async fn analyze(&self, report: &str, period: ReportPeriod) -> TimecalResult<String> {
        self.query(&build_prompt(report, period)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> AssistantConfig {
        AssistantConfig {
            api_key: Some("sk-test".to_string()),
            base_url: base_url.to_string(),
            ..AssistantConfig::default()
        }
    }

    #[test]
    fn test_build_prompt() {
        let daily = build_prompt("REPORT BODY", ReportPeriod::Daily);
        assert!(daily.contains("following daily calendar"));
        assert!(daily.contains("REPORT BODY"));
        assert!(daily.contains("\"Today felt ______"));

        let weekly = build_prompt("x", ReportPeriod::Weekly);
        assert!(weekly.contains("following weekly calendar"));
        assert!(weekly.contains("\"This week felt ______"));
    }

    #[test]
    fn test_missing_api_key() {
        let mut cfg = config("http://localhost");
        cfg.api_key = Some(String::new());
        assert!(matches!(AssistantClient::new(&cfg), Err(TimecalError::Config(_))));
        cfg.api_key = None;
        assert!(matches!(AssistantClient::new(&cfg), Err(TimecalError::Config(_))));
    }

    #[tokio::test]
    async fn test_query_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 1000,
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "Partially."}},
                    {"message": {"role": "assistant", "content": "ignored"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AssistantClient::new(&config(&server.uri())).unwrap();
        assert_eq!(client.query("hello").await.unwrap(), "Partially.");
    }

    #[tokio::test]
    async fn test_query_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AssistantClient::new(&config(&server.uri())).unwrap();
        assert!(matches!(client.query("hi").await, Err(TimecalError::Assistant(_))));
    }

    #[tokio::test]
    async fn test_query_without_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let client = AssistantClient::new(&config(&server.uri())).unwrap();
        let err = client.query("hi").await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }
}
