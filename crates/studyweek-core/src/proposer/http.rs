//! OpenAI-compatible chat-completions proposer.
//!
//! Sends the prompt from [`super::prompt`] in JSON mode and converts the
//! `weekly_plan` reply into a [`ProposedPlan`]. Replies wrapped in Markdown
//! code fences are unwrapped first.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use studyweek_db::models::Difficulty;

use super::ProposerError;
use super::prompt::{SYSTEM_PROMPT, build_user_prompt};
use super::trait_def::PlanProposer;
use super::types::{ProposalRequest, ProposedDay, ProposedPlan, ProposedTask};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Connection settings for [`HttpProposer`].
#[derive(Debug, Clone)]
pub struct HttpProposerConfig {
    /// Full URL of the chat-completions endpoint.
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for HttpProposerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            api_key: None,
            temperature: 0.7,
            max_tokens: 8000,
        }
    }
}

pub struct HttpProposer {
    client: Client,
    config: HttpProposerConfig,
}

impl HttpProposer {
    pub fn new(config: HttpProposerConfig) -> Result<Self, ProposerError> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpProposerConfig {
        &self.config
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl PlanProposer for HttpProposer {
    fn name(&self) -> &str {
        "http"
    }

    async fn propose(&self, request: &ProposalRequest<'_>) -> Result<ProposedPlan, ProposerError> {
        let prompt = build_user_prompt(request);
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let mut http = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            http = http.bearer_auth(key);
        }

        debug!(
            model = %self.config.model,
            first_date = %request.scope.first_date(),
            days = request.scope.expected_days(),
            "requesting plan proposal"
        );

        let response = http.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "plan proposer returned an error status");
            return Err(ProposerError::Rejected {
                status: status.as_u16(),
                body: truncate(&text, 500),
            });
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProposerError::Malformed("reply has no message content".to_owned()))?;

        parse_reply(&content)
    }
}

/// The JSON body of a reply, with any Markdown code fence removed.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after = &trimmed[start + 3..];
    // Skip an info string such as `json`.
    let body = match after.find('\n') {
        Some(nl) if !after[..nl].contains('{') => &after[nl + 1..],
        _ => after,
    };
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

#[derive(Deserialize)]
struct WirePlan {
    #[serde(alias = "days")]
    weekly_plan: Vec<WireDay>,
}

#[derive(Deserialize)]
struct WireDay {
    #[serde(default)]
    date: Option<String>,
    #[serde(default, alias = "focus")]
    daily_focus: Option<String>,
    #[serde(default)]
    total_planned_minutes: i32,
    #[serde(default)]
    tasks: Vec<WireTask>,
}

#[derive(Deserialize)]
struct WireTask {
    sequence: i32,
    category: String,
    title: String,
    assigned_minutes: i32,
    #[serde(default)]
    time_slot: Option<String>,
    #[serde(default, alias = "difficulty_level")]
    difficulty: Option<String>,
    #[serde(default)]
    instruction: Option<String>,
    #[serde(default, alias = "rest_after")]
    rest_after_minutes: i32,
}

/// Parse reply text into a plan. Accepts either `{"weekly_plan": [...]}` or
/// a bare day object.
pub fn parse_reply(text: &str) -> Result<ProposedPlan, ProposerError> {
    let json = strip_code_fence(text);
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| ProposerError::Malformed(e.to_string()))?;

    let days = if value.get("weekly_plan").is_some() || value.get("days").is_some() {
        serde_json::from_value::<WirePlan>(value)
            .map_err(|e| ProposerError::Malformed(e.to_string()))?
            .weekly_plan
    } else {
        let day = serde_json::from_value::<WireDay>(value)
            .map_err(|e| ProposerError::Malformed(e.to_string()))?;
        vec![day]
    };

    let days = days
        .into_iter()
        .map(WireDay::into_proposed)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ProposedPlan { days })
}

impl WireDay {
    fn into_proposed(self) -> Result<ProposedDay, ProposerError> {
        let date = match self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => Some(
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .map_err(|_| ProposerError::Malformed(format!("invalid date {d:?}")))?,
            ),
            None => None,
        };
        Ok(ProposedDay {
            date,
            focus: self.daily_focus.unwrap_or_default(),
            total_planned_minutes: self.total_planned_minutes,
            tasks: self.tasks.into_iter().map(WireTask::into_proposed).collect(),
        })
    }
}

impl WireTask {
    fn into_proposed(self) -> ProposedTask {
        let difficulty = self.difficulty.as_deref().and_then(|d| {
            d.trim()
                .parse::<Difficulty>()
                .inspect_err(|e| debug!(error = %e, "ignoring unknown difficulty"))
                .ok()
        });
        ProposedTask {
            sequence: self.sequence,
            category: self.category,
            title: self.title,
            assigned_minutes: self.assigned_minutes,
            time_slot: self.time_slot,
            difficulty,
            instruction: self.instruction,
            rest_after_minutes: self.rest_after_minutes,
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((i, _)) => format!("{}...", &text[..i]),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"{
      "weekly_plan": [
        {
          "date": "2026-10-19",
          "daily_focus": "Calculation accuracy",
          "total_planned_minutes": 55,
          "tasks": [
            {"sequence": 1, "category": "math", "title": "Quadratics p.42",
             "assigned_minutes": 25, "time_slot": "18:00-18:25",
             "difficulty_level": "high", "instruction": "Show all steps.", "rest_after": 5},
            {"sequence": 2, "category": "english", "title": "Reading",
             "assigned_minutes": 30, "difficulty": "extreme"}
          ]
        }
      ]
    }"#;

    #[test]
    fn parses_weekly_plan_reply() {
        let plan = parse_reply(REPLY).unwrap();
        assert_eq!(plan.days.len(), 1);
        let day = &plan.days[0];
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2026, 10, 19));
        assert_eq!(day.focus, "Calculation accuracy");
        assert_eq!(day.tasks[0].difficulty, Some(Difficulty::High));
        assert_eq!(day.tasks[0].rest_after_minutes, 5);
        // Unknown difficulty is dropped, not fatal.
        assert_eq!(day.tasks[1].difficulty, None);
        assert_eq!(day.tasks[1].rest_after_minutes, 0);
    }

    #[test]
    fn parses_fenced_reply() {
        let fenced = format!("Here you go:\n```json\n{REPLY}\n```\n");
        assert_eq!(parse_reply(&fenced).unwrap().days.len(), 1);
        let bare_fence = format!("```\n{REPLY}\n```");
        assert_eq!(parse_reply(&bare_fence).unwrap().days.len(), 1);
    }

    #[test]
    fn parses_bare_day_object() {
        let plan = parse_reply(
            r#"{"focus": "Review", "total_planned_minutes": 20,
                "tasks": [{"sequence": 1, "category": "math", "title": "Review", "assigned_minutes": 20}]}"#,
        )
        .unwrap();
        assert_eq!(plan.days.len(), 1);
        assert_eq!(plan.days[0].focus, "Review");
        assert_eq!(plan.days[0].date, None);
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(matches!(
            parse_reply("not json").unwrap_err(),
            ProposerError::Malformed(_)
        ));
    }

    #[test]
    fn invalid_date_is_malformed() {
        let err = parse_reply(r#"{"weekly_plan": [{"date": "next monday", "tasks": []}]}"#)
            .unwrap_err();
        assert!(matches!(err, ProposerError::Malformed(ref m) if m.contains("next monday")));
    }

    #[test]
    fn missing_task_field_is_malformed() {
        let err = parse_reply(r#"{"weekly_plan": [{"tasks": [{"sequence": 1}]}]}"#).unwrap_err();
        assert!(matches!(err, ProposerError::Malformed(_)));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ab", 3), "ab");
        assert_eq!(truncate("가나다라", 2), "가나...");
    }

    #[test]
    fn default_config_targets_chat_completions() {
        let cfg = HttpProposerConfig::default();
        assert!(cfg.endpoint.ends_with("/chat/completions"));
        assert!(cfg.api_key.is_none());
    }
}
