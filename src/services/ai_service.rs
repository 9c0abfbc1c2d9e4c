// ==================== AI COMPLETION WRAPPER ====================
// Monta um prompt com dois objetos JSON, chama a API de completion e
// interpreta o texto da primeira choice como JSON. Sem retry, sem cache,
// sem validação do formato retornado.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::Config;

pub const COMPLETION_MODEL: &str = "gpt-3.5-turbo-instruct";
pub const MAX_TOKENS: u32 = 1000;
pub const TEMPERATURE: f32 = 0.7;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("OPENAI_API_KEY is not configured")]
    NotConfigured,

    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("completion response has no choices")]
    NoChoices,

    #[error("completion text is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Transport for text completions; returns the first choice's text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AiError>;
}

// ==================== OPENAI CLIENT ====================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

impl CompletionResponse {
    fn into_first_text(self) -> Result<String, AiError> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or(AiError::NoChoices)
    }
}

pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("⚠️  Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        if config.openai_api_key.is_none() {
            log::warn!("⚠️  OPENAI_API_KEY not set, AI endpoints will fail");
        }
        Self::new(&config.openai_base_url, config.openai_api_key.clone())
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::NotConfigured)?;
        let url = format!("{}/completions", self.base_url);

        log::info!("🤖 Requesting completion ({} chars)", prompt.len());

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&CompletionRequest {
                model: COMPLETION_MODEL,
                prompt,
                max_tokens: MAX_TOKENS,
                temperature: TEMPERATURE,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        completion.into_first_text()
    }
}

// ==================== OPERATIONS ====================

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CareerPathsRequest {
    #[schema(value_type = Object)]
    pub profile: Value,
    #[schema(value_type = Object)]
    pub goals: Value,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct MentorMatchesRequest {
    #[schema(value_type = Object)]
    pub mentee: Value,
    #[schema(value_type = Object)]
    pub candidates: Value,
}

pub fn career_paths_prompt(profile: &Value, goals: &Value) -> String {
    format!(
        "Based on the following user profile and career goals, suggest three possible career paths.\n\
         Respond only with a JSON array. Each item must have \"title\", \"description\", \
         \"steps\" (array of strings) and \"timeline\".\n\n\
         User profile:\n{}\n\nCareer goals:\n{}\n",
        profile, goals
    )
}

pub fn mentor_matches_prompt(mentee: &Value, candidates: &Value) -> String {
    format!(
        "Given the mentee profile and the potential mentors below, rank the best mentor matches.\n\
         Respond only with a JSON array. Each item must have \"mentor_id\", \"score\" (0-100) \
         and \"reason\".\n\n\
         Mentee profile:\n{}\n\nPotential mentors:\n{}\n",
        mentee, candidates
    )
}

fn parse_completion(text: &str) -> Result<Value, AiError> {
    Ok(serde_json::from_str(text.trim())?)
}

pub async fn career_paths(
    client: &dyn CompletionClient,
    profile: &Value,
    goals: &Value,
) -> Result<Value, AiError> {
    let text = client.complete(&career_paths_prompt(profile, goals)).await?;
    parse_completion(&text)
}

pub async fn mentor_matches(
    client: &dyn CompletionClient,
    mentee: &Value,
    candidates: &Value,
) -> Result<Value, AiError> {
    let text = client.complete(&mentor_matches_prompt(mentee, candidates)).await?;
    parse_completion(&text)
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedClient;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn well_formed_completion_is_parsed_into_an_array() {
        let client = ScriptedClient::new(
            "\n\n[{\"title\": \"Staff Engineer\", \"steps\": [\"lead a project\"]}]",
        );

        let result = career_paths(&client, &json!({"skills": ["rust"]}), &json!({"target": "staff"}))
            .await
            .unwrap();

        let paths = result.as_array().unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0]["title"], "Staff Engineer");

        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].contains(r#"{"skills":["rust"]}"#));
        assert!(prompts[0].contains(r#"{"target":"staff"}"#));
    }

    #[tokio::test]
    async fn non_json_completion_is_an_error() {
        let client = ScriptedClient::new("Sure! Here are some mentors you might like.");

        let err = mentor_matches(&client, &json!({}), &json!([]))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::InvalidJson(_)));
    }

    #[test]
    fn empty_choices_is_an_error() {
        let response: CompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(response.into_first_text(), Err(AiError::NoChoices)));

        let response: CompletionResponse =
            serde_json::from_str(r#"{"choices": [{"text": "[1]"}, {"text": "[2]"}]}"#).unwrap();
        assert_eq!(response.into_first_text().unwrap(), "[1]");
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let client = OpenAiClient::new("http://127.0.0.1:9", None);
        assert!(matches!(client.complete("hi").await, Err(AiError::NotConfigured)));
    }

    #[test]
    fn request_body_uses_fixed_model_parameters() {
        let body = serde_json::to_value(CompletionRequest {
            model: COMPLETION_MODEL,
            prompt: "p",
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        })
        .unwrap();
        assert_eq!(body["model"], "gpt-3.5-turbo-instruct");
        assert_eq!(body["max_tokens"], 1000);
    }
}
