//! LLM (`OpenAI`) API client module
//!
//! Encapsulates the chat-completion calls used to summarize chunks.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::prompt::sanitize_input;
use super::{GenerationRequest, TextGenerator};
use crate::core::config::AppConfig;
use crate::errors::PipelineError;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}

/// LLM API client for generating summaries
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: Client,
    api_key: String,
    org_id: Option<String>,
    model_name: String,
    base_url: String,
    temperature: f32,
}

impl LlmClient {
    #[must_use]
    pub fn new(api_key: String, org_id: Option<String>, model_name: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            org_id,
            model_name,
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let model = config
            .openai_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let client = Self::new(
            config.openai_api_key.clone(),
            config.openai_org_id.clone(),
            model,
        );
        match &config.openai_base_url {
            Some(base) => client.with_base_url(base),
            None => client,
        }
    }

    /// Points the client at an OpenAI-compatible endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    #[must_use]
    pub fn build_prompt(&self, request: &GenerationRequest<'_>) -> Vec<ChatCompletionMessage> {
        let user_text = format!("{}{}", request.instruction, sanitize_input(request.text));

        vec![
            ChatCompletionMessage {
                role: MessageRole::system,
                content: Content::Text(request.system.to_string()),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
            ChatCompletionMessage {
                role: MessageRole::user,
                content: Content::Text(user_text),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
        ]
    }

    fn headers(&self) -> Result<reqwest::header::HeaderMap, PipelineError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth_value = format!("Bearer {}", self.api_key)
            .parse()
            .map_err(|e| PipelineError::Config(format!("Invalid Authorization header: {e}")))?;
        headers.insert("Authorization", auth_value);

        let content_type_value = "application/json"
            .parse()
            .map_err(|e| PipelineError::Config(format!("Invalid Content-Type header: {e}")))?;
        headers.insert("Content-Type", content_type_value);

        if let Some(org) = &self.org_id {
            let org_value = org.parse().map_err(|e| {
                PipelineError::Config(format!("Invalid OpenAI-Organization header: {e}"))
            })?;
            headers.insert("OpenAI-Organization", org_value);
        }

        Ok(headers)
    }

    /// # Errors
    ///
    /// Returns `PipelineError::Summary` if the request fails, the API answers
    /// with a non-success status, or the response carries no text.
    pub async fn complete(
        &self,
        prompt: Vec<ChatCompletionMessage>,
        max_tokens: u32,
    ) -> Result<String, PipelineError> {
        #[cfg(feature = "debug-logs")]
        info!("Using chat prompt:\n{:?}", prompt);

        let estimated_input_tokens = prompt
            .iter()
            .map(|msg| match &msg.content {
                Content::Text(t) => estimate_tokens(t),
                Content::ImageUrl(_) => 0,
            })
            .sum::<usize>();

        info!(
            model = %self.model_name,
            estimated_input_tokens,
            max_tokens,
            "Requesting chat completion"
        );

        let request_body = json!({
            "model": self.model_name,
            "messages": build_chat_messages(&prompt),
            "max_tokens": max_tokens,
            "temperature": self.temperature,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .headers(self.headers()?)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| PipelineError::Summary(format!("OpenAI API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            return Err(PipelineError::Summary(format!(
                "OpenAI API error (status {status}): {error_text}"
            )));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Summary(format!("Failed to parse OpenAI response: {e}")))?;

        let text = extract_completion_text(&response_json)
            .ok_or_else(|| PipelineError::Summary("No text in response".to_string()))?;
        debug!(chars = text.len(), "Received chat completion");
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, PipelineError> {
        let prompt = self.build_prompt(&request);
        self.complete(prompt, request.max_tokens).await
    }
}

/// Build the chat-completions `messages` payload from a prompt.
/// Image parts are not used by the summarizer and are skipped.
pub(crate) fn build_chat_messages(prompt: &[ChatCompletionMessage]) -> Vec<Value> {
    prompt
        .iter()
        .filter_map(|m| {
            let role_str = match m.role {
                MessageRole::system => "system",
                MessageRole::user | MessageRole::function | MessageRole::tool => "user",
                MessageRole::assistant => "assistant",
            };

            match &m.content {
                Content::Text(t) => Some(json!({
                    "role": role_str,
                    "content": t
                })),
                Content::ImageUrl(_) => None,
            }
        })
        .collect()
}

/// Pulls `choices[0].message.content` out of a chat-completions response.
fn extract_completion_text(response: &Value) -> Option<String> {
    response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompt::{CHUNK_INSTRUCTION, SYSTEM_PROMPT};

    fn request(text: &str) -> GenerationRequest<'_> {
        GenerationRequest {
            system: SYSTEM_PROMPT,
            instruction: CHUNK_INSTRUCTION,
            text,
            max_tokens: 100,
        }
    }

    #[test]
    fn build_prompt_prefixes_instruction_and_sanitizes_text() {
        let client = LlmClient::new("key".to_string(), None, DEFAULT_MODEL.to_string());
        let prompt = client.build_prompt(&request("hello\u{0000} world"));

        assert_eq!(prompt.len(), 2);
        assert!(matches!(prompt[0].role, MessageRole::system));
        match &prompt[1].content {
            Content::Text(t) => {
                assert!(t.starts_with(CHUNK_INSTRUCTION));
                assert!(t.ends_with("hello world"));
            }
            Content::ImageUrl(_) => panic!("expected text content"),
        }
    }

    #[test]
    fn build_chat_messages_maps_roles() {
        let client = LlmClient::new("key".to_string(), None, DEFAULT_MODEL.to_string());
        let messages = build_chat_messages(&client.build_prompt(&request("text")));
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert!(messages[1]["content"].as_str().unwrap().ends_with("text"));
    }

    #[test]
    fn extract_completion_text_reads_first_choice() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "  - a point \n"}}]
        });
        assert_eq!(extract_completion_text(&body).unwrap(), "- a point");

        let empty = json!({"choices": [{"message": {"content": "   "}}]});
        assert!(extract_completion_text(&empty).is_none());
        assert!(extract_completion_text(&json!({})).is_none());
    }

    #[tokio::test]
    async fn generate_posts_to_chat_completions() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 100
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"- summarized"}}]}"#)
            .create_async()
            .await;

        let client = LlmClient::new("test-key".to_string(), None, DEFAULT_MODEL.to_string())
            .with_base_url(&server.url());
        let text = client.generate(request("some input")).await.unwrap();

        assert_eq!(text, "- summarized");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn generate_maps_api_errors_to_summary_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let client = LlmClient::new("test-key".to_string(), None, DEFAULT_MODEL.to_string())
            .with_base_url(&server.url());
        let err = client.generate(request("input")).await.unwrap_err();

        match err {
            PipelineError::Summary(msg) => {
                assert!(msg.contains("429"));
                assert!(msg.contains("rate limited"));
            }
            other => panic!("expected Summary error, got {other:?}"),
        }
    }
}
