//! Text generation seam and an OpenAI-compatible chat completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use feedforge_shared::{FeedForgeError, LlmSection, Result, resolve_api_key};

use crate::http;

/// Prompt-in, text-out LLM service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints (OpenRouter by
/// default).
#[derive(Debug, Clone)]
pub struct ChatCompletions {
    client: Client,
    endpoint: Url,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletions {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        temperature: f32,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            client: http::build_client(api_key, timeout_secs)?,
            endpoint: http::endpoint(base_url, "chat/completions")?,
            model: model.to_string(),
            temperature,
        })
    }

    /// Build a client from the `[llm]` config section.
    pub fn from_config(section: &LlmSection) -> Result<Self> {
        let api_key = resolve_api_key(&section.api_key_env)?;
        Self::new(
            &api_key,
            &section.base_url,
            &section.model,
            section.temperature,
            section.timeout_secs,
        )
    }
}

#[async_trait]
impl TextGenerator for ChatCompletions {
    #[instrument(skip_all, fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response: ChatResponse =
            http::post_json(&self.client, &self.endpoint, &request).await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| FeedForgeError::Provider("completion contained no choices".into()))?;

        debug!(response_chars = text.len(), "completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedforge_shared::ErrorCode;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn generate_returns_first_choice() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({ "model": "test-model" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "[\"A fact.\"]" } }
                ]
            })))
            .mount(&server)
            .await;

        let client = ChatCompletions::new("k", &server.uri(), "test-model", 0.0, 5).unwrap();
        let text = client.generate("hello").await.unwrap();
        assert_eq!(text, "[\"A fact.\"]");
    }

    #[tokio::test]
    async fn empty_choices_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let client = ChatCompletions::new("k", &server.uri(), "m", 0.0, 5).unwrap();
        let err = client.generate("hello").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProviderError);
    }
}
