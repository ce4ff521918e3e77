//! Anthropic Messages API client implementation.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AiClient, AiClientMetadata, ClientOptions};
use crate::error::ProviderError;

/// Public Anthropic endpoint.
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// API version sent with every request.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API request message.
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Anthropic API request body.
#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Anthropic API response content block.
#[derive(Deserialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic API response.
#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<Content>,
}

/// Anthropic API client implementation.
pub struct AnthropicClient {
    /// HTTP client for API requests.
    client: Client,
    /// API key for authentication.
    api_key: String,
    /// Model identifier.
    model: String,
    /// Base URL for the API.
    base_url: String,
    /// Maximum tokens for responses.
    max_tokens: u32,
    /// Temperature for response generation.
    temperature: Option<f32>,
}

impl AnthropicClient {
    /// Creates a new Anthropic client.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let client = super::build_http_client(options.timeout)?;

        Ok(Self {
            client,
            api_key: options.api_key.unwrap_or_default(),
            model: options.model,
            base_url: options
                .base_url
                .unwrap_or_else(|| ANTHROPIC_BASE_URL.to_string()),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        })
    }

    fn get_api_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

impl AiClient for AnthropicClient {
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            debug!(
                system_prompt_len = system_prompt.len(),
                user_prompt_len = user_prompt.len(),
                model = %self.model,
                "Preparing Anthropic API request"
            );

            debug!(
                system_prompt = %system_prompt,
                user_prompt = %user_prompt,
                "Anthropic API request content"
            );

            let request = MessagesRequest {
                model: self.model.clone(),
                max_tokens: self.max_tokens,
                system: system_prompt.to_string(),
                messages: vec![Message {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                }],
                temperature: self.temperature,
            };

            let url = self.get_api_url();
            info!(
                url = %url,
                model = %self.model,
                max_tokens = self.max_tokens,
                "Sending request to Anthropic API"
            );

            let response = self
                .client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request)
                .send()
                .await
                .map_err(|e| ProviderError::NetworkError(e.to_string()))?;
            let response = super::check_error_response(response).await?;

            let messages_response: MessagesResponse = response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponseFormat(e.to_string()))?;

            debug!(
                content_count = messages_response.content.len(),
                "Received Anthropic API response"
            );

            let result = super::first_non_empty(
                messages_response
                    .content
                    .into_iter()
                    .filter(|c| c.content_type == "text")
                    .filter_map(|c| c.text),
                "text content",
            );

            super::log_response_success("Anthropic", &result);
            result
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        AiClientMetadata {
            provider: "Anthropic".to_string(),
            model: self.model.clone(),
            temperature: self.temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{json, Value};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer, temperature: Option<f32>) -> AnthropicClient {
        AnthropicClient::new(ClientOptions {
            model: "claude-3-5-haiku-latest".to_string(),
            api_key: Some("sk-ant-test".to_string()),
            base_url: Some(server.uri()),
            temperature,
            max_tokens: 500,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn sends_messages_request_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "feat: add shaper"}]
            })))
            .mount(&server)
            .await;

        let text = client(&server, Some(0.5))
            .send_request("rules", "changes")
            .await
            .unwrap();
        assert_eq!(text, "feat: add shaper");

        let requests = server.received_requests().await.unwrap();
        let body: Value = requests[0].body_json().unwrap();
        assert_eq!(body["system"], "rules");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "changes");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["temperature"], 0.5);
    }

    #[tokio::test]
    async fn omits_temperature_when_unset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "fix: y"}]
            })))
            .mount(&server)
            .await;

        client(&server, None).send_request("s", "u").await.unwrap();
        let requests = server.received_requests().await.unwrap();
        let body: Value = requests[0].body_json().unwrap();
        assert!(body.get("temperature").is_none());
    }

    #[tokio::test]
    async fn skips_non_text_and_empty_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [
                    {"type": "thinking", "thinking": "..."},
                    {"type": "text", "text": ""},
                    {"type": "text", "text": "refactor: split module"}
                ]
            })))
            .mount(&server)
            .await;

        let text = client(&server, None).send_request("s", "u").await.unwrap();
        assert_eq!(text, "refactor: split module");
    }

    #[tokio::test]
    async fn rate_limit_is_api_request_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = client(&server, None).send_request("s", "u").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::ApiRequestFailed(msg)) if msg.contains("429")
        ));
    }
}
