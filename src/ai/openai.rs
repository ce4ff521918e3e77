//! OpenAI-compatible API client implementation (works with OpenAI, Ollama, etc.)

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::{AiClient, AiClientMetadata, ClientOptions};
use crate::error::ProviderError;
use crate::provider::uses_max_completion_tokens;

/// Public OpenAI endpoint.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Default local Ollama endpoint.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// OpenAI API request message
#[derive(Serialize, Debug)]
struct Message {
    role: String,
    content: String,
}

/// OpenAI API request body
#[derive(Serialize, Debug)]
struct OpenAiRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

/// OpenAI API response choice
#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

/// OpenAI API response message
#[derive(Deserialize, Debug)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI API response
#[derive(Deserialize, Debug)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<Usage>,
}

/// OpenAI API usage statistics
#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct Usage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

/// OpenAI-compatible API client (works with OpenAI, Ollama, etc.)
pub struct OpenAiClient {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication (optional for Ollama)
    api_key: Option<String>,
    /// Model identifier
    model: String,
    /// Base URL for the API (e.g., "https://api.openai.com" or "http://localhost:11434")
    base_url: String,
    /// Maximum tokens for responses
    max_tokens: u32,
    /// Temperature for response generation
    temperature: Option<f32>,
    /// Provider label reported in metadata
    provider: &'static str,
}

impl OpenAiClient {
    fn new(options: ClientOptions, default_base_url: &str, provider: &'static str) -> Result<Self> {
        let client = super::build_http_client(options.timeout)?;

        Ok(Self {
            client,
            api_key: options.api_key,
            model: options.model,
            base_url: options
                .base_url
                .unwrap_or_else(|| default_base_url.to_string()),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            provider,
        })
    }

    /// Creates a client for the public OpenAI API (or a configured proxy).
    pub fn new_openai(options: ClientOptions) -> Result<Self> {
        Self::new(options, OPENAI_BASE_URL, "OpenAI")
    }

    /// Creates a client for an Ollama server's OpenAI-compatible endpoint.
    pub fn new_ollama(options: ClientOptions) -> Result<Self> {
        Self::new(options, OLLAMA_BASE_URL, "Ollama")
    }

    /// Build the full API URL
    fn get_api_url(&self) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');

        // Accept base URLs given with or without the version segment
        let url = if base.ends_with("/v1") {
            format!("{base}/chat/completions")
        } else {
            format!("{base}/v1/chat/completions")
        };

        debug!(base_url = %self.base_url, full_url = %url, "Constructed OpenAI-compatible API URL");

        Url::parse(&url).map_err(|e| {
            ProviderError::InvalidEndpoint(format!("{}: {e}", self.base_url)).into()
        })
    }

    fn build_request(&self, system_prompt: &str, user_prompt: &str) -> OpenAiRequest {
        // Build messages array with system prompt first, then user prompt
        let mut messages = Vec::new();

        if !system_prompt.is_empty() {
            messages.push(Message {
                role: "system".to_string(),
                content: system_prompt.to_string(),
            });
        }

        messages.push(Message {
            role: "user".to_string(),
            content: user_prompt.to_string(),
        });

        let reasoning = uses_max_completion_tokens(&self.model);
        OpenAiRequest {
            model: self.model.clone(),
            messages,
            max_tokens: (!reasoning).then_some(self.max_tokens),
            max_completion_tokens: reasoning.then_some(self.max_tokens),
            temperature: self.temperature,
            stream: false,
        }
    }
}

impl AiClient for OpenAiClient {
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
                base_url = %self.base_url,
                "Preparing OpenAI-compatible API request"
            );

            let request = self.build_request(system_prompt, user_prompt);

            debug!(
                max_tokens = ?request.max_tokens,
                max_completion_tokens = ?request.max_completion_tokens,
                temperature = ?request.temperature,
                message_count = request.messages.len(),
                "Built OpenAI-compatible request payload"
            );

            let api_url = self.get_api_url()?;
            info!(url = %api_url, model = %self.model, "Sending request to OpenAI-compatible API");

            let mut req_builder = self
                .client
                .post(api_url)
                .header("Content-Type", "application/json")
                .json(&request);

            // Add authorization header if API key is provided
            if let Some(ref api_key) = self.api_key {
                req_builder = req_builder.header("Authorization", format!("Bearer {api_key}"));
            }

            let response = req_builder
                .send()
                .await
                .map_err(|e| ProviderError::NetworkError(e.to_string()))?;
            let response = super::check_error_response(response).await?;

            let openai_response: OpenAiResponse = response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponseFormat(e.to_string()))?;

            debug!(
                choice_count = openai_response.choices.len(),
                model = ?openai_response.model,
                usage = ?openai_response.usage,
                "Received OpenAI-compatible API response"
            );

            let result = super::first_non_empty(
                openai_response
                    .choices
                    .into_iter()
                    .filter_map(|choice| choice.message.content),
                "message content",
            );

            super::log_response_success(self.provider, &result);
            result
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        AiClientMetadata {
            provider: self.provider.to_string(),
            model: self.model.clone(),
            temperature: self.temperature,
        }
    }
}
