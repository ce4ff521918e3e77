//! Google Generative Language (Gemini) API client implementation.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::{AiClient, AiClientMetadata, ClientOptions};
use crate::error::ProviderError;

/// Public Gemini endpoint, including the API version.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize, Deserialize, Debug)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize, Debug)]
struct RequestContent {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_output_tokens: u32,
}

/// Gemini `generateContent` request body.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: SystemInstruction,
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize, Debug)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

/// Gemini `generateContent` response.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// Gemini API client implementation.
pub struct GeminiClient {
    /// HTTP client for API requests.
    client: Client,
    /// API key sent in the `x-goog-api-key` header.
    api_key: String,
    /// Model identifier.
    model: String,
    /// Base URL including the API version.
    base_url: String,
    /// Maximum tokens for responses.
    max_tokens: u32,
    /// Temperature for response generation.
    temperature: Option<f32>,
}

impl GeminiClient {
    /// Creates a new Gemini client.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let client = super::build_http_client(options.timeout)?;

        Ok(Self {
            client,
            api_key: options.api_key.unwrap_or_default(),
            model: options.model,
            base_url: options
                .base_url
                .unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        })
    }

    /// Builds `{base}/models/{model}:generateContent`.
    fn get_api_url(&self) -> Result<Url> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        Url::parse(&url).map_err(|e| {
            ProviderError::InvalidEndpoint(format!("{}: {e}", self.base_url)).into()
        })
    }
}

impl AiClient for GeminiClient {
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
                "Preparing Gemini API request"
            );

            let request = GenerateContentRequest {
                system_instruction: SystemInstruction {
                    parts: vec![Part {
                        text: system_prompt.to_string(),
                    }],
                },
                contents: vec![RequestContent {
                    role: "user".to_string(),
                    parts: vec![Part {
                        text: user_prompt.to_string(),
                    }],
                }],
                generation_config: GenerationConfig {
                    temperature: self.temperature,
                    max_output_tokens: self.max_tokens,
                },
            };

            let api_url = self.get_api_url()?;
            info!(url = %api_url, model = %self.model, "Sending request to Gemini API");

            let response = self
                .client
                .post(api_url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| ProviderError::NetworkError(e.to_string()))?;
            let response = super::check_error_response(response).await?;

            let gemini_response: GenerateContentResponse = response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponseFormat(e.to_string()))?;

            debug!(
                candidate_count = gemini_response.candidates.len(),
                finish_reason = ?gemini_response.candidates.first().and_then(|c| c.finish_reason.as_deref()),
                "Received Gemini API response"
            );

            // A candidate's text is the concatenation of its parts
            let result = super::first_non_empty(
                gemini_response.candidates.into_iter().map(|candidate| {
                    candidate
                        .content
                        .map(|content| {
                            content
                                .parts
                                .into_iter()
                                .map(|part| part.text)
                                .collect::<String>()
                        })
                        .unwrap_or_default()
                }),
                "candidate text",
            );

            super::log_response_success("Gemini", &result);
            result
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        AiClientMetadata {
            provider: "Google".to_string(),
            model: self.model.clone(),
            temperature: self.temperature,
        }
    }
}
