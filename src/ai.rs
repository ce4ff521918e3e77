//! AI client trait, shared HTTP helpers, and provider dispatch.

pub mod anthropic;
pub mod gemini;
pub mod openai;
#[cfg(test)]
pub(crate) mod test_utils;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::error::{GommitError, ProviderError};
use crate::prompt::RequestPrompt;
use crate::provider::{self, ProviderConfig, ProviderKind};

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

/// Default HTTP request timeout for AI API calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound accepted for the request timeout.
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Metadata about an AI client implementation.
#[derive(Clone, Debug)]
pub struct AiClientMetadata {
    /// Service provider name.
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Temperature sent with requests, `None` for the provider default.
    pub temperature: Option<f32>,
}

/// Trait for AI service clients.
pub trait AiClient: Send + Sync {
    /// Sends one system + user prompt and returns the first non-empty text
    /// of the response.
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

    /// Returns metadata about the AI client implementation.
    fn get_metadata(&self) -> AiClientMetadata;
}

/// Everything a client needs, passed explicitly at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientOptions {
    /// Model identifier.
    pub model: String,
    /// Secret for hosted APIs.
    pub api_key: Option<String>,
    /// API base URL; `None` selects the provider's public endpoint.
    pub base_url: Option<String>,
    /// Temperature to send, `None` to omit it.
    pub temperature: Option<f32>,
    /// Maximum tokens in the response.
    pub max_tokens: u32,
    /// HTTP timeout for the request.
    pub timeout: Duration,
}

/// Request limits that apply to every provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestSettings {
    /// Maximum tokens in the response.
    pub max_tokens: u32,
    /// HTTP timeout.
    pub timeout: Duration,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Builds a concrete client for a provider family.
pub trait ClientFactory: Send + Sync {
    /// Creates the client. Called only after the configuration validated.
    fn create(&self, kind: ProviderKind, options: ClientOptions) -> Result<Box<dyn AiClient>>;
}

/// Factory for the real HTTP clients.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpClientFactory;

impl ClientFactory for HttpClientFactory {
    fn create(&self, kind: ProviderKind, options: ClientOptions) -> Result<Box<dyn AiClient>> {
        Ok(match kind {
            ProviderKind::OpenAi => Box::new(OpenAiClient::new_openai(options)?),
            ProviderKind::Ollama => Box::new(OpenAiClient::new_ollama(options)?),
            ProviderKind::Anthropic => Box::new(AnthropicClient::new(options)?),
            ProviderKind::Google => Box::new(GeminiClient::new(options)?),
        })
    }
}

/// Sends a composed prompt to the named provider and returns the trimmed
/// message.
///
/// Required fields are validated before any client is built, so a blank
/// `api_key` or `uri` never reaches the network.
pub async fn dispatch(
    factory: &dyn ClientFactory,
    provider_name: &str,
    config: &ProviderConfig,
    settings: &RequestSettings,
    prompt: &RequestPrompt,
) -> Result<String> {
    let descriptor = provider::descriptor(provider_name)?;
    descriptor.validate(config)?;

    let model = if config.model.trim().is_empty() {
        descriptor.default_model.to_string()
    } else {
        config.model.trim().to_string()
    };
    let temperature = descriptor.effective_temperature(&model, config.temperature);

    let options = ClientOptions {
        api_key: config
            .non_blank(provider::ProviderField::ApiKey)
            .map(str::to_string),
        base_url: config
            .non_blank(provider::ProviderField::Uri)
            .map(str::to_string),
        model,
        temperature,
        max_tokens: settings.max_tokens,
        timeout: settings.timeout,
    };

    let generation_error = |e: anyhow::Error| GommitError::Generation {
        provider: provider_name.to_string(),
        message: format!("{e:#}"),
    };

    let client = factory
        .create(descriptor.kind, options)
        .map_err(generation_error)?;
    let metadata = client.get_metadata();
    info!(
        provider = %metadata.provider,
        model = %metadata.model,
        temperature = ?metadata.temperature,
        "Requesting commit message"
    );

    let text = client
        .send_request(&prompt.system, &prompt.user)
        .await
        .map_err(generation_error)?;

    let message = text.trim();
    if message.is_empty() {
        return Err(GommitError::EmptyResponse {
            provider: provider_name.to_string(),
        }
        .into());
    }
    Ok(message.to_string())
}

// ── Shared helpers for AI client implementations ────────────────────

/// Builds an HTTP client with the given request timeout.
pub(crate) fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout.min(MAX_REQUEST_TIMEOUT))
        .build()
        .context("Failed to build HTTP client")
}

/// Checks an HTTP response for error status and returns a structured error
/// if non-success.
pub(crate) async fn check_error_response(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_else(|e| {
        debug!("Failed to read error response body: {e}");
        String::new()
    });
    Err(ProviderError::ApiRequestFailed(format!("HTTP {status}: {error_text}")).into())
}

/// Returns the first non-blank text, or an error naming what was missing.
pub(crate) fn first_non_empty<I>(texts: I, what: &str) -> Result<String>
where
    I: IntoIterator<Item = String>,
{
    texts
        .into_iter()
        .find(|text| !text.trim().is_empty())
        .ok_or_else(|| ProviderError::InvalidResponseFormat(format!("No {what} in response")).into())
}

/// Logs successful text extraction from an AI API response.
pub(crate) fn log_response_success(provider: &str, result: &Result<String>) {
    if let Ok(text) = result {
        debug!(
            response_len = text.len(),
            "Successfully extracted text content from {} API response", provider
        );
        debug!(response_content = %text, "{} API response content", provider);
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::{RecordingClientFactory, StubResponse};
    use super::*;

    fn prompt() -> RequestPrompt {
        RequestPrompt {
            system: "system rules".to_string(),
            user: "user content".to_string(),
            warnings: Vec::new(),
        }
    }

    fn openai_config(api_key: Option<&str>, model: &str, temperature: f32) -> ProviderConfig {
        ProviderConfig {
            api_key: api_key.map(String::from),
            model: model.to_string(),
            temperature,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn blank_required_field_fails_before_client_is_built() {
        let factory = RecordingClientFactory::new(StubResponse::Text("unused".into()));
        let err = dispatch(
            &factory,
            "openai",
            &openai_config(Some(""), "gpt-4o", 0.5),
            &RequestSettings::default(),
            &prompt(),
        )
        .await
        .unwrap_err();

        let gommit_err = err.downcast_ref::<GommitError>().unwrap();
        assert!(gommit_err.is_configuration_error());
        assert_eq!(gommit_err.to_string(), "api_key is required for provider openai");
        assert_eq!(factory.created().len(), 0);
        assert_eq!(factory.prompt_handle().request_count(), 0);
    }

    #[tokio::test]
    async fn unknown_provider_is_configuration_error() {
        let factory = RecordingClientFactory::new(StubResponse::Text("unused".into()));
        let err = dispatch(
            &factory,
            "cohere",
            &openai_config(Some("key"), "command", 0.0),
            &RequestSettings::default(),
            &prompt(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GommitError>(),
            Some(GommitError::UnknownProvider(_))
        ));
        assert!(factory.created().is_empty());
    }

    #[tokio::test]
    async fn locked_model_never_receives_temperature() {
        let factory = RecordingClientFactory::new(StubResponse::Text("feat: x".into()));
        dispatch(
            &factory,
            "openai",
            &openai_config(Some("sk-test"), "o3-mini", 0.9),
            &RequestSettings::default(),
            &prompt(),
        )
        .await
        .unwrap();

        let created = factory.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, ProviderKind::OpenAi);
        assert_eq!(created[0].1.temperature, None);
    }

    #[tokio::test]
    async fn other_models_receive_configured_temperature() {
        let factory = RecordingClientFactory::new(StubResponse::Text("feat: x".into()));
        dispatch(
            &factory,
            "openai",
            &openai_config(Some("sk-test"), "gpt-4o-mini", 0.4),
            &RequestSettings::default(),
            &prompt(),
        )
        .await
        .unwrap();
        assert_eq!(factory.created()[0].1.temperature, Some(0.4));
    }

    #[tokio::test]
    async fn options_carry_credentials_and_limits() {
        let factory = RecordingClientFactory::new(StubResponse::Text("fix: y".into()));
        let config = ProviderConfig {
            uri: Some("http://localhost:11434".to_string()),
            model: String::new(),
            ..Default::default()
        };
        let settings = RequestSettings {
            max_tokens: 256,
            timeout: Duration::from_secs(5),
        };
        dispatch(&factory, "ollama", &config, &settings, &prompt())
            .await
            .unwrap();

        let (kind, options) = factory.created().remove(0);
        assert_eq!(kind, ProviderKind::Ollama);
        assert_eq!(options.model, "llama3.2");
        assert_eq!(options.base_url.as_deref(), Some("http://localhost:11434"));
        assert_eq!(options.api_key, None);
        assert_eq!(options.max_tokens, 256);
        assert_eq!(options.timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn response_is_trimmed_and_prompt_forwarded() {
        let factory =
            RecordingClientFactory::new(StubResponse::Text("\n  feat: add parser  \n\n".into()));
        let message = dispatch(
            &factory,
            "anthropic",
            &openai_config(Some("key"), "claude-3-5-haiku-latest", 0.0),
            &RequestSettings::default(),
            &prompt(),
        )
        .await
        .unwrap();

        assert_eq!(message, "feat: add parser");
        let prompts = factory.prompt_handle().prompts();
        assert_eq!(
            prompts,
            vec![("system rules".to_string(), "user content".to_string())]
        );
    }

    #[tokio::test]
    async fn blank_response_is_empty_response_error() {
        let factory = RecordingClientFactory::new(StubResponse::Text("   \n".into()));
        let err = dispatch(
            &factory,
            "google",
            &openai_config(Some("key"), "gemini-2.0-flash", 0.0),
            &RequestSettings::default(),
            &prompt(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GommitError>(),
            Some(GommitError::EmptyResponse { provider }) if provider == "google"
        ));
    }

    #[tokio::test]
    async fn client_failure_is_generation_error_with_cause() {
        let factory = RecordingClientFactory::new(StubResponse::Error("HTTP 401: bad key".into()));
        let err = dispatch(
            &factory,
            "openai",
            &openai_config(Some("key"), "gpt-4o", 0.0),
            &RequestSettings::default(),
            &prompt(),
        )
        .await
        .unwrap_err();
        let gommit_err = err.downcast_ref::<GommitError>().unwrap();
        assert!(gommit_err.is_generation_error());
        assert!(gommit_err.to_string().contains("HTTP 401: bad key"));
        assert!(gommit_err.to_string().contains("openai"));
    }

    #[test]
    fn first_non_empty_skips_blank_entries() {
        let texts = vec![String::new(), "  ".to_string(), "hello".to_string()];
        assert_eq!(first_non_empty(texts, "text").unwrap(), "hello");
        assert!(first_non_empty(Vec::<String>::new(), "text").is_err());
    }
}
