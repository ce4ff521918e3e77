//! Provider catalog: the static descriptor table, required-field
//! validation, and the per-model temperature policy.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::GommitError;

/// LLM provider families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// OpenAI chat completions API.
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
    /// Self-hosted Ollama through its OpenAI-compatible endpoint.
    Ollama,
    /// Google Generative Language API (Gemini).
    Google,
}

/// Fields a provider configuration may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderField {
    /// Secret used to authenticate against a hosted API.
    ApiKey,
    /// Base URL of the API.
    Uri,
}

impl ProviderField {
    /// Name of the field in the configuration file.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::Uri => "uri",
        }
    }
}

impl fmt::Display for ProviderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static catalog entry for one provider.
#[derive(Debug)]
pub struct ProviderDescriptor {
    /// Provider family.
    pub kind: ProviderKind,
    /// Logical key used in configuration and on the command line.
    pub title: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Fields that must be non-blank before dispatch.
    pub required: &'static [ProviderField],
    /// Fields that may be set.
    pub optional: &'static [ProviderField],
    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: &'static str,
    /// Environment variable consulted when `uri` is unset.
    pub uri_env: &'static str,
    /// Model used when the configuration names none.
    pub default_model: &'static str,
    /// Suggested models.
    pub models: &'static [&'static str],
}

/// Every supported provider, one entry each.
pub static PROVIDERS: &[ProviderDescriptor] = &[
    ProviderDescriptor {
        kind: ProviderKind::OpenAi,
        title: "openai",
        name: "OpenAI",
        required: &[ProviderField::ApiKey],
        optional: &[ProviderField::Uri],
        api_key_env: "OPENAI_API_KEY",
        uri_env: "OPENAI_URI",
        default_model: "gpt-4o-mini",
        models: &["gpt-4o", "gpt-4o-mini", "gpt-4.1", "gpt-4.1-mini", "o3-mini", "gpt-5-mini"],
    },
    ProviderDescriptor {
        kind: ProviderKind::Anthropic,
        title: "anthropic",
        name: "Anthropic",
        required: &[ProviderField::ApiKey],
        optional: &[ProviderField::Uri],
        api_key_env: "ANTHROPIC_API_KEY",
        uri_env: "ANTHROPIC_URI",
        default_model: "claude-3-5-haiku-latest",
        models: &[
            "claude-3-5-haiku-latest",
            "claude-3-7-sonnet-latest",
            "claude-sonnet-4-0",
        ],
    },
    ProviderDescriptor {
        kind: ProviderKind::Ollama,
        title: "ollama",
        name: "Ollama",
        required: &[ProviderField::Uri],
        optional: &[ProviderField::ApiKey],
        api_key_env: "OLLAMA_API_KEY",
        uri_env: "OLLAMA_URI",
        default_model: "llama3.2",
        models: &["llama3.2", "mistral", "codellama", "qwen2.5-coder"],
    },
    ProviderDescriptor {
        kind: ProviderKind::Google,
        title: "google",
        name: "Google",
        required: &[ProviderField::ApiKey],
        optional: &[ProviderField::Uri],
        api_key_env: "GOOGLE_API_KEY",
        uri_env: "GOOGLE_URI",
        default_model: "gemini-2.0-flash",
        models: &["gemini-2.0-flash", "gemini-2.5-flash", "gemini-2.5-pro"],
    },
];

/// Looks up a provider by its logical name.
pub fn find_provider(title: &str) -> Option<&'static ProviderDescriptor> {
    PROVIDERS.iter().find(|p| p.title == title)
}

/// Looks up a provider by name, failing with a configuration error.
pub fn descriptor(title: &str) -> Result<&'static ProviderDescriptor, GommitError> {
    find_provider(title).ok_or_else(|| GommitError::UnknownProvider(title.to_string()))
}

/// Logical names of all providers, in catalog order.
pub fn provider_titles() -> Vec<&'static str> {
    PROVIDERS.iter().map(|p| p.title).collect()
}

/// Per-provider settings from the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Secret for hosted providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Endpoint for self-hosted providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Model identifier.
    #[serde(default)]
    pub model: String,
    /// Requested sampling temperature (0.0-1.0, 0 = provider default).
    #[serde(default)]
    pub temperature: f32,
    /// Overrides the global commit style for this provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_style: Option<String>,
}

impl ProviderConfig {
    /// Returns the value of a field, if set.
    pub fn field(&self, field: ProviderField) -> Option<&str> {
        match field {
            ProviderField::ApiKey => self.api_key.as_deref(),
            ProviderField::Uri => self.uri.as_deref(),
        }
    }

    /// Returns the value of a field when it is set and non-blank.
    pub fn non_blank(&self, field: ProviderField) -> Option<&str> {
        self.field(field).filter(|v| !v.trim().is_empty())
    }
}

impl ProviderDescriptor {
    /// Checks that every required field is non-blank and the temperature
    /// is in range.
    pub fn validate(&self, config: &ProviderConfig) -> Result<(), GommitError> {
        if let Some(field) = self
            .required
            .iter()
            .find(|field| config.non_blank(**field).is_none())
        {
            return Err(GommitError::MissingProviderField {
                provider: self.title.to_string(),
                field: field.as_str().to_string(),
            });
        }
        check_temperature(self.title, config.temperature)
    }

    /// Returns true when this family rejects custom temperatures for `model`.
    pub fn is_temperature_locked(&self, model: &str) -> bool {
        let locked: &[&str] = match self.kind {
            ProviderKind::OpenAi => &OPENAI_FIXED_TEMPERATURE_PREFIXES,
            ProviderKind::Anthropic | ProviderKind::Ollama | ProviderKind::Google => &[],
        };
        locked.iter().any(|prefix| model.starts_with(prefix))
    }

    /// Temperature to send with the request, or `None` to use the provider
    /// default.
    pub fn effective_temperature(&self, model: &str, configured: f32) -> Option<f32> {
        if self.is_temperature_locked(model) {
            if configured > 0.0 {
                warn!(
                    provider = self.title,
                    model, configured, "Model only supports its default temperature, ignoring configured value"
                );
            }
            return None;
        }
        (configured > 0.0).then_some(configured)
    }
}

/// Accepted sampling temperatures.
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=1.0;

/// Rejects temperatures outside [`TEMPERATURE_RANGE`] (NaN included).
pub fn check_temperature(provider: &str, value: f32) -> Result<(), GommitError> {
    if TEMPERATURE_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(GommitError::InvalidTemperature {
            provider: provider.to_string(),
            value,
        })
    }
}

/// OpenAI model families that only accept the default temperature.
const OPENAI_FIXED_TEMPERATURE_PREFIXES: [&str; 4] = ["o1", "o3", "o4", "gpt-5"];

/// Returns true for OpenAI reasoning families, which take
/// `max_completion_tokens` instead of `max_tokens`.
pub fn uses_max_completion_tokens(model: &str) -> bool {
    OPENAI_FIXED_TEMPERATURE_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}
