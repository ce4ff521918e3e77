//! Error types for the commit-message pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the message pipeline.
///
/// Variants fall into four classes: configuration, file access,
/// generation, and empty response. Use
/// [`GommitError::is_configuration_error`] to classify without matching
/// every variant.
#[derive(Error, Debug)]
pub enum GommitError {
    /// A field the provider descriptor marks as required is blank.
    #[error("{field} is required for provider {provider}")]
    MissingProviderField {
        /// Logical provider name (e.g. "openai").
        provider: String,
        /// Missing field name (e.g. "api_key").
        field: String,
    },

    /// The requested provider is not in the provider catalog.
    #[error("Unsupported LLM provider: {0}")]
    UnknownProvider(String),

    /// The provider exists but has no entry in the configuration file.
    #[error("Provider configuration not found for: {0}")]
    ProviderNotConfigured(String),

    /// The sampling temperature is outside 0.0 to 1.0.
    #[error("temperature for provider {provider} must be between 0.0 and 1.0, got {value}")]
    InvalidTemperature {
        /// Logical provider name.
        provider: String,
        /// Rejected value.
        value: f32,
    },

    /// The commit style is not one of conventional, simple, detailed.
    #[error("Unknown commit style '{0}' (expected conventional, simple or detailed)")]
    UnknownCommitStyle(String),

    /// No configuration file exists at the expected location.
    #[error("Configuration file not found at {}", path.display())]
    ConfigNotFound {
        /// Path that was checked.
        path: PathBuf,
    },

    /// The configuration file exists but is not valid.
    #[error("Invalid configuration in {}: {message}", path.display())]
    InvalidConfig {
        /// Path of the configuration file.
        path: PathBuf,
        /// Parser or validation message.
        message: String,
    },

    /// A file that exists could not be read.
    #[error("Failed to read {}", path.display())]
    FileAccess {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The provider call failed.
    #[error("Error generating commit message with {provider}: {message}")]
    Generation {
        /// Logical provider name.
        provider: String,
        /// Flattened cause chain of the client failure.
        message: String,
    },

    /// The provider answered but the answer held no usable text.
    #[error("No commit message generated by {provider}: the response was empty")]
    EmptyResponse {
        /// Logical provider name.
        provider: String,
    },
}

impl GommitError {
    /// Returns true for errors caused by missing or invalid configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::MissingProviderField { .. }
                | Self::UnknownProvider(_)
                | Self::ProviderNotConfigured(_)
                | Self::InvalidTemperature { .. }
                | Self::UnknownCommitStyle(_)
                | Self::ConfigNotFound { .. }
                | Self::InvalidConfig { .. }
        )
    }

    /// Returns true for provider-call failures, including empty responses.
    pub fn is_generation_error(&self) -> bool {
        matches!(self, Self::Generation { .. } | Self::EmptyResponse { .. })
    }
}

/// Errors raised by individual provider clients.
///
/// The adapter folds these into [`GommitError::Generation`] together with
/// the provider name.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The API answered with a non-success status.
    #[error("API request failed: {0}")]
    ApiRequestFailed(String),

    /// The response body did not match the expected schema.
    #[error("Invalid response format: {0}")]
    InvalidResponseFormat(String),

    /// The configured endpoint could not be turned into a request URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Network connectivity error.
    #[error("Network error: {0}")]
    NetworkError(String),
}

// Note: anyhow already has a blanket impl for thiserror::Error types
