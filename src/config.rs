//! Configuration loading, provider credential fallbacks, and CLI overrides.
//!
//! The configuration lives in `$HOME/gommit.json` (or the file named by
//! `$GOMMIT_CONFIG`). Provider credentials missing from the file fall back
//! to the process environment, then to a `.env` file in the working
//! directory. The `.env` file is only read, never exported.

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ai::{RequestSettings, MAX_REQUEST_TIMEOUT};
use crate::error::GommitError;
use crate::provider::{self, ProviderConfig, ProviderField, PROVIDERS};

/// File name of the configuration inside the home directory.
pub const CONFIG_FILE_NAME: &str = "gommit.json";

/// Environment variable that points at an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "GOMMIT_CONFIG";

/// Dotenv file consulted for credential fallbacks.
pub const DOTENV_FILE: &str = ".env";

/// Provider used when the configuration names none.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider used when `-p` is not given.
    pub default_provider: String,
    /// Per-provider settings keyed by logical provider name.
    pub providers: BTreeMap<String, ProviderConfig>,
    /// Maximum tokens requested from the provider.
    pub max_tokens: u32,
    /// Global commit style.
    pub commit_style: String,
    /// Lines kept at each end of a long diff.
    pub truncate_lines: usize,
    /// Maximum characters per diff line (0 disables the cap).
    pub max_line_width: usize,
    /// HTTP timeout for the provider call.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: DEFAULT_PROVIDER.to_string(),
            providers: BTreeMap::new(),
            max_tokens: 500,
            commit_style: "conventional".to_string(),
            truncate_lines: 1000,
            max_line_width: 300,
            request_timeout_secs: 60,
        }
    }
}

impl Config {
    /// Loads the configuration from the default location.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// Loads the configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(GommitError::ConfigNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = fs::read_to_string(path).map_err(|source| GommitError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: Config =
            serde_json::from_str(&content).map_err(|e| GommitError::InvalidConfig {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if config.default_provider.trim().is_empty() {
            config.default_provider = DEFAULT_PROVIDER.to_string();
        }

        for (name, provider_config) in &config.providers {
            provider::check_temperature(name, provider_config.temperature).map_err(|e| {
                GommitError::InvalidConfig {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            })?;
        }

        debug!(
            path = %path.display(),
            default_provider = %config.default_provider,
            providers = config.providers.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Returns the configuration path: `$GOMMIT_CONFIG` when set, else
    /// `$HOME/gommit.json`.
    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home_dir.join(CONFIG_FILE_NAME))
    }

    /// Resolves the settings for `provider_name`, filling blank credentials
    /// from `fallback`.
    ///
    /// A provider absent from the file is still usable when the fallback
    /// supplies at least one of its fields.
    pub fn provider_config(
        &self,
        provider_name: &str,
        fallback: &CredentialFallback,
    ) -> Result<ProviderConfig, GommitError> {
        let descriptor = provider::descriptor(provider_name)?;

        let mut config = match self.providers.get(provider_name) {
            Some(config) => config.clone(),
            None => {
                let has_fallback = fallback.lookup(descriptor.api_key_env).is_some()
                    || fallback.lookup(descriptor.uri_env).is_some();
                if !has_fallback {
                    return Err(GommitError::ProviderNotConfigured(provider_name.to_string()));
                }
                ProviderConfig::default()
            }
        };

        for (field, key) in [
            (ProviderField::ApiKey, descriptor.api_key_env),
            (ProviderField::Uri, descriptor.uri_env),
        ] {
            if config.non_blank(field).is_some() {
                continue;
            }
            if let Some(value) = fallback.lookup(key) {
                debug!(provider = provider_name, field = %field, source = key, "Using credential fallback");
                let value = Some(value.to_string());
                match field {
                    ProviderField::ApiKey => config.api_key = value,
                    ProviderField::Uri => config.uri = value,
                }
            }
        }

        Ok(config)
    }

    /// Request limits for the provider call, with the timeout clamped to
    /// `1..=600` seconds.
    pub fn request_settings(&self) -> RequestSettings {
        let max_secs = MAX_REQUEST_TIMEOUT.as_secs();
        let secs = self.request_timeout_secs.clamp(1, max_secs);
        if secs != self.request_timeout_secs {
            warn!(
                configured = self.request_timeout_secs,
                used = secs,
                "request_timeout_secs out of range, clamping"
            );
        }

        RequestSettings {
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(secs),
        }
    }
}

/// Credential values consulted when the configuration leaves a provider
/// field blank. Process environment wins over the `.env` file.
#[derive(Debug, Clone, Default)]
pub struct CredentialFallback {
    process: HashMap<String, String>,
    dotenv: HashMap<String, String>,
}

impl CredentialFallback {
    /// Creates a fallback from explicit maps.
    pub fn new(process: HashMap<String, String>, dotenv: HashMap<String, String>) -> Self {
        Self { process, dotenv }
    }

    /// Reads every provider variable from the process environment and the
    /// dotenv file at `dotenv_path` (a missing file is not an error).
    pub fn load<P: AsRef<Path>>(dotenv_path: P) -> Result<Self> {
        let process = PROVIDERS
            .iter()
            .flat_map(|p| [p.api_key_env, p.uri_env])
            .filter_map(|key| env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect();

        let dotenv = read_dotenv(dotenv_path.as_ref())?;
        Ok(Self { process, dotenv })
    }

    /// Returns the first non-blank value for `key`.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        [&self.process, &self.dotenv]
            .into_iter()
            .filter_map(|vars| vars.get(key))
            .map(String::as_str)
            .find(|value| !value.trim().is_empty())
    }
}

/// Parses a dotenv file without touching the process environment.
fn read_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    iter.collect::<Result<HashMap<_, _>, _>>()
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Values given on the command line that replace configured ones for a
/// single run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    /// Provider to use instead of `default_provider`.
    pub provider: Option<String>,
    /// Model for the selected provider.
    pub model: Option<String>,
    /// Temperature for the selected provider, 0.0 to 1.0.
    pub temperature: Option<f32>,
    /// Commit style for the selected provider.
    pub commit_style: Option<String>,
    /// Lines kept at each end of a long diff.
    pub truncate_lines: Option<usize>,
    /// Maximum characters per diff line.
    pub max_line_width: Option<usize>,
}

/// Provider selection after overrides were applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProvider {
    /// Logical provider name.
    pub name: String,
    /// Provider settings including overrides and credential fallbacks.
    pub config: ProviderConfig,
    /// Human-readable description of every override applied.
    pub overrides: Vec<String>,
}

impl ConfigOverrides {
    /// Selects the provider and applies all overrides.
    ///
    /// Global overrides (`truncate_lines`, `max_line_width`) are written to
    /// `config`; provider overrides go to the returned provider settings.
    pub fn apply(
        &self,
        config: &mut Config,
        fallback: &CredentialFallback,
    ) -> Result<ResolvedProvider, GommitError> {
        let mut overrides = Vec::new();

        let name = match self.provider.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(provider) => {
                overrides.push(provider.to_string());
                provider.to_string()
            }
            None => config.default_provider.clone(),
        };

        let mut provider_config = config.provider_config(&name, fallback)?;

        if let Some(model) = self.model.as_deref().filter(|m| !m.trim().is_empty()) {
            provider_config.model = model.to_string();
            overrides.push(format!("model({model})"));
        }

        if let Some(temperature) = self.temperature {
            provider::check_temperature(&name, temperature)?;
            provider_config.temperature = temperature;
            overrides.push(format!("temperature({temperature:.2})"));
        }

        if let Some(style) = self.commit_style.as_deref().filter(|s| !s.trim().is_empty()) {
            provider_config.commit_style = Some(style.to_string());
            overrides.push(format!("style({style})"));
        }

        if let Some(lines) = self.truncate_lines.filter(|l| *l > 0) {
            config.truncate_lines = lines;
            overrides.push(format!("truncate_lines({lines})"));
        }

        if let Some(width) = self.max_line_width.filter(|w| *w > 0) {
            config.max_line_width = width;
            overrides.push(format!("max_line_width({width})"));
        }

        Ok(ResolvedProvider {
            name,
            config: provider_config,
            overrides,
        })
    }
}
