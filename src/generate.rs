//! Message pipeline: style resolution, prompt composition, and dispatch.

use anyhow::{Context, Result};
use tracing::debug;

use crate::ai::{self, ClientFactory};
use crate::config::Config;
use crate::git::StagedChange;
use crate::prompt::{self, CommitStyle};
use crate::provider::ProviderConfig;

/// Picks the provider's `commit_style` when set, else the global one.
pub fn resolve_commit_style(config: &Config, provider_config: &ProviderConfig) -> Result<CommitStyle> {
    let name = provider_config
        .commit_style
        .as_deref()
        .filter(|style| !style.trim().is_empty())
        .unwrap_or(&config.commit_style);

    Ok(name.trim().parse::<CommitStyle>()?)
}

/// Generates a commit message for `changes` in one linear pass.
///
/// Either the complete, trimmed message is returned or the first failure,
/// with context naming the stage that failed. The typed [`GommitError`]
/// stays reachable through `downcast_ref`.
///
/// [`GommitError`]: crate::error::GommitError
pub async fn generate_commit_message(
    config: &Config,
    changes: &[StagedChange],
    provider_name: &str,
    provider_config: &ProviderConfig,
    custom_rules: Option<&str>,
    factory: &dyn ClientFactory,
) -> Result<String> {
    let style = resolve_commit_style(config, provider_config).context("Failed to build prompt")?;
    debug!(%style, provider = provider_name, files = changes.len(), "Generating commit message");

    let request = prompt::compose(
        changes,
        style,
        config.truncate_lines,
        config.max_line_width,
        custom_rules,
    );

    ai::dispatch(
        factory,
        provider_name,
        provider_config,
        &config.request_settings(),
        &request,
    )
    .await
    .with_context(|| format!("Failed to generate commit message with {provider_name}"))
}
