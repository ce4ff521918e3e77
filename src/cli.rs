//! CLI interface for gommit.

use std::io::{self, IsTerminal, Write};

use anyhow::{Context, Result};
use clap::Parser;
use termcolor::WriteColor;
use tracing::debug;

use crate::ai::{ClientFactory, HttpClientFactory};
use crate::config::{Config, ConfigOverrides, CredentialFallback, ResolvedProvider, DOTENV_FILE};
use crate::error::GommitError;
use crate::generate::generate_commit_message;
use crate::git::{GitRepository, UnstagedFile};
use crate::prompt::{self, CUSTOM_RULES_FILE};
use crate::provider;

pub mod confirm;
pub mod output;

use output::{write_toned, Tone};

/// Unstaged files listed when nothing is staged.
const MAX_LISTED_UNSTAGED: usize = 10;

/// gommit: generates a commit message for the staged changes with an LLM.
#[derive(Parser, Debug)]
#[command(name = "gommit")]
#[command(about = "Generates a git commit message for the staged changes using an LLM", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Provider to use instead of the configured default.
    #[arg(short = 'p', long)]
    pub provider: Option<String>,

    /// Model to use for the selected provider.
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Sampling temperature for the selected provider.
    #[arg(short = 't', long)]
    pub temperature: Option<f32>,

    /// Commit style: conventional, simple or detailed.
    #[arg(short = 's', long)]
    pub style: Option<String>,

    /// Lines kept at each end of a long diff.
    #[arg(short = 'l', long)]
    pub truncate_lines: Option<usize>,

    /// Maximum characters per diff line.
    #[arg(short = 'w', long)]
    pub max_line_width: Option<usize>,

    /// Commits without asking for confirmation.
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Enables debug logging on stderr.
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// Runs the full flow against the real provider APIs.
    pub async fn execute(self) -> Result<()> {
        self.execute_with(&HttpClientFactory).await
    }

    /// Runs the full flow with the given client factory.
    pub async fn execute_with(self, factory: &dyn ClientFactory) -> Result<()> {
        let mut config = Config::load().context("Error loading configuration")?;

        let repo = GitRepository::open()?;
        let changes = repo
            .staged_changes()
            .context("Error getting staged changes")?;

        if changes.is_empty() {
            let unstaged = repo
                .unstaged_files()
                .context("Error getting unstaged changes")?;
            write_unstaged_report(&mut output::stdout(), &unstaged)?;
            return Ok(());
        }

        let fallback = CredentialFallback::load(DOTENV_FILE)?;
        let resolved = self.overrides().apply(&mut config, &fallback)?;
        if !resolved.overrides.is_empty() {
            write_toned(
                &mut output::stderr(),
                Tone::Warning,
                &format!(
                    "⚠️ Overriding configuration: {}\n\n",
                    resolved.overrides.join(", ")
                ),
            )?;
        }

        let custom_rules = prompt::load_custom_rules(CUSTOM_RULES_FILE)?;
        let model = display_model(&resolved);
        write_toned(
            &mut output::stderr(),
            Tone::Info,
            &format!("Generating commit message using AI ({model})...\n"),
        )?;

        let message = tokio::select! {
            result = generate_commit_message(
                &config,
                &changes,
                &resolved.name,
                &resolved.config,
                custom_rules.as_deref(),
                factory,
            ) => result?,
            _ = tokio::signal::ctrl_c() => {
                anyhow::bail!("Commit message generation interrupted");
            }
        };

        write_preview(&mut output::stdout(), &model, &message)?;

        if !self.yes {
            let stdin = io::stdin();
            let confirmed = confirm::confirm_commit(stdin.is_terminal(), &mut stdin.lock())?;
            if !confirmed {
                write_toned(&mut output::stdout(), Tone::Info, "\n🚫 Commit cancelled by user\n")?;
                return Ok(());
            }
        }

        let summary = repo.commit(&message)?;
        debug!(summary = %summary.trim(), "git commit finished");
        let mut stdout = output::stdout();
        write!(stdout, "{summary}")?;
        write_toned(&mut stdout, Tone::Success, "\n✅ Successfully created commit!\n\n")?;

        Ok(())
    }

    /// Collects the command-line overrides.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            provider: self.provider.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            commit_style: self.style.clone(),
            truncate_lines: self.truncate_lines,
            max_line_width: self.max_line_width,
        }
    }
}

/// Follow-up advice for a failed run, chosen by the error's class.
pub fn error_hint(err: &anyhow::Error) -> Option<&'static str> {
    let gommit_err = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<GommitError>())?;

    if gommit_err.is_configuration_error() {
        Some("Check the configuration file ($GOMMIT_CONFIG or ~/gommit.json) and the provider's environment variables.")
    } else if gommit_err.is_generation_error() {
        Some("The provider call failed. Run again with --verbose to log the request details.")
    } else {
        None
    }
}

/// Model shown to the user: the configured one or the provider default.
fn display_model(resolved: &ResolvedProvider) -> String {
    let configured = resolved.config.model.trim();
    if !configured.is_empty() {
        return configured.to_string();
    }
    provider::find_provider(&resolved.name)
        .map(|p| p.default_model.to_string())
        .unwrap_or_default()
}

/// Explains that nothing is staged and lists files that could be.
fn write_unstaged_report<W: WriteColor + ?Sized>(out: &mut W, files: &[UnstagedFile]) -> io::Result<()> {
    write_toned(
        out,
        Tone::Error,
        "\n❌ No staged changes found. Use 'git add' first.\n\n",
    )?;

    if files.is_empty() {
        return Ok(());
    }

    write_toned(out, Tone::Detail, "Modified files that could be staged:\n")?;
    write_toned(out, Tone::Detail, "----------------------------------\n")?;
    for file in files.iter().take(MAX_LISTED_UNSTAGED) {
        write_toned(
            out,
            Tone::Plain,
            &format!("  • {} ({})\n", file.path, file.status),
        )?;
    }
    if files.len() > MAX_LISTED_UNSTAGED {
        write_toned(
            out,
            Tone::Detail,
            &format!("\nAnd {} more files...\n", files.len() - MAX_LISTED_UNSTAGED),
        )?;
    }
    write_toned(out, Tone::Detail, "\nTry: git add <file> to stage specific files\n")?;
    write_toned(out, Tone::Detail, "  or: git add . to stage all files\n")
}

/// Prints the generated message between rulers.
fn write_preview<W: WriteColor + ?Sized>(out: &mut W, model: &str, message: &str) -> io::Result<()> {
    let title = format!("📝 Generated commit message ({model}):");
    let ruler = "-".repeat(title.chars().count());
    write_toned(out, Tone::Info, &format!("\n{title}\n{ruler}\n"))?;
    writeln!(out, "{message}")?;
    write_toned(out, Tone::Info, &format!("{ruler}\n"))
}
