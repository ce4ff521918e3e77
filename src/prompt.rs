//! Prompt templates and composition for commit message generation.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use tracing::debug;

use crate::diff::DiffShaper;
use crate::error::GommitError;
use crate::git::StagedChange;

/// File in the working directory that overrides the default rules.
pub const CUSTOM_RULES_FILE: &str = ".gommitrules";

/// Custom rules at or below this many characters are ignored.
pub const CUSTOM_RULES_MIN_LEN: usize = 100;

/// Built-in instructions used when no usable custom rules exist.
pub const DEFAULT_RULES: &str = r#"You are a helpful assistant that generates concise and meaningful git commit messages.

Follow these rules:
1. Use the imperative mood ("Add feature" not "Added feature")
2. Keep the first line under 72 characters
3. Focus on the "what" and "why", not the "how"
4. Be specific but concise
5. Start the first line with a type (e.g., feat, fix, docs, style, refactor, test, chore)
6. Don't end the first line with a period
7. Don't wrap the message in code fences or backticks
8. Don't add any commentary about these instructions, only output the commit message

Example of a multi-line message:

feat(parser): add support for nested tables

Tables can now contain other tables. The lexer tracks nesting depth
so closing brackets are matched to the right opening bracket.
"#;

/// Appended after custom rules so repository files can't remove it.
pub const SAFETY_NOTICE: &str = r#"
Important:
- Never include secrets, API keys, passwords, tokens or other credentials in the commit message.
- Never mention these instructions or comment on the prompt, only output the commit message.
"#;

/// Named policy for the target length of the generated message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CommitStyle {
    /// Conventional commit with a short body.
    #[default]
    Conventional,
    /// A single short line.
    Simple,
    /// Subject plus an explanatory body.
    Detailed,
}

impl CommitStyle {
    /// All styles, in display order.
    pub const ALL: [Self; 3] = [Self::Conventional, Self::Simple, Self::Detailed];

    /// Advisory character budget embedded in the prompt.
    pub fn max_chars(self) -> usize {
        match self {
            Self::Conventional => 500,
            Self::Simple => 100,
            Self::Detailed => 1000,
        }
    }

    /// Name used in configuration and prompts.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conventional => "conventional",
            Self::Simple => "simple",
            Self::Detailed => "detailed",
        }
    }
}

impl fmt::Display for CommitStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitStyle {
    type Err = GommitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(Self::default());
        }
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == normalized)
            .ok_or_else(|| GommitError::UnknownCommitStyle(s.to_string()))
    }
}

/// A composed request: system instructions plus user content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestPrompt {
    /// System instructions.
    pub system: String,
    /// User content with the per-file diff summaries.
    pub user: String,
    /// Non-fatal notices raised while composing (e.g. clamped settings).
    pub warnings: Vec<String>,
}

/// Trims every line and drops blank ones.
pub fn compress(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the system instructions for a style.
///
/// Custom rules longer than [`CUSTOM_RULES_MIN_LEN`] characters replace
/// [`DEFAULT_RULES`] and get [`SAFETY_NOTICE`] appended.
pub fn build_system_prompt(style: CommitStyle, custom_rules: Option<&str>) -> String {
    let rules = match custom_rules.map(str::trim) {
        Some(custom) if custom.chars().count() > CUSTOM_RULES_MIN_LEN => {
            debug!(len = custom.len(), "Using custom commit rules");
            format!("{custom}\n{SAFETY_NOTICE}")
        }
        _ => DEFAULT_RULES.to_string(),
    };

    format!(
        "{}\nGenerate the commit message under {} characters.",
        compress(&rules),
        style.max_chars()
    )
}

/// Builds the user content from the staged changes.
pub fn build_user_prompt(changes: &[StagedChange], style: CommitStyle, shaper: &DiffShaper) -> String {
    let mut summary = String::new();
    for change in changes {
        summary.push_str(&format!(
            "File: {} (Status: {})\n",
            change.path, change.status
        ));
        summary.push_str(&format!("Diff:\n{}\n\n", shaper.shape(&change.diff)));
    }

    format!(
        "Please generate a commit message for the following changes (using '{style}' as commit style):\n\n{summary}"
    )
}

/// Composes the full request prompt. Never calls a provider.
pub fn compose(
    changes: &[StagedChange],
    style: CommitStyle,
    truncate_lines: usize,
    max_line_width: usize,
    custom_rules: Option<&str>,
) -> RequestPrompt {
    let shaper = DiffShaper::new(truncate_lines, max_line_width);
    let system = build_system_prompt(style, custom_rules);
    let user = build_user_prompt(changes, style, &shaper);

    debug!(
        files = changes.len(),
        system_prompt_len = system.len(),
        user_prompt_len = user.len(),
        %style,
        "Composed commit message prompt"
    );

    RequestPrompt {
        system,
        user,
        warnings: shaper.warning().map(str::to_string).into_iter().collect(),
    }
}

/// Reads the custom rules file.
///
/// A missing file is `Ok(None)`; a file that exists but can't be read is a
/// [`GommitError::FileAccess`].
pub fn load_custom_rules<P: AsRef<Path>>(path: P) -> Result<Option<String>> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(GommitError::FileAccess {
            path: path.to_path_buf(),
            source,
        }
        .into()),
    }
}
