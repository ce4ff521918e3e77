//! Git repository operations: staged-change collection and committing.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use git2::{Delta, DiffFindOptions, DiffOptions, ErrorCode, Patch, Repository, Status, StatusOptions, Tree};
use tracing::debug;

/// One staged file change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedChange {
    /// Path relative to the repository root.
    pub path: String,
    /// Single-letter status (`A`, `M`, `D`, `R`, `C`, `T`, `?`).
    pub status: String,
    /// Unified diff of the change (empty for binary or mode-only changes).
    pub diff: String,
}

/// A modified-but-unstaged or untracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnstagedFile {
    /// Path relative to the repository root.
    pub path: String,
    /// Human-readable status (`modified`, `untracked`, `deleted`).
    pub status: &'static str,
}

/// Git repository wrapper
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Opens the repository containing the current directory
    pub fn open() -> Result<Self> {
        let repo = Repository::discover(".").context("Not in a git repository")?;

        Ok(Self { repo })
    }

    /// Opens the repository at the specified path
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::open(path).context("Failed to open git repository")?;

        Ok(Self { repo })
    }

    /// Returns the working tree root, `None` for bare repositories
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Resolves the HEAD tree, `None` for a repository without commits.
    fn head_tree(&self) -> Result<Option<Tree<'_>>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                return Ok(None);
            }
            Err(e) => return Err(e).context("Failed to get HEAD reference"),
        };

        let tree = head.peel_to_tree().context("Failed to get HEAD tree")?;
        Ok(Some(tree))
    }

    /// Lists staged changes with one diff per file, in index order.
    pub fn staged_changes(&self) -> Result<Vec<StagedChange>> {
        let head_tree = self.head_tree()?;
        let mut index = self.repo.index().context("Failed to read index")?;
        index
            .read(false)
            .context("Failed to refresh index from disk")?;

        let mut diff_opts = DiffOptions::new();
        diff_opts.include_typechange(true);
        let mut diff = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), Some(&index), Some(&mut diff_opts))
            .context("Failed to diff HEAD against index")?;

        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts))
            .context("Failed to detect renames")?;

        let mut changes = Vec::new();
        for (idx, delta) in diff.deltas().enumerate() {
            let Some(path) = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
            else {
                continue;
            };

            let diff_text = match Patch::from_diff(&diff, idx)
                .with_context(|| format!("Failed to build diff for {}", path.display()))?
            {
                Some(mut patch) => {
                    let buf = patch
                        .to_buf()
                        .with_context(|| format!("Failed to format diff for {}", path.display()))?;
                    String::from_utf8_lossy(&buf).into_owned()
                }
                None => String::new(),
            };

            changes.push(StagedChange {
                path: path.to_string_lossy().into_owned(),
                status: status_letter(delta.status()).to_string(),
                diff: diff_text,
            });
        }

        debug!(count = changes.len(), "Collected staged changes");
        Ok(changes)
    }

    /// Lists files with unstaged modifications, deletions, or no tracking.
    pub fn unstaged_files(&self) -> Result<Vec<UnstagedFile>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .context("Failed to get repository status")?;

        let mut files = Vec::new();
        for entry in statuses.iter() {
            let Some(path) = entry.path() else {
                continue;
            };
            if let Some(status) = worktree_status(entry.status()) {
                files.push(UnstagedFile {
                    path: path.to_string(),
                    status,
                });
            }
        }

        Ok(files)
    }

    /// Commits the index with `message` through the git CLI, so hooks and
    /// signing configuration apply. Returns git's summary output.
    pub fn commit(&self, message: &str) -> Result<String> {
        let workdir = self
            .workdir()
            .context("Cannot commit in a bare repository")?;

        let output = Command::new("git")
            .current_dir(workdir)
            .args(["commit", "--message", message])
            .output()
            .context("Failed to execute git commit")?;

        if !output.status.success() {
            let error_msg = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Error creating commit: {}", error_msg.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Maps a delta to its single-letter status.
fn status_letter(delta: Delta) -> &'static str {
    match delta {
        Delta::Added => "A",
        Delta::Deleted => "D",
        Delta::Modified => "M",
        Delta::Renamed => "R",
        Delta::Copied => "C",
        Delta::Typechange => "T",
        _ => "?",
    }
}

/// Maps working-tree status flags to a display status.
fn worktree_status(flags: Status) -> Option<&'static str> {
    if flags.contains(Status::WT_MODIFIED) {
        Some("modified")
    } else if flags.contains(Status::WT_NEW) {
        Some("untracked")
    } else if flags.contains(Status::WT_DELETED) {
        Some("deleted")
    } else {
        None
    }
}
