//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use git2::{Repository, Signature};
use gommit::ai::{AiClient, AiClientMetadata, ClientFactory, ClientOptions};
use gommit::provider::ProviderKind;
use tempfile::TempDir;

/// Prompt pairs sent to stub clients.
type PromptLog = Arc<Mutex<Vec<(String, String)>>>;

/// Client that answers every request with the same text.
struct StubClient {
    reply: String,
    model: String,
    prompts: PromptLog,
}

impl AiClient for StubClient {
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            self.prompts
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_prompt.to_string()));
            Ok(self.reply.clone())
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        AiClientMetadata {
            provider: "Stub".to_string(),
            model: self.model.clone(),
            temperature: None,
        }
    }
}

/// Factory that builds [`StubClient`]s and remembers every build.
pub struct StubFactory {
    reply: String,
    created: Arc<Mutex<Vec<(ProviderKind, ClientOptions)>>>,
    prompts: PromptLog,
}

impl StubFactory {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            created: Arc::default(),
            prompts: Arc::default(),
        }
    }

    pub fn created(&self) -> Vec<(ProviderKind, ClientOptions)> {
        self.created.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

impl ClientFactory for StubFactory {
    fn create(&self, kind: ProviderKind, options: ClientOptions) -> Result<Box<dyn AiClient>> {
        self.created.lock().unwrap().push((kind, options.clone()));
        Ok(Box::new(StubClient {
            reply: self.reply.clone(),
            model: options.model,
            prompts: self.prompts.clone(),
        }))
    }
}

/// Temporary git repository with a configured identity.
pub struct TestRepo {
    _temp_dir: TempDir,
    pub repo_path: PathBuf,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let repo_path = temp_dir.path().to_path_buf();
        let repo = Repository::init(&repo_path)?;

        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;
        config.set_bool("commit.gpgsign", false)?;

        Ok(Self {
            _temp_dir: temp_dir,
            repo_path,
            repo,
        })
    }

    pub fn write_and_stage(&self, path: &str, content: &str) -> Result<()> {
        fs::write(self.repo_path.join(path), content)?;
        let mut index = self.repo.index()?;
        index.add_path(Path::new(path))?;
        index.write()?;
        Ok(())
    }

    pub fn commit_index(&self, message: &str) -> Result<git2::Oid> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = Signature::now("Test User", "test@example.com")?;
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        Ok(self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?)
    }

    pub fn head_message(&self) -> Result<String> {
        let commit = self.repo.head()?.peel_to_commit()?;
        Ok(commit.message().unwrap_or_default().to_string())
    }
}
