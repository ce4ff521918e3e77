//! Shared test utilities for the `ai` module.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use super::{AiClient, AiClientMetadata, ClientFactory, ClientOptions};
use crate::provider::ProviderKind;

/// Canned answer returned by [`StubAiClient`].
#[derive(Clone, Debug)]
pub(crate) enum StubResponse {
    /// Successful text response.
    Text(String),
    /// Client failure with this message.
    Error(String),
}

/// AI client that returns a canned response and records every prompt.
pub(crate) struct StubAiClient {
    response: StubResponse,
    options: ClientOptions,
    recorded_prompts: Arc<Mutex<Vec<(String, String)>>>,
}

impl AiClient for StubAiClient {
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            self.recorded_prompts
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_prompt.to_string()));
            match &self.response {
                StubResponse::Text(text) => Ok(text.clone()),
                StubResponse::Error(message) => Err(anyhow::anyhow!(message.clone())),
            }
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        AiClientMetadata {
            provider: "Stub".to_string(),
            model: self.options.model.clone(),
            temperature: self.options.temperature,
        }
    }
}

/// Factory that hands out [`StubAiClient`]s and records what it was asked
/// to build.
pub(crate) struct RecordingClientFactory {
    response: StubResponse,
    created: Arc<Mutex<Vec<(ProviderKind, ClientOptions)>>>,
    recorded_prompts: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingClientFactory {
    /// Creates a factory whose clients all return `response`.
    pub(crate) fn new(response: StubResponse) -> Self {
        Self {
            response,
            created: Arc::new(Mutex::new(Vec::new())),
            recorded_prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns every `(kind, options)` pair a client was built for.
    pub(crate) fn created(&self) -> Vec<(ProviderKind, ClientOptions)> {
        self.created.lock().unwrap().clone()
    }

    /// Returns a handle for inspecting the prompts sent to built clients.
    pub(crate) fn prompt_handle(&self) -> PromptRecordHandle {
        PromptRecordHandle {
            recorded_prompts: self.recorded_prompts.clone(),
        }
    }
}

impl ClientFactory for RecordingClientFactory {
    fn create(&self, kind: ProviderKind, options: ClientOptions) -> Result<Box<dyn AiClient>> {
        self.created.lock().unwrap().push((kind, options.clone()));
        Ok(Box::new(StubAiClient {
            response: self.response.clone(),
            options,
            recorded_prompts: self.recorded_prompts.clone(),
        }))
    }
}

/// Shared handle to the prompts recorded by stub clients.
pub(crate) struct PromptRecordHandle {
    recorded_prompts: Arc<Mutex<Vec<(String, String)>>>,
}

impl PromptRecordHandle {
    /// Returns all recorded `(system_prompt, user_prompt)` pairs.
    pub(crate) fn prompts(&self) -> Vec<(String, String)> {
        self.recorded_prompts.lock().unwrap().clone()
    }

    /// Returns the number of AI requests that were made.
    pub(crate) fn request_count(&self) -> usize {
        self.recorded_prompts.lock().unwrap().len()
    }
}
