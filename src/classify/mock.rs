//! Queue-based mock provider for tests

use super::provider::LlmProvider;
use crate::error::DiscoveryError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted `LlmProvider` returning queued responses in order. Public so
/// integration tests can drive the pipeline without network access.
pub struct MockProvider {
    responses: Mutex<VecDeque<Result<String, DiscoveryError>>>,
    invocations: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            invocations: AtomicUsize::new(0),
        }
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn push_error(&self, error: DiscoveryError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// How many times `invoke` was called.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn invoke(&self, _prompt: &str) -> Result<String, DiscoveryError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(DiscoveryError::Configuration(
                    "MockProvider: response queue is empty".into(),
                ))
            })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
