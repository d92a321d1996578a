// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock model provider for deterministic testing.
//!
//! `MockModel` implements `ModelProvider` with pre-configured completions,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use maitre_core::{Adapter, AdapterType, HealthStatus, MaitreError, ModelProvider};

/// A mock model that returns pre-configured completions.
///
/// Completions are popped from a FIFO queue; failures queued with
/// [`fail_next`] are consumed before completions. When the queue is empty
/// the last prompt is echoed back, which deliberately fails draft
/// validation so an under-scripted test surfaces loudly.
///
/// [`fail_next`]: MockModel::fail_next
pub struct MockModel {
    responses: Arc<Mutex<VecDeque<Result<String, MaitreError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock pre-loaded with the given completions.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let mock = Self::new();
        let queue: VecDeque<_> = responses.into_iter().map(Ok).collect();
        *mock.responses.try_lock().unwrap() = queue;
        mock
    }

    /// Add a completion to the end of the queue.
    pub async fn add_response(&self, text: String) {
        self.responses.lock().await.push_back(Ok(text));
    }

    /// Queue a failure for an upcoming `complete()` call.
    pub async fn fail_next(&self, transient: bool) {
        self.responses
            .lock()
            .await
            .push_back(Err(MaitreError::Generation {
                message: "scripted model failure".to_string(),
                source: None,
                transient,
            }));
    }

    /// Every prompt received so far, in order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.prompts.lock().await.len()
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for MockModel {
    fn name(&self) -> &str {
        "mock-model"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Model
    }

    async fn health_check(&self) -> Result<HealthStatus, MaitreError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MaitreError> {
        Ok(())
    }
}

#[async_trait]
impl ModelProvider for MockModel {
    async fn complete(&self, prompt: &str) -> Result<String, MaitreError> {
        self.prompts.lock().await.push(prompt.to_string());
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(format!("unscripted completion for: {prompt}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pops_responses_in_order() {
        let model = MockModel::with_responses(vec!["one".into(), "two".into()]);
        assert_eq!(model.complete("p1").await.unwrap(), "one");
        assert_eq!(model.complete("p2").await.unwrap(), "two");
        assert_eq!(model.call_count().await, 2);
    }

    #[tokio::test]
    async fn scripted_failure_surfaces() {
        let model = MockModel::new();
        model.fail_next(true).await;
        model.add_response("after".into()).await;

        assert!(model.complete("p").await.unwrap_err().is_transient());
        assert_eq!(model.complete("p").await.unwrap(), "after");
    }

    #[tokio::test]
    async fn records_prompts() {
        let model = MockModel::with_responses(vec!["x".into()]);
        model.complete("the prompt").await.unwrap();
        assert_eq!(model.prompts().await, vec!["the prompt".to_string()]);
    }
}
