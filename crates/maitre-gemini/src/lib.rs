// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini model provider adapter.
//!
//! Implements [`ModelProvider`] over the generateContent REST API for the
//! draft generator.

pub mod client;
pub mod types;

use async_trait::async_trait;
use maitre_config::model::GeminiConfig;
use maitre_core::{Adapter, AdapterType, HealthStatus, MaitreError, ModelProvider};
use tracing::info;

use crate::client::GeminiClient;
use crate::types::GenerateContentRequest;

/// Gemini model provider.
///
/// API key resolution order: config, then the `GEMINI_API_KEY` environment
/// variable, then error.
pub struct GeminiModel {
    client: GeminiClient,
}

impl GeminiModel {
    pub fn new(config: &GeminiConfig) -> Result<Self, MaitreError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = GeminiClient::new(api_key, config.model.clone())?;
        info!(model = config.model, "Gemini provider initialized");
        Ok(Self { client })
    }

    /// Creates a provider with an existing client (for testing).
    #[cfg(test)]
    fn with_client(client: GeminiClient) -> Self {
        Self { client }
    }
}

fn resolve_api_key(configured: &Option<String>) -> Result<String, MaitreError> {
    if let Some(key) = configured {
        if !key.is_empty() {
            return Ok(key.clone());
        }
    }
    match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(MaitreError::Config(
            "no Gemini API key: set [gemini].api_key or GEMINI_API_KEY".to_string(),
        )),
    }
}

#[async_trait]
impl Adapter for GeminiModel {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Model
    }

    async fn health_check(&self) -> Result<HealthStatus, MaitreError> {
        // No dedicated ping endpoint; the adapter is healthy once built.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MaitreError> {
        Ok(())
    }
}

#[async_trait]
impl ModelProvider for GeminiModel {
    async fn complete(&self, prompt: &str) -> Result<String, MaitreError> {
        let request = GenerateContentRequest::single_turn(prompt);
        let response = self.client.generate(&request).await?;
        response.text().ok_or_else(|| MaitreError::Generation {
            message: "response contained no candidates".to_string(),
            source: None,
            transient: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> GeminiModel {
        let client = GeminiClient::new("test-key".into(), "gemini-2.0-flash".into())
            .unwrap()
            .with_base_url(base_url.to_string());
        GeminiModel::with_client(client)
    }

    #[test]
    fn config_key_wins_over_environment() {
        let key = resolve_api_key(&Some("from-config".to_string())).unwrap();
        assert_eq!(key, "from-config");
    }

    #[test]
    fn empty_config_key_is_treated_as_absent() {
        // May still resolve from the environment on a developer machine, but
        // must never return the empty string.
        if let Ok(key) = resolve_api_key(&Some(String::new())) {
            assert!(!key.is_empty());
        }
    }

    #[tokio::test]
    async fn complete_returns_candidate_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Dear guest, thank you."}]},
                    "finishReason": "STOP"
                }]
            })))
            .mount(&server)
            .await;

        let text = provider(&server.uri()).complete("write a reply").await.unwrap();
        assert_eq!(text, "Dear guest, thank you.");
    }

    #[tokio::test]
    async fn empty_candidate_list_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = provider(&server.uri()).complete("write a reply").await.unwrap_err();
        assert!(err.is_transient());
    }
}
