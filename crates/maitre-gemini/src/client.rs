// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini generateContent API.
//!
//! Handles request construction, API-key authentication, and transient
//! error retry.

use std::time::Duration;

use maitre_core::MaitreError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

/// Base URL for the Gemini API model collection.
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// HTTP client for Gemini API communication.
///
/// Manages the authentication header, connection pooling, and retry logic
/// for transient errors (429, 500, 503).
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    model: String,
    max_retries: u32,
    base_url: String,
}

impl GeminiClient {
    /// Creates a new Gemini API client for the given model.
    pub fn new(api_key: String, model: String) -> Result<Self, MaitreError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&api_key)
                .map_err(|e| MaitreError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| MaitreError::Generation {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
                transient: false,
            })?;

        Ok(Self {
            client,
            model,
            max_retries: 1,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Returns the model identifier this client targets.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Sends a generateContent request and returns the parsed response.
    ///
    /// On transient errors (429, 500, 503), retries once after a 1-second
    /// delay. Errors are reported as [`MaitreError::Generation`] with the
    /// transient flag set for retryable statuses, so callers with their own
    /// retry policy can layer on top.
    pub async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, MaitreError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying generateContent after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(request)
                .send()
                .await
                .map_err(|e| MaitreError::Generation {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                    transient: true,
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "generateContent response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| MaitreError::Generation {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                    transient: true,
                })?;
                return serde_json::from_str(&body).map_err(|e| MaitreError::Generation {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                    transient: false,
                });
            }

            let transient = is_transient_error(status);
            let body = response.text().await.unwrap_or_default();
            let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                format!(
                    "Gemini API error ({}): {}",
                    api_err.error.status, api_err.error.message
                )
            } else {
                format!("API returned {status}: {body}")
            };

            if transient && attempt < self.max_retries {
                warn!(status = %status, "transient error, will retry");
                last_error = Some(MaitreError::Generation {
                    message,
                    source: None,
                    transient: true,
                });
                continue;
            }

            return Err(MaitreError::Generation {
                message,
                source: None,
                transient,
            });
        }

        Err(last_error.unwrap_or_else(|| MaitreError::Generation {
            message: "generateContent failed after retries".into(),
            source: None,
            transient: true,
        }))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> GeminiClient {
        GeminiClient::new("test-api-key".into(), "gemini-2.0-flash".into())
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    fn success_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
    }

    #[tokio::test]
    async fn generate_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("Hi there!")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let request = GenerateContentRequest::single_turn("Hello");
        let response = client.generate(&request).await.unwrap();

        assert_eq!(response.text().unwrap(), "Hi there!");
    }

    #[tokio::test]
    async fn generate_retries_on_429() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("After retry")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let request = GenerateContentRequest::single_turn("Hello");
        let response = client.generate(&request).await.unwrap();

        assert_eq!(response.text().unwrap(), "After retry");
    }

    #[tokio::test]
    async fn generate_surfaces_permanent_error_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "Invalid request", "status": "INVALID_ARGUMENT"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .generate(&GenerateContentRequest::single_turn("Hello"))
            .await
            .unwrap_err();

        assert!(!err.is_transient());
        let message = err.to_string();
        assert!(message.contains("INVALID_ARGUMENT"), "got: {message}");
    }

    #[tokio::test]
    async fn exhausted_retries_report_transient_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .generate(&GenerateContentRequest::single_turn("Hello"))
            .await
            .unwrap_err();

        assert!(err.is_transient());
    }
}
