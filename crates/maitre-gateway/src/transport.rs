// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio WhatsApp transport.
//!
//! Sends outbound messages through the Twilio Messages API. WhatsApp caps
//! message bodies at 1600 characters; bodies are chunked below that at
//! whitespace boundaries and sent in order, so long drafts arrive as a
//! readable sequence instead of being rejected.

use std::time::Duration;

use async_trait::async_trait;
use maitre_config::model::TwilioConfig;
use maitre_core::types::TransportMessageId;
use maitre_core::{Adapter, AdapterType, ChatTransport, HealthStatus, MaitreError};
use serde::Deserialize;
use tracing::{debug, warn};

/// Base URL for the Twilio REST API.
const API_BASE_URL: &str = "https://api.twilio.com";

/// Chunk bound, kept under Twilio's 1600-character body limit.
pub const MAX_CHUNK_CHARS: usize = 1500;

/// Twilio WhatsApp transport implementing [`ChatTransport`].
pub struct TwilioTransport {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorResponse {
    #[serde(default)]
    code: i64,
    message: String,
}

impl TwilioTransport {
    /// Creates a transport from the Twilio config section.
    ///
    /// All three credentials (account SID, auth token, sender number) must
    /// be present; tests use mock transports instead of a partial setup.
    pub fn new(config: &TwilioConfig) -> Result<Self, MaitreError> {
        let account_sid = required(&config.account_sid, "twilio.account_sid")?;
        let auth_token = required(&config.auth_token, "twilio.auth_token")?;
        let from_number = required(&config.from_number, "twilio.from_number")?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MaitreError::Delivery {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
                transient: false,
            })?;

        Ok(Self {
            client,
            account_sid,
            auth_token,
            from_number,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    async fn send_one(&self, recipient: &str, body: &str) -> Result<String, MaitreError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );
        let form = [
            ("To", recipient),
            ("From", self.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| MaitreError::Delivery {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
                transient: true,
            })?;

        let status = response.status();
        debug!(status = %status, "Twilio send response received");

        if status.is_success() {
            let parsed: MessageResponse =
                response.json().await.map_err(|e| MaitreError::Delivery {
                    message: format!("failed to parse Twilio response: {e}"),
                    source: Some(Box::new(e)),
                    transient: false,
                })?;
            return Ok(parsed.sid);
        }

        let transient = matches!(status.as_u16(), 429 | 500..=599);
        let text = response.text().await.unwrap_or_default();
        let message = if let Ok(err) = serde_json::from_str::<TwilioErrorResponse>(&text) {
            format!("Twilio error {}: {}", err.code, err.message)
        } else {
            format!("Twilio returned {status}: {text}")
        };
        if transient {
            warn!(status = %status, "transient Twilio send failure");
        }
        Err(MaitreError::Delivery {
            message,
            source: None,
            transient,
        })
    }
}

fn required(value: &Option<String>, key: &str) -> Result<String, MaitreError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| MaitreError::Config(format!("{key} is required for the Twilio transport")))
}

/// Splits `text` into chunks of at most `limit` characters, preferring
/// whitespace boundaries. A single overlong word is split hard.
pub fn chunk_body(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_inclusive(char::is_whitespace) {
        let word_len = word.chars().count();
        if current_len + word_len > limit && !current.is_empty() {
            chunks.push(current.trim_end().to_string());
            current = String::new();
            current_len = 0;
        }
        if word_len > limit {
            // Pathological single token; cut it at the limit.
            let mut rest: Vec<char> = word.chars().collect();
            while rest.len() > limit {
                let head: String = rest.drain(..limit).collect();
                chunks.push(head);
            }
            current = rest.into_iter().collect();
            current_len = current.chars().count();
        } else {
            current.push_str(word);
            current_len += word_len;
        }
    }
    if !current.trim().is_empty() {
        chunks.push(current.trim_end().to_string());
    }
    chunks
}

#[async_trait]
impl Adapter for TwilioTransport {
    fn name(&self) -> &str {
        "twilio-whatsapp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, MaitreError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MaitreError> {
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TwilioTransport {
    /// Sends `text`, chunked if needed. Returns the id of the first chunk;
    /// that id names the whole logical message in the turn log.
    async fn send(
        &self,
        recipient: &str,
        text: &str,
    ) -> Result<TransportMessageId, MaitreError> {
        let chunks = chunk_body(text, MAX_CHUNK_CHARS);
        let total = chunks.len();
        let mut first_sid = None;

        for (index, chunk) in chunks.iter().enumerate() {
            let sid = self.send_one(recipient, chunk).await?;
            debug!(chunk = index + 1, total, sid = %sid, "chunk delivered");
            if first_sid.is_none() {
                first_sid = Some(sid);
            }
        }

        first_sid
            .map(TransportMessageId)
            .ok_or_else(|| MaitreError::Delivery {
                message: "refusing to send an empty message".to_string(),
                source: None,
                transient: false,
            })
    }
}
