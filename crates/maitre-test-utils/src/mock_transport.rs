// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat transport for deterministic testing.
//!
//! `MockTransport` implements `ChatTransport`, capturing outbound messages
//! for assertion and replaying scripted failures.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use maitre_core::types::TransportMessageId;
use maitre_core::{Adapter, AdapterType, ChatTransport, HealthStatus, MaitreError};

/// A captured outbound message.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub recipient: String,
    pub text: String,
}

/// A mock chat transport.
///
/// Messages passed to `send()` are captured and retrievable via
/// [`sent_messages`]. Failures queued with [`fail_next`] are consumed
/// before any capture, one per call.
///
/// [`sent_messages`]: MockTransport::sent_messages
/// [`fail_next`]: MockTransport::fail_next
pub struct MockTransport {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failures: Arc<Mutex<VecDeque<MaitreError>>>,
    counter: AtomicU64,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(VecDeque::new())),
            counter: AtomicU64::new(0),
        }
    }

    /// Queue a failure for an upcoming `send()` call.
    pub async fn fail_next(&self, transient: bool) {
        self.failures.lock().await.push_back(MaitreError::Delivery {
            message: "scripted send failure".to_string(),
            source: None,
            transient,
        });
    }

    /// All messages sent so far, in order.
    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// The text of the most recent message, if any.
    pub async fn last_text(&self) -> Option<String> {
        self.sent.lock().await.last().map(|m| m.text.clone())
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
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
impl ChatTransport for MockTransport {
    async fn send(
        &self,
        recipient: &str,
        text: &str,
    ) -> Result<TransportMessageId, MaitreError> {
        if let Some(err) = self.failures.lock().await.pop_front() {
            return Err(err);
        }
        self.sent.lock().await.push(SentMessage {
            recipient: recipient.to_string(),
            text: text.to_string(),
        });
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(TransportMessageId(format!("mock-sm-{n}")))
    }
}
