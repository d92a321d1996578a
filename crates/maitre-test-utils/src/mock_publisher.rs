// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock review publisher for deterministic testing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use maitre_core::{Adapter, AdapterType, HealthStatus, MaitreError, ReviewPublisher};

/// A published (review id, final text) pair.
#[derive(Debug, Clone)]
pub struct PublishedReply {
    pub review_id: String,
    pub text: String,
}

/// A mock publisher that records every publish call.
///
/// The capture list is the test's witness for exactly-once publication:
/// duplicate suppression shows up as a single entry no matter how many
/// approval events were delivered.
pub struct MockPublisher {
    published: Arc<Mutex<Vec<PublishedReply>>>,
    failures: Arc<Mutex<VecDeque<MaitreError>>>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            published: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Queue a failure for an upcoming `publish()` call.
    pub async fn fail_next(&self, transient: bool) {
        self.failures.lock().await.push_back(MaitreError::Delivery {
            message: "scripted publish failure".to_string(),
            source: None,
            transient,
        });
    }

    pub async fn published(&self) -> Vec<PublishedReply> {
        self.published.lock().await.clone()
    }

    pub async fn publish_count(&self) -> usize {
        self.published.lock().await.len()
    }
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for MockPublisher {
    fn name(&self) -> &str {
        "mock-publisher"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Publisher
    }

    async fn health_check(&self) -> Result<HealthStatus, MaitreError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MaitreError> {
        Ok(())
    }
}

#[async_trait]
impl ReviewPublisher for MockPublisher {
    async fn publish(&self, review_id: &str, final_text: &str) -> Result<(), MaitreError> {
        if let Some(err) = self.failures.lock().await.pop_front() {
            return Err(err);
        }
        self.published.lock().await.push(PublishedReply {
            review_id: review_id.to_string(),
            text: final_text.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_published_replies() {
        let publisher = MockPublisher::new();
        publisher.publish("r1", "final text").await.unwrap();

        let published = publisher.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].review_id, "r1");
        assert_eq!(published[0].text, "final text");
    }

    #[tokio::test]
    async fn scripted_failure_does_not_record() {
        let publisher = MockPublisher::new();
        publisher.fail_next(true).await;

        assert!(publisher.publish("r1", "text").await.is_err());
        assert_eq!(publisher.publish_count().await, 0);

        publisher.publish("r1", "text").await.unwrap();
        assert_eq!(publisher.publish_count().await, 1);
    }
}
