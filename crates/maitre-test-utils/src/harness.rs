// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete workflow stack with mock adapters
//! and a temp SQLite database, so tests can drive the full approve,
//! revise, and abandon flows without any external service.

use std::sync::Arc;
use std::time::Duration;

use maitre_config::model::{DraftConfig, StorageConfig};
use maitre_core::types::{InboundMessage, NewReview, Review};
use maitre_core::{MaitreError, ReviewStore};
use maitre_draft::DraftGenerator;
use maitre_engine::{EngineSettings, WorkflowEngine};
use maitre_guidelines::GuidelineRules;
use maitre_resilience::RetryPolicy;
use maitre_storage::SqliteReviewStore;

use crate::mock_model::MockModel;
use crate::mock_publisher::MockPublisher;
use crate::mock_transport::MockTransport;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    approval_timeout: Duration,
    draft_config: DraftConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            approval_timeout: Duration::from_secs(3600),
            draft_config: DraftConfig::default(),
        }
    }

    /// Pre-load mock model completions.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Override the approval timeout.
    pub fn with_approval_timeout(mut self, timeout: Duration) -> Self {
        self.approval_timeout = timeout;
        self
    }

    /// Override the draft sentence bounds.
    pub fn with_draft_config(mut self, config: DraftConfig) -> Self {
        self.draft_config = config;
        self
    }

    /// Build the harness, creating the temp database and all adapters.
    pub async fn build(self) -> Result<TestHarness, MaitreError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| MaitreError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let store = Arc::new(SqliteReviewStore::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        }));
        store.initialize().await?;

        let transport = Arc::new(MockTransport::new());
        let model = Arc::new(MockModel::with_responses(self.responses));
        let publisher = Arc::new(MockPublisher::new());

        let retry = RetryPolicy {
            max_attempts: 2,
            initial_backoff_ms: 1,
            backoff_factor: 1,
        };
        let drafter = DraftGenerator::new(model.clone(), self.draft_config, retry.clone());

        let engine = Arc::new(WorkflowEngine::new(
            store.clone(),
            transport.clone(),
            drafter,
            publisher.clone(),
            GuidelineRules::default(),
            retry,
            EngineSettings {
                manager_recipient: "whatsapp:+15550001111".to_string(),
                approval_timeout: self.approval_timeout,
            },
        ));

        Ok(TestHarness {
            engine,
            store,
            transport,
            model,
            publisher,
            _temp_dir: temp_dir,
        })
    }
}

/// A fully wired workflow stack over mocks and a temp database.
pub struct TestHarness {
    pub engine: Arc<WorkflowEngine>,
    pub store: Arc<SqliteReviewStore>,
    pub transport: Arc<MockTransport>,
    pub model: Arc<MockModel>,
    pub publisher: Arc<MockPublisher>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Ingest a review through the full pipeline.
    pub async fn ingest(&self, review: NewReview) -> Result<Review, MaitreError> {
        self.engine.ingest(review).await
    }

    /// Deliver a manager reply, as the webhook handler would.
    pub async fn manager_says(&self, sid: &str, text: &str) -> Result<(), MaitreError> {
        self.engine
            .handle_inbound(InboundMessage {
                transport_message_id: sid.to_string(),
                sender_id: "whatsapp:+15550001111".to_string(),
                text: text.to_string(),
                timestamp: chrono::Utc::now()
                    .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maitre_core::types::ReviewState;

    #[tokio::test]
    async fn harness_drives_a_full_approval() {
        let harness = TestHarness::builder()
            .with_mock_responses(vec![
                "Sam, thank you for the kind words about our tasting menu. \
                 We can't wait to host you again."
                    .to_string(),
            ])
            .build()
            .await
            .unwrap();

        harness
            .ingest(NewReview {
                id: "h1".to_string(),
                rating: 4,
                text: "Loved the tasting menu.".to_string(),
                customer_name: "Sam".to_string(),
            })
            .await
            .unwrap();

        harness.manager_says("SM1", "approve").await.unwrap();

        let review = harness.store.get_review("h1").await.unwrap().unwrap();
        assert_eq!(review.state, ReviewState::Published);
        assert_eq!(harness.publisher.publish_count().await, 1);
    }
}
