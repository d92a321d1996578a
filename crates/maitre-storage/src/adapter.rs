// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ReviewStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use maitre_config::model::StorageConfig;
use maitre_core::types::{ConversationTurn, Review, ReviewState, Revision};
use maitre_core::{
    Adapter, AdapterType, HealthStatus, MaitreError, ReviewStore,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed review store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`ReviewStore::initialize`].
pub struct SqliteReviewStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteReviewStore {
    /// Create a new store with the given configuration.
    ///
    /// The database connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, MaitreError> {
        self.db.get().ok_or_else(|| MaitreError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl Adapter for SqliteReviewStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, MaitreError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MaitreError> {
        // Shutdown delegates to close if the DB was initialized.
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for SqliteReviewStore {
    async fn initialize(&self) -> Result<(), MaitreError> {
        let path = self.config.database_path.clone();
        let db = Database::open(&path).await?;
        self.db.set(db).map_err(|_| MaitreError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite review store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), MaitreError> {
        self.db()?.close().await
    }

    async fn create_review(&self, review: &Review) -> Result<(), MaitreError> {
        queries::reviews::create_review(self.db()?, review).await
    }

    async fn get_review(&self, id: &str) -> Result<Option<Review>, MaitreError> {
        queries::reviews::get_review(self.db()?, id).await
    }

    async fn update_review(
        &self,
        review: &Review,
        expected_version: i64,
    ) -> Result<(), MaitreError> {
        queries::reviews::update_review(self.db()?, review, expected_version).await
    }

    async fn expired_awaiting(&self, now: &str) -> Result<Vec<Review>, MaitreError> {
        queries::reviews::expired_awaiting(self.db()?, now).await
    }

    async fn oldest_actionable(&self) -> Result<Option<Review>, MaitreError> {
        queries::reviews::oldest_actionable(self.db()?).await
    }

    async fn count_by_state(&self) -> Result<Vec<(ReviewState, i64)>, MaitreError> {
        queries::reviews::count_by_state(self.db()?).await
    }

    async fn record_turn(&self, turn: &ConversationTurn) -> Result<bool, MaitreError> {
        queries::turns::record_turn(self.db()?, turn).await
    }

    async fn turns_for_review(
        &self,
        review_id: &str,
    ) -> Result<Vec<ConversationTurn>, MaitreError> {
        queries::turns::turns_for_review(self.db()?, review_id).await
    }

    async fn append_revision(
        &self,
        review_id: &str,
        draft: &str,
        instruction: &str,
    ) -> Result<(), MaitreError> {
        let now = chrono_now();
        queries::revisions::append_revision(self.db()?, review_id, draft, instruction, &now)
            .await
    }

    async fn revisions_for_review(
        &self,
        review_id: &str,
    ) -> Result<Vec<Revision>, MaitreError> {
        queries::revisions::revisions_for_review(self.db()?, review_id).await
    }
}

/// UTC timestamp in the millisecond RFC 3339 format used across the store.
fn chrono_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maitre_core::Direction;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    fn make_review(id: &str) -> Review {
        Review {
            id: id.to_string(),
            rating: 5,
            body: "Wonderful evening".to_string(),
            customer_name: "Alex".to_string(),
            special_occasion: None,
            state: ReviewState::Ingested,
            current_draft: None,
            last_outbound_message_id: None,
            needs_attention: false,
            approval_deadline: None,
            version: 0,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn store_implements_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SqliteReviewStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init.db");
        let store = SqliteReviewStore::new(make_config(db_path.to_str().unwrap()));

        store.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double.db");
        let store = SqliteReviewStore::new(make_config(db_path.to_str().unwrap()));

        store.initialize().await.unwrap();
        assert!(store.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_check_fails_when_not_initialized() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("noinit.db");
        let store = SqliteReviewStore::new(make_config(db_path.to_str().unwrap()));

        assert!(store.health_check().await.is_err());
    }

    #[tokio::test]
    async fn full_review_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let store = SqliteReviewStore::new(make_config(db_path.to_str().unwrap()));
        store.initialize().await.unwrap();

        let mut review = make_review("r-life");
        store.create_review(&review).await.unwrap();

        review.state = ReviewState::Drafted;
        review.current_draft = Some("Dear Alex, thank you...".to_string());
        store.update_review(&review, 0).await.unwrap();

        let turn = ConversationTurn {
            review_id: "r-life".to_string(),
            direction: Direction::Outbound,
            transport_message_id: "SM100".to_string(),
            payload: "Dear Alex, thank you...".to_string(),
            created_at: "2026-01-01T00:01:00.000Z".to_string(),
        };
        assert!(store.record_turn(&turn).await.unwrap());
        assert!(!store.record_turn(&turn).await.unwrap());

        store
            .append_revision("r-life", "Dear Alex, thank you...", "shorter please")
            .await
            .unwrap();
        let history = store.revisions_for_review("r-life").await.unwrap();
        assert_eq!(history.len(), 1);

        let stored = store.get_review("r-life").await.unwrap().unwrap();
        assert_eq!(stored.state, ReviewState::Drafted);
        assert_eq!(stored.version, 1);

        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        store.shutdown().await.unwrap();
    }
}
