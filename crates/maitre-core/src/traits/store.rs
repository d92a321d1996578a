// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Review store trait: the single source of truth for review state.

use async_trait::async_trait;

use crate::error::MaitreError;
use crate::traits::adapter::Adapter;
use crate::types::{ConversationTurn, Review, ReviewState, Revision};

/// Persistence for reviews, revision history, and the conversation turn log.
///
/// All review mutation goes through [`update_review`], an atomic
/// compare-and-swap keyed on the version field. A lost race yields
/// [`MaitreError::Conflict`], which callers absorb as a stale transition,
/// never surfacing it to the ingestion caller.
///
/// [`update_review`]: ReviewStore::update_review
#[async_trait]
pub trait ReviewStore: Adapter {
    /// Initializes the backend (migrations, connection setup).
    async fn initialize(&self) -> Result<(), MaitreError>;

    /// Closes the backend, flushing pending writes.
    async fn close(&self) -> Result<(), MaitreError>;

    // --- Review operations ---

    /// Persists a freshly ingested review at version 0.
    async fn create_review(&self, review: &Review) -> Result<(), MaitreError>;

    async fn get_review(&self, id: &str) -> Result<Option<Review>, MaitreError>;

    /// Writes the review back conditionally on `expected_version` matching
    /// the stored row, bumping the version by one. Returns
    /// [`MaitreError::Conflict`] when the row moved underneath the caller.
    async fn update_review(
        &self,
        review: &Review,
        expected_version: i64,
    ) -> Result<(), MaitreError>;

    /// Reviews in `AwaitingApproval` whose deadline is at or before `now`.
    async fn expired_awaiting(&self, now: &str) -> Result<Vec<Review>, MaitreError>;

    /// The oldest review a manager reply can act on (awaiting approval or
    /// revising), or `None` when nothing is pending.
    async fn oldest_actionable(&self) -> Result<Option<Review>, MaitreError>;

    /// Review counts grouped by state, for progress summaries.
    async fn count_by_state(&self) -> Result<Vec<(ReviewState, i64)>, MaitreError>;

    // --- Conversation turn log ---

    /// Appends a turn to the log. Returns `false` without writing when a
    /// turn with the same transport message id already exists; this is the
    /// at-most-once gate for duplicated webhook deliveries.
    async fn record_turn(&self, turn: &ConversationTurn) -> Result<bool, MaitreError>;

    async fn turns_for_review(
        &self,
        review_id: &str,
    ) -> Result<Vec<ConversationTurn>, MaitreError>;

    // --- Revision history ---

    /// Appends a (superseded draft, manager instruction) pair.
    async fn append_revision(
        &self,
        review_id: &str,
        draft: &str,
        instruction: &str,
    ) -> Result<(), MaitreError>;

    async fn revisions_for_review(
        &self,
        review_id: &str,
    ) -> Result<Vec<Revision>, MaitreError>;
}
