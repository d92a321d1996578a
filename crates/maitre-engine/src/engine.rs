// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The review approval workflow engine.
//!
//! Drives each review through the lifecycle: ingested, drafted, awaiting
//! approval, optionally revising, then published or abandoned. All state
//! lives in the review store; the engine holds only a per-review mutex map
//! so conversation events and the deadline sweep never interleave on the
//! same review.
//!
//! Duplicate webhook deliveries are absorbed by the conversation turn log:
//! the inbound turn is recorded under the review's lock before any
//! transition, and a turn that was already recorded ends processing there.
//! Combined with the store's versioned compare-and-swap this gives the
//! exactly-once publish guarantee.

use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use maitre_config::model::{EngineConfig, TwilioConfig};
use maitre_core::types::{
    ConversationTurn, Direction, InboundMessage, NewReview, Review, ReviewState,
};
use maitre_core::{ChatTransport, MaitreError, ReviewPublisher, ReviewStore};
use maitre_draft::DraftGenerator;
use maitre_guidelines::GuidelineRules;
use maitre_resilience::RetryPolicy;

use crate::classify::{Action, classify};

/// Engine-level settings distilled from the config sections.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Chat address the approval conversation happens on.
    pub manager_recipient: String,
    /// How long a review waits in AwaitingApproval before the sweep
    /// abandons it.
    pub approval_timeout: Duration,
}

impl EngineSettings {
    pub fn from_config(engine: &EngineConfig, twilio: &TwilioConfig) -> Result<Self, MaitreError> {
        let manager_recipient = twilio
            .manager_number
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                MaitreError::Config("twilio.manager_number is required".to_string())
            })?;
        Ok(Self {
            manager_recipient,
            approval_timeout: Duration::from_secs(engine.approval_timeout_secs),
        })
    }
}

/// The workflow engine. One instance per process; clone-free, shared via `Arc`.
pub struct WorkflowEngine {
    store: Arc<dyn ReviewStore>,
    transport: Arc<dyn ChatTransport>,
    drafter: DraftGenerator,
    publisher: Arc<dyn ReviewPublisher>,
    rules: GuidelineRules,
    retry: RetryPolicy,
    settings: EngineSettings,
    // Per-review critical sections. Entries are tiny and reviews are
    // finite, so entries are never reaped.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl WorkflowEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn ReviewStore>,
        transport: Arc<dyn ChatTransport>,
        drafter: DraftGenerator,
        publisher: Arc<dyn ReviewPublisher>,
        rules: GuidelineRules,
        retry: RetryPolicy,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            transport,
            drafter,
            publisher,
            rules,
            retry,
            settings,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, review_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(review_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Ingests a new review: persists it, generates a draft, and sends the
    /// draft to the manager for approval.
    ///
    /// Generation or delivery exhaustion never surfaces to the ingestion
    /// caller: the review is flagged for manual attention and returned, so
    /// the source sees the review as accepted and will not re-submit it.
    /// Only infrastructure failures (storage, internal) propagate.
    pub async fn ingest(&self, new: NewReview) -> Result<Review, MaitreError> {
        let now = now_string();
        let special_occasion = self.rules.detect_occasion(&new.text);
        let mut review = Review {
            id: new.id,
            rating: new.rating.clamp(1, 5),
            body: new.text,
            customer_name: new.customer_name,
            special_occasion,
            state: ReviewState::Ingested,
            current_draft: None,
            last_outbound_message_id: None,
            needs_attention: false,
            approval_deadline: None,
            version: 0,
            created_at: now.clone(),
            updated_at: now,
        };

        let lock = self.lock_for(&review.id);
        let _guard = lock.lock().await;

        self.store.create_review(&review).await?;
        info!(review_id = %review.id, rating = review.rating, "review ingested");

        let directive = self.rules.resolve(review.rating, &review.body);
        let draft = match self.drafter.generate(&review, &directive).await {
            Ok(draft) => draft,
            Err(e @ MaitreError::Generation { .. }) => {
                error!(review_id = %review.id, error = %e, "draft generation exhausted, flagging for attention");
                review.needs_attention = true;
                self.save(&mut review).await?;
                return Ok(review);
            }
            Err(e) => return Err(e),
        };

        review.state = ReviewState::Drafted;
        review.current_draft = Some(draft);
        self.save(&mut review).await?;
        debug!(review_id = %review.id, "draft accepted");

        match self.dispatch_for_approval(&mut review).await {
            Ok(()) => Ok(review),
            // dispatch_for_approval already flagged and saved the review.
            Err(MaitreError::Delivery { .. }) => Ok(review),
            Err(e) => Err(e),
        }
    }

    /// Handles a normalized inbound manager message.
    ///
    /// Correlates the message to the oldest actionable review, records the
    /// turn (the deduplication gate), classifies the text, and applies the
    /// transition. When the correlated review settles between the
    /// correlation read and its lock, correlation is re-run once so the
    /// reply lands on the next pending review instead of being lost.
    /// Duplicate deliveries, unroutable messages, and stale transitions all
    /// resolve to `Ok(())`; only infrastructure failures propagate.
    pub async fn handle_inbound(&self, message: InboundMessage) -> Result<(), MaitreError> {
        let mut recorded = false;

        for _ in 0..2 {
            let Some(target) = self.store.oldest_actionable().await? else {
                if !recorded {
                    // No review can act on this; log the turn unrouted for audit.
                    let turn = ConversationTurn {
                        review_id: String::new(),
                        direction: Direction::Inbound,
                        transport_message_id: message.transport_message_id.clone(),
                        payload: message.text.clone(),
                        created_at: now_string(),
                    };
                    if self.store.record_turn(&turn).await? {
                        warn!(
                            transport_message_id = %message.transport_message_id,
                            "inbound message arrived with no review awaiting action"
                        );
                    }
                } else {
                    debug!(
                        transport_message_id = %message.transport_message_id,
                        "reply's review settled and nothing else is pending, dropping"
                    );
                }
                return Ok(());
            };

            let lock = self.lock_for(&target.id);
            let _guard = lock.lock().await;

            // The dedup gate fires once per delivery; a re-correlated
            // reply keeps the turn it already logged.
            if !recorded {
                let turn = ConversationTurn {
                    review_id: target.id.clone(),
                    direction: Direction::Inbound,
                    transport_message_id: message.transport_message_id.clone(),
                    payload: message.text.clone(),
                    created_at: now_string(),
                };
                if !self.store.record_turn(&turn).await? {
                    debug!(
                        transport_message_id = %message.transport_message_id,
                        "duplicate inbound delivery ignored"
                    );
                    return Ok(());
                }
                recorded = true;
            }

            // Re-read under the lock; the correlation read raced other events.
            let Some(review) = self.store.get_review(&target.id).await? else {
                return Err(MaitreError::Internal(format!(
                    "review {} vanished between correlation and lock",
                    target.id
                )));
            };
            if !review.state.is_actionable() {
                let stale = MaitreError::StaleTransition {
                    review_id: review.id.clone(),
                    state: review.state,
                };
                debug!(error = %stale, "correlated review settled first, re-correlating");
                continue;
            }

            return match classify(&message.text) {
                Action::Approve => self.approve(review).await,
                Action::Reject => self.reject(review).await,
                Action::Revise(instruction) => self.revise(review, instruction).await,
            };
        }

        debug!(
            transport_message_id = %message.transport_message_id,
            "reply still unroutable after re-correlation, dropping"
        );
        Ok(())
    }

    /// Abandons reviews whose approval deadline has passed. Returns how
    /// many were abandoned this pass.
    pub async fn sweep_expired(&self) -> Result<usize, MaitreError> {
        let now = now_string();
        let expired = self.store.expired_awaiting(&now).await?;
        let mut abandoned = 0usize;

        for candidate in expired {
            let lock = self.lock_for(&candidate.id);
            let _guard = lock.lock().await;

            let Some(mut review) = self.store.get_review(&candidate.id).await? else {
                continue;
            };
            if review.state != ReviewState::AwaitingApproval {
                continue;
            }
            match &review.approval_deadline {
                Some(deadline) if deadline.as_str() <= now.as_str() => {}
                _ => continue,
            }

            review.state = ReviewState::Abandoned;
            review.approval_deadline = None;
            if let Err(e) = self.save(&mut review).await {
                if matches!(e, MaitreError::Conflict { .. }) {
                    continue;
                }
                return Err(e);
            }
            abandoned += 1;
            info!(review_id = %review.id, "review abandoned after approval timeout");

            self.notify(
                &review.id,
                &format!(
                    "No decision arrived in time, so the draft reply for {}'s review was set aside.",
                    review.customer_name
                ),
            )
            .await;
        }

        Ok(abandoned)
    }

    /// A short progress summary for the manager.
    pub async fn pending_summary(&self) -> Result<String, MaitreError> {
        let counts = self.store.count_by_state().await?;
        let pending: i64 = counts
            .iter()
            .filter(|(state, _)| state.is_actionable())
            .map(|(_, n)| n)
            .sum();
        Ok(match pending {
            0 => "All caught up, no reviews waiting on you.".to_string(),
            1 => "1 review is still waiting on you.".to_string(),
            n => format!("{n} reviews are still waiting on you."),
        })
    }

    async fn approve(&self, mut review: Review) -> Result<(), MaitreError> {
        let final_text = review.current_draft.clone().ok_or_else(|| {
            MaitreError::Internal(format!("review {} approved without a draft", review.id))
        })?;

        review.state = ReviewState::Approved;
        review.approval_deadline = None;
        if self.save_or_stale(&mut review).await? {
            return Ok(());
        }
        info!(review_id = %review.id, "draft approved");

        let publish_result = self
            .retry
            .run("publish", || {
                self.publisher.publish(&review.id, &final_text)
            })
            .await;

        match publish_result {
            Ok(()) => {
                review.state = ReviewState::Published;
                self.save(&mut review).await?;
                info!(review_id = %review.id, "reply published");

                let summary = self.pending_summary().await?;
                self.notify(
                    &review.id,
                    &format!(
                        "Published the reply to {}'s review. {summary}",
                        review.customer_name
                    ),
                )
                .await;
                Ok(())
            }
            Err(e) => {
                // Approved but unpublished: flag for manual follow-up. The
                // approval stands; the review is never re-sent for approval.
                error!(review_id = %review.id, error = %e, "publish failed after retries");
                review.needs_attention = true;
                self.save(&mut review).await?;
                self.notify(
                    &review.id,
                    &format!(
                        "The reply to {}'s review was approved but could not be published. \
                         It is flagged for manual follow-up.",
                        review.customer_name
                    ),
                )
                .await;
                Ok(())
            }
        }
    }

    async fn reject(&self, mut review: Review) -> Result<(), MaitreError> {
        review.state = ReviewState::Abandoned;
        review.approval_deadline = None;
        if self.save_or_stale(&mut review).await? {
            return Ok(());
        }
        info!(review_id = %review.id, "draft rejected by manager");

        let summary = self.pending_summary().await?;
        self.notify(
            &review.id,
            &format!(
                "Discarded the draft for {}'s review. {summary}",
                review.customer_name
            ),
        )
        .await;
        Ok(())
    }

    async fn revise(&self, mut review: Review, instruction: String) -> Result<(), MaitreError> {
        let prior_draft = review.current_draft.clone().ok_or_else(|| {
            MaitreError::Internal(format!("review {} revised without a draft", review.id))
        })?;

        review.state = ReviewState::Revising;
        review.approval_deadline = None;
        if self.save_or_stale(&mut review).await? {
            return Ok(());
        }

        self.store
            .append_revision(&review.id, &prior_draft, &instruction)
            .await?;
        info!(review_id = %review.id, "revision requested");

        let directive = self.rules.resolve(review.rating, &review.body);
        match self
            .drafter
            .revise(&review, &directive, &prior_draft, &instruction)
            .await
        {
            Ok(new_draft) => {
                review.current_draft = Some(new_draft);
                self.save(&mut review).await?;
                match self.dispatch_for_approval(&mut review).await {
                    // Delivery exhaustion already flagged the review.
                    Ok(()) | Err(MaitreError::Delivery { .. }) => Ok(()),
                    Err(e) => Err(e),
                }
            }
            Err(e) => {
                error!(review_id = %review.id, error = %e, "revision generation failed");
                review.needs_attention = true;
                self.save(&mut review).await?;
                self.notify(
                    &review.id,
                    &format!(
                        "Couldn't rewrite the reply for {}'s review. \
                         It is flagged for manual follow-up.",
                        review.customer_name
                    ),
                )
                .await;
                Ok(())
            }
        }
    }

    /// Sends the current draft to the manager and moves the review into
    /// AwaitingApproval with a fresh deadline. On delivery failure after
    /// retries the review keeps its draft and is flagged as stalled.
    async fn dispatch_for_approval(&self, review: &mut Review) -> Result<(), MaitreError> {
        let draft = review.current_draft.clone().ok_or_else(|| {
            MaitreError::Internal(format!("review {} dispatched without a draft", review.id))
        })?;
        let message = approval_request(review, &draft);

        let sent = self
            .retry
            .run("draft delivery", || {
                self.transport.send(&self.settings.manager_recipient, &message)
            })
            .await;

        match sent {
            Ok(message_id) => {
                let turn = ConversationTurn {
                    review_id: review.id.clone(),
                    direction: Direction::Outbound,
                    transport_message_id: message_id.0.clone(),
                    payload: message,
                    created_at: now_string(),
                };
                self.store.record_turn(&turn).await?;

                review.last_outbound_message_id = Some(message_id.0);
                review.state = ReviewState::AwaitingApproval;
                review.approval_deadline = Some(deadline_from_now(self.settings.approval_timeout));
                review.needs_attention = false;
                self.save(review).await?;
                debug!(review_id = %review.id, "draft sent for approval");
                Ok(())
            }
            Err(e) => {
                error!(review_id = %review.id, error = %e, "draft delivery failed after retries");
                review.needs_attention = true;
                self.save(review).await?;
                Err(e)
            }
        }
    }

    /// Best-effort manager notification; failures are logged, never fatal.
    /// Delivered notifications are recorded in the review's turn log like
    /// any other outbound message.
    async fn notify(&self, review_id: &str, text: &str) {
        match self
            .transport
            .send(&self.settings.manager_recipient, text)
            .await
        {
            Ok(message_id) => {
                let turn = ConversationTurn {
                    review_id: review_id.to_string(),
                    direction: Direction::Outbound,
                    transport_message_id: message_id.0,
                    payload: text.to_string(),
                    created_at: now_string(),
                };
                if let Err(e) = self.store.record_turn(&turn).await {
                    warn!(review_id, error = %e, "failed to log notification turn");
                }
            }
            Err(e) => warn!(review_id, error = %e, "manager notification failed"),
        }
    }

    /// Writes the review back through the CAS update and keeps the
    /// in-memory version in step with the stored row.
    async fn save(&self, review: &mut Review) -> Result<(), MaitreError> {
        review.updated_at = now_string();
        self.store.update_review(review, review.version).await?;
        review.version += 1;
        Ok(())
    }

    /// Like [`save`], but treats a lost CAS race as a stale transition:
    /// logs and reports `true` so the caller drops the event.
    ///
    /// [`save`]: WorkflowEngine::save
    async fn save_or_stale(&self, review: &mut Review) -> Result<bool, MaitreError> {
        match self.save(review).await {
            Ok(()) => Ok(false),
            Err(MaitreError::Conflict { review_id }) => {
                let stale = MaitreError::StaleTransition {
                    review_id,
                    state: review.state,
                };
                debug!(error = %stale, "transition lost a race, dropping event");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }
}

fn approval_request(review: &Review, draft: &str) -> String {
    let stars = "\u{2B50}".repeat(review.rating as usize);
    format!(
        "New {stars} review from {}:\n\n\"{}\"\n\nDraft reply:\n{draft}\n\n\
         Reply \"approve\" to publish, \"reject\" to discard, or describe the changes you want.",
        review.customer_name, review.body
    )
}

fn now_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn deadline_from_now(timeout: Duration) -> String {
    (Utc::now() + chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::hours(24)))
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maitre_config::model::{DraftConfig, StorageConfig};
    use maitre_storage::SqliteReviewStore;
    use maitre_test_utils::{MockModel, MockPublisher, MockTransport};

    struct Fixture {
        engine: Arc<WorkflowEngine>,
        store: Arc<SqliteReviewStore>,
        transport: Arc<MockTransport>,
        model: Arc<MockModel>,
        publisher: Arc<MockPublisher>,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("engine.db");
        let store = Arc::new(SqliteReviewStore::new(StorageConfig {
            database_path: db_path.to_str().unwrap().to_string(),
            wal_mode: true,
        }));
        store.initialize().await.unwrap();

        let transport = Arc::new(MockTransport::new());
        let model = Arc::new(MockModel::new());
        let publisher = Arc::new(MockPublisher::new());

        let retry = RetryPolicy {
            max_attempts: 2,
            initial_backoff_ms: 1,
            backoff_factor: 1,
        };
        let drafter = DraftGenerator::new(model.clone(), DraftConfig::default(), retry.clone());

        let engine = Arc::new(WorkflowEngine::new(
            store.clone(),
            transport.clone(),
            drafter,
            publisher.clone(),
            GuidelineRules::default(),
            retry,
            EngineSettings {
                manager_recipient: "whatsapp:+15550001111".to_string(),
                approval_timeout: Duration::from_secs(3600),
            },
        ));

        Fixture {
            engine,
            store,
            transport,
            model,
            publisher,
            _dir: dir,
        }
    }

    fn good_draft() -> String {
        "Maya, thank you for the kind words about the pasta. \
         Our kitchen will be thrilled to hear it. We hope to welcome you back soon."
            .to_string()
    }

    fn new_review(id: &str) -> NewReview {
        NewReview {
            id: id.to_string(),
            rating: 4,
            text: "Great pasta and friendly staff.".to_string(),
            customer_name: "Maya".to_string(),
        }
    }

    fn inbound(sid: &str, text: &str) -> InboundMessage {
        InboundMessage {
            transport_message_id: sid.to_string(),
            sender_id: "whatsapp:+15550001111".to_string(),
            text: text.to_string(),
            timestamp: now_string(),
        }
    }

    async fn ingest_standard(fx: &Fixture, id: &str) {
        fx.model.add_response(good_draft()).await;
        fx.engine.ingest(new_review(id)).await.unwrap();
    }

    #[tokio::test]
    async fn ingest_sends_draft_and_awaits_approval() {
        let fx = fixture().await;
        ingest_standard(&fx, "r1").await;

        let review = fx.store.get_review("r1").await.unwrap().unwrap();
        assert_eq!(review.state, ReviewState::AwaitingApproval);
        assert!(review.approval_deadline.is_some());
        assert!(review.last_outbound_message_id.is_some());
        assert!(review.current_draft.as_deref().unwrap().contains("Maya"));

        let sent = fx.transport.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("Draft reply:"));
        assert!(sent[0].text.contains("Great pasta"));

        let turns = fx.store.turns_for_review("r1").await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].direction, Direction::Outbound);
    }

    #[tokio::test]
    async fn approve_publishes_and_confirms() {
        let fx = fixture().await;
        ingest_standard(&fx, "r1").await;

        fx.engine.handle_inbound(inbound("SM1", "approve")).await.unwrap();

        let review = fx.store.get_review("r1").await.unwrap().unwrap();
        assert_eq!(review.state, ReviewState::Published);

        let published = fx.publisher.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].review_id, "r1");
        assert!(published[0].text.contains("thank you for the kind words"));

        let last = fx.transport.last_text().await.unwrap();
        assert!(last.contains("Published the reply"));
        assert!(last.contains("All caught up"));

        // Turn log: outbound draft, inbound approval, outbound confirmation.
        let turns = fx.store.turns_for_review("r1").await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[2].direction, Direction::Outbound);
        assert!(turns[2].payload.contains("Published the reply"));
    }

    #[tokio::test]
    async fn duplicate_approval_delivery_publishes_once() {
        let fx = fixture().await;
        ingest_standard(&fx, "r1").await;

        fx.engine.handle_inbound(inbound("SM1", "approve")).await.unwrap();
        fx.engine.handle_inbound(inbound("SM1", "approve")).await.unwrap();

        assert_eq!(fx.publisher.publish_count().await, 1);
        let review = fx.store.get_review("r1").await.unwrap().unwrap();
        assert_eq!(review.state, ReviewState::Published);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_approvals_publish_once() {
        let fx = fixture().await;
        ingest_standard(&fx, "r1").await;

        let a = {
            let engine = fx.engine.clone();
            tokio::spawn(async move { engine.handle_inbound(inbound("SM1", "approve")).await })
        };
        let b = {
            let engine = fx.engine.clone();
            tokio::spawn(async move { engine.handle_inbound(inbound("SM1", "approve")).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(fx.publisher.publish_count().await, 1);
    }

    // Two distinct approvals racing over two pending reviews: whichever
    // loses the first review's lock must re-correlate and settle the
    // second instead of dropping its reply.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_approvals_settle_both_pending_reviews() {
        let fx = fixture().await;
        ingest_standard(&fx, "r1").await;
        ingest_standard(&fx, "r2").await;

        let a = {
            let engine = fx.engine.clone();
            tokio::spawn(async move { engine.handle_inbound(inbound("SM1", "approve")).await })
        };
        let b = {
            let engine = fx.engine.clone();
            tokio::spawn(async move { engine.handle_inbound(inbound("SM2", "approve")).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(fx.publisher.publish_count().await, 2);
        for id in ["r1", "r2"] {
            let review = fx.store.get_review(id).await.unwrap().unwrap();
            assert_eq!(review.state, ReviewState::Published, "{id}");
        }
    }

    #[tokio::test]
    async fn revision_loop_resends_and_then_publishes() {
        let fx = fixture().await;
        ingest_standard(&fx, "r1").await;

        fx.model
            .add_response(
                "Maya, thank you for the kind words about the pasta. \
                 The patio is lovely this time of year and we saved you a table. \
                 We hope to welcome you back soon."
                    .to_string(),
            )
            .await;
        fx.engine
            .handle_inbound(inbound("SM2", "mention the patio"))
            .await
            .unwrap();

        let review = fx.store.get_review("r1").await.unwrap().unwrap();
        assert_eq!(review.state, ReviewState::AwaitingApproval);
        assert!(review.current_draft.as_deref().unwrap().contains("patio"));

        let revisions = fx.store.revisions_for_review("r1").await.unwrap();
        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].instruction, "mention the patio");
        assert!(revisions[0].draft.contains("thrilled"));

        // Two approval requests went out, one per draft.
        let requests: Vec<_> = fx
            .transport
            .sent_messages()
            .await
            .into_iter()
            .filter(|m| m.text.contains("Draft reply:"))
            .collect();
        assert_eq!(requests.len(), 2);

        fx.engine.handle_inbound(inbound("SM3", "approve")).await.unwrap();
        let published = fx.publisher.published().await;
        assert_eq!(published.len(), 1);
        assert!(published[0].text.contains("patio"));
    }

    #[tokio::test]
    async fn reject_abandons_without_publishing() {
        let fx = fixture().await;
        ingest_standard(&fx, "r1").await;

        fx.engine.handle_inbound(inbound("SM1", "reject")).await.unwrap();

        let review = fx.store.get_review("r1").await.unwrap().unwrap();
        assert_eq!(review.state, ReviewState::Abandoned);
        assert_eq!(fx.publisher.publish_count().await, 0);
        assert!(
            fx.transport
                .last_text()
                .await
                .unwrap()
                .contains("Discarded the draft")
        );
    }

    #[tokio::test]
    async fn reply_with_nothing_actionable_is_logged_and_dropped() {
        let fx = fixture().await;

        fx.engine.handle_inbound(inbound("SM9", "approve")).await.unwrap();

        assert_eq!(fx.publisher.publish_count().await, 0);
        // The turn is still recorded for audit, unrouted.
        let turns = fx.store.turns_for_review("").await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].transport_message_id, "SM9");
    }

    #[tokio::test]
    async fn publish_failure_keeps_approval_and_flags_attention() {
        let fx = fixture().await;
        ingest_standard(&fx, "r1").await;

        fx.publisher.fail_next(false).await;
        fx.engine.handle_inbound(inbound("SM1", "approve")).await.unwrap();

        let review = fx.store.get_review("r1").await.unwrap().unwrap();
        assert_eq!(review.state, ReviewState::Approved);
        assert!(review.needs_attention);
        assert_eq!(fx.publisher.publish_count().await, 0);
        assert!(
            fx.transport
                .last_text()
                .await
                .unwrap()
                .contains("manual follow-up")
        );

        // A later approve must not re-trigger the publish path.
        fx.engine.handle_inbound(inbound("SM2", "approve")).await.unwrap();
        assert_eq!(fx.publisher.publish_count().await, 0);
        let review = fx.store.get_review("r1").await.unwrap().unwrap();
        assert_eq!(review.state, ReviewState::Approved);
    }

    #[tokio::test]
    async fn sweep_abandons_expired_reviews_and_ignores_late_replies() {
        let fx = fixture().await;
        ingest_standard(&fx, "r1").await;

        // Backdate the deadline.
        let mut review = fx.store.get_review("r1").await.unwrap().unwrap();
        let version = review.version;
        review.approval_deadline = Some("2020-01-01T00:00:00.000Z".to_string());
        fx.store.update_review(&review, version).await.unwrap();

        let abandoned = fx.engine.sweep_expired().await.unwrap();
        assert_eq!(abandoned, 1);

        let review = fx.store.get_review("r1").await.unwrap().unwrap();
        assert_eq!(review.state, ReviewState::Abandoned);
        assert!(
            fx.transport
                .last_text()
                .await
                .unwrap()
                .contains("set aside")
        );

        // The abandonment notice is logged as an outbound turn.
        let turns = fx.store.turns_for_review("r1").await.unwrap();
        let last = turns.last().unwrap();
        assert_eq!(last.direction, Direction::Outbound);
        assert!(last.payload.contains("set aside"));

        // The manager's late reply has nothing to act on.
        fx.engine.handle_inbound(inbound("SM5", "approve")).await.unwrap();
        assert_eq!(fx.publisher.publish_count().await, 0);
        let review = fx.store.get_review("r1").await.unwrap().unwrap();
        assert_eq!(review.state, ReviewState::Abandoned);
    }

    #[tokio::test]
    async fn sweep_leaves_unexpired_reviews_alone() {
        let fx = fixture().await;
        ingest_standard(&fx, "r1").await;

        assert_eq!(fx.engine.sweep_expired().await.unwrap(), 0);
        let review = fx.store.get_review("r1").await.unwrap().unwrap();
        assert_eq!(review.state, ReviewState::AwaitingApproval);
    }

    #[tokio::test]
    async fn delivery_failure_on_ingest_flags_attention_without_erroring() {
        let fx = fixture().await;
        fx.model.add_response(good_draft()).await;
        fx.transport.fail_next(false).await;

        // The caller sees the review as accepted; the failure shows up as
        // the attention flag, not an error.
        let returned = fx.engine.ingest(new_review("r1")).await.unwrap();
        assert_eq!(returned.state, ReviewState::Drafted);
        assert!(returned.needs_attention);

        let review = fx.store.get_review("r1").await.unwrap().unwrap();
        assert_eq!(review.state, ReviewState::Drafted);
        assert!(review.needs_attention);
        assert!(review.current_draft.is_some());
    }

    #[tokio::test]
    async fn generation_failure_on_ingest_flags_attention_without_erroring() {
        let fx = fixture().await;
        fx.model.fail_next(false).await;

        let returned = fx.engine.ingest(new_review("r1")).await.unwrap();
        assert_eq!(returned.state, ReviewState::Ingested);
        assert!(returned.needs_attention);

        let review = fx.store.get_review("r1").await.unwrap().unwrap();
        assert_eq!(review.state, ReviewState::Ingested);
        assert!(review.needs_attention);
        assert!(review.current_draft.is_none());
    }

    #[tokio::test]
    async fn stalled_review_is_excluded_from_correlation() {
        let fx = fixture().await;
        fx.model.fail_next(false).await;
        fx.engine.ingest(new_review("r1")).await.unwrap();
        ingest_standard(&fx, "r2").await;

        // r1 is older but flagged; the reply must land on r2.
        fx.engine.handle_inbound(inbound("SM1", "approve")).await.unwrap();

        let published = fx.publisher.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].review_id, "r2");
    }

    #[tokio::test]
    async fn replies_route_to_the_oldest_actionable_review() {
        let fx = fixture().await;
        ingest_standard(&fx, "r1").await;
        ingest_standard(&fx, "r2").await;

        fx.engine.handle_inbound(inbound("SM1", "approve")).await.unwrap();
        assert_eq!(fx.publisher.published().await[0].review_id, "r1");

        fx.engine.handle_inbound(inbound("SM2", "approve")).await.unwrap();
        let published = fx.publisher.published().await;
        assert_eq!(published.len(), 2);
        assert_eq!(published[1].review_id, "r2");
    }

    #[tokio::test]
    async fn pending_summary_counts_actionable_reviews() {
        let fx = fixture().await;
        assert!(
            fx.engine
                .pending_summary()
                .await
                .unwrap()
                .contains("All caught up")
        );

        ingest_standard(&fx, "r1").await;
        assert!(fx.engine.pending_summary().await.unwrap().contains('1'));

        ingest_standard(&fx, "r2").await;
        assert!(fx.engine.pending_summary().await.unwrap().contains('2'));
    }
}
