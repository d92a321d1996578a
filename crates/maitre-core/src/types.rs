// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Maitre workflow engine.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier assigned to a message by the chat transport provider.
///
/// Globally unique per delivered message; the workflow engine uses it to
/// deduplicate at-least-once webhook deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransportMessageId(pub String);

impl std::fmt::Display for TransportMessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies the type of adapter behind the [`crate::Adapter`] trait.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Transport,
    Model,
    Storage,
    Publisher,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Lifecycle states of a review.
///
/// Transitions are monotonic except the `Revising` -> `AwaitingApproval`
/// loop. `Published` and `Abandoned` are terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// Review received from the source platform; no accepted draft yet.
    Ingested,
    /// A draft passed validation and is persisted, not yet sent.
    Drafted,
    /// Draft sent to the manager; waiting for a reply or the deadline.
    AwaitingApproval,
    /// Manager asked for changes; a new draft is being generated.
    Revising,
    /// Manager approved the current draft; publish pending or exhausted.
    Approved,
    /// Final response dispatched to the review platform. Terminal.
    Published,
    /// Rejected by the manager or timed out. Terminal.
    Abandoned,
}

impl ReviewState {
    /// Terminal states permit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, ReviewState::Published | ReviewState::Abandoned)
    }

    /// States in which a manager reply can act on the review.
    pub fn is_actionable(self) -> bool {
        matches!(self, ReviewState::AwaitingApproval | ReviewState::Revising)
    }
}

/// A review as produced by the review-source collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    /// Stable identifier from the source platform.
    pub id: String,
    /// Star rating, 1-5.
    pub rating: u8,
    /// Customer review body.
    pub text: String,
    /// Display name of the reviewer.
    pub customer_name: String,
}

/// The persisted review entity, owned and mutated exclusively by the
/// workflow engine through the review store's versioned updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub rating: u8,
    pub body: String,
    pub customer_name: String,
    /// Occasion tag (birthday, anniversary, ...) derived from the body text.
    pub special_occasion: Option<String>,
    pub state: ReviewState,
    /// The single current candidate response. Revisions append to the
    /// revision history rather than overwrite it.
    pub current_draft: Option<String>,
    /// Most recent message sent to the manager, for reply correlation
    /// and idempotent sends.
    pub last_outbound_message_id: Option<String>,
    /// Set when a failure path exhausted its retries and the review needs
    /// manual follow-up.
    pub needs_attention: bool,
    /// RFC 3339 deadline while in `AwaitingApproval`; past it the sweep
    /// abandons the review.
    pub approval_deadline: Option<String>,
    /// Optimistic concurrency counter, bumped on every store update.
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// One entry in a review's append-only revision history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revision {
    pub review_id: String,
    /// The draft that was superseded.
    pub draft: String,
    /// The manager instruction that superseded it.
    pub instruction: String,
    pub created_at: String,
}

/// Direction of a conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// One inbound or outbound message record tied to a review. Append-only;
/// the transport message id is unique across the log and serves as the
/// deduplication gate for inbound events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub review_id: String,
    pub direction: Direction,
    pub transport_message_id: String,
    pub payload: String,
    pub created_at: String,
}

/// An inbound message normalized by the conversation gateway.
///
/// The workflow engine never inspects raw transport payloads; everything
/// it sees has this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub transport_message_id: String,
    pub sender_id: String,
    pub text: String,
    pub timestamp: String,
}
