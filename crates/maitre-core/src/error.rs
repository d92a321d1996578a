// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Maitre review approval engine.

use thiserror::Error;

use crate::types::ReviewState;

/// The primary error type used across all Maitre adapter traits and core operations.
#[derive(Debug, Error)]
pub enum MaitreError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Draft generation failed: the model call errored or the output failed
    /// structural validation. `transient` marks failures worth retrying.
    #[error("generation failure: {message}")]
    Generation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        transient: bool,
    },

    /// Chat transport send failed. `transient` marks failures worth retrying.
    #[error("delivery failure: {message}")]
    Delivery {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        transient: bool,
    },

    /// An inbound webhook payload could not be parsed, or came from an
    /// unknown sender. Absorbed at the gateway boundary, never propagated
    /// into the workflow engine.
    #[error("malformed inbound event: {0}")]
    MalformedEvent(String),

    /// A transition was attempted against a state that no longer matches
    /// (the event lost a race or arrived after a terminal state). Benign;
    /// callers log and drop it.
    #[error("stale transition for review {review_id}: state is {state}")]
    StaleTransition {
        review_id: String,
        state: ReviewState,
    },

    /// An optimistic review update lost a race on the version field. The
    /// engine treats this as a stale transition and drops the event.
    #[error("persistence conflict for review {review_id}")]
    Conflict { review_id: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MaitreError {
    /// Returns true when the failure is transient and a bounded retry may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            MaitreError::Generation { transient, .. } => *transient,
            MaitreError::Delivery { transient, .. } => *transient,
            _ => false,
        }
    }

    /// Returns true for errors that are absorbed locally (logged, dropped)
    /// rather than surfaced to the caller.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            MaitreError::MalformedEvent(_) | MaitreError::StaleTransition { .. }
        )
    }
}
