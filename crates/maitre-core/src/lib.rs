// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Maitre review approval engine.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Maitre workspace. The external
//! collaborators (chat transport, model provider, review store, publisher)
//! all implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MaitreError;
pub use types::{
    AdapterType, ConversationTurn, Direction, HealthStatus, InboundMessage, NewReview,
    Review, ReviewState, Revision, TransportMessageId,
};

// Re-export all adapter traits at crate root.
pub use traits::{Adapter, ChatTransport, ModelProvider, ReviewPublisher, ReviewStore};
