// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport trait for sending messages to the manager's chat channel.

use async_trait::async_trait;

use crate::error::MaitreError;
use crate::traits::adapter::Adapter;
use crate::types::TransportMessageId;

/// Outbound side of the chat transport (Twilio WhatsApp in production).
///
/// Stateless with respect to review data; safe to call in parallel across
/// reviews. Inbound webhook payloads are normalized separately by the
/// gateway before they reach the engine.
#[async_trait]
pub trait ChatTransport: Adapter {
    /// Sends a message and returns the provider-assigned message id.
    ///
    /// Fails with [`MaitreError::Delivery`]; callers retry transient
    /// failures under a bounded policy, then flag the review as stalled.
    async fn send(&self, recipient: &str, text: &str)
    -> Result<TransportMessageId, MaitreError>;
}
