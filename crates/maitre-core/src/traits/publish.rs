// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publisher trait for dispatching the final approved response.

use async_trait::async_trait;

use crate::error::MaitreError;
use crate::traits::adapter::Adapter;

/// Publish collaborator: posts the approved response back to the review
/// platform. Invoked exactly once per approved review.
#[async_trait]
pub trait ReviewPublisher: Adapter {
    /// Publishes the final text for a review.
    ///
    /// Fails with [`MaitreError::Delivery`]; the engine retries with
    /// bounded backoff and on exhaustion marks the review
    /// approved-but-unpublished for manual follow-up.
    async fn publish(&self, review_id: &str, final_text: &str) -> Result<(), MaitreError>;
}
