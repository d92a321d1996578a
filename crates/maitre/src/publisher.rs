// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Production publisher.
//!
//! The review platforms this service fronts have no write API in scope, so
//! the approved reply is emitted as a structured log record an operator (or
//! a downstream shipper) posts to the platform. The exactly-once guarantee
//! is enforced upstream by the engine; this adapter only has to be
//! idempotent-friendly and loud.

use async_trait::async_trait;
use maitre_core::{Adapter, AdapterType, HealthStatus, MaitreError, ReviewPublisher};
use tracing::info;

pub struct LogPublisher;

#[async_trait]
impl Adapter for LogPublisher {
    fn name(&self) -> &str {
        "log-publisher"
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
impl ReviewPublisher for LogPublisher {
    async fn publish(&self, review_id: &str, final_text: &str) -> Result<(), MaitreError> {
        info!(
            target: "maitre::published",
            review_id,
            reply = final_text,
            "approved reply ready for the review platform"
        );
        Ok(())
    }
}
