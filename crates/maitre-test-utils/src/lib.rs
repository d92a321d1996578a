// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Maitre integration tests.
//!
//! Provides mock adapters and harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockModel`] - Mock model provider with pre-configured completions
//! - [`MockTransport`] - Mock chat transport with outbound capture
//! - [`MockPublisher`] - Mock review publisher recording publish calls
//! - [`TestHarness`] - Fully wired workflow stack over a temp database

pub mod harness;
pub mod mock_model;
pub mod mock_publisher;
pub mod mock_transport;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_model::MockModel;
pub use mock_publisher::{MockPublisher, PublishedReply};
pub use mock_transport::{MockTransport, SentMessage};
