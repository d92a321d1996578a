// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Maitre collaborator boundaries.
//!
//! All adapters extend the [`Adapter`] base trait and use `#[async_trait]`
//! for dynamic dispatch compatibility.

pub mod adapter;
pub mod model;
pub mod publish;
pub mod store;
pub mod transport;

pub use adapter::Adapter;
pub use model::ModelProvider;
pub use publish::ReviewPublisher;
pub use store::ReviewStore;
pub use transport::ChatTransport;
