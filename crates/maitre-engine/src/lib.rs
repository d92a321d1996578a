// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Review approval workflow engine.
//!
//! [`WorkflowEngine`] owns the review lifecycle; [`classify`] maps manager
//! replies to actions. Everything else (storage, transport, model,
//! publisher) comes in through the adapter traits in `maitre-core`.

pub mod classify;
pub mod engine;

pub use classify::{Action, classify};
pub use engine::{EngineSettings, WorkflowEngine};
