// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation gateway between the engine and the manager's chat channel.
//!
//! Outbound: [`TwilioTransport`] implements `ChatTransport` over the Twilio
//! Messages API. Inbound: [`normalize_inbound`] converts raw webhook form
//! parameters into engine events, and [`signature`] authenticates them.

pub mod inbound;
pub mod signature;
pub mod transport;

pub use inbound::normalize_inbound;
pub use transport::{MAX_CHUNK_CHARS, TwilioTransport, chunk_body};
