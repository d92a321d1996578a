// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the review approval engine.
//!
//! A single [`Database`] handle owns the connection to a WAL-mode SQLite
//! file; all access funnels through its background writer thread via
//! `tokio-rusqlite`. Schema migrations are embedded and applied on open.
//!
//! [`SqliteReviewStore`] is the adapter the engine talks to. It implements
//! the `ReviewStore` trait and delegates to the typed query modules under
//! [`queries`].

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteReviewStore;
pub use database::Database;
