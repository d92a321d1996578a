// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. All functions accept `&Database` and run through
//! the single background writer thread.

pub mod revisions;
pub mod reviews;
pub mod turns;
