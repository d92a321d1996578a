// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manager reply classification.
//!
//! Total over all input: anything that is not a recognized approval or
//! rejection keyword is a revision instruction. There is no "unknown"
//! outcome; a manager typo becomes a (harmless) revision request rather
//! than a dropped message.

/// The action a manager reply maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Publish the current draft.
    Approve,
    /// Discard the draft and abandon the review.
    Reject,
    /// Rewrite the draft following this instruction.
    Revise(String),
}

const AFFIRMATIVE: &[&str] = &[
    "approve",
    "approved",
    "yes",
    "y",
    "ok",
    "okay",
    "lgtm",
    "looks good",
    "looks good to me",
    "send",
    "send it",
    "ship it",
    "go ahead",
    "perfect",
    "\u{1F44D}",
];

const NEGATIVE: &[&str] = &[
    "reject",
    "rejected",
    "no",
    "n",
    "discard",
    "skip",
    "drop",
    "abandon",
    "don't send",
    "dont send",
    "do not send",
];

/// Classifies a manager reply.
///
/// Keyword matching is exact (after lowercasing and stripping trailing
/// punctuation), so "no, mention the chef instead" is a revision
/// instruction, not a rejection.
pub fn classify(text: &str) -> Action {
    let normalized = text
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .trim()
        .to_lowercase();

    if AFFIRMATIVE.contains(&normalized.as_str()) {
        Action::Approve
    } else if NEGATIVE.contains(&normalized.as_str()) {
        Action::Reject
    } else {
        Action::Revise(text.trim().to_string())
    }
}
