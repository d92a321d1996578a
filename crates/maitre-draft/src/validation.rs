// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Draft acceptance checks.
//!
//! A draft is accepted only when it addresses the customer by name, stays
//! within the configured sentence bounds, and carries every mandatory
//! phrase from the directive. Phrase matching is case-insensitive; the
//! model is allowed to adjust capitalization at a sentence start.

use maitre_config::model::DraftConfig;
use maitre_core::types::Review;
use maitre_guidelines::Directive;

/// Checks a draft against the acceptance criteria.
///
/// Returns the list of failure reasons, empty when the draft is accepted.
/// The reasons are written to be fed back into a corrective prompt.
pub fn validate(
    draft: &str,
    review: &Review,
    directive: &Directive,
    config: &DraftConfig,
) -> Vec<String> {
    let mut failures = Vec::new();
    let lowered = draft.to_lowercase();

    if !lowered.contains(&review.customer_name.to_lowercase()) {
        failures.push(format!(
            "the response must address the customer by name ({})",
            review.customer_name
        ));
    }

    let sentences = sentence_count(draft);
    if sentences < config.min_sentences {
        failures.push(format!(
            "the response has {sentences} sentences but must have at least {}",
            config.min_sentences
        ));
    } else if sentences > config.max_sentences {
        failures.push(format!(
            "the response has {sentences} sentences but must have at most {}",
            config.max_sentences
        ));
    }

    for phrase in &directive.mandatory_phrases {
        if !lowered.contains(&phrase.to_lowercase()) {
            failures.push(format!(
                "the response must contain the phrase \"{phrase}\""
            ));
        }
    }

    failures
}

/// Counts sentences by terminal punctuation. Abbreviations are rare in
/// this register, so a simple split is good enough.
pub fn sentence_count(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// Returns the mandatory phrases missing from `draft`, case-insensitive.
pub fn missing_phrases(draft: &str, directive: &Directive) -> Vec<String> {
    let lowered = draft.to_lowercase();
    directive
        .mandatory_phrases
        .iter()
        .filter(|p| !lowered.contains(&p.to_lowercase()))
        .cloned()
        .collect()
}
