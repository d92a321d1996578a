// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly for draft generation and revision.

use maitre_core::types::Review;
use maitre_guidelines::{Directive, OfferEffect};

const VOICE: &str = "You are the voice of a family-owned restaurant replying to a \
customer review. Write warmly and specifically; never sound like a form letter. \
Reply with the response text only, no preamble and no quotation marks.";

/// Assembles the prompt for a fresh draft.
pub fn initial(review: &Review, directive: &Directive) -> String {
    let mut prompt = String::new();
    prompt.push_str(VOICE);
    prompt.push_str("\n\n");
    push_review_context(&mut prompt, review);
    push_directive(&mut prompt, directive);
    prompt
}

/// Assembles the prompt for a revision of an existing draft.
///
/// The prior draft and the manager's instruction are both included so the
/// model rewrites rather than starting over.
pub fn revision(
    review: &Review,
    directive: &Directive,
    prior_draft: &str,
    instruction: &str,
) -> String {
    let mut prompt = String::new();
    prompt.push_str(VOICE);
    prompt.push_str("\n\n");
    push_review_context(&mut prompt, review);
    push_directive(&mut prompt, directive);
    prompt.push_str("\nAn earlier draft was written but the manager wants changes.\n");
    prompt.push_str("Earlier draft:\n");
    prompt.push_str(prior_draft);
    prompt.push_str("\n\nManager's instruction: ");
    prompt.push_str(instruction);
    prompt.push_str("\n\nRewrite the response applying the instruction while keeping every required phrase.\n");
    prompt
}

/// Appends validation failure reasons to a prompt for the corrective pass.
pub fn with_corrections(base: &str, failures: &[String]) -> String {
    let mut prompt = base.to_string();
    prompt.push_str("\nYour previous attempt was rejected for these reasons:\n");
    for reason in failures {
        prompt.push_str("- ");
        prompt.push_str(reason);
        prompt.push('\n');
    }
    prompt.push_str("Write a new response that fixes every one of them.\n");
    prompt
}

fn push_review_context(prompt: &mut String, review: &Review) {
    prompt.push_str(&format!(
        "Customer name: {}\nStar rating: {} out of 5\nReview text:\n{}\n",
        review.customer_name, review.rating, review.body
    ));
    if let Some(occasion) = &review.special_occasion {
        prompt.push_str(&format!(
            "The review mentions a special occasion: {occasion}.\n"
        ));
    }
}

fn push_directive(prompt: &mut String, directive: &Directive) {
    prompt.push_str(&format!("\nOpen the response {}.\n", directive.opening_style));
    if !directive.tone.is_empty() {
        prompt.push_str(&format!("Tone: {}.\n", directive.tone.join(", ")));
    }
    if !directive.mandatory_phrases.is_empty() {
        prompt.push_str("The response must contain each of these phrases verbatim:\n");
        for phrase in &directive.mandatory_phrases {
            prompt.push_str(&format!("- \"{phrase}\"\n"));
        }
    }
    for offer in &directive.offers {
        match &offer.effect {
            OfferEffect::DiscountCode(code) => {
                prompt.push_str(&format!(
                    "Include the discount code {code} for their next visit.\n"
                ));
            }
            OfferEffect::ComplimentaryItem(item) => {
                prompt.push_str(&format!("Offer them a {item}.\n"));
            }
        }
    }
    prompt.push_str(&format!("Close {}.\n", directive.closing));
}
