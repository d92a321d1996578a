// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The structured prompt directive produced by the guideline resolver.

use serde::{Deserialize, Serialize};

/// Structured output of the guideline resolver dictating tone, required
/// phrases, and offers for a draft. Consumed by the draft generator as
/// prompt directives and by the validator as acceptance criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    /// How the response must open (e.g., apology-first for low ratings).
    pub opening_style: String,
    /// Tone descriptors fed into the prompt.
    pub tone: Vec<String>,
    /// Phrases the final draft must contain, rating-dependent.
    pub mandatory_phrases: Vec<String>,
    /// Offers to extend to the customer.
    pub offers: Vec<Offer>,
    /// How the response must close.
    pub closing: String,
}

/// A single offer rule: the condition that triggered it and its effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub condition: OfferCondition,
    pub effect: OfferEffect,
}

/// What triggered an offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferCondition {
    /// Triggered by the review's star rating tier.
    RatingTier(u8),
    /// Triggered by an occasion keyword found in the review text.
    SpecialOccasion(String),
}

/// What an offer grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferEffect {
    /// A discount code for the next visit. At most one survives conflict
    /// resolution.
    DiscountCode(String),
    /// A complimentary item (dessert, drink, ...). Stacks with discounts.
    ComplimentaryItem(String),
}

impl Offer {
    /// The rating tier this offer came from, if any. Occasion offers have
    /// no tier and lose discount conflicts to any rating-tier offer.
    pub fn tier(&self) -> Option<u8> {
        match self.condition {
            OfferCondition::RatingTier(t) => Some(t),
            OfferCondition::SpecialOccasion(_) => None,
        }
    }

    pub fn is_discount(&self) -> bool {
        matches!(self.effect, OfferEffect::DiscountCode(_))
    }
}
