// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Guideline resolver: maps a review's star rating and text to a structured
//! prompt [`Directive`].
//!
//! `resolve` is a pure, deterministic, total function. Every rating and any
//! text produce a directive; there is no error path. The source guidelines
//! are independent bullet rules with no stated precedence, so the
//! resolution order is made explicit here: all matching offers apply unless
//! two grant a discount code, in which case the lowest-rating-tier rule
//! wins as the most specific.

pub mod directive;

pub use directive::{Directive, Offer, OfferCondition, OfferEffect};

/// Configurable knobs for the otherwise-fixed guideline rules.
#[derive(Debug, Clone)]
pub struct GuidelineRules {
    /// Keyword list for special-occasion detection, matched
    /// case-insensitively as substrings.
    pub occasion_terms: Vec<String>,
    /// Manager contact line required in 1-star responses.
    pub manager_contact: String,
    /// The complimentary item offered for special occasions.
    pub complimentary_item: String,
}

impl Default for GuidelineRules {
    fn default() -> Self {
        Self {
            occasion_terms: vec![
                "birthday".into(),
                "anniversary".into(),
                "special event".into(),
                "celebration".into(),
            ],
            manager_contact: "+1 (555) 010-4872".into(),
            complimentary_item: "complimentary dessert on your next visit".into(),
        }
    }
}

impl GuidelineRules {
    /// Returns the first occasion term found in `text`, if any.
    ///
    /// Multiple matching terms all trigger the same single offer, so only
    /// the first match (in term-list order) is reported as the tag.
    pub fn detect_occasion(&self, text: &str) -> Option<String> {
        let lowered = text.to_lowercase();
        self.occasion_terms
            .iter()
            .find(|term| !term.is_empty() && lowered.contains(&term.to_lowercase()))
            .cloned()
    }

    /// Resolves a rating and review text into a prompt directive.
    ///
    /// Ratings outside 1-5 are clamped so the function stays total.
    pub fn resolve(&self, rating: u8, text: &str) -> Directive {
        let rating = rating.clamp(1, 5);
        let mut directive = self.rating_tier(rating);

        if let Some(term) = self.detect_occasion(text) {
            directive.offers.push(Offer {
                condition: OfferCondition::SpecialOccasion(term),
                effect: OfferEffect::ComplimentaryItem(self.complimentary_item.clone()),
            });
        }

        directive.offers = merge_offers(directive.offers);
        directive
    }

    fn rating_tier(&self, rating: u8) -> Directive {
        match rating {
            1 => Directive {
                opening_style: "open with a direct, personal apology".into(),
                tone: vec!["apologetic".into(), "sincere".into(), "urgent".into()],
                mandatory_phrases: vec![
                    "we sincerely apologize".into(),
                    format!("reach our manager directly at {}", self.manager_contact),
                ],
                offers: vec![Offer {
                    condition: OfferCondition::RatingTier(1),
                    effect: OfferEffect::DiscountCode("THANKYOU10".into()),
                }],
                closing: "commit to doing better and invite them to give us another chance"
                    .into(),
            },
            2 => Directive {
                opening_style: "open by acknowledging the disappointment".into(),
                tone: vec!["apologetic".into(), "constructive".into()],
                mandatory_phrases: vec!["we're sorry we fell short".into()],
                offers: vec![Offer {
                    condition: OfferCondition::RatingTier(2),
                    effect: OfferEffect::DiscountCode("COMEBACK15".into()),
                }],
                closing: "commit to doing better and invite them to return".into(),
            },
            3 => Directive {
                opening_style: "open by thanking them for the balanced feedback".into(),
                tone: vec!["appreciative".into(), "balanced".into()],
                mandatory_phrases: vec!["we appreciate your honest feedback".into()],
                offers: vec![],
                closing: "invite them to return and see the improvements".into(),
            },
            4 => Directive {
                opening_style: "open with warm thanks".into(),
                tone: vec!["warm".into(), "grateful".into()],
                mandatory_phrases: vec!["thank you for the kind words".into()],
                offers: vec![],
                closing: "invite them back soon".into(),
            },
            _ => Directive {
                opening_style: "open with enthusiastic gratitude".into(),
                tone: vec!["enthusiastic".into(), "grateful".into()],
                mandatory_phrases: vec![
                    "we're honored to have served you".into(),
                    "ask about our loyalty program".into(),
                ],
                offers: vec![],
                closing: "tell them we look forward to their next visit".into(),
            },
        }
    }
}

/// Applies the offer conflict policy: all offers survive unless more than
/// one grants a discount code. Conflicting discounts are resolved in favor
/// of the lowest rating tier; tier-less (occasion) discounts lose to any
/// rating-tier discount.
fn merge_offers(offers: Vec<Offer>) -> Vec<Offer> {
    let discounts: Vec<&Offer> = offers.iter().filter(|o| o.is_discount()).collect();
    if discounts.len() <= 1 {
        return offers;
    }

    let winner = discounts
        .iter()
        .min_by_key(|o| o.tier().map(|t| t as u16).unwrap_or(u16::MAX))
        .map(|o| (*o).clone());

    let mut merged: Vec<Offer> = offers.into_iter().filter(|o| !o.is_discount()).collect();
    if let Some(w) = winner {
        merged.insert(0, w);
    }
    merged
}
