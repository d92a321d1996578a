// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Draft generation for review responses.
//!
//! [`DraftGenerator`] turns a review plus its guideline directive into a
//! response draft by prompting a model provider. Model output is checked
//! against the acceptance criteria in [`validation`]; a rejected draft gets
//! exactly one corrective pass with the failure reasons fed back into the
//! prompt. Two rejections in a row surface as a permanent generation error
//! so the review can be flagged for attention instead of looping.

pub mod prompt;
pub mod validation;

use std::sync::Arc;

use maitre_config::model::DraftConfig;
use maitre_core::types::Review;
use maitre_core::{MaitreError, ModelProvider};
use maitre_guidelines::Directive;
use maitre_resilience::RetryPolicy;
use tracing::{debug, warn};

/// Generates and revises response drafts through a model provider.
pub struct DraftGenerator {
    model: Arc<dyn ModelProvider>,
    config: DraftConfig,
    retry: RetryPolicy,
}

impl DraftGenerator {
    pub fn new(model: Arc<dyn ModelProvider>, config: DraftConfig, retry: RetryPolicy) -> Self {
        Self {
            model,
            config,
            retry,
        }
    }

    /// Generates a fresh draft for a review.
    ///
    /// Transient model failures are retried per the policy. A draft that
    /// fails validation gets one corrective attempt; if that also fails,
    /// the error carries the remaining failure reasons.
    pub async fn generate(
        &self,
        review: &Review,
        directive: &Directive,
    ) -> Result<String, MaitreError> {
        let base = prompt::initial(review, directive);
        let draft = self.complete(&base).await?;

        let failures = validation::validate(&draft, review, directive, &self.config);
        if failures.is_empty() {
            return Ok(draft);
        }

        warn!(
            review_id = %review.id,
            failures = failures.len(),
            "draft rejected, attempting corrective pass"
        );
        let corrected = self
            .complete(&prompt::with_corrections(&base, &failures))
            .await?;

        let failures = validation::validate(&corrected, review, directive, &self.config);
        if failures.is_empty() {
            Ok(corrected)
        } else {
            Err(MaitreError::Generation {
                message: format!(
                    "draft for review {} rejected twice: {}",
                    review.id,
                    failures.join("; ")
                ),
                source: None,
                transient: false,
            })
        }
    }

    /// Rewrites an existing draft per the manager's instruction.
    ///
    /// The instruction wins over style, but mandatory phrases are not
    /// negotiable: any phrase the rewrite dropped is re-inserted before the
    /// draft goes back out for approval.
    pub async fn revise(
        &self,
        review: &Review,
        directive: &Directive,
        prior_draft: &str,
        instruction: &str,
    ) -> Result<String, MaitreError> {
        let text = prompt::revision(review, directive, prior_draft, instruction);
        let mut draft = self.complete(&text).await?;

        let missing = validation::missing_phrases(&draft, directive);
        if !missing.is_empty() {
            debug!(
                review_id = %review.id,
                dropped = missing.len(),
                "revision dropped mandatory phrases, re-inserting"
            );
            for phrase in missing {
                if !draft.ends_with(['.', '!', '?']) {
                    draft.push('.');
                }
                draft.push(' ');
                draft.push_str(&capitalize(&phrase));
                draft.push('.');
            }
        }
        Ok(draft)
    }

    async fn complete(&self, prompt_text: &str) -> Result<String, MaitreError> {
        // Empty completions count as transient so the retry policy covers them.
        self.retry
            .run("draft generation", || async {
                let draft = self.model.complete(prompt_text).await?;
                let draft = draft.trim().to_string();
                if draft.is_empty() {
                    return Err(MaitreError::Generation {
                        message: "model returned an empty completion".to_string(),
                        source: None,
                        transient: true,
                    });
                }
                Ok(draft)
            })
            .await
    }
}

fn capitalize(phrase: &str) -> String {
    let mut chars = phrase.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use maitre_core::types::ReviewState;
    use maitre_core::{Adapter, AdapterType, HealthStatus};
    use maitre_guidelines::GuidelineRules;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Model that replays a scripted sequence of completions and records
    /// every prompt it was given.
    struct ScriptedModel {
        responses: Mutex<VecDeque<Result<String, MaitreError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Result<String, MaitreError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Adapter for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Model
        }
        async fn health_check(&self) -> Result<HealthStatus, MaitreError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), MaitreError> {
            Ok(())
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedModel {
        async fn complete(&self, prompt: &str) -> Result<String, MaitreError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(MaitreError::Internal("script exhausted".into())))
        }
    }

    fn transient_failure() -> MaitreError {
        MaitreError::Generation {
            message: "503 from upstream".to_string(),
            source: None,
            transient: true,
        }
    }

    fn review(rating: u8) -> Review {
        Review {
            id: "r1".to_string(),
            rating,
            body: "Lovely dinner, slightly slow service.".to_string(),
            customer_name: "Maya".to_string(),
            special_occasion: None,
            state: ReviewState::Ingested,
            current_draft: None,
            last_outbound_message_id: None,
            needs_attention: false,
            approval_deadline: None,
            version: 0,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    fn good_draft_for_4_star() -> String {
        "Maya, thank you for the kind words about your dinner. \
         We're glad the food delivered even when the pace didn't. \
         We'd love to welcome you back soon."
            .to_string()
    }

    fn generator(model: Arc<ScriptedModel>) -> DraftGenerator {
        DraftGenerator::new(model, DraftConfig::default(), RetryPolicy::with_attempts(3))
    }

    #[tokio::test]
    async fn accepts_first_valid_draft() {
        let model = ScriptedModel::new(vec![Ok(good_draft_for_4_star())]);
        let review = review(4);
        let directive = GuidelineRules::default().resolve(4, &review.body);

        let draft = generator(model.clone())
            .generate(&review, &directive)
            .await
            .unwrap();

        assert!(draft.contains("Maya"));
        assert_eq!(model.prompts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_model_failures() {
        let model = ScriptedModel::new(vec![
            Err(transient_failure()),
            Err(transient_failure()),
            Ok(good_draft_for_4_star()),
        ]);
        let review = review(4);
        let directive = GuidelineRules::default().resolve(4, &review.body);

        let draft = generator(model.clone())
            .generate(&review, &directive)
            .await
            .unwrap();

        assert!(draft.contains("thank you for the kind words"));
        assert_eq!(model.prompts().len(), 3);
    }

    #[tokio::test]
    async fn rejected_draft_gets_one_corrective_pass() {
        let model = ScriptedModel::new(vec![
            Ok("Thanks for coming. Hope to see you again.".to_string()),
            Ok(good_draft_for_4_star()),
        ]);
        let review = review(4);
        let directive = GuidelineRules::default().resolve(4, &review.body);

        let draft = generator(model.clone())
            .generate(&review, &directive)
            .await
            .unwrap();
        assert!(draft.contains("Maya"));

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("rejected for these reasons"));
        assert!(prompts[1].contains("Maya"));
    }

    #[tokio::test]
    async fn two_rejections_surface_a_permanent_error() {
        let bad = "Thanks. Bye.".to_string();
        let model = ScriptedModel::new(vec![Ok(bad.clone()), Ok(bad)]);
        let review = review(4);
        let directive = GuidelineRules::default().resolve(4, &review.body);

        let err = generator(model)
            .generate(&review, &directive)
            .await
            .unwrap_err();

        assert!(!err.is_transient());
        assert!(matches!(err, MaitreError::Generation { .. }));
    }

    #[tokio::test]
    async fn revision_reinserts_dropped_mandatory_phrases() {
        let model = ScriptedModel::new(vec![Ok(
            "Maya, shorter and punchier as requested. See you soon.".to_string(),
        )]);
        let review = review(4);
        let directive = GuidelineRules::default().resolve(4, &review.body);

        let draft = generator(model)
            .revise(&review, &directive, "old draft", "make it shorter")
            .await
            .unwrap();

        assert!(draft.to_lowercase().contains("thank you for the kind words"));
        assert!(draft.starts_with("Maya, shorter"));
    }

    #[tokio::test]
    async fn revision_prompt_contains_prior_draft() {
        let model = ScriptedModel::new(vec![Ok(good_draft_for_4_star())]);
        let review = review(4);
        let directive = GuidelineRules::default().resolve(4, &review.body);

        generator(model.clone())
            .revise(&review, &directive, "the prior draft body", "warmer tone")
            .await
            .unwrap();

        let prompts = model.prompts();
        assert!(prompts[0].contains("the prior draft body"));
        assert!(prompts[0].contains("warmer tone"));
    }

    #[tokio::test]
    async fn empty_completion_is_a_transient_failure() {
        let model = ScriptedModel::new(vec![
            Ok("   ".to_string()),
            Ok("".to_string()),
            Ok("".to_string()),
        ]);
        let review = review(4);
        let directive = GuidelineRules::default().resolve(4, &review.body);

        let generator = DraftGenerator::new(model, DraftConfig::default(), RetryPolicy::no_retry());
        let err = generator.generate(&review, &directive).await.unwrap_err();
        assert!(err.is_transient());
    }
}
