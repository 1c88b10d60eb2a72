//! Question generation pipeline: input normalization, tone/archetype
//! selection, the bounded-retry generation loop, duplicate detection against
//! per-user history, and offline cache population.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::completion::CompletionClient;
use crate::config::GenerationConfig;
use crate::error::{CuriousMindError, Result};
use crate::history::{HistoryStore, UserHistory, UserStats};
use crate::image::ImageAnalyzer;
use crate::offline::{generate_offline_question, CacheStats, Connectivity, OfflineCache};
use crate::pipeline::decision::{
    decide_attempt, is_duplicate_question, AttemptDecision, LoopState, RetryReason,
};
use crate::prompts::{build_question_prompt, QUESTION_SYSTEM_PROMPT};
use crate::tones::{self, UserContext};
use crate::types::{clamp_complexity, Category, QuestionPayload, QuestionResult};
use crate::validation::{hallucination_check, validate_input_safety, validate_question_structure};

/// Declared kind of the caller's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    Text,
    Image,
    Sentence,
}

/// Orchestrates the full generation flow for one question.
pub struct QuestionPipeline {
    client: CompletionClient,
    history: Arc<dyn HistoryStore>,
    cache: Arc<OfflineCache>,
    connectivity: Arc<dyn Connectivity>,
    image: Arc<dyn ImageAnalyzer>,
    generation: GenerationConfig,
}

impl QuestionPipeline {
    pub fn new(
        client: CompletionClient,
        history: Arc<dyn HistoryStore>,
        cache: Arc<OfflineCache>,
        connectivity: Arc<dyn Connectivity>,
        image: Arc<dyn ImageAnalyzer>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            client,
            history,
            cache,
            connectivity,
            image,
            generation,
        }
    }

    /// Generate a validated question from arbitrary input.
    ///
    /// Offline, this short-circuits to the cache (or the rule-based
    /// generator) without touching the provider. Online, it runs up to
    /// `max_attempts` generation attempts, absorbing per-attempt failures,
    /// and fails only on unsafe input, image-format errors, a non-retryable
    /// provider error, or attempt exhaustion.
    pub async fn generate_question(
        &self,
        input: &str,
        tone_name: Option<&str>,
        user_id: Option<&str>,
        user_context: Option<&UserContext>,
        input_kind: InputKind,
    ) -> Result<QuestionResult> {
        if !self.connectivity.is_online() {
            info!("Device is offline, serving cached content");
            return Ok(self.generate_offline(input, tone_name).await);
        }

        let processed_input = if input_kind == InputKind::Image {
            let outcome = self.image.process_image(input).await?;
            debug!(
                method = ?outcome.method,
                confidence = outcome.confidence_score,
                "Image processed"
            );
            outcome.question_input().to_string()
        } else {
            input.to_string()
        };

        let safety = validate_input_safety(&processed_input);
        if !safety.valid {
            return Err(CuriousMindError::UnsafeInput {
                issues: safety.issues,
            });
        }

        let tone = match tone_name {
            Some(name) => tones::by_name(name),
            None => tones::random_tone(),
        };
        let archetype = tones::random_archetype();
        let history = match user_id {
            Some(id) => self.history.get(id).await,
            None => None,
        };

        let prompt = build_question_prompt(&processed_input, &archetype);
        let prompt = tones::apply_to_prompt(&prompt, &tone);
        let prompt = tones::inject_user_context(&prompt, user_context);

        let max_attempts = self.generation.max_attempts;
        let mut state = LoopState::Attempting(0);
        let mut last_failure = String::from("no attempt completed");

        while let LoopState::Attempting(attempt) = state {
            let (decision, candidate) = match self.run_attempt(&prompt, &tone, &history, user_id).await {
                Ok(outcome) => outcome,
                Err(err) if err.is_retryable() => {
                    warn!("Generation attempt {} failed: {}", attempt + 1, err);
                    last_failure = err.to_string();
                    state = state.advance(
                        &AttemptDecision::Retry(RetryReason::ProviderFailed(err.to_string())),
                        max_attempts,
                    );
                    continue;
                }
                // Non-retryable provider failures escape immediately
                Err(err) => return Err(err),
            };

            match decision {
                AttemptDecision::Accept => {
                    let result = candidate.expect("accepted attempt always carries a result");
                    self.finalize(&result, &processed_input, attempt + 1).await;
                    return Ok(result);
                }
                AttemptDecision::Retry(reason) => {
                    warn!("Generation attempt {} rejected: {}", attempt + 1, reason);
                    last_failure = reason.to_string();
                    state = state.advance(&AttemptDecision::Retry(reason), max_attempts);
                }
            }
        }

        Err(CuriousMindError::AttemptsExhausted {
            attempts: max_attempts,
            last_error: last_failure,
        })
    }

    /// One generation attempt: completion call, parse, staged checks, verdict.
    async fn run_attempt(
        &self,
        prompt: &str,
        tone: &crate::types::ToneVariant,
        history: &Option<UserHistory>,
        user_id: Option<&str>,
    ) -> Result<(AttemptDecision, Option<QuestionResult>)> {
        let response = self
            .client
            .generate_completion(QUESTION_SYSTEM_PROMPT, prompt)
            .await?;

        let cutoff = self.generation.hallucination_confidence_cutoff;

        let parsed: serde_json::Value = match serde_json::from_str(&response) {
            Ok(value) => value,
            Err(err) => {
                return Ok((
                    decide_attempt(Some(&err.to_string()), None, false, None, cutoff),
                    None,
                ))
            }
        };

        let structure = validate_question_structure(&parsed);
        if !structure.valid {
            return Ok((
                decide_attempt(None, Some(&structure), false, None, cutoff),
                None,
            ));
        }

        // Structure passed, so this deserialization cannot fail on shape
        let payload: QuestionPayload = serde_json::from_value(parsed).map_err(|err| {
            CuriousMindError::MalformedResponse {
                message: err.to_string(),
            }
        })?;

        let duplicate = match history {
            Some(history) => is_duplicate_question(
                &payload.question,
                &history.previous_questions,
                self.generation.similarity_threshold,
            ),
            None => false,
        };
        if duplicate {
            return Ok((
                decide_attempt(None, Some(&structure), true, None, cutoff),
                None,
            ));
        }

        let category = Category::parse_validated(&payload.category)
            .expect("structure validation guarantees category membership");

        if !tones::compatibility(tone, category) {
            // Advisory only; never gates the result
            warn!(
                "Tone '{}' flagged as a poor fit for category '{}'",
                tone.name, category
            );
        }

        let candidate = QuestionResult {
            question: payload.question,
            complexity_score: clamp_complexity(payload.complexity_score),
            category,
            hook_line: payload.hook_line,
            tone_applied: tone.clone(),
            generated_at: Utc::now(),
            user_id: user_id.map(|id| id.to_string()),
        };

        let check = hallucination_check(&self.client, &candidate).await;
        let decision = decide_attempt(
            None,
            Some(&structure),
            false,
            Some(&check),
            self.generation.hallucination_confidence_cutoff,
        );

        Ok((decision, Some(candidate)))
    }

    /// Record the accepted result in history and the offline cache.
    async fn finalize(&self, result: &QuestionResult, input: &str, attempts_used: u32) {
        if let Some(user_id) = &result.user_id {
            let mut history = self
                .history
                .get(user_id)
                .await
                .unwrap_or_else(|| UserHistory::new(user_id.clone()));
            history.record_question(
                &result.question,
                &result.tone_applied,
                result.category,
                self.generation.history_limit,
            );
            self.history.put(history).await;
        }

        self.cache.cache_pair(result, None).await;

        info!(
            question = %result.question,
            category = %result.category,
            complexity = result.complexity_score,
            tone = %result.tone_applied.name,
            attempts = attempts_used,
            input = %input,
            user = %result.user_id.as_deref().unwrap_or("anonymous"),
            "Question generated"
        );
    }

    /// Degraded path: a random valid cached question, else a rule-generated one.
    async fn generate_offline(&self, input: &str, tone_name: Option<&str>) -> QuestionResult {
        if let Some(cached) = self.cache.random_cached_question().await {
            return QuestionResult {
                question: cached.question,
                complexity_score: cached.complexity_score,
                category: cached.category,
                hook_line: "From your offline collection".to_string(),
                tone_applied: cached.tone_applied,
                generated_at: Utc::now(),
                user_id: None,
            };
        }

        generate_offline_question(input, tone_name)
    }

    /// Aggregate statistics for a user, if any history exists.
    pub async fn user_stats(&self, user_id: &str) -> Option<UserStats> {
        self.history.get(user_id).await.map(|h| UserStats::from(&h))
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn clear_expired_cache(&self) {
        self.cache.clear_expired().await;
    }
}
