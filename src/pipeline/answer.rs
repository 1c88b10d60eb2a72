//! Answer generation: single-attempt orchestration producing an answer for a
//! given question and tone. No retry loop, no duplicate check, no
//! hallucination pass; errors propagate directly.

use chrono::Utc;
use tracing::{error, info};

use crate::completion::CompletionClient;
use crate::error::{CuriousMindError, Result};
use crate::prompts::{build_answer_prompt, ANSWER_SYSTEM_PROMPT};
use crate::tones;
use crate::types::{clamp_confidence, AnswerPayload, AnswerResult, ToneVariant};

/// Confidence assumed when the provider omits a score.
const DEFAULT_CONFIDENCE: u8 = 85;

pub struct AnswerPipeline {
    client: CompletionClient,
}

impl AnswerPipeline {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    /// Generate one answer under the given (or a random) tone.
    pub async fn generate_answer(
        &self,
        question: &str,
        tone: Option<ToneVariant>,
        question_id: Option<&str>,
    ) -> Result<AnswerResult> {
        let tone = tone.unwrap_or_else(tones::random_tone);
        let prompt = build_answer_prompt(question, &tone);

        let response = self
            .client
            .generate_completion(ANSWER_SYSTEM_PROMPT, &prompt)
            .await?;

        let payload: AnswerPayload = serde_json::from_str(&response).map_err(|err| {
            CuriousMindError::MalformedResponse {
                message: format!("answer payload: {}", err),
            }
        })?;

        let result = AnswerResult {
            answer: payload.answer,
            sources: payload.sources,
            confidence_score: payload
                .confidence_score
                .map(clamp_confidence)
                .unwrap_or(DEFAULT_CONFIDENCE),
            tone_applied: tone,
            generated_at: Utc::now(),
            question_id: question_id.map(|id| id.to_string()),
        };

        info!(
            question = %question,
            answer_chars = result.answer.len(),
            sources = result.sources.len(),
            confidence = result.confidence_score,
            tone = %result.tone_applied.name,
            "Answer generated"
        );

        Ok(result)
    }

    /// Generate up to `min(count, catalog size)` answers, one per tone in
    /// catalog order. Individual failures are logged and skipped; the batch
    /// itself never fails. Generations run strictly sequentially to keep
    /// ordering deterministic and avoid burst load on the provider.
    pub async fn generate_multiple_answers(
        &self,
        question: &str,
        count: usize,
    ) -> Vec<AnswerResult> {
        let catalog = tones::all_tones();
        let mut answers = Vec::new();

        for tone in catalog.iter().take(count.min(catalog.len())) {
            match self
                .generate_answer(question, Some(tone.clone()), None)
                .await
            {
                Ok(answer) => answers.push(answer),
                Err(err) => {
                    error!(
                        "Failed to generate '{}' answer for \"{}\": {}",
                        tone.name, question, err
                    );
                }
            }
        }

        answers
    }
}
