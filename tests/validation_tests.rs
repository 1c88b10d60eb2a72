use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use curious_mind::completion::{CompletionClient, CompletionProvider, ProviderError, RetryPolicy};
use curious_mind::tones;
use curious_mind::types::{Category, QuestionResult, ValidationOutcome};
use curious_mind::validation;

struct FixedProvider(Result<String, u16>);

#[async_trait]
impl CompletionProvider for FixedProvider {
    async fn complete(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
    ) -> Result<String, ProviderError> {
        match &self.0 {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(ProviderError {
                status: Some(*status),
                code: None,
                message: "forced failure".to_string(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

fn client_returning(result: Result<String, u16>) -> CompletionClient {
    CompletionClient::with_policy(
        Arc::new(FixedProvider(result)),
        RetryPolicy {
            attempts: 1,
            base_delay: Duration::from_millis(1),
            max_jitter_ms: 0,
        },
    )
}

fn sample_question() -> QuestionResult {
    QuestionResult {
        question: "Why do cats purr when they're content?".to_string(),
        complexity_score: 6,
        category: Category::Biological,
        hook_line: "hook".to_string(),
        tone_applied: tones::by_name("funny"),
        generated_at: Utc::now(),
        user_id: None,
    }
}

#[tokio::test]
async fn hallucination_check_parses_verdict() {
    let client = client_returning(Ok(
        r#"{"is_valid":true,"confidence_score":88,"issues":[]}"#.to_string()
    ));
    let outcome = validation::hallucination_check(&client, &sample_question()).await;
    assert!(outcome.valid);
    assert_eq!(outcome.confidence_score, 88);
}

#[tokio::test]
async fn hallucination_check_clamps_out_of_range_confidence() {
    let client = client_returning(Ok(
        r#"{"is_valid":false,"confidence_score":250,"issues":["overconfident"]}"#.to_string(),
    ));
    let outcome = validation::hallucination_check(&client, &sample_question()).await;
    assert!(!outcome.valid);
    assert_eq!(outcome.confidence_score, 100);
}

#[tokio::test]
async fn hallucination_check_fails_closed_on_provider_error() {
    let client = client_returning(Err(500));
    let outcome = validation::hallucination_check(&client, &sample_question()).await;
    assert!(!outcome.valid);
    assert_eq!(outcome.confidence_score, 0);
    assert_eq!(outcome.issues, vec!["Validation service unavailable"]);
}

#[tokio::test]
async fn hallucination_check_fails_closed_on_unparseable_output() {
    let client = client_returning(Ok("I think it looks fine".to_string()));
    let outcome = validation::hallucination_check(&client, &sample_question()).await;
    assert!(!outcome.valid);
    assert_eq!(outcome.confidence_score, 0);
}

#[test]
fn input_safety_boundary_is_exactly_5000_chars() {
    let at_limit = "a".repeat(5000);
    assert!(validation::validate_input_safety(&at_limit).valid);
    let over = "a".repeat(5001);
    assert!(!validation::validate_input_safety(&over).valid);
}

#[test]
fn combine_aggregates_three_phase_results() {
    let combined = validation::combine(&[
        ValidationOutcome::passed(),
        ValidationOutcome::passed(),
        ValidationOutcome {
            valid: true,
            confidence_score: 70,
            issues: vec![],
        },
    ]);
    assert!(combined.valid);
    assert_eq!(combined.confidence_score, 90);
    assert!(combined.issues.is_empty());
}
