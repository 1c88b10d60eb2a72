//! Response and input validation: input safety screening, structural checks
//! over provider output, the fail-closed hallucination check, and outcome
//! aggregation.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::error;

use crate::completion::CompletionClient;
use crate::prompts::{build_fact_check_prompt, FACT_CHECK_SYSTEM_PROMPT};
use crate::types::{
    clamp_confidence, Category, FactCheckPayload, QuestionResult, ValidationOutcome,
};

/// Maximum accepted input length in characters.
pub const MAX_INPUT_CHARS: usize = 5000;

static HARMFUL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\b(suicide|self-harm|violence|illegal)\b").unwrap(),
        Regex::new(r"(?i)\b(hate|discrimination|offensive)\b").unwrap(),
        // Basic script-injection screening
        Regex::new(r"(?i)<script|javascript:|data:").unwrap(),
    ]
});

/// Screen raw input before any network call. Pure and synchronous.
pub fn validate_input_safety(input: &str) -> ValidationOutcome {
    let mut issues = Vec::new();

    for pattern in HARMFUL_PATTERNS.iter() {
        if pattern.is_match(input) {
            issues.push("Input contains potentially harmful or inappropriate content".to_string());
            break;
        }
    }

    if input.chars().count() > MAX_INPUT_CHARS {
        issues.push(format!("Input too long (max {} characters)", MAX_INPUT_CHARS));
    }

    if input.trim().is_empty() {
        issues.push("Input cannot be empty".to_string());
    }

    if issues.is_empty() {
        ValidationOutcome::passed()
    } else {
        ValidationOutcome::failed(issues)
    }
}

/// Check a parsed provider response against the question shape: field
/// presence and types, the "why" prefix, complexity range, and category
/// membership. Pure and synchronous.
pub fn validate_question_structure(response: &serde_json::Value) -> ValidationOutcome {
    let mut issues = Vec::new();

    let question = response.get("question").and_then(|q| q.as_str());
    if question.map(|q| q.is_empty()).unwrap_or(true) {
        issues.push("Missing or invalid question field".to_string());
    }

    let complexity = response.get("complexity_score").and_then(|c| c.as_i64());
    if complexity.is_none() {
        issues.push("Missing or invalid complexity_score field".to_string());
    }

    let category = response.get("category").and_then(|c| c.as_str());
    if category.map(|c| c.is_empty()).unwrap_or(true) {
        issues.push("Missing or invalid category field".to_string());
    }

    if response
        .get("hook_line")
        .and_then(|h| h.as_str())
        .map(|h| h.is_empty())
        .unwrap_or(true)
    {
        issues.push("Missing or invalid hook_line field".to_string());
    }

    if let Some(question) = question {
        if !question.to_lowercase().trim_start().starts_with("why") {
            issues.push("Question must start with \"Why\"".to_string());
        }
    }

    if let Some(score) = complexity {
        if !(1..=10).contains(&score) {
            issues.push("Complexity score must be between 1 and 10".to_string());
        }
    }

    if let Some(category) = category {
        if Category::parse_validated(category).is_none() {
            let members: Vec<&str> = Category::VALIDATED.iter().map(|c| c.as_str()).collect();
            issues.push(format!("Category must be one of: {}", members.join(", ")));
        }
    }

    if issues.is_empty() {
        ValidationOutcome::passed()
    } else {
        ValidationOutcome::failed(issues)
    }
}

/// Ask a fact-checking persona to judge an already-generated question. Any
/// failure of the call or its parsing collapses to an invalid, zero-confidence
/// outcome rather than propagating: unverified content is not accepted.
pub async fn hallucination_check(
    client: &CompletionClient,
    result: &QuestionResult,
) -> ValidationOutcome {
    let prompt = build_fact_check_prompt(result);

    let response = match client
        .generate_completion(FACT_CHECK_SYSTEM_PROMPT, &prompt)
        .await
    {
        Ok(text) => text,
        Err(err) => {
            error!("Hallucination check failed: {}", err);
            return fail_closed();
        }
    };

    match serde_json::from_str::<FactCheckPayload>(&response) {
        Ok(payload) => ValidationOutcome {
            valid: payload.is_valid,
            confidence_score: clamp_confidence(payload.confidence_score),
            issues: payload.issues,
        },
        Err(err) => {
            error!("Hallucination check returned unparseable output: {}", err);
            fail_closed()
        }
    }
}

fn fail_closed() -> ValidationOutcome {
    ValidationOutcome {
        valid: false,
        confidence_score: 0,
        issues: vec!["Validation service unavailable".to_string()],
    }
}

/// Aggregate independent checks into one decision: AND validity, average
/// confidence, concatenate issues.
pub fn combine(outcomes: &[ValidationOutcome]) -> ValidationOutcome {
    if outcomes.is_empty() {
        return ValidationOutcome::passed();
    }

    let all_valid = outcomes.iter().all(|o| o.valid);
    let sum: u32 = outcomes.iter().map(|o| o.confidence_score as u32).sum();
    let avg = (sum as f64 / outcomes.len() as f64).round() as u8;
    let issues = outcomes.iter().flat_map(|o| o.issues.clone()).collect();

    ValidationOutcome {
        valid: all_valid,
        confidence_score: avg,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn safety_rejects_empty_and_oversized_input() {
        assert!(!validate_input_safety("").valid);
        assert!(!validate_input_safety("   ").valid);
        let oversized = "a".repeat(MAX_INPUT_CHARS + 1);
        assert!(!validate_input_safety(&oversized).valid);
        assert!(validate_input_safety("cats purring in the sun").valid);
    }

    #[test]
    fn safety_rejects_denylisted_content() {
        let outcome = validate_input_safety("how to do something illegal");
        assert!(!outcome.valid);
        assert_eq!(outcome.issues.len(), 1);
        assert!(!validate_input_safety("<script>alert(1)</script>").valid);
        assert!(!validate_input_safety("javascript:void(0)").valid);
    }

    #[test]
    fn structure_accepts_well_formed_question() {
        let value = json!({
            "question": "Why do cats purr when they're content?",
            "complexity_score": 6,
            "category": "biological",
            "hook_line": "The secret vibration"
        });
        let outcome = validate_question_structure(&value);
        assert!(outcome.valid, "issues: {:?}", outcome.issues);
        assert_eq!(outcome.confidence_score, 100);
    }

    #[test]
    fn structure_collects_every_violation() {
        let value = json!({
            "question": "How do cats purr?",
            "complexity_score": 14,
            "category": "chemical",
            "hook_line": "x"
        });
        let outcome = validate_question_structure(&value);
        assert!(!outcome.valid);
        assert_eq!(outcome.issues.len(), 3);
    }

    #[test]
    fn structure_requires_all_fields() {
        let outcome = validate_question_structure(&json!({ "question": "Why though?" }));
        assert!(!outcome.valid);
        assert!(outcome
            .issues
            .iter()
            .any(|issue| issue.contains("complexity_score")));
        assert!(outcome.issues.iter().any(|issue| issue.contains("category")));
        assert!(outcome.issues.iter().any(|issue| issue.contains("hook_line")));
    }

    #[test]
    fn category_is_never_silently_coerced() {
        let value = json!({
            "question": "Why is water wet?",
            "complexity_score": 4,
            "category": "general",
            "hook_line": "x"
        });
        assert!(!validate_question_structure(&value).valid);
    }

    #[test]
    fn combine_ands_validity_and_averages_confidence() {
        let combined = combine(&[
            ValidationOutcome {
                valid: true,
                confidence_score: 100,
                issues: vec![],
            },
            ValidationOutcome {
                valid: false,
                confidence_score: 50,
                issues: vec!["problem".into()],
            },
        ]);
        assert!(!combined.valid);
        assert_eq!(combined.confidence_score, 75);
        assert_eq!(combined.issues, vec!["problem".to_string()]);
    }
}
