//! Pure decision logic for the question generation loop. Everything here is
//! synchronous and side-effect free so the retry behavior can be exercised
//! without a provider.

use crate::types::ValidationOutcome;

/// Why an attempt was abandoned. Internal signal only; never surfaced to
/// callers directly.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryReason {
    ProviderFailed(String),
    ParseFailed(String),
    StructureInvalid(Vec<String>),
    Duplicate,
    LowConfidence {
        confidence_score: u8,
        issues: Vec<String>,
    },
}

impl std::fmt::Display for RetryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryReason::ProviderFailed(message) => write!(f, "provider call failed: {}", message),
            RetryReason::ParseFailed(message) => write!(f, "response parse failed: {}", message),
            RetryReason::StructureInvalid(issues) => {
                write!(f, "structure validation failed: {}", issues.join(", "))
            }
            RetryReason::Duplicate => write!(f, "duplicate of a previous question"),
            RetryReason::LowConfidence {
                confidence_score,
                issues,
            } => write!(
                f,
                "hallucination check failed (confidence {}): {}",
                confidence_score,
                issues.join(", ")
            ),
        }
    }
}

/// Verdict for one generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptDecision {
    Accept,
    Retry(RetryReason),
}

/// State of the generation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Attempting(u32),
    Success,
    ExhaustedAttempts,
}

impl LoopState {
    /// Advance the loop given an attempt's verdict.
    pub fn advance(self, decision: &AttemptDecision, max_attempts: u32) -> LoopState {
        match self {
            LoopState::Attempting(n) => match decision {
                AttemptDecision::Accept => LoopState::Success,
                AttemptDecision::Retry(_) if n + 1 >= max_attempts => LoopState::ExhaustedAttempts,
                AttemptDecision::Retry(_) => LoopState::Attempting(n + 1),
            },
            terminal => terminal,
        }
    }
}

/// Decide one attempt's fate from the staged check results. Later stages are
/// `None` when an earlier stage already failed and they were never run.
///
/// A hallucination check fails the attempt only when the verdict is invalid
/// AND its confidence is below the cutoff; a low-confidence but valid verdict
/// is accepted.
pub fn decide_attempt(
    parse_error: Option<&str>,
    structure: Option<&ValidationOutcome>,
    duplicate: bool,
    hallucination: Option<&ValidationOutcome>,
    hallucination_cutoff: u8,
) -> AttemptDecision {
    if let Some(message) = parse_error {
        return AttemptDecision::Retry(RetryReason::ParseFailed(message.to_string()));
    }

    if let Some(structure) = structure {
        if !structure.valid {
            return AttemptDecision::Retry(RetryReason::StructureInvalid(structure.issues.clone()));
        }
    }

    if duplicate {
        return AttemptDecision::Retry(RetryReason::Duplicate);
    }

    if let Some(check) = hallucination {
        if !check.valid && check.confidence_score < hallucination_cutoff {
            return AttemptDecision::Retry(RetryReason::LowConfidence {
                confidence_score: check.confidence_score,
                issues: check.issues.clone(),
            });
        }
    }

    AttemptDecision::Accept
}

/// Word-overlap similarity: |common words| / max(|words1|, |words2|).
pub fn word_overlap_similarity(a: &str, b: &str) -> f32 {
    let words_a: Vec<&str> = a.split_whitespace().collect();
    let words_b: Vec<&str> = b.split_whitespace().collect();
    let longest = words_a.len().max(words_b.len());
    if longest == 0 {
        return 0.0;
    }
    let common = words_a.iter().filter(|w| words_b.contains(w)).count();
    common as f32 / longest as f32
}

/// A candidate is a duplicate when its normalized text exactly matches a
/// prior question, or word overlap against one exceeds the threshold.
pub fn is_duplicate_question(candidate: &str, previous: &[String], threshold: f32) -> bool {
    let normalized = candidate.to_lowercase().trim().to_string();
    previous.iter().any(|prior| {
        let prior = prior.to_lowercase().trim().to_string();
        normalized == prior || word_overlap_similarity(&normalized, &prior) > threshold
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passed() -> ValidationOutcome {
        ValidationOutcome::passed()
    }

    #[test]
    fn accept_when_all_checks_pass() {
        let decision = decide_attempt(None, Some(&passed()), false, Some(&passed()), 70);
        assert_eq!(decision, AttemptDecision::Accept);
    }

    #[test]
    fn parse_failure_wins_over_everything() {
        let decision = decide_attempt(Some("bad json"), None, false, None, 70);
        assert!(matches!(
            decision,
            AttemptDecision::Retry(RetryReason::ParseFailed(_))
        ));
    }

    #[test]
    fn invalid_structure_triggers_retry() {
        let structure = ValidationOutcome::failed(vec!["missing hook_line".into()]);
        let decision = decide_attempt(None, Some(&structure), false, None, 70);
        assert!(matches!(
            decision,
            AttemptDecision::Retry(RetryReason::StructureInvalid(_))
        ));
    }

    #[test]
    fn duplicate_triggers_retry() {
        let decision = decide_attempt(None, Some(&passed()), true, None, 70);
        assert_eq!(decision, AttemptDecision::Retry(RetryReason::Duplicate));
    }

    #[test]
    fn low_confidence_invalid_verdict_fails_attempt() {
        let check = ValidationOutcome {
            valid: false,
            confidence_score: 40,
            issues: vec!["implausible".into()],
        };
        let decision = decide_attempt(None, Some(&passed()), false, Some(&check), 70);
        assert!(matches!(
            decision,
            AttemptDecision::Retry(RetryReason::LowConfidence { .. })
        ));
    }

    #[test]
    fn low_confidence_but_valid_verdict_is_accepted() {
        let check = ValidationOutcome {
            valid: true,
            confidence_score: 10,
            issues: vec![],
        };
        let decision = decide_attempt(None, Some(&passed()), false, Some(&check), 70);
        assert_eq!(decision, AttemptDecision::Accept);
    }

    #[test]
    fn high_confidence_invalid_verdict_is_accepted() {
        // Invalid but confident enough: above the cutoff the verdict stands.
        let check = ValidationOutcome {
            valid: false,
            confidence_score: 85,
            issues: vec![],
        };
        let decision = decide_attempt(None, Some(&passed()), false, Some(&check), 70);
        assert_eq!(decision, AttemptDecision::Accept);
    }

    #[test]
    fn loop_state_machine_transitions() {
        let retry = AttemptDecision::Retry(RetryReason::Duplicate);
        let accept = AttemptDecision::Accept;

        assert_eq!(
            LoopState::Attempting(0).advance(&accept, 3),
            LoopState::Success
        );
        assert_eq!(
            LoopState::Attempting(0).advance(&retry, 3),
            LoopState::Attempting(1)
        );
        assert_eq!(
            LoopState::Attempting(2).advance(&retry, 3),
            LoopState::ExhaustedAttempts
        );
        // Terminal states are absorbing
        assert_eq!(LoopState::Success.advance(&retry, 3), LoopState::Success);
    }

    #[test]
    fn exact_match_is_always_duplicate() {
        let history = vec!["Why do cats purr when they're happy?".to_string()];
        assert!(is_duplicate_question(
            "Why do cats purr when they're happy?",
            &history,
            0.8
        ));
        assert!(is_duplicate_question(
            "  WHY DO CATS PURR WHEN THEY'RE HAPPY?  ",
            &history,
            0.8
        ));
    }

    #[test]
    fn high_word_overlap_is_duplicate() {
        let history = vec!["why do cats purr when they are happy".to_string()];
        // 7 of 8 words shared -> 0.875 > 0.8
        assert!(is_duplicate_question(
            "why do cats purr when they are sleepy",
            &history,
            0.8
        ));
        assert!(!is_duplicate_question(
            "why do dogs bark at strangers",
            &history,
            0.8
        ));
    }

    #[test]
    fn overlap_ratio_uses_longer_question() {
        // 3 common words, max length 6 -> 0.5
        let sim = word_overlap_similarity(
            "why do cats",
            "why do cats purr so loudly",
        );
        assert!((sim - 0.5).abs() < f32::EPSILON);
    }
}
