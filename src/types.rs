//! Core data model for curious-mind: tones, archetypes, generated results,
//! cached entries, and the typed payload shapes expected from providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Causal category a question falls into.
///
/// `General` only appears on the offline rule-generated path; provider output
/// claiming anything outside the five validated members fails structural
/// validation instead of being coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Biological,
    Physical,
    Psychological,
    Social,
    Philosophical,
    General,
}

impl Category {
    pub const VALIDATED: [Category; 5] = [
        Category::Biological,
        Category::Physical,
        Category::Psychological,
        Category::Social,
        Category::Philosophical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Biological => "biological",
            Category::Physical => "physical",
            Category::Psychological => "psychological",
            Category::Social => "social",
            Category::Philosophical => "philosophical",
            Category::General => "general",
        }
    }

    /// Parse one of the five validated categories (case-insensitive).
    /// `general` is deliberately not accepted here.
    pub fn parse_validated(s: &str) -> Option<Category> {
        match s.trim().to_lowercase().as_str() {
            "biological" => Some(Category::Biological),
            "physical" => Some(Category::Physical),
            "psychological" => Some(Category::Psychological),
            "social" => Some(Category::Social),
            "philosophical" => Some(Category::Philosophical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named stylistic modifier ("wildcard") applied to generation prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneVariant {
    pub name: String,
    pub tone_instruction: String,
    pub description: String,
}

/// A causal-angle template biasing which kind of "why" is asked.
/// Advisory prompt flavoring only; never validated against output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archetype {
    pub name: String,
    pub prompt_template: String,
    pub category: Category,
    pub complexity_range: (u8, u8),
}

/// A fully validated generated question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question: String,
    pub complexity_score: u8,
    pub category: Category,
    pub hook_line: String,
    pub tone_applied: ToneVariant,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// A generated answer for a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub sources: Vec<String>,
    pub confidence_score: u8,
    pub tone_applied: ToneVariant,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
}

/// Outcome of one independent validation check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub confidence_score: u8,
    pub issues: Vec<String>,
}

impl ValidationOutcome {
    pub fn passed() -> Self {
        Self {
            valid: true,
            confidence_score: 100,
            issues: Vec::new(),
        }
    }

    pub fn failed(issues: Vec<String>) -> Self {
        Self {
            valid: false,
            confidence_score: 0,
            issues,
        }
    }
}

/// A question held in the offline cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedQuestion {
    pub id: String,
    pub question: String,
    pub category: Category,
    pub complexity_score: u8,
    pub tone_applied: ToneVariant,
    pub cached_at: DateTime<Utc>,
}

/// An answer held in the offline cache, pointing back at its question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAnswer {
    pub id: String,
    pub question_id: String,
    pub answer: String,
    pub sources: Vec<String>,
    pub tone_applied: ToneVariant,
    pub cached_at: DateTime<Utc>,
}

/// How the image collaborator produced its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageMethod {
    TextExtraction,
    ImageDescription,
}

/// Result of the image-to-text collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    pub description: String,
    pub confidence_score: u8,
    pub method: ImageMethod,
    pub processed_at: DateTime<Utc>,
}

impl ImageOutcome {
    /// Prefer extracted text over the scene description when substituting
    /// image output for pipeline input.
    pub fn question_input(&self) -> &str {
        match &self.extracted_text {
            Some(text) => text,
            None => &self.description,
        }
    }
}

/// Question-shaped provider payload. Anything that fails to deserialize into
/// this is a malformed response, not a best-effort parse.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionPayload {
    pub question: String,
    pub complexity_score: i64,
    pub category: String,
    pub hook_line: String,
}

/// Answer-shaped provider payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerPayload {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub confidence_score: Option<i64>,
}

/// Fact-check payload returned by the hallucination-check call.
#[derive(Debug, Clone, Deserialize)]
pub struct FactCheckPayload {
    pub is_valid: bool,
    pub confidence_score: i64,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// Clamp a provider-supplied complexity score into the surfaced 1..=10 range.
pub fn clamp_complexity(score: i64) -> u8 {
    score.clamp(1, 10) as u8
}

/// Clamp a provider-supplied confidence score into the surfaced 0..=100 range.
pub fn clamp_confidence(score: i64) -> u8 {
    score.clamp(0, 100) as u8
}
