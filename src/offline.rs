//! Offline degraded-mode service: a bounded, time-expiring cache of generated
//! question/answer pairs, a keyword-driven fallback question generator, and
//! the connectivity probe the pipeline consults at entry.
//!
//! Load/save hooks are deliberately absent here; a deployment that wants
//! durability supplies a store that reloads non-expired entries at startup
//! and persists on mutation.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::tones;
use crate::types::{AnswerResult, CachedAnswer, CachedQuestion, Category, QuestionResult};

/// Connectivity probe consulted before any provider call.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Fixed connectivity state, set once from configuration.
pub struct StaticConnectivity(pub bool);

impl Connectivity for StaticConnectivity {
    fn is_online(&self) -> bool {
        self.0
    }
}

/// Keyword patterns mapping simple inputs to an offline question template.
static OFFLINE_PATTERNS: Lazy<Vec<(Regex, &'static str, Category)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(?i)cat|feline|pet").unwrap(),
            "Why do cats exhibit this behavior?",
            Category::Biological,
        ),
        (
            Regex::new(r"(?i)plant|flower|tree").unwrap(),
            "Why do plants develop this characteristic?",
            Category::Biological,
        ),
        (
            Regex::new(r"(?i)human|people|person").unwrap(),
            "Why do humans experience this phenomenon?",
            Category::Psychological,
        ),
        (
            Regex::new(r"(?i)water|ocean|sea").unwrap(),
            "Why does water behave this way?",
            Category::Physical,
        ),
        (
            Regex::new(r"(?i)sky|cloud|weather").unwrap(),
            "Why do we observe this in the atmosphere?",
            Category::Physical,
        ),
    ]
});

/// Rule-based question generation for when no provider is reachable and the
/// cache has nothing to offer. Always returns something.
pub fn generate_offline_question(input: &str, tone_name: Option<&str>) -> QuestionResult {
    let mut question = "Why does this phenomenon occur?";
    let mut category = Category::General;

    for (pattern, template, cat) in OFFLINE_PATTERNS.iter() {
        if pattern.is_match(input) {
            question = template;
            category = *cat;
            break;
        }
    }

    let tone = match tone_name {
        Some(name) => tones::by_name(name),
        None => tones::random_tone(),
    };

    QuestionResult {
        question: question.to_string(),
        complexity_score: rand::thread_rng().gen_range(4..=8),
        category,
        hook_line: "An intriguing question to spark your curiosity".to_string(),
        tone_applied: tone,
        generated_at: Utc::now(),
        user_id: None,
    }
}

/// Cache occupancy counters.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub questions: usize,
    pub answers: usize,
    pub expired_items: usize,
}

#[derive(Default)]
struct CacheInner {
    questions: Vec<CachedQuestion>,
    answers: Vec<CachedAnswer>,
}

/// Bounded, expiring store of previously generated question/answer pairs.
/// Never exceeds its capacity and never serves an entry past its expiry
/// window.
pub struct OfflineCache {
    inner: RwLock<CacheInner>,
    capacity: usize,
    expiry: Duration,
}

impl OfflineCache {
    /// Build a cache seeded with a small set of pre-authored popular Q&A
    /// pairs so a cold start never finds it empty.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: RwLock::new(Self::seeded_inner()),
            capacity: config.capacity,
            expiry: Duration::days(config.expiry_days),
        }
    }

    fn seeded_inner() -> CacheInner {
        let now = Utc::now();
        let catalog = tones::all_tones();
        let seeds = [
            ("offline-1", "Why do cats purr when they're content?", Category::Biological, 6u8),
            ("offline-2", "Why do humans find certain sounds soothing?", Category::Psychological, 7),
            ("offline-3", "Why do plants grow towards light?", Category::Biological, 5),
            ("offline-4", "Why do stars shine in the night sky?", Category::Physical, 8),
            ("offline-5", "Why do people laugh when they're happy?", Category::Psychological, 6),
        ];

        let answers = [
            (
                "answer-1",
                "offline-1",
                "Cats purr through a fascinating mechanism involving their laryngeal muscles and neural oscillators. When content, their brain sends rapid signals to throat muscles, creating vibrations at 20-50 Hz. These vibrations don't just communicate happiness - they actually promote bone healing and reduce pain, which is why cats purr when injured too!",
                vec!["Feline Biology Research", "Veterinary Science Journal"],
            ),
            (
                "answer-2",
                "offline-2",
                "Humans find certain sounds soothing due to evolutionary wiring and neurochemistry. Our brains respond positively to sounds that historically indicated safety - gentle water, soft wind, rhythmic patterns like a heartbeat. The auditory cortex processes these sounds and triggers serotonin and dopamine release while reducing cortisol, creating physiological relaxation.",
                vec!["Neuroscience Research", "Evolutionary Psychology"],
            ),
            (
                "answer-3",
                "offline-3",
                "Plants grow towards light through phototropism, a response controlled by auxin hormones. When light hits one side of a plant, auxin concentrates on the shadowed side, causing those cells to elongate faster. This creates the bending motion toward light. It's nature's way of ensuring plants maximize their energy capture for survival!",
                vec!["Plant Biology Textbook", "Botanical Research"],
            ),
        ];

        let mut inner = CacheInner::default();
        for (i, (id, question, category, complexity)) in seeds.iter().enumerate() {
            inner.questions.push(CachedQuestion {
                id: id.to_string(),
                question: question.to_string(),
                category: *category,
                complexity_score: *complexity,
                tone_applied: catalog[i % catalog.len()].clone(),
                cached_at: now,
            });
        }
        for (i, (id, question_id, answer, sources)) in answers.iter().enumerate() {
            inner.answers.push(CachedAnswer {
                id: id.to_string(),
                question_id: question_id.to_string(),
                answer: answer.to_string(),
                sources: sources.iter().map(|s| s.to_string()).collect(),
                tone_applied: catalog[i % catalog.len()].clone(),
                cached_at: now,
            });
        }
        inner
    }

    fn is_expired(&self, cached_at: DateTime<Utc>) -> bool {
        cached_at < Utc::now() - self.expiry
    }

    /// Cache a generated question (and optionally its answer), returning the
    /// cached question's id.
    pub async fn cache_pair(
        &self,
        question: &QuestionResult,
        answer: Option<&AnswerResult>,
    ) -> String {
        let question_id = format!("cached-{}", Uuid::new_v4());
        let now = Utc::now();

        let mut inner = self.inner.write().await;
        inner.questions.push(CachedQuestion {
            id: question_id.clone(),
            question: question.question.clone(),
            category: question.category,
            complexity_score: question.complexity_score,
            tone_applied: question.tone_applied.clone(),
            cached_at: now,
        });

        if let Some(answer) = answer {
            inner.answers.push(CachedAnswer {
                id: format!("answer-{}", Uuid::new_v4()),
                question_id: question_id.clone(),
                answer: answer.answer.clone(),
                sources: answer.sources.clone(),
                tone_applied: answer.tone_applied.clone(),
                cached_at: now,
            });
        }

        Self::maintain_size(&mut inner.questions, self.capacity, |q| q.cached_at);
        Self::maintain_size(&mut inner.answers, self.capacity, |a| a.cached_at);

        question_id
    }

    /// On overflow, keep only the newest `capacity` entries by cache time.
    fn maintain_size<T>(entries: &mut Vec<T>, capacity: usize, cached_at: impl Fn(&T) -> DateTime<Utc>) {
        if entries.len() > capacity {
            entries.sort_by_key(&cached_at);
            let excess = entries.len() - capacity;
            entries.drain(..excess);
        }
    }

    /// All non-expired cached questions.
    pub async fn get_cached_questions(&self) -> Vec<CachedQuestion> {
        self.inner
            .read()
            .await
            .questions
            .iter()
            .filter(|q| !self.is_expired(q.cached_at))
            .cloned()
            .collect()
    }

    /// A random non-expired cached question, if any.
    pub async fn random_cached_question(&self) -> Option<CachedQuestion> {
        let valid = self.get_cached_questions().await;
        valid.choose(&mut rand::thread_rng()).cloned()
    }

    /// Reverse lookup: the non-expired cached answer whose back-reference
    /// matches `question_id`.
    pub async fn get_cached_answer(&self, question_id: &str) -> Option<CachedAnswer> {
        self.inner
            .read()
            .await
            .answers
            .iter()
            .find(|a| a.question_id == question_id && !self.is_expired(a.cached_at))
            .cloned()
    }

    /// Drop every expired entry from both collections.
    pub async fn clear_expired(&self) {
        let cutoff = Utc::now() - self.expiry;
        let mut inner = self.inner.write().await;
        inner.questions.retain(|q| q.cached_at >= cutoff);
        inner.answers.retain(|a| a.cached_at >= cutoff);
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        let expired_questions = inner
            .questions
            .iter()
            .filter(|q| self.is_expired(q.cached_at))
            .count();
        let expired_answers = inner
            .answers
            .iter()
            .filter(|a| self.is_expired(a.cached_at))
            .count();
        CacheStats {
            questions: inner.questions.len(),
            answers: inner.answers.len(),
            expired_items: expired_questions + expired_answers,
        }
    }

    /// Test hook: backdate one entry by id to simulate aging.
    #[doc(hidden)]
    pub async fn backdate_entry(&self, id: &str, cached_at: DateTime<Utc>) {
        let mut inner = self.inner.write().await;
        if let Some(q) = inner.questions.iter_mut().find(|q| q.id == id) {
            q.cached_at = cached_at;
        }
        if let Some(a) = inner.answers.iter_mut().find(|a| a.id == id) {
            a.cached_at = cached_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_generator_maps_keywords_to_categories() {
        let cases = [
            ("my cat is sleeping", Category::Biological),
            ("a flowering tree", Category::Biological),
            ("people in a crowd", Category::Psychological),
            ("the ocean at dawn", Category::Physical),
            ("clouds before a storm", Category::Physical),
            ("quantum entanglement", Category::General),
        ];
        for (input, expected) in cases {
            let result = generate_offline_question(input, None);
            assert_eq!(result.category, expected, "input: {}", input);
            assert!(result.question.to_lowercase().starts_with("why"));
            assert!((4..=8).contains(&result.complexity_score));
        }
    }

    #[test]
    fn offline_generator_honors_requested_tone() {
        let result = generate_offline_question("water", Some("poetic"));
        assert_eq!(result.tone_applied.name, "poetic");
    }
}
