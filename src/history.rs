//! Per-user question history behind an injectable store interface. The
//! in-memory implementation is process-lifetime only; a real deployment swaps
//! in a durable store without touching the pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::{Category, ToneVariant};

/// History kept for one user. Owned by the question pipeline; no persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserHistory {
    pub user_id: String,
    pub previous_questions: Vec<String>,
    /// Tone name -> times used, for the favorite-tones ranking
    pub tone_uses: BTreeMap<String, u32>,
    pub categories: BTreeSet<String>,
    pub last_updated: DateTime<Utc>,
}

impl UserHistory {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            previous_questions: Vec::new(),
            tone_uses: BTreeMap::new(),
            categories: BTreeSet::new(),
            last_updated: Utc::now(),
        }
    }

    /// Append a generated question, keeping only the most recent `limit`
    /// entries (oldest evicted first), and bump the tone/category tallies.
    pub fn record_question(
        &mut self,
        question: &str,
        tone: &ToneVariant,
        category: Category,
        limit: usize,
    ) {
        self.previous_questions.push(question.to_string());
        if self.previous_questions.len() > limit {
            let excess = self.previous_questions.len() - limit;
            self.previous_questions.drain(..excess);
        }

        *self.tone_uses.entry(tone.name.clone()).or_insert(0) += 1;
        self.categories.insert(category.as_str().to_string());
        self.last_updated = Utc::now();
    }

    /// Top tones by use count, most used first. Ties resolve alphabetically
    /// because the tally map iterates in name order.
    pub fn favorite_tones(&self, top: usize) -> Vec<String> {
        let mut ranked: Vec<(&String, &u32)> = self.tone_uses.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1));
        ranked.into_iter().take(top).map(|(name, _)| name.clone()).collect()
    }
}

/// Aggregate statistics surfaced per user.
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total_questions: usize,
    pub favorite_wildcards: Vec<String>,
    pub categories: Vec<String>,
}

impl From<&UserHistory> for UserStats {
    fn from(history: &UserHistory) -> Self {
        Self {
            total_questions: history.previous_questions.len(),
            favorite_wildcards: history.favorite_tones(3),
            categories: history.categories.iter().cloned().collect(),
        }
    }
}

/// Store interface for user histories. Reads and writes are whole-history;
/// concurrent read-modify-write cycles for the same user may interleave (a
/// known limitation carried over from the reference behavior).
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Option<UserHistory>;
    async fn put(&self, history: UserHistory);
    async fn evict(&self, user_id: &str);
}

/// Process-wide in-memory store.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    histories: Arc<RwLock<HashMap<String, UserHistory>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn get(&self, user_id: &str) -> Option<UserHistory> {
        self.histories.read().await.get(user_id).cloned()
    }

    async fn put(&self, history: UserHistory) {
        self.histories
            .write()
            .await
            .insert(history.user_id.clone(), history);
    }

    async fn evict(&self, user_id: &str) {
        self.histories.write().await.remove(user_id);
    }
}
