use chrono::{Duration, Utc};

use curious_mind::config::CacheConfig;
use curious_mind::offline::OfflineCache;
use curious_mind::tones;
use curious_mind::types::{Category, QuestionResult};

fn question(text: &str) -> QuestionResult {
    QuestionResult {
        question: text.to_string(),
        complexity_score: 5,
        category: Category::Physical,
        hook_line: "hook".to_string(),
        tone_applied: tones::by_name("scientific"),
        generated_at: Utc::now(),
        user_id: None,
    }
}

#[tokio::test]
async fn cold_start_is_seeded_with_popular_pairs() {
    let cache = OfflineCache::new(&CacheConfig::default());
    let stats = cache.stats().await;
    assert_eq!(stats.questions, 5);
    assert_eq!(stats.answers, 3);
    assert_eq!(stats.expired_items, 0);

    let questions = cache.get_cached_questions().await;
    assert!(questions
        .iter()
        .any(|q| q.question == "Why do plants grow towards light?"));
}

#[tokio::test]
async fn answer_reverse_lookup_follows_back_reference() {
    let cache = OfflineCache::new(&CacheConfig::default());
    let answer = cache.get_cached_answer("offline-1").await.unwrap();
    assert!(answer.answer.contains("purr"));
    assert!(cache.get_cached_answer("offline-99").await.is_none());
}

#[tokio::test]
async fn capacity_bound_keeps_only_newest_entries() {
    let cache = OfflineCache::new(&CacheConfig {
        capacity: 10,
        expiry_days: 7,
    });

    for i in 0..25 {
        cache
            .cache_pair(&question(&format!("Why number {}?", i)), None)
            .await;
    }

    let stats = cache.stats().await;
    assert_eq!(stats.questions, 10);

    // Seeds were the oldest entries and must have been evicted
    let questions = cache.get_cached_questions().await;
    assert!(questions.iter().all(|q| q.question.starts_with("Why number")));
}

#[tokio::test]
async fn expired_entries_are_excluded_from_reads() {
    let cache = OfflineCache::new(&CacheConfig::default());
    let stale = Utc::now() - Duration::days(8);

    cache.backdate_entry("offline-1", stale).await;
    cache.backdate_entry("answer-1", stale).await;

    let questions = cache.get_cached_questions().await;
    assert_eq!(questions.len(), 4);
    assert!(questions.iter().all(|q| q.id != "offline-1"));

    assert!(cache.get_cached_answer("offline-1").await.is_none());

    let stats = cache.stats().await;
    assert_eq!(stats.expired_items, 2);
}

#[tokio::test]
async fn clear_expired_purges_both_collections() {
    let cache = OfflineCache::new(&CacheConfig::default());
    let stale = Utc::now() - Duration::days(30);
    cache.backdate_entry("offline-2", stale).await;
    cache.backdate_entry("answer-2", stale).await;

    cache.clear_expired().await;

    let stats = cache.stats().await;
    assert_eq!(stats.questions, 4);
    assert_eq!(stats.answers, 2);
    assert_eq!(stats.expired_items, 0);
}

#[tokio::test]
async fn random_cached_question_skips_expired_entries() {
    let cache = OfflineCache::new(&CacheConfig::default());
    let stale = Utc::now() - Duration::days(8);
    for id in ["offline-1", "offline-2", "offline-3", "offline-4"] {
        cache.backdate_entry(id, stale).await;
    }

    for _ in 0..20 {
        let picked = cache.random_cached_question().await.unwrap();
        assert_eq!(picked.id, "offline-5");
    }
}

#[tokio::test]
async fn caching_a_pair_links_answer_to_question() {
    let cache = OfflineCache::new(&CacheConfig::default());
    let q = question("Why does ice float?");
    let answer = curious_mind::types::AnswerResult {
        answer: "Because solid water is less dense than liquid water.".to_string(),
        sources: vec!["Physics of Water".to_string()],
        confidence_score: 90,
        tone_applied: tones::by_name("scientific"),
        generated_at: Utc::now(),
        question_id: None,
    };

    let question_id = cache.cache_pair(&q, Some(&answer)).await;
    let cached = cache.get_cached_answer(&question_id).await.unwrap();
    assert_eq!(cached.sources, vec!["Physics of Water"]);
}
