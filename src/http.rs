//! HTTP surface for curious-mind.
//!
//! Thin Axum bindings over the question/answer pipelines and the tone
//! catalog: request-shape validation, `{success, data}` envelopes, CORS, and
//! a small metrics counter. No business logic lives here.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::completion::{create_provider, CompletionClient};
use crate::config::Config;
use crate::error::CuriousMindError;
use crate::history::InMemoryHistoryStore;
use crate::image::StubAnalyzer;
use crate::offline::{OfflineCache, StaticConnectivity};
use crate::pipeline::{AnswerPipeline, InputKind, QuestionPipeline};
use crate::tones::{self, UserContext};

/// Shared state for the HTTP server
#[derive(Clone)]
pub struct AppState {
    pub questions: Arc<QuestionPipeline>,
    pub answers: Arc<AnswerPipeline>,
    pub metrics: Arc<Mutex<HttpMetrics>>,
}

/// Metrics for the HTTP server
#[derive(Debug, Clone, Default)]
pub struct HttpMetrics {
    pub total_requests: u64,
    pub errors_total: u64,
}

impl AppState {
    /// Wire up the full component graph from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = create_provider(config)?;
        let question_client = CompletionClient::new(provider.clone(), config);
        let answer_client = CompletionClient::new(provider, config);

        let cache = Arc::new(OfflineCache::new(&config.cache));
        let history = Arc::new(InMemoryHistoryStore::new());
        let connectivity = Arc::new(StaticConnectivity(!config.runtime.offline));

        let questions = QuestionPipeline::new(
            question_client,
            history,
            cache,
            connectivity,
            Arc::new(StubAnalyzer),
            config.generation.clone(),
        );
        let answers = AnswerPipeline::new(answer_client);

        Ok(Self {
            questions: Arc::new(questions),
            answers: Arc::new(answers),
            metrics: Arc::new(Mutex::new(HttpMetrics::default())),
        })
    }
}

/// Build the router for the public API.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/generate-question", post(generate_question_handler))
        .route("/generate-answer", post(generate_answer_handler))
        .route(
            "/generate-multiple-answers",
            post(generate_multiple_answers_handler),
        )
        .route("/wildcards", get(wildcards_handler))
        .route("/user/:user_id/stats", get(user_stats_handler))
        .route("/offline/cache-stats", get(cache_stats_handler))
        .route("/offline/clear-expired", post(clear_expired_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

const VALID_WILDCARDS: &[&str] = &["funny", "scientific", "poetic", "childlike", "philosophical"];

#[derive(Debug, Deserialize)]
pub struct GenerateQuestionRequest {
    pub input: String,
    pub wildcard: Option<String>,
    pub user_id: Option<String>,
    pub user_context: Option<UserContext>,
    #[serde(rename = "type", default)]
    pub input_type: InputKind,
}

#[derive(Debug, Deserialize)]
pub struct GenerateAnswerRequest {
    pub question: String,
    pub wildcard: Option<String>,
    pub question_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateMultipleAnswersRequest {
    pub question: String,
    pub count: Option<usize>,
}

fn validation_failure(details: Vec<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "success": false,
            "error": "Validation failed",
            "details": details,
        })),
    )
        .into_response()
}

fn check_wildcard(wildcard: &Option<String>, details: &mut Vec<String>) {
    if let Some(name) = wildcard {
        if !VALID_WILDCARDS.contains(&name.as_str()) {
            details.push(format!(
                "wildcard must be one of: {}",
                VALID_WILDCARDS.join(", ")
            ));
        }
    }
}

fn validate_question_request(req: &GenerateQuestionRequest) -> Vec<String> {
    let mut details = Vec::new();
    if req.input.is_empty() || req.input.chars().count() > 5000 {
        details.push("input must be between 1 and 5000 characters".to_string());
    }
    check_wildcard(&req.wildcard, &mut details);
    if let Some(context) = &req.user_context {
        if let Some(age) = context.age {
            if !(1..=120).contains(&age) {
                details.push("user_context.age must be between 1 and 120".to_string());
            }
        }
    }
    details
}

fn validate_answer_request(question: &str, wildcard: &Option<String>) -> Vec<String> {
    let mut details = Vec::new();
    if question.is_empty() || question.chars().count() > 1000 {
        details.push("question must be between 1 and 1000 characters".to_string());
    }
    check_wildcard(wildcard, &mut details);
    details
}

/// Map a pipeline error to an HTTP status and error envelope.
fn error_response(context: &str, err: &CuriousMindError) -> Response {
    let status = match err {
        CuriousMindError::UnsafeInput { .. } | CuriousMindError::ImageFormat { .. } => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({
            "success": false,
            "error": context,
            "message": err.to_string(),
        })),
    )
        .into_response()
}

async fn track(state: &AppState, failed: bool) {
    let mut metrics = state.metrics.lock().await;
    metrics.total_requests += 1;
    if failed {
        metrics.errors_total += 1;
    }
}

pub async fn generate_question_handler(
    State(state): State<AppState>,
    Json(req): Json<GenerateQuestionRequest>,
) -> Response {
    let details = validate_question_request(&req);
    if !details.is_empty() {
        track(&state, true).await;
        return validation_failure(details);
    }

    let result = state
        .questions
        .generate_question(
            &req.input,
            req.wildcard.as_deref(),
            req.user_id.as_deref(),
            req.user_context.as_ref(),
            req.input_type,
        )
        .await;

    match result {
        Ok(question) => {
            track(&state, false).await;
            Json(json!({ "success": true, "data": question })).into_response()
        }
        Err(err) => {
            error!("Question generation failed: {}", err);
            track(&state, true).await;
            error_response("Question generation failed", &err)
        }
    }
}

pub async fn generate_answer_handler(
    State(state): State<AppState>,
    Json(req): Json<GenerateAnswerRequest>,
) -> Response {
    let details = validate_answer_request(&req.question, &req.wildcard);
    if !details.is_empty() {
        track(&state, true).await;
        return validation_failure(details);
    }

    let tone = req.wildcard.as_deref().map(tones::by_name);
    let result = state
        .answers
        .generate_answer(&req.question, tone, req.question_id.as_deref())
        .await;

    match result {
        Ok(answer) => {
            track(&state, false).await;
            Json(json!({ "success": true, "data": answer })).into_response()
        }
        Err(err) => {
            error!("Answer generation failed: {}", err);
            track(&state, true).await;
            error_response("Answer generation failed", &err)
        }
    }
}

pub async fn generate_multiple_answers_handler(
    State(state): State<AppState>,
    Json(req): Json<GenerateMultipleAnswersRequest>,
) -> Response {
    let mut details = validate_answer_request(&req.question, &None);
    let count = req.count.unwrap_or(3);
    if !(1..=5).contains(&count) {
        details.push("count must be between 1 and 5".to_string());
    }
    if !details.is_empty() {
        track(&state, true).await;
        return validation_failure(details);
    }

    let answers = state
        .answers
        .generate_multiple_answers(&req.question, count)
        .await;
    let generated = answers.len();
    track(&state, false).await;

    Json(json!({
        "success": true,
        "data": answers,
        "metadata": { "answers_generated": generated },
    }))
    .into_response()
}

pub async fn wildcards_handler(State(state): State<AppState>) -> Response {
    track(&state, false).await;
    Json(json!({ "success": true, "data": tones::all_tones() })).into_response()
}

pub async fn user_stats_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.questions.user_stats(&user_id).await {
        Some(stats) => {
            track(&state, false).await;
            Json(json!({ "success": true, "data": stats })).into_response()
        }
        None => {
            track(&state, true).await;
            (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "success": false,
                    "error": "User not found or no question history",
                })),
            )
                .into_response()
        }
    }
}

pub async fn cache_stats_handler(State(state): State<AppState>) -> Response {
    let stats = state.questions.cache_stats().await;
    track(&state, false).await;
    Json(json!({ "success": true, "data": stats })).into_response()
}

pub async fn clear_expired_handler(State(state): State<AppState>) -> Response {
    state.questions.clear_expired_cache().await;
    track(&state, false).await;
    Json(json!({
        "success": true,
        "message": "Expired cache cleared successfully",
    }))
    .into_response()
}

pub async fn health_handler() -> Response {
    Json(json!({
        "success": true,
        "status": "healthy",
        "service": "curious-mind",
    }))
    .into_response()
}
