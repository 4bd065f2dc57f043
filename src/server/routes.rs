//! HTTP 路由
//!
//! `POST /run-quiz` 永远返回 200 和一个 JSON 结果，错误写在响应体里

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value as JsonValue};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::models::{QuizOutcome, RawQuizRequest};
use crate::server::handler::RequestHandler;

/// 路由共享状态
pub struct AppState {
    pub handler: RequestHandler,
}

/// 构建路由
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/run-quiz", post(run_quiz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "message": "LLM quiz solver is running",
    }))
}

async fn run_quiz(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RawQuizRequest>, JsonRejection>,
) -> Json<QuizOutcome> {
    let outcome = match body {
        Ok(Json(raw)) => state.handler.handle(raw).await,
        Err(rejection) => state.handler.reject_malformed(rejection.body_text()),
    };
    Json(outcome)
}
