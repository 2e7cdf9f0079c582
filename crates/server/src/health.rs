use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use quotebot_core::quotes::QuoteStore;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    store: Arc<QuoteStore>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuoteStoreCheck {
    pub categories: usize,
    pub total_quotes: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub quotes: QuoteStoreCheck,
    pub checked_at: String,
}

pub fn router(store: Arc<QuoteStore>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(HealthState { store })
}

pub async fn root() -> &'static str {
    "It works!"
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let quotes = QuoteStoreCheck {
        categories: state.store.category_names().count(),
        total_quotes: state.store.total_quotes(),
    };
    let ready = quotes.total_quotes > 0;

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        quotes,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}
