pub mod buckets;
pub mod candles;
pub mod health;
pub mod pairs;
pub mod subjects;

use crate::error::AppError;
use crate::store::Store;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/buckets/:kind", get(buckets::list_buckets))
        .route("/v1/buckets/:kind/:id", get(buckets::get_bucket))
        .route("/v1/candles", get(candles::get_candles))
        .route("/v1/subjects/:id", get(subjects::get_subject))
        .route("/v1/pairs/:id", get(pairs::get_pair))
        .layer(cors)
        .with_state(state)
}

/// Inclusive period range from optional query bounds.
fn period_range(from: Option<i64>, to: Option<i64>) -> Result<(i64, i64), AppError> {
    let from = from.unwrap_or(0);
    let to = to.unwrap_or(i64::MAX);
    if from > to {
        return Err(AppError::BadRequest(format!(
            "from ({}) must not exceed to ({})",
            from, to
        )));
    }
    Ok((from, to))
}
