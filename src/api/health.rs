use axum::extract::State;
use axum::Json;

use super::AppState;
use crate::error::AppError;
use crate::orchestration::EVENTS_CURSOR;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Ready once the store answers; reports how far ingestion has progressed.
pub async fn ready(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let cursor = state.store.load_cursor(EVENTS_CURSOR).await?;
    Ok(Json(serde_json::json!({
        "status": "ready",
        "lastSeq": cursor,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Store};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health_returns_ok() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_ready_reports_cursor() {
        let store = Arc::new(MemoryStore::new());
        store.save_cursor(EVENTS_CURSOR, 42).await.unwrap();

        let Json(body) = ready(State(AppState::new(store))).await.unwrap();
        assert_eq!(body["status"], "ready");
        assert_eq!(body["lastSeq"], 42);
    }
}
