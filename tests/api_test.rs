mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use ledger_rollup::api::{self, AppState};
use ledger_rollup::domain::RetentionPolicy;
use ledger_rollup::orchestration::EVENTS_CURSOR;
use ledger_rollup::{AggregationContext, Orchestrator, Resolution, Store};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

/// Router over a SQLite store holding six hourly swaps with a two-hour window.
async fn setup_test_app() -> (axum::Router, Arc<dyn Store>, TempDir) {
    let (store, temp_dir) = sqlite_store().await;
    register_pair(store.clone()).await;

    let context = AggregationContext::new(FACTORY)
        .with_resolutions(vec![Resolution::Day, Resolution::Hour])
        .with_hour_policy(RetentionPolicy { window: 2, cap: 2 });
    let orchestrator = Orchestrator::new(store.clone(), context);
    for hour in 0..6u64 {
        let price = if hour == 5 { "3" } else { "2" };
        orchestrator
            .process_event(&swap_at(hour * 3_600, price))
            .await
            .unwrap();
    }
    store.save_cursor(EVENTS_CURSOR, 6).await.unwrap();

    let app = api::create_router(AppState::new(store.clone()));
    (app, store, temp_dir)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _store, _temp_dir) = setup_test_app().await;

    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_reports_ingest_cursor() {
    let (app, _store, _temp_dir) = setup_test_app().await;

    let (status, body) = get(app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["lastSeq"], 6);
}

#[tokio::test]
async fn test_candles_only_cover_retained_hours() {
    let (app, _store, _temp_dir) = setup_test_app().await;

    let (status, body) = get(
        app,
        &format!("/v1/candles?subject={}&resolution=hour", TOKEN0),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"], TOKEN0);
    assert_eq!(body["resolution"], "hour");

    let candles = body["candles"].as_array().unwrap();
    let periods: Vec<i64> = candles
        .iter()
        .map(|c| c["periodIndex"].as_i64().unwrap())
        .collect();
    assert_eq!(periods, vec![4, 5]);
    assert_eq!(candles[1]["periodStart"], 5 * 3_600);
    assert_eq!(candles[1]["txns"], 1);
    assert_eq!(candles[0]["close"], "20");
    assert_eq!(candles[1]["close"], "30");
}

#[tokio::test]
async fn test_candles_range_filter() {
    let (app, _store, _temp_dir) = setup_test_app().await;

    let (status, body) = get(
        app,
        &format!("/v1/candles?subject={}&resolution=hour&from=5&to=9", TOKEN0),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["candles"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_candles_reject_day_resolution() {
    let (app, _store, _temp_dir) = setup_test_app().await;

    let (status, body) = get(
        app,
        &format!("/v1/candles?subject={}&resolution=day", TOKEN0),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_candles_reject_inverted_range() {
    let (app, _store, _temp_dir) = setup_test_app().await;

    let (status, _) = get(
        app,
        &format!("/v1/candles?subject={}&resolution=hour&from=9&to=1", TOKEN0),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_pair_hour_buckets_are_never_archived() {
    let (app, _store, _temp_dir) = setup_test_app().await;

    let (status, body) = get(app, &format!("/v1/buckets/pair_hour?subject={}", PAIR)).await;
    assert_eq!(status, StatusCode::OK);

    let buckets = body["buckets"].as_array().unwrap();
    assert_eq!(buckets.len(), 6);
    assert_eq!(buckets[0]["kind"], "pair_hour");
    assert_eq!(buckets[0]["id"], format!("{}-0", PAIR));
    assert_eq!(buckets[0]["resolution"], "hour");
}

#[tokio::test]
async fn test_get_bucket_by_id() {
    let (app, _store, _temp_dir) = setup_test_app().await;

    let (status, body) = get(app, &format!("/v1/buckets/factory_day/{}-0", FACTORY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subjectId"], FACTORY);
    assert_eq!(body["periodIndex"], 0);
    assert_eq!(body["data"]["daily_txns"], 6);
}

#[tokio::test]
async fn test_archived_bucket_is_not_found() {
    let (app, _store, _temp_dir) = setup_test_app().await;

    let (status, body) = get(app, &format!("/v1/buckets/token_hour/{}-1", TOKEN0)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unknown_bucket_kind_is_bad_request() {
    let (app, _store, _temp_dir) = setup_test_app().await;

    let (status, _) = get(app, "/v1/buckets/token_week?subject=0xaaa").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_subject_reports_archive_watermarks() {
    let (app, _store, _temp_dir) = setup_test_app().await;

    let (status, body) = get(app, &format!("/v1/subjects/{}", TOKEN0)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "AAA");
    assert_eq!(body["txCount"], 6);
    assert_eq!(body["hour"]["lastRecorded"], 5);
    assert_eq!(body["hour"]["lastArchived"], 2);
    assert_eq!(body["hour"]["pending"], 2);
    assert_eq!(body["hour"]["oldestPending"], 4);
    // Minute resolution is disabled in this setup.
    assert_eq!(body["minute"]["pending"], 0);
    assert!(body["minute"]["oldestPending"].is_null());
}

#[tokio::test]
async fn test_pair_endpoint() {
    let (app, _store, _temp_dir) = setup_test_app().await;

    let (status, body) = get(app.clone(), &format!("/v1/pairs/{}", PAIR)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token0"], TOKEN0);
    assert_eq!(body["token1"], TOKEN1);
    assert_eq!(body["txCount"], 6);
    assert_eq!(body["reserve0"], "100");

    let (status, _) = get(app, "/v1/pairs/0xnone").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
