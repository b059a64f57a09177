use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{period_range, AppState};
use crate::domain::BucketKind;
use crate::error::AppError;
use crate::store::StoredBucket;

#[derive(Debug, Deserialize)]
pub struct BucketsQuery {
    pub subject: String,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketDto {
    pub kind: String,
    pub id: String,
    pub subject_id: String,
    pub resolution: String,
    pub period_index: i64,
    pub period_start: i64,
    pub data: serde_json::Value,
}

impl From<StoredBucket> for BucketDto {
    fn from(stored: StoredBucket) -> Self {
        BucketDto {
            kind: stored.kind.as_str().to_string(),
            id: stored.key.id,
            subject_id: stored.key.subject_id,
            resolution: stored.key.resolution.as_str().to_string(),
            period_index: stored.key.period_index,
            period_start: stored.key.period_start,
            data: stored.body,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BucketsResponse {
    pub buckets: Vec<BucketDto>,
}

fn parse_kind(raw: &str) -> Result<BucketKind, AppError> {
    BucketKind::from_str(raw).map_err(AppError::BadRequest)
}

pub async fn get_bucket(
    Path((kind, id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<BucketDto>, AppError> {
    let kind = parse_kind(&kind)?;
    let stored = state
        .store
        .load_bucket(kind, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} bucket {}", kind, id)))?;

    Ok(Json(stored.into()))
}

pub async fn list_buckets(
    Path(kind): Path<String>,
    Query(params): Query<BucketsQuery>,
    State(state): State<AppState>,
) -> Result<Json<BucketsResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let (from, to) = period_range(params.from, params.to)?;

    let buckets = state
        .store
        .list_buckets(kind, &params.subject, from, to)
        .await?
        .into_iter()
        .map(BucketDto::from)
        .collect();

    Ok(Json(BucketsResponse { buckets }))
}
