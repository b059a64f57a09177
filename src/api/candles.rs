use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{period_range, AppState};
use crate::domain::{BucketKind, CandleBucket, Decimal, Resolution};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CandlesQuery {
    pub subject: String,
    pub resolution: String,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandleDto {
    pub period_index: i64,
    pub period_start: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub price_usd: Decimal,
    pub volume: Decimal,
    pub volume_usd: Decimal,
    pub fees_usd: Decimal,
    pub txns: i64,
}

impl From<CandleBucket> for CandleDto {
    fn from(candle: CandleBucket) -> Self {
        CandleDto {
            period_index: candle.key.period_index,
            period_start: candle.key.period_start,
            open: candle.ohlc.open,
            high: candle.ohlc.high,
            low: candle.ohlc.low,
            close: candle.ohlc.close,
            price_usd: candle.price_usd,
            volume: candle.volume,
            volume_usd: candle.volume_usd,
            fees_usd: candle.fees_usd,
            txns: candle.txns,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CandlesResponse {
    pub subject: String,
    pub resolution: Resolution,
    pub candles: Vec<CandleDto>,
}

pub async fn get_candles(
    Query(params): Query<CandlesQuery>,
    State(state): State<AppState>,
) -> Result<Json<CandlesResponse>, AppError> {
    let resolution = Resolution::from_str(&params.resolution).map_err(AppError::BadRequest)?;
    let kind = BucketKind::candle(resolution).ok_or_else(|| {
        AppError::BadRequest("candles are kept for hour and minute only".to_string())
    })?;
    let (from, to) = period_range(params.from, params.to)?;

    let stored = state
        .store
        .list_buckets(kind, &params.subject, from, to)
        .await?;

    let mut candles = Vec::with_capacity(stored.len());
    for bucket in stored {
        let candle: CandleBucket = bucket.decode()?;
        candles.push(CandleDto::from(candle));
    }

    Ok(Json(CandlesResponse {
        subject: params.subject,
        resolution,
        candles,
    }))
}
