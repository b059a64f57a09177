use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::domain::{Decimal, PairId};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairDto {
    pub id: String,
    pub token0: String,
    pub token1: String,
    pub reserve0: Decimal,
    pub reserve1: Decimal,
    pub reserve_eth: Decimal,
    pub reserve_usd: Decimal,
    pub total_supply: Decimal,
    pub token0_price: Decimal,
    pub token1_price: Decimal,
    pub volume_token0: Decimal,
    pub volume_token1: Decimal,
    pub volume_usd: Decimal,
    pub untracked_volume_usd: Decimal,
    pub tx_count: i64,
    pub created_at_timestamp: u64,
    pub created_at_block: u64,
}

pub async fn get_pair(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PairDto>, AppError> {
    let pair = state
        .store
        .load_pair(&PairId::new(id.clone()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("pair {}", id)))?;

    Ok(Json(PairDto {
        id: pair.id.0,
        token0: pair.token0.0,
        token1: pair.token1.0,
        reserve0: pair.reserve0,
        reserve1: pair.reserve1,
        reserve_eth: pair.reserve_eth,
        reserve_usd: pair.reserve_usd,
        total_supply: pair.total_supply,
        token0_price: pair.token0_price,
        token1_price: pair.token1_price,
        volume_token0: pair.volume_token0,
        volume_token1: pair.volume_token1,
        volume_usd: pair.volume_usd,
        untracked_volume_usd: pair.untracked_volume_usd,
        tx_count: pair.tx_count,
        created_at_timestamp: pair.created_at_timestamp.as_secs(),
        created_at_block: pair.created_at_block,
    }))
}
