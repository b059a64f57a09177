use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::domain::{Decimal, RetentionLedger, SubjectId};
use crate::error::AppError;

/// Archive progress for one fine resolution.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDto {
    pub last_recorded: i64,
    pub last_archived: i64,
    pub pending: usize,
    pub oldest_pending: Option<i64>,
}

impl From<&RetentionLedger> for LedgerDto {
    fn from(ledger: &RetentionLedger) -> Self {
        LedgerDto {
            last_recorded: ledger.last_recorded,
            last_archived: ledger.last_archived,
            pending: ledger.len(),
            oldest_pending: ledger.pending.front().copied(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDto {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
    pub total_supply: Decimal,
    pub derived_price: Decimal,
    pub trade_volume: Decimal,
    pub trade_volume_usd: Decimal,
    pub untracked_volume_usd: Decimal,
    pub total_liquidity: Decimal,
    pub tx_count: i64,
    pub hour: LedgerDto,
    pub minute: LedgerDto,
}

pub async fn get_subject(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SubjectDto>, AppError> {
    let subject = state
        .store
        .load_subject(&SubjectId::new(id.clone()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("subject {}", id)))?;

    Ok(Json(SubjectDto {
        hour: LedgerDto::from(&subject.hour_ledger),
        minute: LedgerDto::from(&subject.minute_ledger),
        id: subject.id.0,
        symbol: subject.symbol,
        name: subject.name,
        decimals: subject.decimals,
        total_supply: subject.total_supply,
        derived_price: subject.derived_price,
        trade_volume: subject.trade_volume,
        trade_volume_usd: subject.trade_volume_usd,
        untracked_volume_usd: subject.untracked_volume_usd,
        total_liquidity: subject.total_liquidity,
        tx_count: subject.tx_count,
    }))
}
