#![allow(dead_code)]

use ledger_rollup::domain::{SwapVolume, TokenMetadata};
use ledger_rollup::orchestration::Registration;
use ledger_rollup::{
    init_db, Decimal, LedgerEvent, MockMetadataSource, PairCreated, PairId, Registrar,
    Repository, SequencedItem, SourceItem, Store, SubjectId, Timestamp,
};
use std::sync::Arc;
use tempfile::TempDir;

pub const FACTORY: &str = "0xfactory";
pub const PAIR: &str = "0xpair";
pub const TOKEN0: &str = "0xaaa";
pub const TOKEN1: &str = "0xbbb";

pub fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

/// SQLite-backed store in a temp dir; keep the dir alive for the test.
pub async fn sqlite_store() -> (Arc<dyn Store>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();

    let pool = init_db(&db_path).await.expect("init_db failed");
    (Arc::new(Repository::new(pool)), temp_dir)
}

pub fn metadata() -> MockMetadataSource {
    let token = |symbol: &str| TokenMetadata {
        symbol: symbol.to_string(),
        name: format!("{} Token", symbol),
        decimals: Some(18),
        total_supply: d("1000000"),
    };
    MockMetadataSource::new()
        .with_token(SubjectId::new(TOKEN0), token("AAA"))
        .with_token(SubjectId::new(TOKEN1), token("BBB"))
}

pub fn pair_created() -> PairCreated {
    PairCreated {
        pair: PairId::new(PAIR),
        token0: SubjectId::new(TOKEN0),
        token1: SubjectId::new(TOKEN1),
        timestamp: Timestamp::new(0),
        block_number: 1,
    }
}

/// Register the default pair so events can be aggregated against it.
pub async fn register_pair(store: Arc<dyn Store>) {
    let registrar = Registrar::new(store, Arc::new(metadata()), FACTORY);
    let outcome = registrar.register_pair(&pair_created()).await.unwrap();
    assert_eq!(outcome, Registration::Registered);
}

/// A swap on the default pair at `ts` with token0 priced at `price0` reference units.
pub fn swap_at(ts: u64, price0: &str) -> LedgerEvent {
    LedgerEvent {
        pair: PairId::new(PAIR),
        timestamp: Timestamp::new(ts),
        block_number: ts,
        reserve0: d("100"),
        reserve1: d("200"),
        total_supply: d("141"),
        token0_derived_price: d(price0),
        token1_derived_price: d("0.5"),
        reference_price: d("10"),
        volume: Some(SwapVolume {
            amount0: d("1"),
            amount1: d("2"),
            amount_eth: d("2"),
            amount_usd: d("20"),
            untracked_usd: d("20"),
        }),
    }
}

pub fn sequenced(seq: u64, item: SourceItem) -> SequencedItem {
    SequencedItem { seq, item }
}
