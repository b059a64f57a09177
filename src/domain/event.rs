//! Items delivered by the upstream event source.

use super::{Decimal, PairId, SubjectId, Timestamp};
use serde::{Deserialize, Serialize};

/// Volumes moved by a swap. Token amounts are absolute values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapVolume {
    pub amount0: Decimal,
    pub amount1: Decimal,
    /// Tracked volume in reference units.
    pub amount_eth: Decimal,
    /// Tracked volume in USD.
    pub amount_usd: Decimal,
    pub untracked_usd: Decimal,
}

/// Price/reserve update for one pair, already enriched with derived prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEvent {
    pub pair: PairId,
    pub timestamp: Timestamp,
    pub block_number: u64,
    pub reserve0: Decimal,
    pub reserve1: Decimal,
    pub total_supply: Decimal,
    /// Price of token0 in reference units.
    pub token0_derived_price: Decimal,
    /// Price of token1 in reference units.
    pub token1_derived_price: Decimal,
    /// USD value of one reference unit.
    pub reference_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<SwapVolume>,
}

/// Announcement of a new pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairCreated {
    pub pair: PairId,
    pub token0: SubjectId,
    pub token1: SubjectId,
    pub timestamp: Timestamp,
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SourceItem {
    PairCreated(PairCreated),
    Ledger(LedgerEvent),
}

impl SourceItem {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            SourceItem::PairCreated(created) => created.timestamp,
            SourceItem::Ledger(event) => event.timestamp,
        }
    }
}

/// A source item with its position in the upstream stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedItem {
    pub seq: u64,
    #[serde(flatten)]
    pub item: SourceItem,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_item_json_shape() {
        let json = serde_json::json!({
            "seq": 7,
            "type": "ledger",
            "pair": "0xpair",
            "timestamp": 3600,
            "blockNumber": 100,
            "reserve0": "10",
            "reserve1": "20",
            "totalSupply": "14.1",
            "token0DerivedPrice": "2",
            "token1DerivedPrice": "0.5",
            "referencePrice": "1800.25"
        });

        let item: SequencedItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.seq, 7);
        match item.item {
            SourceItem::Ledger(event) => {
                assert_eq!(event.pair, PairId::new("0xpair"));
                assert_eq!(event.timestamp, Timestamp::new(3600));
                assert!(event.volume.is_none());
                assert_eq!(event.reference_price.to_string(), "1800.25");
            }
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_pair_created_json_shape() {
        let json = serde_json::json!({
            "seq": 1,
            "type": "pairCreated",
            "pair": "0xpair",
            "token0": "0xa",
            "token1": "0xb",
            "timestamp": 10,
            "blockNumber": 1
        });

        let item: SequencedItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.item.timestamp(), Timestamp::new(10));
        assert!(matches!(item.item, SourceItem::PairCreated(_)));
    }
}
