//! Per-bucket update rules.
//!
//! Snapshot fields are restated from the current entity state on every call;
//! within-period counters and volumes accumulate. Each call is one transaction.

use crate::domain::{
    CandleBucket, Decimal, DecimalOverflow, Factory, FactoryDayBucket, Pair, PairDayBucket,
    PairHourBucket, Subject, SwapVolume, TokenDayBucket,
};

/// Which side of a pair a subject sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSide {
    Token0,
    Token1,
}

/// Swap volume seen from one subject's side of the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenVolume {
    pub amount: Decimal,
    pub amount_usd: Decimal,
    pub untracked_usd: Decimal,
    pub fees_usd: Decimal,
}

impl TokenVolume {
    pub fn for_side(
        volume: &SwapVolume,
        side: PairSide,
        fee_rate: Decimal,
    ) -> Result<Self, DecimalOverflow> {
        let amount = match side {
            PairSide::Token0 => volume.amount0,
            PairSide::Token1 => volume.amount1,
        };
        Ok(Self {
            amount,
            amount_usd: volume.amount_usd,
            untracked_usd: volume.untracked_usd,
            fees_usd: volume.amount_usd.checked_mul(fee_rate)?,
        })
    }
}

pub fn roll_factory_day(
    bucket: &mut FactoryDayBucket,
    factory: &Factory,
    volume: Option<&SwapVolume>,
) -> Result<(), DecimalOverflow> {
    bucket.total_volume_usd = factory.total_volume_usd;
    bucket.total_volume_eth = factory.total_volume_eth;
    bucket.total_liquidity_usd = factory.total_liquidity_usd;
    bucket.total_liquidity_eth = factory.total_liquidity_eth;
    bucket.tx_count = factory.tx_count;
    bucket.daily_txns += 1;

    if let Some(volume) = volume {
        bucket.daily_volume_usd = bucket.daily_volume_usd.checked_add(volume.amount_usd)?;
        bucket.daily_volume_eth = bucket.daily_volume_eth.checked_add(volume.amount_eth)?;
        bucket.daily_volume_untracked =
            bucket.daily_volume_untracked.checked_add(volume.untracked_usd)?;
    }
    Ok(())
}

pub fn roll_pair_day(
    bucket: &mut PairDayBucket,
    pair: &Pair,
    volume: Option<&SwapVolume>,
) -> Result<(), DecimalOverflow> {
    bucket.total_supply = pair.total_supply;
    bucket.reserve0 = pair.reserve0;
    bucket.reserve1 = pair.reserve1;
    bucket.reserve_usd = pair.reserve_usd;
    bucket.daily_txns += 1;

    if let Some(volume) = volume {
        bucket.daily_volume_token0 = bucket.daily_volume_token0.checked_add(volume.amount0)?;
        bucket.daily_volume_token1 = bucket.daily_volume_token1.checked_add(volume.amount1)?;
        bucket.daily_volume_usd = bucket.daily_volume_usd.checked_add(volume.amount_usd)?;
    }
    Ok(())
}

pub fn roll_pair_hour(
    bucket: &mut PairHourBucket,
    pair: &Pair,
    volume: Option<&SwapVolume>,
) -> Result<(), DecimalOverflow> {
    bucket.total_supply = pair.total_supply;
    bucket.reserve0 = pair.reserve0;
    bucket.reserve1 = pair.reserve1;
    bucket.reserve_usd = pair.reserve_usd;
    bucket.hourly_txns += 1;

    if let Some(volume) = volume {
        bucket.hourly_volume_token0 = bucket.hourly_volume_token0.checked_add(volume.amount0)?;
        bucket.hourly_volume_token1 = bucket.hourly_volume_token1.checked_add(volume.amount1)?;
        bucket.hourly_volume_usd = bucket.hourly_volume_usd.checked_add(volume.amount_usd)?;
    }
    Ok(())
}

pub fn roll_token_day(
    bucket: &mut TokenDayBucket,
    subject: &Subject,
    reference_price: Decimal,
    volume: Option<&TokenVolume>,
) -> Result<(), DecimalOverflow> {
    bucket.price_usd = subject.derived_price.checked_mul(reference_price)?;
    bucket.total_liquidity_token = subject.total_liquidity;
    bucket.total_liquidity_eth = subject.total_liquidity.checked_mul(subject.derived_price)?;
    bucket.total_liquidity_usd = bucket.total_liquidity_eth.checked_mul(reference_price)?;
    bucket.daily_txns += 1;

    if let Some(volume) = volume {
        bucket.daily_volume_token = bucket.daily_volume_token.checked_add(volume.amount)?;
        bucket.daily_volume_eth = bucket
            .daily_volume_eth
            .checked_add(volume.amount.checked_mul(subject.derived_price)?)?;
        bucket.daily_volume_usd = bucket.daily_volume_usd.checked_add(volume.amount_usd)?;
    }
    Ok(())
}

pub fn roll_candle(
    bucket: &mut CandleBucket,
    price_usd: Decimal,
    volume: Option<&TokenVolume>,
) -> Result<(), DecimalOverflow> {
    bucket.ohlc.observe(price_usd);
    bucket.price_usd = price_usd;
    bucket.txns += 1;

    if let Some(volume) = volume {
        bucket.volume = bucket.volume.checked_add(volume.amount)?;
        bucket.volume_usd = bucket.volume_usd.checked_add(volume.amount_usd)?;
        bucket.untracked_volume_usd =
            bucket.untracked_volume_usd.checked_add(volume.untracked_usd)?;
        bucket.fees_usd = bucket.fees_usd.checked_add(volume.fees_usd)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BucketKey, PairId, Resolution, SubjectId, Timestamp, TokenMetadata};

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn swap() -> SwapVolume {
        SwapVolume {
            amount0: d("2"),
            amount1: d("8"),
            amount_eth: d("4"),
            amount_usd: d("400"),
            untracked_usd: d("0"),
        }
    }

    #[test]
    fn test_token_volume_for_side_picks_amount_and_fees() {
        let volume = TokenVolume::for_side(&swap(), PairSide::Token1, d("0.003")).unwrap();
        assert_eq!(volume.amount, d("8"));
        assert_eq!(volume.fees_usd, d("1.2"));
    }

    #[test]
    fn test_roll_pair_hour_restates_and_counts() {
        let key = BucketKey::derive("p", Resolution::Hour, Timestamp::new(10));
        let mut bucket = PairHourBucket::new(key, PairId::new("p"));
        let mut pair = Pair::new(
            PairId::new("p"),
            SubjectId::new("a"),
            SubjectId::new("b"),
            Timestamp::new(0),
            0,
        );

        pair.reserve0 = d("1");
        roll_pair_hour(&mut bucket, &pair, Some(&swap())).unwrap();
        pair.reserve0 = d("5");
        roll_pair_hour(&mut bucket, &pair, None).unwrap();

        assert_eq!(bucket.hourly_txns, 2);
        assert_eq!(bucket.reserve0, d("5"));
        assert_eq!(bucket.hourly_volume_token1, d("8"));
        assert_eq!(bucket.hourly_volume_usd, d("400"));
    }

    #[test]
    fn test_roll_token_day_liquidity_snapshot() {
        let meta = TokenMetadata {
            symbol: "A".to_string(),
            name: "A".to_string(),
            decimals: Some(18),
            total_supply: Decimal::zero(),
        };
        let mut subject = Subject::new(SubjectId::new("a"), &meta, 18);
        subject.total_liquidity = d("10");
        subject.derived_price = d("0.5");

        let key = BucketKey::derive("a", Resolution::Day, Timestamp::new(10));
        let mut bucket = TokenDayBucket::new(key, SubjectId::new("a"));
        let volume = TokenVolume::for_side(&swap(), PairSide::Token0, d("0.003")).unwrap();
        roll_token_day(&mut bucket, &subject, d("2000"), Some(&volume)).unwrap();

        assert_eq!(bucket.price_usd, d("1000"));
        assert_eq!(bucket.total_liquidity_eth, d("5"));
        assert_eq!(bucket.total_liquidity_usd, d("10000"));
        assert_eq!(bucket.daily_volume_token, d("2"));
        assert_eq!(bucket.daily_volume_eth, d("1"));
        assert_eq!(bucket.daily_txns, 1);
    }

    #[test]
    fn test_roll_candle_updates_ohlc_and_counts() {
        let key = BucketKey::derive("a", Resolution::Minute, Timestamp::new(60));
        let mut candle = CandleBucket::new(key, SubjectId::new("a"), d("10"));
        roll_candle(&mut candle, d("10"), None).unwrap();
        roll_candle(&mut candle, d("7"), None).unwrap();
        roll_candle(&mut candle, d("10"), None).unwrap();

        assert_eq!(candle.txns, 3);
        assert_eq!(candle.ohlc.open, d("10"));
        assert_eq!(candle.ohlc.low, d("7"));
        assert_eq!(candle.ohlc.high, d("10"));
        assert_eq!(candle.ohlc.close, d("10"));
        assert_eq!(candle.price_usd, d("10"));
    }

    #[test]
    fn test_roll_factory_day_restates_totals() {
        let key = BucketKey::derive("f", Resolution::Day, Timestamp::new(0));
        let mut bucket = FactoryDayBucket::new(key);
        let mut factory = Factory::new("f");
        factory.tx_count = 41;
        factory.total_liquidity_usd = d("99");

        roll_factory_day(&mut bucket, &factory, Some(&swap())).unwrap();
        assert_eq!(bucket.tx_count, 41);
        assert_eq!(bucket.daily_txns, 1);
        assert_eq!(bucket.total_liquidity_usd, d("99"));
        assert_eq!(bucket.daily_volume_eth, d("4"));
    }
}
