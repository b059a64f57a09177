use crate::domain::{Decimal, DecimalOverflow, Factory, LedgerEvent, Pair, Subject};

/// Restate a pair, its two subjects and the factory from one ledger event.
///
/// Every event counts as one transaction on each entity it touches. Liquidity
/// totals move by the delta between the pair's previous and new reserves, so
/// a subject listed in several pairs accumulates across all of them.
///
/// # Errors
/// Returns [`DecimalOverflow`] when a value leaves the decimal range. The
/// records may then be half-updated and must not be persisted.
pub fn apply_event(
    event: &LedgerEvent,
    pair: &mut Pair,
    token0: &mut Subject,
    token1: &mut Subject,
    factory: &mut Factory,
) -> Result<(), DecimalOverflow> {
    let previous_reserve_eth = pair.reserve_eth;

    token0.total_liquidity = token0
        .total_liquidity
        .checked_sub(pair.reserve0)?
        .checked_add(event.reserve0)?;
    token1.total_liquidity = token1
        .total_liquidity
        .checked_sub(pair.reserve1)?
        .checked_add(event.reserve1)?;
    token0.derived_price = event.token0_derived_price;
    token1.derived_price = event.token1_derived_price;

    pair.reserve0 = event.reserve0;
    pair.reserve1 = event.reserve1;
    pair.total_supply = event.total_supply;
    pair.token0_price = ratio(event.reserve0, event.reserve1);
    pair.token1_price = ratio(event.reserve1, event.reserve0);
    pair.reserve_eth = event
        .reserve0
        .checked_mul(event.token0_derived_price)?
        .checked_add(event.reserve1.checked_mul(event.token1_derived_price)?)?;
    pair.reserve_usd = pair.reserve_eth.checked_mul(event.reference_price)?;

    factory.total_liquidity_eth = factory
        .total_liquidity_eth
        .checked_sub(previous_reserve_eth)?
        .checked_add(pair.reserve_eth)?;
    factory.total_liquidity_usd = factory
        .total_liquidity_eth
        .checked_mul(event.reference_price)?;

    pair.tx_count += 1;
    token0.tx_count += 1;
    token1.tx_count += 1;
    factory.tx_count += 1;

    if let Some(volume) = &event.volume {
        pair.volume_token0 = pair.volume_token0.checked_add(volume.amount0)?;
        pair.volume_token1 = pair.volume_token1.checked_add(volume.amount1)?;
        pair.volume_usd = pair.volume_usd.checked_add(volume.amount_usd)?;
        pair.untracked_volume_usd = pair.untracked_volume_usd.checked_add(volume.untracked_usd)?;

        token0.trade_volume = token0.trade_volume.checked_add(volume.amount0)?;
        token0.trade_volume_usd = token0.trade_volume_usd.checked_add(volume.amount_usd)?;
        token0.untracked_volume_usd =
            token0.untracked_volume_usd.checked_add(volume.untracked_usd)?;
        token1.trade_volume = token1.trade_volume.checked_add(volume.amount1)?;
        token1.trade_volume_usd = token1.trade_volume_usd.checked_add(volume.amount_usd)?;
        token1.untracked_volume_usd =
            token1.untracked_volume_usd.checked_add(volume.untracked_usd)?;

        factory.total_volume_usd = factory.total_volume_usd.checked_add(volume.amount_usd)?;
        factory.total_volume_eth = factory.total_volume_eth.checked_add(volume.amount_eth)?;
        factory.untracked_volume_usd =
            factory.untracked_volume_usd.checked_add(volume.untracked_usd)?;
    }
    Ok(())
}

/// `numerator / denominator`, zero while the pool is empty.
fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PairId, SubjectId, SwapVolume, Timestamp, TokenMetadata};

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn subject(id: &str) -> Subject {
        let meta = TokenMetadata {
            symbol: id.to_uppercase(),
            name: id.to_string(),
            decimals: Some(18),
            total_supply: Decimal::zero(),
        };
        Subject::new(SubjectId::new(id), &meta, 18)
    }

    fn event(r0: &str, r1: &str, volume: Option<SwapVolume>) -> LedgerEvent {
        LedgerEvent {
            pair: PairId::new("p"),
            timestamp: Timestamp::new(100),
            block_number: 1,
            reserve0: d(r0),
            reserve1: d(r1),
            total_supply: d("50"),
            token0_derived_price: d("2"),
            token1_derived_price: d("0.5"),
            reference_price: d("1000"),
            volume,
        }
    }

    fn pair() -> Pair {
        Pair::new(
            PairId::new("p"),
            SubjectId::new("a"),
            SubjectId::new("b"),
            Timestamp::new(0),
            0,
        )
    }

    #[test]
    fn test_apply_event_restates_pair_snapshot() {
        let (mut p, mut a, mut b, mut f) = (pair(), subject("a"), subject("b"), Factory::new("f"));
        apply_event(&event("10", "40", None), &mut p, &mut a, &mut b, &mut f).unwrap();

        assert_eq!(p.reserve0, d("10"));
        assert_eq!(p.reserve1, d("40"));
        assert_eq!(p.total_supply, d("50"));
        assert_eq!(p.token0_price, d("0.25"));
        assert_eq!(p.token1_price, d("4"));
        // 10 * 2 + 40 * 0.5
        assert_eq!(p.reserve_eth, d("40"));
        assert_eq!(p.reserve_usd, d("40000"));
        assert_eq!(a.derived_price, d("2"));
        assert_eq!(b.derived_price, d("0.5"));
    }

    #[test]
    fn test_apply_event_moves_liquidity_by_reserve_delta() {
        let (mut p, mut a, mut b, mut f) = (pair(), subject("a"), subject("b"), Factory::new("f"));
        a.total_liquidity = d("100"); // held in other pairs

        apply_event(&event("10", "40", None), &mut p, &mut a, &mut b, &mut f).unwrap();
        apply_event(&event("12", "30", None), &mut p, &mut a, &mut b, &mut f).unwrap();

        assert_eq!(a.total_liquidity, d("112"));
        assert_eq!(b.total_liquidity, d("30"));
        // 12 * 2 + 30 * 0.5
        assert_eq!(f.total_liquidity_eth, d("39"));
        assert_eq!(f.total_liquidity_usd, d("39000"));
    }

    #[test]
    fn test_apply_event_counts_one_transaction_everywhere() {
        let (mut p, mut a, mut b, mut f) = (pair(), subject("a"), subject("b"), Factory::new("f"));
        apply_event(&event("1", "1", None), &mut p, &mut a, &mut b, &mut f).unwrap();
        apply_event(&event("1", "1", None), &mut p, &mut a, &mut b, &mut f).unwrap();
        assert_eq!((p.tx_count, a.tx_count, b.tx_count, f.tx_count), (2, 2, 2, 2));
    }

    #[test]
    fn test_apply_event_accumulates_swap_volume() {
        let (mut p, mut a, mut b, mut f) = (pair(), subject("a"), subject("b"), Factory::new("f"));
        let volume = SwapVolume {
            amount0: d("3"),
            amount1: d("12"),
            amount_eth: d("6"),
            amount_usd: d("6000"),
            untracked_usd: d("1"),
        };
        apply_event(&event("10", "40", Some(volume)), &mut p, &mut a, &mut b, &mut f).unwrap();

        assert_eq!(p.volume_token0, d("3"));
        assert_eq!(p.volume_token1, d("12"));
        assert_eq!(p.volume_usd, d("6000"));
        assert_eq!(a.trade_volume, d("3"));
        assert_eq!(b.trade_volume, d("12"));
        assert_eq!(b.trade_volume_usd, d("6000"));
        assert_eq!(f.total_volume_eth, d("6"));
        assert_eq!(f.untracked_volume_usd, d("1"));
    }

    #[test]
    fn test_apply_event_empty_pool_prices_are_zero() {
        let (mut p, mut a, mut b, mut f) = (pair(), subject("a"), subject("b"), Factory::new("f"));
        apply_event(&event("0", "5", None), &mut p, &mut a, &mut b, &mut f).unwrap();
        assert_eq!(p.token0_price, Decimal::zero());
        assert_eq!(p.token1_price, Decimal::zero());
    }

    #[test]
    fn test_apply_event_reports_overflow() {
        let (mut p, mut a, mut b, mut f) = (pair(), subject("a"), subject("b"), Factory::new("f"));
        let mut huge = event("1000000000000000", "1", None);
        huge.token0_derived_price = d("100000000000000");

        let err = apply_event(&huge, &mut p, &mut a, &mut b, &mut f).unwrap_err();
        assert_eq!(err.op, "*");
    }
}
