//! Look-ahead contamination tests for every indicator and strategy variant.
//!
//! No value at bar t may depend on candles from bar t+1 or later.
//!
//! Method: compute on a truncated series (candles 0..150) and on the full
//! series (candles 0..300). Bars 0..150 must be identical between both runs.

use siglab_core::indicators::*;
use siglab_core::{Candle, EvalContext, RuleFamily, Side, Strategy};

/// Deterministic pseudo-random walk with realistic OHLCV variation.
fn make_test_candles(n: usize) -> Vec<Candle> {
    let mut candles = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let change = (((seed >> 33) % 200) as f64 - 100.0) * 0.05;
        price = (price + change).max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        candles.push(Candle {
            timestamp: 1_700_000_000_000 + i as i64 * 3_600_000,
            open,
            high: open.max(close) + 2.0 + (i % 3) as f64,
            low: open.min(close) - 2.0 - (i % 5) as f64 * 0.5,
            close,
            volume: 1000.0 + ((seed >> 40) % 900) as f64,
        });
    }

    candles
}

fn assert_same_prefix(name: &str, truncated: &[f64], full: &[f64]) {
    for (i, (t, f)) in truncated.iter().zip(full).enumerate() {
        if t.is_nan() && f.is_nan() {
            continue;
        }
        assert!(
            !t.is_nan() && !f.is_nan(),
            "{name}: NaN mismatch at bar {i} (truncated={t}, full={f})"
        );
        assert!(
            (t - f).abs() < 1e-10,
            "{name}: look-ahead contamination at bar {i}: truncated={t}, full={f}"
        );
    }
}

fn assert_no_lookahead(indicator: &dyn Indicator, candles: &[Candle], truncated_len: usize) {
    let full = indicator.compute(candles);
    let truncated = indicator.compute(&candles[..truncated_len]);
    assert_eq!(truncated.len(), truncated_len, "{}", indicator.name());
    assert_eq!(full.len(), candles.len(), "{}", indicator.name());
    assert_same_prefix(indicator.name(), &truncated, &full);
}

#[test]
fn lookahead_moving_averages() {
    let candles = make_test_candles(300);
    assert_no_lookahead(&Sma::new(10), &candles, 150);
    assert_no_lookahead(&Sma::on(30, siglab_core::PriceField::Volume), &candles, 150);
    assert_no_lookahead(&Ema::new(20), &candles, 150);
}

#[test]
fn lookahead_rsi() {
    let candles = make_test_candles(300);
    assert_no_lookahead(&Rsi::new(14), &candles, 150);
    assert_no_lookahead(&Rsi::new(7), &candles, 150);
}

#[test]
fn lookahead_atr() {
    let candles = make_test_candles(300);
    assert_no_lookahead(&Atr::new(14), &candles, 150);
}

#[test]
fn lookahead_donchian() {
    let candles = make_test_candles(300);
    assert_no_lookahead(&Donchian::upper(20), &candles, 150);
    assert_no_lookahead(&Donchian::lower(20), &candles, 150);
    assert_no_lookahead(&Donchian::basis(96), &candles, 150);
}

#[test]
fn lookahead_lwti() {
    let candles = make_test_candles(300);
    assert_no_lookahead(&Lwti::new(LwtiParams::default()), &candles, 150);
    assert_no_lookahead(
        &Lwti::new(LwtiParams::new(8).smoothed(MaType::Sma, 5)),
        &candles,
        150,
    );
}

#[test]
fn lookahead_macd() {
    let candles = make_test_candles(300);
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let full = macd(&closes, 12, 26, 9);
    let truncated = macd(&closes[..150], 12, 26, 9);
    assert_same_prefix("macd_line", &truncated.line, &full.line);
    assert_same_prefix("macd_signal", &truncated.signal, &full.signal);
}

#[test]
fn shifted_band_excludes_current_bar() {
    let mut candles = make_test_candles(200);
    let period = 20;
    let channel_before = {
        let high: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let low: Vec<f64> = candles.iter().map(|c| c.low).collect();
        shift_and_pad(&donchian(&high, &low, period).upper, period - 1, 2)
    };
    // a spike on the last bar must not move the shifted band at that bar
    candles[199].high += 1_000.0;
    let high: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let low: Vec<f64> = candles.iter().map(|c| c.low).collect();
    let channel_after = shift_and_pad(&donchian(&high, &low, period).upper, period - 1, 2);
    assert_eq!(channel_before[199], channel_after[199]);
}

#[test]
fn lookahead_strategy_entries() {
    let candles = make_test_candles(300);
    let ctx = EvalContext::silent();
    for family in [
        RuleFamily::rsi_reversal(),
        RuleFamily::macd_rsi(),
        RuleFamily::donchian_lwti(),
    ] {
        for side in [Side::Long, Side::Short] {
            let strategy = Strategy::with_default_grid(family.clone(), side).unwrap();
            let full = strategy.evaluate_batch(&candles, 0, &ctx).unwrap();
            let truncated = strategy.evaluate_batch(&candles[..150], 0, &ctx).unwrap();
            assert_eq!(
                &full.entries[..150],
                truncated.entries.as_slice(),
                "{}",
                strategy.name()
            );
            assert_same_prefix(&strategy.name(), &truncated.exit_prices, &full.exit_prices);
        }
    }
}
