//! Indicator library: pure transforms from candle columns to aligned series.
//!
//! Every transform allocates a fresh `Vec<f64>` of the same length as its
//! input and never mutates the input. Positions without enough history hold
//! `f64::NAN` (undefined), never zero, and undefined inputs propagate as
//! undefined through later arithmetic.
//!
//! Two layers:
//! - free functions over `&[f64]` (`sma`, `ema`, `rsi`, `macd`, ...) used to
//!   compose indicators out of derived series
//! - `Indicator` implementations that read a `PriceField` from candles, used
//!   where a named, self-describing series is wanted

pub mod atr;
pub mod donchian;
pub mod ema;
pub mod lwti;
pub mod macd;
pub mod rsi;
pub mod shift;
pub mod sma;

pub use atr::{atr, true_range, Atr};
pub use donchian::{donchian, Donchian, DonchianBand, DonchianChannel};
pub use ema::{ema, Ema};
pub use lwti::{lwti, Lwti, LwtiParams};
pub use macd::{macd, Macd};
pub use rsi::{rsi, Rsi};
pub use shift::{lag, round_to, shift_and_pad};
pub use sma::{sma, Sma};

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

/// Trait for candle-driven indicators.
///
/// # Look-ahead contamination guard
/// No value at bar t may depend on candles after t. Every implementation must
/// pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "rsi_14", "donchian_upper_96").
    fn name(&self) -> &str;

    /// Number of leading positions that are undefined.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire candle series.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Moving average flavour used where the smoothing type is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaType {
    Sma,
    #[default]
    Ema,
}

impl MaType {
    pub fn apply(self, values: &[f64], period: usize) -> Vec<f64> {
        match self {
            MaType::Sma => sma(values, period),
            MaType::Ema => ema(values, period),
        }
    }
}

/// Index of the first defined value, if any.
pub(crate) fn first_defined(values: &[f64]) -> Option<usize> {
    values.iter().position(|v| !v.is_nan())
}

/// Create synthetic candles from close prices for testing.
///
/// open = prev_close (or close for the first candle),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: 1_700_000_000_000 + i as i64 * 60_000,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
