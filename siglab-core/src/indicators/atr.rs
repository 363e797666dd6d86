//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR seed: mean of the first `period` true-range values, then
//! atr[i] = (atr[i-1] * (period-1) + tr[i]) / period.
//! Lookback: period - 1.

use crate::domain::Candle;

use super::Indicator;

/// Compute the True Range series from candles.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i == 0 {
                c.high - c.low
            } else {
                c.true_range(candles[i - 1].close)
            }
        })
        .collect()
}

/// Wilder-smoothed average of a true-range series.
pub fn atr(tr: &[f64], period: usize) -> Vec<f64> {
    let n = tr.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    let seed_window = &tr[..period];
    if seed_window.iter().any(|v| v.is_nan()) {
        return result;
    }
    let mut prev = seed_window.iter().sum::<f64>() / period as f64;
    result[period - 1] = prev;

    let p = period as f64;
    for i in period..n {
        if tr[i].is_nan() {
            return result;
        }
        prev = (prev * (p - 1.0) + tr[i]) / p;
        result[i] = prev;
    }

    result
}

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        atr(&true_range(candles), self.period)
    }
}
