//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → RSI = 100; avg_gain == 0 → RSI = 0; both → 50.

use crate::domain::{Candle, PriceField};

use super::Indicator;

/// Wilder RSI of `values`. The first `period` positions are undefined.
pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period + 1 {
        return result;
    }

    let changes: Vec<f64> = std::iter::once(f64::NAN)
        .chain(values.windows(2).map(|w| w[1] - w[0]))
        .collect();

    // Seed: average gain and average loss over first `period` changes
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for &ch in &changes[1..=period] {
        if ch.is_nan() {
            return result;
        }
        if ch > 0.0 {
            avg_gain += ch;
        } else {
            avg_loss -= ch;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    result[period] = compute_rsi(avg_gain, avg_loss);

    let alpha = 1.0 / period as f64;
    for i in (period + 1)..n {
        let ch = changes[i];
        if ch.is_nan() {
            return result;
        }

        let gain = if ch > 0.0 { ch } else { 0.0 };
        let loss = if ch < 0.0 { -ch } else { 0.0 };

        avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
        avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;

        result[i] = compute_rsi(avg_gain, avg_loss);
    }

    result
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    field: PriceField,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self::on(period, PriceField::Close)
    }

    pub fn on(period: usize, field: PriceField) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        let name = match field {
            PriceField::Close => format!("rsi_{period}"),
            other => format!("rsi_{}_{period}", other.as_str()),
        };
        Self {
            period,
            field,
            name,
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        rsi(&self.field.extract(candles), self.period)
    }
}
