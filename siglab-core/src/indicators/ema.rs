//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: SMA of the first `period` defined values, placed at the last of them.
//! Lookback: period - 1 (plus any leading undefined region of the input).

use crate::domain::{Candle, PriceField};

use super::{first_defined, Indicator};

/// EMA of an arbitrary series.
///
/// A leading undefined region is skipped, so this also works on derived
/// series such as a MACD line. Once seeded, an undefined input taints every
/// later value.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 {
        return result;
    }
    let start = match first_defined(values) {
        Some(s) if n - s >= period => s,
        _ => return result,
    };

    let seed_window = &values[start..start + period];
    if seed_window.iter().any(|v| v.is_nan()) {
        return result;
    }
    let seed = seed_window.iter().sum::<f64>() / period as f64;
    let seed_index = start + period - 1;
    result[seed_index] = seed;

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = seed;
    for i in (seed_index + 1)..n {
        if values[i].is_nan() {
            return result;
        }
        let value = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = value;
        prev = value;
    }

    result
}

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    field: PriceField,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self::on(period, PriceField::Close)
    }

    pub fn on(period: usize, field: PriceField) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        let name = match field {
            PriceField::Close => format!("ema_{period}"),
            other => format!("ema_{}_{period}", other.as_str()),
        };
        Self {
            period,
            field,
            name,
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        ema(&self.field.extract(candles), self.period)
    }
}
