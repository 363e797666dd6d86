//! Simple Moving Average (SMA).
//!
//! Rolling mean over a trailing window of exactly `period` values.
//! Lookback: period - 1. A window containing an undefined value is undefined.

use crate::domain::{Candle, PriceField};

use super::Indicator;

/// Rolling mean of `values`. Returns all-NaN when `period` is 0 or exceeds the input.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut nan_count = 0usize;

    for i in 0..n {
        let entering = values[i];
        if entering.is_nan() {
            nan_count += 1;
        } else {
            sum += entering;
        }

        if i >= period {
            let leaving = values[i - period];
            if leaving.is_nan() {
                nan_count -= 1;
            } else {
                sum -= leaving;
            }
        }

        if i + 1 >= period && nan_count == 0 {
            result[i] = sum / period as f64;
        }
    }

    result
}

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    field: PriceField,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self::on(period, PriceField::Close)
    }

    pub fn on(period: usize, field: PriceField) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        let name = match field {
            PriceField::Close => format!("sma_{period}"),
            other => format!("sma_{}_{period}", other.as_str()),
        };
        Self {
            period,
            field,
            name,
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        sma(&self.field.extract(candles), self.period)
    }
}
