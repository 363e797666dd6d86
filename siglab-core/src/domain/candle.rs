//! Candle: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SignalError;

/// OHLCV candle. `timestamp` is the candle open time in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Returns true if any price or volume field is not finite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }
}

/// Column selector for indicators that read a single candle field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceField {
    pub fn value(self, candle: &Candle) -> f64 {
        match self {
            PriceField::Open => candle.open,
            PriceField::High => candle.high,
            PriceField::Low => candle.low,
            PriceField::Close => candle.close,
            PriceField::Volume => candle.volume,
        }
    }

    /// Extract the column as a fresh series aligned with `candles`.
    pub fn extract(self, candles: &[Candle]) -> Vec<f64> {
        candles.iter().map(|c| self.value(c)).collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::Volume => "volume",
        }
    }
}

/// Check the ordering and sanity assumptions every evaluation relies on.
///
/// Timestamps must be strictly increasing and every field finite.
pub fn validate_candles(candles: &[Candle]) -> Result<(), SignalError> {
    for (i, candle) in candles.iter().enumerate() {
        if candle.is_void() {
            return Err(SignalError::InvalidCandles {
                index: i,
                reason: "non-finite price or volume".into(),
            });
        }
        if candle.high < candle.low {
            return Err(SignalError::InvalidCandles {
                index: i,
                reason: format!("high {} below low {}", candle.high, candle.low),
            });
        }
        if i > 0 && candle.timestamp <= candles[i - 1].timestamp {
            return Err(SignalError::InvalidCandles {
                index: i,
                reason: format!(
                    "timestamp {} not after previous {}",
                    candle.timestamp,
                    candles[i - 1].timestamp
                ),
            });
        }
    }
    Ok(())
}
