//! Moving Average Convergence Divergence (MACD).
//!
//! line      = EMA(fast) - EMA(slow)
//! signal    = EMA(line, signal_period), seeded at the first defined line value
//! histogram = line - signal
//!
//! Lookback of the signal line: (max(fast, slow) - 1) + (signal_period - 1).

use super::ema;

/// MACD line, signal line and histogram, aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl Macd {
    /// Bars before the histogram is defined.
    pub fn lookback(fast: usize, slow: usize, signal: usize) -> usize {
        fast.max(slow).saturating_sub(1) + signal.saturating_sub(1)
    }
}

pub fn macd(values: &[f64], fast: usize, slow: usize, signal_period: usize) -> Macd {
    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);

    let line: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema(&line, signal_period);
    let histogram = line.iter().zip(&signal).map(|(l, s)| l - s).collect();

    Macd {
        line,
        signal,
        histogram,
    }
}
