//! Donchian Channel: highest high / lowest low over a lookback window.
//!
//! - Upper: max(high[t-period+1..=t])
//! - Lower: min(low[t-period+1..=t])
//! - Basis: (upper + lower) / 2
//!
//! Lookback: period - 1. Compare bands against price only after an
//! alignment shift (see `shift_and_pad`), otherwise a bar's own high
//! leaks into its own breakout test.

use crate::domain::Candle;

use super::Indicator;

/// Which band of the Donchian channel to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonchianBand {
    Upper,
    Lower,
    Basis,
}

impl DonchianBand {
    fn as_str(self) -> &'static str {
        match self {
            DonchianBand::Upper => "upper",
            DonchianBand::Lower => "lower",
            DonchianBand::Basis => "basis",
        }
    }
}

/// All three bands, aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct DonchianChannel {
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
    pub basis: Vec<f64>,
}

impl DonchianChannel {
    pub fn band(&self, band: DonchianBand) -> &[f64] {
        match band {
            DonchianBand::Upper => &self.upper,
            DonchianBand::Lower => &self.lower,
            DonchianBand::Basis => &self.basis,
        }
    }
}

/// Channel over `high`/`low`. A window containing NaN yields NaN for that bar.
pub fn donchian(high: &[f64], low: &[f64], period: usize) -> DonchianChannel {
    let n = high.len().min(low.len());
    let mut upper = vec![f64::NAN; n];
    let mut lower = vec![f64::NAN; n];
    let mut basis = vec![f64::NAN; n];

    if period == 0 || n < period {
        return DonchianChannel {
            upper,
            lower,
            basis,
        };
    }

    for i in (period - 1)..n {
        let start = i + 1 - period;
        let highs = &high[start..=i];
        let lows = &low[start..=i];
        if highs.iter().chain(lows).any(|v| v.is_nan()) {
            continue;
        }
        let hi = highs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lo = lows.iter().copied().fold(f64::INFINITY, f64::min);
        upper[i] = hi;
        lower[i] = lo;
        basis[i] = (hi + lo) / 2.0;
    }

    DonchianChannel {
        upper,
        lower,
        basis,
    }
}

#[derive(Debug, Clone)]
pub struct Donchian {
    period: usize,
    band: DonchianBand,
    name: String,
}

impl Donchian {
    pub fn new(period: usize, band: DonchianBand) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        Self {
            period,
            band,
            name: format!("donchian_{}_{period}", band.as_str()),
        }
    }

    pub fn upper(period: usize) -> Self {
        Self::new(period, DonchianBand::Upper)
    }

    pub fn lower(period: usize) -> Self {
        Self::new(period, DonchianBand::Lower)
    }

    pub fn basis(period: usize) -> Self {
        Self::new(period, DonchianBand::Basis)
    }
}

impl Indicator for Donchian {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let high: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let low: Vec<f64> = candles.iter().map(|c| c.low).collect();
        let mut channel = donchian(&high, &low, self.period);
        match self.band {
            DonchianBand::Upper => std::mem::take(&mut channel.upper),
            DonchianBand::Lower => std::mem::take(&mut channel.lower),
            DonchianBand::Basis => std::mem::take(&mut channel.basis),
        }
    }
}
