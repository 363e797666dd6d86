//! Larry Williams Large Trade Index (LWTI).
//!
//! diff  = close[t] - close[t-period]
//! lwti  = MA(diff, period) / MA(true_range, period) * 50 + 50
//!
//! Centered on 50: above 50 the net move over `period` bars is up relative to
//! the typical bar range. When the smoothed range is exactly zero the index is
//! exactly 50. An optional second moving average smooths the result.

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

use super::{true_range, Indicator, MaType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwtiParams {
    pub period: usize,
    #[serde(default)]
    pub ma_type: MaType,
    /// Secondary smoothing pass applied to the finished index.
    #[serde(default)]
    pub smooth: Option<(MaType, usize)>,
}

impl LwtiParams {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            ma_type: MaType::Ema,
            smooth: None,
        }
    }

    pub fn smoothed(mut self, ma_type: MaType, period: usize) -> Self {
        self.smooth = Some((ma_type, period));
        self
    }

    /// Bars before the index is defined.
    pub fn lookback(&self) -> usize {
        let base = (2 * self.period).saturating_sub(1);
        match self.smooth {
            Some((_, p)) => base + p.saturating_sub(1),
            None => base,
        }
    }
}

impl Default for LwtiParams {
    fn default() -> Self {
        Self::new(25).smoothed(MaType::Ema, 20)
    }
}

pub fn lwti(candles: &[Candle], params: &LwtiParams) -> Vec<f64> {
    let n = candles.len();
    let period = params.period;
    if period == 0 {
        return vec![f64::NAN; n];
    }

    let mut diff = vec![f64::NAN; n];
    for i in period..n {
        diff[i] = candles[i].close - candles[i - period].close;
    }
    let tr = true_range(candles);

    let ma_diff = params.ma_type.apply(&diff, period);
    let ma_tr = params.ma_type.apply(&tr, period);

    let index: Vec<f64> = ma_diff
        .iter()
        .zip(&ma_tr)
        .map(|(&d, &r)| {
            if d.is_nan() || r.is_nan() {
                f64::NAN
            } else if r == 0.0 {
                50.0
            } else {
                d / r * 50.0 + 50.0
            }
        })
        .collect();

    match params.smooth {
        Some((ma_type, smooth_period)) => ma_type.apply(&index, smooth_period),
        None => index,
    }
}

#[derive(Debug, Clone)]
pub struct Lwti {
    params: LwtiParams,
    name: String,
}

impl Lwti {
    pub fn new(params: LwtiParams) -> Self {
        assert!(params.period >= 1, "LWTI period must be >= 1");
        Self {
            name: format!("lwti_{}", params.period),
            params,
        }
    }
}

impl Indicator for Lwti {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.params.lookback()
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        lwti(candles, &self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    fn flat_candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle {
                timestamp: i as i64 * 60_000,
                open: 10.0,
                high: 10.0,
                low: 10.0,
                close: 10.0,
                volume: 1.0,
            })
            .collect()
    }

    #[test]
    fn zero_range_is_exactly_fifty() {
        let candles = flat_candles(40);
        let result = lwti(&candles, &LwtiParams::new(8));
        assert!(result[14].is_nan());
        for v in &result[15..] {
            assert_eq!(*v, 50.0);
        }
    }

    #[test]
    fn zero_range_smoothed_stays_at_fifty() {
        let candles = flat_candles(120);
        let result = lwti(&candles, &LwtiParams::default());
        for v in &result[68..] {
            assert_approx(*v, 50.0, 1e-9);
        }
    }

    #[test]
    fn warmup_matches_lookback() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + i as f64).collect();
        let candles = make_candles(&closes);
        let params = LwtiParams::new(8).smoothed(MaType::Sma, 5);
        let result = lwti(&candles, &params);
        let lookback = params.lookback();
        assert_eq!(lookback, 19);
        assert!(result[lookback - 1].is_nan());
        assert!(!result[lookback].is_nan());
    }

    #[test]
    fn uptrend_above_fifty_downtrend_below() {
        let up: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let down: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        let params = LwtiParams::new(8);
        assert!(lwti(&make_candles(&up), &params)[59] > 50.0);
        assert!(lwti(&make_candles(&down), &params)[59] < 50.0);
    }

    #[test]
    fn steady_trend_known_value() {
        // close rises 1 per bar; make_candles gives every bar (after the first) TR = 3
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let result = lwti(&make_candles(&closes), &LwtiParams {
            period: 4,
            ma_type: MaType::Sma,
            smooth: None,
        });
        // diff = 4, MA(tr) = 3 → 4/3 * 50 + 50
        assert_approx(result[30], 4.0 / 3.0 * 50.0 + 50.0, DEFAULT_EPSILON);
    }

    #[test]
    fn lwti_name_and_lookback() {
        let ind = Lwti::new(LwtiParams::default());
        assert_eq!(ind.name(), "lwti_25");
        assert_eq!(ind.lookback(), 49 + 19);
    }
}
