//! Donchian breakout confirmed by the Large Trade Index.
//!
//! Bands are computed over `period` bars and shifted forward by `band_shift`
//! before any comparison. Long entry:
//! - close above the shifted upper band (minus `breakout_buffer`)
//! - LWTI above `lwti_level`
//! - volume above its simple average
//! - close higher than the previous close
//!
//! Exit prices: the close wherever it falls back below the shifted basis.
//! Short mirrors against the lower band.

use serde::{Deserialize, Serialize};

use crate::diagnostics::SeriesMap;
use crate::domain::{Candle, PriceField};
use crate::error::SignalError;
use crate::grid::{ParamAxis, ParamRow};
use crate::indicators::{donchian, lwti, shift_and_pad, sma, LwtiParams};
use crate::signal;

use super::{value_at, Rules, Side};

pub const AXES: [&str; 1] = ["period"];

pub fn default_axes() -> Vec<ParamAxis> {
    vec![ParamAxis::integral("period", vec![96.0])]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DonchianLwtiSettings {
    pub filter_distance: usize,
    pub band_shift: usize,
    /// Subtracted from the upper band (added to the lower band for short).
    pub breakout_buffer: f64,
    pub lwti: LwtiParams,
    pub lwti_level: f64,
    pub volume_ma_length: usize,
    pub require_two_bar_rise: bool,
    /// Require LWTI on the other side of `lwti_level` within this many bars.
    pub lwti_dip_lookback: Option<usize>,
}

impl Default for DonchianLwtiSettings {
    fn default() -> Self {
        Self {
            filter_distance: 24,
            band_shift: 2,
            breakout_buffer: 0.0,
            lwti: LwtiParams::default(),
            lwti_level: 50.0,
            volume_ma_length: 30,
            require_two_bar_rise: false,
            lwti_dip_lookback: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonchianLwtiRules {
    pub period: usize,
    pub settings: DonchianLwtiSettings,
}

impl DonchianLwtiRules {
    pub fn from_row(row: &ParamRow, settings: DonchianLwtiSettings) -> Result<Self, SignalError> {
        if settings.lwti.period == 0 {
            return Err(SignalError::invalid_parameter("lwti.period", "must be positive"));
        }
        if settings.volume_ma_length == 0 {
            return Err(SignalError::invalid_parameter(
                "volume_ma_length",
                "must be positive",
            ));
        }
        if !settings.breakout_buffer.is_finite() {
            return Err(SignalError::invalid_parameter(
                "breakout_buffer",
                "must be finite",
            ));
        }
        Ok(Self {
            period: row.require_usize("period")?,
            settings,
        })
    }

    /// Bars before the shifted bands are defined.
    pub fn band_offset(&self) -> usize {
        self.period.saturating_sub(1)
    }
}

pub struct DonchianLwtiSeries {
    close: Vec<f64>,
    volume: Vec<f64>,
    volume_ma: Vec<f64>,
    upper: Vec<f64>,
    lower: Vec<f64>,
    basis: Vec<f64>,
    lwti: Vec<f64>,
}

impl Rules for DonchianLwtiRules {
    type Series = DonchianLwtiSeries;

    fn indicators(&self, candles: &[Candle]) -> DonchianLwtiSeries {
        let close = PriceField::Close.extract(candles);
        let volume = PriceField::Volume.extract(candles);
        let high = PriceField::High.extract(candles);
        let low = PriceField::Low.extract(candles);

        let channel = donchian(&high, &low, self.period);
        let offset = self.band_offset();
        let shift = self.settings.band_shift;

        DonchianLwtiSeries {
            volume_ma: sma(&volume, self.settings.volume_ma_length),
            upper: shift_and_pad(&channel.upper, offset, shift),
            lower: shift_and_pad(&channel.lower, offset, shift),
            basis: shift_and_pad(&channel.basis, offset, shift),
            lwti: lwti(candles, &self.settings.lwti),
            close,
            volume,
        }
    }

    fn entries(
        &self,
        side: Side,
        series: &DonchianLwtiSeries,
        _candles: &[Candle],
    ) -> Result<Vec<bool>, SignalError> {
        let buffer = self.settings.breakout_buffer;
        let trigger: Vec<f64> = match side {
            Side::Long => series.upper.iter().map(|u| u - buffer).collect(),
            Side::Short => series.lower.iter().map(|l| l + buffer).collect(),
        };
        let breakout = side.beyond(&series.close, &trigger)?;
        let trending = side.beyond_level(&series.lwti, self.settings.lwti_level);
        let volume_up = signal::above(&series.volume, &series.volume_ma)?;
        let advancing = side.advancing(&series.close, 1);

        let mut conditions: Vec<&[bool]> = vec![
            breakout.as_slice(),
            trending.as_slice(),
            volume_up.as_slice(),
            advancing.as_slice(),
        ];

        let advanced_before;
        if self.settings.require_two_bar_rise {
            advanced_before = signal::shift_bools(&advancing, 1);
            conditions.push(advanced_before.as_slice());
        }

        let dipped;
        if let Some(bars) = self.settings.lwti_dip_lookback {
            dipped = signal::held_within(
                &side.stretched(&series.lwti, self.settings.lwti_level),
                bars,
            );
            conditions.push(dipped.as_slice());
        }

        signal::all_of(&conditions)
    }

    fn exits(
        &self,
        side: Side,
        series: &DonchianLwtiSeries,
        _candles: &[Candle],
    ) -> Result<Vec<f64>, SignalError> {
        let back_through_basis = side.behind(&series.close, &series.basis)?;
        signal::mark(&series.close, &back_through_basis)
    }

    fn marker_source<'a>(&self, series: &'a DonchianLwtiSeries) -> &'a [f64] {
        &series.close
    }

    fn diagnostics(&self, _side: Side, series: DonchianLwtiSeries, _candles: &[Candle]) -> SeriesMap {
        let mut map = SeriesMap::new();
        map.insert("close", series.close);
        map.insert("volume", series.volume);
        map.insert("volume_ma", series.volume_ma);
        map.insert("donchian_upper", series.upper);
        map.insert("donchian_lower", series.lower);
        map.insert("donchian_basis", series.basis);
        map.insert("lwti", series.lwti);
        map.insert_level("lwti_level", self.settings.lwti_level);
        map
    }

    fn filter_distance(&self) -> usize {
        self.settings.filter_distance
    }

    fn warmup(&self) -> usize {
        let closes_back = if self.settings.require_two_bar_rise { 2 } else { 1 };
        (self.band_offset() + self.settings.band_shift)
            .max(self.settings.lwti.lookback())
            .max(self.settings.volume_ma_length.saturating_sub(1))
            .max(closes_back)
            + 1
    }

    fn settings_lines(&self, _side: Side) -> Vec<String> {
        vec![
            format!("period= {}", self.period),
            format!("band_shift= {}", self.settings.band_shift),
            format!("lwti_period= {}", self.settings.lwti.period),
        ]
    }

    fn entry_message(&self, side: Side, diagnostics: &SeriesMap, bar: usize) -> String {
        let close = value_at(diagnostics, "close", bar);
        let band = value_at(diagnostics, side.pick("donchian_upper", "donchian_lower"), bar);
        let lwti = value_at(diagnostics, "lwti", bar);
        let volume = value_at(diagnostics, "volume", bar);
        let volume_ma = value_at(diagnostics, "volume_ma", bar);
        let (cmp, band_name) = side.pick((">", "upper"), ("<", "lower"));
        format!(
            "Entry time!!! {side} breakout: close {close} {cmp} {band_name} {band}, \
             lwti {lwti} {cmp} {}, volume {volume} > {volume_ma}",
            self.settings.lwti_level
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ParamGrid;

    fn rules(period: f64, settings: DonchianLwtiSettings) -> DonchianLwtiRules {
        let grid = ParamGrid::new(vec![ParamAxis::integral("period", vec![period])]).unwrap();
        DonchianLwtiRules::from_row(&grid.row(0).unwrap(), settings).unwrap()
    }

    fn flat_series(len: usize) -> DonchianLwtiSeries {
        DonchianLwtiSeries {
            close: vec![100.0; len],
            volume: vec![200.0; len],
            volume_ma: vec![100.0; len],
            upper: vec![105.0; len],
            lower: vec![95.0; len],
            basis: vec![100.0; len],
            lwti: vec![60.0; len],
        }
    }

    fn fired(entries: &[bool]) -> Vec<usize> {
        entries
            .iter()
            .enumerate()
            .filter_map(|(i, &e)| e.then_some(i))
            .collect()
    }

    #[test]
    fn default_warmup() {
        // band: 95 + 2; lwti: 49 + 19 = 68; volume ma: 29
        let r = rules(96.0, DonchianLwtiSettings::default());
        assert_eq!(r.warmup(), 98);
    }

    #[test]
    fn breakout_requires_all_conditions() {
        let r = rules(10.0, DonchianLwtiSettings::default());
        let mut s = flat_series(10);
        s.close[6] = 106.0;
        let candles: Vec<Candle> = Vec::new();
        assert_eq!(fired(&r.entries(Side::Long, &s, &candles).unwrap()), vec![6]);

        s.lwti[6] = 45.0;
        assert!(fired(&r.entries(Side::Long, &s, &candles).unwrap()).is_empty());
        s.lwti[6] = 60.0;

        s.volume[6] = 90.0;
        assert!(fired(&r.entries(Side::Long, &s, &candles).unwrap()).is_empty());
    }

    #[test]
    fn breakout_buffer_lowers_the_trigger() {
        let settings = DonchianLwtiSettings {
            breakout_buffer: 2.0,
            ..DonchianLwtiSettings::default()
        };
        let r = rules(10.0, settings);
        let mut s = flat_series(10);
        s.close[6] = 104.0;
        let candles: Vec<Candle> = Vec::new();
        assert_eq!(fired(&r.entries(Side::Long, &s, &candles).unwrap()), vec![6]);
    }

    #[test]
    fn two_bar_rise_toggle() {
        let settings = DonchianLwtiSettings {
            require_two_bar_rise: true,
            ..DonchianLwtiSettings::default()
        };
        let r = rules(10.0, settings);
        let mut s = flat_series(10);
        s.close[6] = 106.0;
        let candles: Vec<Candle> = Vec::new();
        assert!(fired(&r.entries(Side::Long, &s, &candles).unwrap()).is_empty());
        s.close[5] = 101.0;
        assert_eq!(fired(&r.entries(Side::Long, &s, &candles).unwrap()), vec![6]);
    }

    #[test]
    fn lwti_dip_toggle() {
        let settings = DonchianLwtiSettings {
            lwti_dip_lookback: Some(24),
            ..DonchianLwtiSettings::default()
        };
        let r = rules(10.0, settings);
        let mut s = flat_series(10);
        s.close[6] = 106.0;
        let candles: Vec<Candle> = Vec::new();
        assert!(fired(&r.entries(Side::Long, &s, &candles).unwrap()).is_empty());
        s.lwti[2] = 40.0;
        assert_eq!(fired(&r.entries(Side::Long, &s, &candles).unwrap()), vec![6]);
    }

    #[test]
    fn short_breaks_the_lower_band() {
        let r = rules(10.0, DonchianLwtiSettings::default());
        let mut s = flat_series(10);
        s.lwti = vec![40.0; 10];
        s.close[7] = 94.0;
        let candles: Vec<Candle> = Vec::new();
        assert_eq!(fired(&r.entries(Side::Short, &s, &candles).unwrap()), vec![7]);
        assert!(fired(&r.entries(Side::Long, &s, &candles).unwrap()).is_empty());
    }

    #[test]
    fn exits_at_close_through_basis() {
        let r = rules(10.0, DonchianLwtiSettings::default());
        let mut s = flat_series(5);
        s.close = vec![101.0, 99.0, 100.0, 98.5, f64::NAN];
        let candles: Vec<Candle> = Vec::new();
        let long = r.exits(Side::Long, &s, &candles).unwrap();
        assert!(long[0].is_nan());
        assert_eq!(long[1], 99.0);
        assert!(long[2].is_nan());
        assert_eq!(long[3], 98.5);
        assert!(long[4].is_nan());
        let short = r.exits(Side::Short, &s, &candles).unwrap();
        assert_eq!(short[0], 101.0);
        assert!(short[1].is_nan());
    }

    #[test]
    fn zero_volume_ma_length_rejected() {
        let grid = ParamGrid::new(default_axes()).unwrap();
        let settings = DonchianLwtiSettings {
            volume_ma_length: 0,
            ..DonchianLwtiSettings::default()
        };
        assert!(DonchianLwtiRules::from_row(&grid.row(0).unwrap(), settings).is_err());
    }
}
