//! RSI reversal: an oversold (overbought) RSI that has just turned.
//!
//! Long fires when RSI is below `rsi_is_below`, fell on the previous bar and
//! rises on this one. Short is the mirror with `rsi_is_above`. RSI is rounded
//! before comparison so threshold checks are stable against float noise.
//! No exit rule.

use serde::{Deserialize, Serialize};

use crate::diagnostics::SeriesMap;
use crate::domain::{Candle, PriceField};
use crate::error::SignalError;
use crate::grid::{ParamAxis, ParamRow};
use crate::indicators::{rsi, round_to};
use crate::signal;

use super::{value_at, Rules, Side};

pub const AXES: [&str; 3] = ["rsi_is_above", "rsi_is_below", "rsi_length"];

pub fn default_axes() -> Vec<ParamAxis> {
    vec![
        ParamAxis::real("rsi_is_above", vec![70.0]),
        ParamAxis::real("rsi_is_below", vec![30.0]),
        ParamAxis::integral("rsi_length", vec![14.0]),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiReversalSettings {
    pub filter_distance: usize,
    pub rsi_decimals: u32,
}

impl Default for RsiReversalSettings {
    fn default() -> Self {
        Self {
            filter_distance: 0,
            rsi_decimals: 1,
        }
    }
}

/// One grid row bound to the family settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiReversalRules {
    pub rsi_is_above: f64,
    pub rsi_is_below: f64,
    pub rsi_length: usize,
    pub settings: RsiReversalSettings,
}

impl RsiReversalRules {
    pub fn from_row(row: &ParamRow, settings: RsiReversalSettings) -> Result<Self, SignalError> {
        Ok(Self {
            rsi_is_above: row.require("rsi_is_above")?,
            rsi_is_below: row.require("rsi_is_below")?,
            rsi_length: row.require_usize("rsi_length")?,
            settings,
        })
    }

    fn threshold(&self, side: Side) -> f64 {
        side.pick(self.rsi_is_below, self.rsi_is_above)
    }
}

pub struct RsiReversalSeries {
    rsi: Vec<f64>,
}

impl Rules for RsiReversalRules {
    type Series = RsiReversalSeries;

    fn indicators(&self, candles: &[Candle]) -> RsiReversalSeries {
        let raw = rsi(&PriceField::Close.extract(candles), self.rsi_length);
        RsiReversalSeries {
            rsi: round_to(&raw, self.settings.rsi_decimals),
        }
    }

    fn entries(
        &self,
        side: Side,
        series: &RsiReversalSeries,
        _candles: &[Candle],
    ) -> Result<Vec<bool>, SignalError> {
        let stretched = side.stretched(&series.rsi, self.threshold(side));
        let turned = side.turn(&series.rsi)?;
        signal::all_of(&[&stretched, &turned])
    }

    fn marker_source<'a>(&self, series: &'a RsiReversalSeries) -> &'a [f64] {
        &series.rsi
    }

    fn diagnostics(&self, side: Side, series: RsiReversalSeries, _candles: &[Candle]) -> SeriesMap {
        let mut map = SeriesMap::new();
        map.insert("rsi", series.rsi);
        map.insert_level(side.pick("rsi_is_below", "rsi_is_above"), self.threshold(side));
        map
    }

    fn filter_distance(&self) -> usize {
        self.settings.filter_distance
    }

    /// RSI is defined from `rsi_length`; the turn test reads two bars back.
    fn warmup(&self) -> usize {
        self.rsi_length + 3
    }

    fn settings_lines(&self, side: Side) -> Vec<String> {
        let mut lines = vec![format!("rsi_length= {}", self.rsi_length)];
        lines.push(match side {
            Side::Long => format!("rsi_is_below= {}", self.rsi_is_below),
            Side::Short => format!("rsi_is_above= {}", self.rsi_is_above),
        });
        lines
    }

    fn entry_message(&self, side: Side, diagnostics: &SeriesMap, bar: usize) -> String {
        let (two_back, one_back) = match (bar.checked_sub(2), bar.checked_sub(1)) {
            (Some(a), Some(b)) => (value_at(diagnostics, "rsi", a), value_at(diagnostics, "rsi", b)),
            _ => (f64::NAN, f64::NAN),
        };
        let now = value_at(diagnostics, "rsi", bar);
        let level = self.threshold(side);
        match side {
            Side::Long => format!(
                "Entry time!!! {two_back} > {one_back} < {now} and {now} < {level}"
            ),
            Side::Short => format!(
                "Entry time!!! {two_back} < {one_back} > {now} and {now} > {level}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ParamGrid;
    use crate::indicators::make_candles;

    fn rules() -> RsiReversalRules {
        let grid = ParamGrid::new(default_axes()).unwrap();
        RsiReversalRules::from_row(&grid.row(0).unwrap(), RsiReversalSettings::default()).unwrap()
    }

    #[test]
    fn binds_default_row() {
        let r = rules();
        assert_eq!(r.rsi_is_above, 70.0);
        assert_eq!(r.rsi_is_below, 30.0);
        assert_eq!(r.rsi_length, 14);
        assert_eq!(r.warmup(), 17);
    }

    #[test]
    fn rsi_is_rounded_to_one_decimal() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.9).sin() * 3.0).collect();
        let series = rules().indicators(&make_candles(&closes));
        for v in series.rsi.iter().filter(|v| !v.is_nan()) {
            assert!(((v * 10.0).round() - v * 10.0).abs() < 1e-9, "not rounded: {v}");
        }
    }

    #[test]
    fn long_fires_only_on_oversold_trough() {
        let series = RsiReversalSeries {
            rsi: vec![f64::NAN, 35.0, 28.0, 25.0, 27.0, 26.0, 29.0, 40.0, 31.0, 33.0],
        };
        let candles = make_candles(&[1.0; 10]);
        let entries = rules().entries(Side::Long, &series, &candles).unwrap();
        // 4: 28 > 25 < 27; 6: 27 > 26 < 29; 9: 40 > 31 < 33 but 33 is not below 30
        let fired: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter_map(|(i, &e)| e.then_some(i))
            .collect();
        assert_eq!(fired, vec![4, 6]);
    }

    #[test]
    fn short_fires_only_on_overbought_peak() {
        let series = RsiReversalSeries {
            rsi: vec![60.0, 72.0, 75.0, 73.0, 74.0, 65.0],
        };
        let candles = make_candles(&[1.0; 6]);
        let entries = rules().entries(Side::Short, &series, &candles).unwrap();
        assert_eq!(entries, vec![false, false, false, true, false, false]);
    }

    #[test]
    fn entry_message_mirrors_side() {
        let mut diagnostics = SeriesMap::new();
        diagnostics.insert("rsi", vec![28.0, 25.0, 27.0]);
        let msg = rules().entry_message(Side::Long, &diagnostics, 2);
        assert_eq!(msg, "Entry time!!! 28 > 25 < 27 and 27 < 30");
    }
}
