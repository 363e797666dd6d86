//! MACD crossover confirmed by a recent RSI extreme.
//!
//! Long entry, all on the same bar:
//! - MACD line crosses above its signal line
//! - RSI was below `rsi_is_below` at some bar among the `rsi_lookback` bars
//!   before this one
//! - volume above its simple average
//! - some close among the `ema_lookback` bars before this one above the
//!   current EMA
//!
//! Both lookbacks exclude the current bar and stay false until a full window
//! of prior bars exists. The RSI lookback reads the unrounded RSI.
//!
//! Optional: MACD still below `macd_below`, and no earlier crossover in the
//! same direction within `recent_cross_exclusion` bars. Short mirrors every
//! comparison. No exit rule.

use serde::{Deserialize, Serialize};

use crate::diagnostics::SeriesMap;
use crate::domain::{Candle, PriceField};
use crate::error::SignalError;
use crate::grid::{ParamAxis, ParamRow};
use crate::indicators::{ema, macd, round_to, rsi, sma, Macd};
use crate::signal;

use super::{value_at, Rules, Side};

pub const AXES: [&str; 8] = [
    "rsi_is_above",
    "rsi_is_below",
    "rsi_length",
    "ema_length",
    "fast_length",
    "macd_below",
    "signal_smoothing",
    "slow_length",
];

pub fn default_axes() -> Vec<ParamAxis> {
    vec![
        ParamAxis::real("rsi_is_above", vec![70.0]),
        ParamAxis::real("rsi_is_below", vec![30.0]),
        ParamAxis::integral("rsi_length", vec![14.0]),
        ParamAxis::integral("ema_length", vec![200.0]),
        ParamAxis::integral("fast_length", vec![12.0]),
        ParamAxis::real("macd_below", vec![0.0]),
        ParamAxis::integral("signal_smoothing", vec![9.0]),
        ParamAxis::integral("slow_length", vec![26.0]),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdRsiSettings {
    pub filter_distance: usize,
    /// Rounding of the RSI shown in diagnostics and entry messages.
    pub rsi_decimals: u32,
    pub rsi_lookback: usize,
    pub volume_ma_length: usize,
    pub ema_lookback: usize,
    pub require_macd_beyond_level: bool,
    /// Skip an entry when a same-direction crossover happened in this many prior bars.
    pub recent_cross_exclusion: Option<usize>,
}

impl Default for MacdRsiSettings {
    fn default() -> Self {
        Self {
            filter_distance: 0,
            rsi_decimals: 1,
            rsi_lookback: 10,
            volume_ma_length: 30,
            ema_lookback: 48,
            require_macd_beyond_level: false,
            recent_cross_exclusion: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdRsiRules {
    pub rsi_is_above: f64,
    pub rsi_is_below: f64,
    pub rsi_length: usize,
    pub ema_length: usize,
    pub fast_length: usize,
    pub macd_below: f64,
    pub signal_smoothing: usize,
    pub slow_length: usize,
    pub settings: MacdRsiSettings,
}

impl MacdRsiRules {
    pub fn from_row(row: &ParamRow, settings: MacdRsiSettings) -> Result<Self, SignalError> {
        if settings.volume_ma_length == 0 {
            return Err(SignalError::invalid_parameter(
                "volume_ma_length",
                "must be positive",
            ));
        }
        Ok(Self {
            rsi_is_above: row.require("rsi_is_above")?,
            rsi_is_below: row.require("rsi_is_below")?,
            rsi_length: row.require_usize("rsi_length")?,
            ema_length: row.require_usize("ema_length")?,
            fast_length: row.require_usize("fast_length")?,
            macd_below: row.require("macd_below")?,
            signal_smoothing: row.require_usize("signal_smoothing")?,
            slow_length: row.require_usize("slow_length")?,
            settings,
        })
    }

    fn rsi_threshold(&self, side: Side) -> f64 {
        side.pick(self.rsi_is_below, self.rsi_is_above)
    }
}

pub struct MacdRsiSeries {
    close: Vec<f64>,
    volume: Vec<f64>,
    volume_ma: Vec<f64>,
    rsi: Vec<f64>,
    macd: Macd,
    ema: Vec<f64>,
}

impl Rules for MacdRsiRules {
    type Series = MacdRsiSeries;

    fn indicators(&self, candles: &[Candle]) -> MacdRsiSeries {
        let close = PriceField::Close.extract(candles);
        let volume = PriceField::Volume.extract(candles);
        let volume_ma = sma(&volume, self.settings.volume_ma_length);
        let rsi = rsi(&close, self.rsi_length);
        let macd = macd(&close, self.fast_length, self.slow_length, self.signal_smoothing);
        let ema = ema(&close, self.ema_length);
        MacdRsiSeries {
            close,
            volume,
            volume_ma,
            rsi,
            macd,
            ema,
        }
    }

    fn entries(
        &self,
        side: Side,
        series: &MacdRsiSeries,
        _candles: &[Candle],
    ) -> Result<Vec<bool>, SignalError> {
        let crossed = side.crossed(&series.macd.line, &series.macd.signal)?;
        let rsi_extreme = signal::held_before(
            &side.stretched(&series.rsi, self.rsi_threshold(side)),
            self.settings.rsi_lookback,
        );
        let volume_up = signal::above(&series.volume, &series.volume_ma)?;
        let trend_seen =
            side.beyond_before(&series.close, &series.ema, self.settings.ema_lookback)?;

        let mut conditions: Vec<&[bool]> = vec![
            crossed.as_slice(),
            rsi_extreme.as_slice(),
            volume_up.as_slice(),
            trend_seen.as_slice(),
        ];

        let macd_stretched;
        if self.settings.require_macd_beyond_level {
            macd_stretched = side.stretched(&series.macd.line, self.macd_below);
            conditions.push(macd_stretched.as_slice());
        }

        let no_recent_cross: Vec<bool>;
        if let Some(bars) = self.settings.recent_cross_exclusion {
            no_recent_cross = signal::held_within(&signal::shift_bools(&crossed, 1), bars)
                .into_iter()
                .map(|seen| !seen)
                .collect();
            conditions.push(no_recent_cross.as_slice());
        }

        signal::all_of(&conditions)
    }

    fn marker_source<'a>(&self, series: &'a MacdRsiSeries) -> &'a [f64] {
        &series.macd.line
    }

    fn diagnostics(&self, side: Side, series: MacdRsiSeries, _candles: &[Candle]) -> SeriesMap {
        let mut map = SeriesMap::new();
        map.insert("close", series.close);
        map.insert("volume", series.volume);
        map.insert("volume_ma", series.volume_ma);
        map.insert("rsi", round_to(&series.rsi, self.settings.rsi_decimals));
        map.insert("ema", series.ema);
        map.insert("macd", series.macd.line);
        map.insert("macd_signal", series.macd.signal);
        map.insert("macd_histogram", series.macd.histogram);
        map.insert_level(
            side.pick("rsi_is_below", "rsi_is_above"),
            self.rsi_threshold(side),
        );
        if self.settings.require_macd_beyond_level {
            map.insert_level("macd_below", self.macd_below);
        }
        map
    }

    fn filter_distance(&self) -> usize {
        self.settings.filter_distance
    }

    fn warmup(&self) -> usize {
        // the crossover reads the previous bar of the signal line
        let cross = Macd::lookback(self.fast_length, self.slow_length, self.signal_smoothing) + 1;
        cross
            .max(self.ema_length.saturating_sub(1))
            .max(self.settings.volume_ma_length.saturating_sub(1))
            .max(self.rsi_length)
            .max(self.settings.rsi_lookback)
            .max(self.settings.ema_lookback)
            + 1
    }

    fn settings_lines(&self, side: Side) -> Vec<String> {
        let mut lines = vec![
            format!("ema_length= {}", self.ema_length),
            format!("fast_length= {}", self.fast_length),
            format!("macd_below= {}", self.macd_below),
            format!("signal_smoothing= {}", self.signal_smoothing),
            format!("slow_length= {}", self.slow_length),
            format!("rsi_length= {}", self.rsi_length),
        ];
        lines.push(match side {
            Side::Long => format!("rsi_is_below= {}", self.rsi_is_below),
            Side::Short => format!("rsi_is_above= {}", self.rsi_is_above),
        });
        lines
    }

    fn entry_message(&self, side: Side, diagnostics: &SeriesMap, bar: usize) -> String {
        let line = value_at(diagnostics, "macd", bar);
        let signal_line = value_at(diagnostics, "macd_signal", bar);
        let rsi = value_at(diagnostics, "rsi", bar);
        let close = value_at(diagnostics, "close", bar);
        let ema = value_at(diagnostics, "ema", bar);
        let direction = side.pick("above", "below");
        format!(
            "Entry time!!! macd {line} crossed {direction} signal {signal_line}, \
             rsi {rsi} (level {}), close {close}, ema {ema}",
            self.rsi_threshold(side)
        )
    }
}
