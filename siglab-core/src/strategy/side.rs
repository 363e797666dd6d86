//! Trade direction and the mirrored condition primitives built on it.
//!
//! Every rule family is written once against these helpers; `Side::Long`
//! and `Side::Short` pick the mirror-image comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SignalError;
use crate::signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }

    /// Pick the long or short flavour of a setting.
    pub fn pick<T>(self, long: T, short: T) -> T {
        match self {
            Side::Long => long,
            Side::Short => short,
        }
    }

    /// Stretched against the trade: below `level` for long (oversold),
    /// above it for short (overbought).
    pub fn stretched(self, values: &[f64], level: f64) -> Vec<bool> {
        match self {
            Side::Long => signal::below_level(values, level),
            Side::Short => signal::above_level(values, level),
        }
    }

    /// On the trade's side of `level`: above for long, below for short.
    pub fn beyond_level(self, values: &[f64], level: f64) -> Vec<bool> {
        match self {
            Side::Long => signal::above_level(values, level),
            Side::Short => signal::below_level(values, level),
        }
    }

    /// `a` on the trade's side of `b`.
    pub fn beyond(self, a: &[f64], b: &[f64]) -> Result<Vec<bool>, SignalError> {
        match self {
            Side::Long => signal::above(a, b),
            Side::Short => signal::below(a, b),
        }
    }

    /// `a` on the losing side of `b`.
    pub fn behind(self, a: &[f64], b: &[f64]) -> Result<Vec<bool>, SignalError> {
        self.opposite().beyond(a, b)
    }

    /// Moved in the trade's direction versus `bars` ago.
    pub fn advancing(self, values: &[f64], bars: usize) -> Vec<bool> {
        match self {
            Side::Long => signal::rising(values, bars),
            Side::Short => signal::falling(values, bars),
        }
    }

    /// Turning point: the previous bar moved against the trade and this bar
    /// moves with it (a trough for long, a peak for short).
    pub fn turn(self, values: &[f64]) -> Result<Vec<bool>, SignalError> {
        let against_before = signal::shift_bools(&self.opposite().advancing(values, 1), 1);
        let with_now = self.advancing(values, 1);
        signal::all_of(&[&against_before, &with_now])
    }

    /// `a` crossed `b` in the trade's direction on this bar.
    pub fn crossed(self, a: &[f64], b: &[f64]) -> Result<Vec<bool>, SignalError> {
        match self {
            Side::Long => signal::crossed_above(a, b),
            Side::Short => signal::crossed_below(a, b),
        }
    }

    /// Some value in the `window` bars before `i` sits on the trade's side
    /// of `reference[i]`. The current bar is not part of the window.
    pub fn beyond_before(
        self,
        values: &[f64],
        reference: &[f64],
        window: usize,
    ) -> Result<Vec<bool>, SignalError> {
        match self {
            Side::Long => signal::exceeded_before(values, reference, window),
            Side::Short => signal::undercut_before(values, reference, window),
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_finds_trough_and_peak() {
        let rsi = [40.0, 35.0, 30.0, 32.0, 31.0, 29.0, 33.0];
        assert_eq!(
            Side::Long.turn(&rsi).unwrap(),
            vec![false, false, false, true, false, false, true]
        );
        assert_eq!(
            Side::Short.turn(&rsi).unwrap(),
            vec![false, false, false, false, true, false, false]
        );
    }

    #[test]
    fn stretched_mirrors() {
        let rsi = [20.0, 50.0, 80.0];
        assert_eq!(Side::Long.stretched(&rsi, 30.0), vec![true, false, false]);
        assert_eq!(Side::Short.stretched(&rsi, 70.0), vec![false, false, true]);
    }

    #[test]
    fn beyond_and_behind_are_opposites_off_ties() {
        let close = [10.0, 12.0, 11.0];
        let basis = [11.0, 11.0, 11.0];
        assert_eq!(Side::Long.beyond(&close, &basis).unwrap(), vec![false, true, false]);
        assert_eq!(Side::Long.behind(&close, &basis).unwrap(), vec![true, false, false]);
        assert_eq!(Side::Short.behind(&close, &basis).unwrap(), vec![false, true, false]);
    }

    #[test]
    fn beyond_before_mirrors() {
        let close = [12.0, 10.0, 10.0, 10.0];
        let ema = [11.0; 4];
        assert_eq!(
            Side::Long.beyond_before(&close, &ema, 2).unwrap(),
            vec![false, false, true, false]
        );
        assert_eq!(
            Side::Short.beyond_before(&close, &ema, 2).unwrap(),
            vec![false, false, true, true]
        );
    }

    #[test]
    fn pick_and_display() {
        assert_eq!(Side::Long.pick(30.0, 70.0), 30.0);
        assert_eq!(Side::Short.pick(30.0, 70.0), 70.0);
        assert_eq!(Side::Short.to_string(), "short");
    }
}
