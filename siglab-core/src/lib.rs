//! siglab core: technical-signal detection over OHLCV candles.
//!
//! - Parameter grid: Cartesian product of named axes, rows addressed by index
//! - Indicator library: pure NaN-warm-up transforms (RSI, SMA/EMA, MACD,
//!   Donchian, LWTI, ATR)
//! - Condition fusion with lookback relaxation, and a signal debouncer
//! - Strategy variants: three rule families, each in a long and a short form
//!
//! Everything here is synchronous and side-effect free apart from the
//! diagnostics sink passed into each evaluation.

pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod grid;
pub mod indicators;
pub mod signal;
pub mod strategy;

pub use diagnostics::{DiagnosticsSink, EvalContext, MemorySink, NullSink, SeriesMap, TracingSink};
pub use domain::{validate_candles, Candle, PriceField};
pub use error::{SignalError, Stage};
pub use grid::{arange, AxisKind, ParamAxis, ParamGrid, ParamRow};
pub use strategy::{Evaluation, RuleFamily, Side, Strategy, StrategyState};
