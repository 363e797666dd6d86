//! Strategy variants: one parameter-grid row bound to a rule family and a side.
//!
//! A `Strategy` is selected once at construction from a `RuleFamily` tag and a
//! `Side`. Every family runs through the same pipeline:
//!
//! 1. candle validation
//! 2. indicator series (pure, NaN warm-up)
//! 3. entry conditions fused with AND
//! 4. debounce with the family's `filter_distance`
//! 5. exit prices (undefined where no exit rule fires)
//!
//! Each call recomputes everything from the candles it is given. Nothing is
//! carried between calls except the `StrategyState` the caller holds.

pub mod donchian_lwti;
pub mod macd_rsi;
pub mod rsi_reversal;
pub mod side;

pub use donchian_lwti::{DonchianLwtiRules, DonchianLwtiSettings};
pub use macd_rsi::{MacdRsiRules, MacdRsiSettings};
pub use rsi_reversal::{RsiReversalRules, RsiReversalSettings};
pub use side::Side;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::diagnostics::{EvalContext, SeriesMap};
use crate::domain::{validate_candles, Candle};
use crate::error::{SignalError, Stage};
use crate::grid::{ParamAxis, ParamGrid, ParamRow};
use crate::signal;

// ─── Rule family contract ────────────────────────────────────────────

/// The per-family half of the pipeline. Implemented by each bound rule set;
/// the long and short forms are the same implementation with a different `Side`.
pub(crate) trait Rules {
    type Series;

    fn indicators(&self, candles: &[Candle]) -> Self::Series;

    /// Raw (undebounced) entry signal, aligned with `candles`.
    fn entries(
        &self,
        side: Side,
        series: &Self::Series,
        candles: &[Candle],
    ) -> Result<Vec<bool>, SignalError>;

    fn exits(
        &self,
        _side: Side,
        _series: &Self::Series,
        candles: &[Candle],
    ) -> Result<Vec<f64>, SignalError> {
        Ok(vec![f64::NAN; candles.len()])
    }

    /// Series whose values are plotted at accepted entries.
    fn marker_source<'a>(&self, series: &'a Self::Series) -> &'a [f64];

    fn diagnostics(&self, side: Side, series: Self::Series, candles: &[Candle]) -> SeriesMap;

    fn filter_distance(&self) -> usize;

    /// Minimum candle count for the final bar's decision to be computable.
    fn warmup(&self) -> usize;

    fn settings_lines(&self, side: Side) -> Vec<String>;

    fn entry_message(&self, side: Side, diagnostics: &SeriesMap, bar: usize) -> String;
}

pub(crate) fn value_at(diagnostics: &SeriesMap, name: &str, bar: usize) -> f64 {
    diagnostics.get(name, bar).unwrap_or(f64::NAN)
}

struct PipelineOutput {
    entries: Vec<bool>,
    exit_prices: Vec<f64>,
    diagnostics: SeriesMap,
}

fn run_pipeline<R: Rules>(
    rules: &R,
    side: Side,
    candles: &[Candle],
    strategy: &str,
    row_index: usize,
) -> Result<PipelineOutput, SignalError> {
    let tag = |stage: Stage| move |e: SignalError| e.in_stage(strategy, row_index, stage);

    let series = rules.indicators(candles);

    let raw = rules
        .entries(side, &series, candles)
        .map_err(tag(Stage::Conditions))?;

    if raw.len() != candles.len() {
        return Err(SignalError::LengthMismatch {
            expected: candles.len(),
            actual: raw.len(),
        })
        .map_err(tag(Stage::Debounce));
    }
    let entries = signal::debounce(&raw, rules.filter_distance());

    let exit_prices = rules
        .exits(side, &series, candles)
        .map_err(tag(Stage::Exits))?;

    let markers = signal::mark(rules.marker_source(&series), &entries)
        .map_err(tag(Stage::Conditions))?;
    let mut diagnostics = rules.diagnostics(side, series, candles);
    diagnostics.insert("entry_markers", markers);

    debug!(
        strategy,
        row_index,
        raw = raw.iter().filter(|&&s| s).count(),
        accepted = entries.iter().filter(|&&s| s).count(),
        "signals debounced"
    );

    Ok(PipelineOutput {
        entries,
        exit_prices,
        diagnostics,
    })
}

// ─── Family tag ──────────────────────────────────────────────────────

/// Rule family plus its non-grid settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum RuleFamily {
    RsiReversal(RsiReversalSettings),
    MacdRsi(MacdRsiSettings),
    DonchianLwti(DonchianLwtiSettings),
}

impl RuleFamily {
    pub fn rsi_reversal() -> Self {
        RuleFamily::RsiReversal(RsiReversalSettings::default())
    }

    pub fn macd_rsi() -> Self {
        RuleFamily::MacdRsi(MacdRsiSettings::default())
    }

    pub fn donchian_lwti() -> Self {
        RuleFamily::DonchianLwti(DonchianLwtiSettings::default())
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleFamily::RsiReversal(_) => "rsi_reversal",
            RuleFamily::MacdRsi(_) => "macd_rsi",
            RuleFamily::DonchianLwti(_) => "donchian_lwti",
        }
    }

    /// Grid axes this family reads, in declaration order.
    pub fn axis_names(&self) -> &'static [&'static str] {
        match self {
            RuleFamily::RsiReversal(_) => &rsi_reversal::AXES,
            RuleFamily::MacdRsi(_) => &macd_rsi::AXES,
            RuleFamily::DonchianLwti(_) => &donchian_lwti::AXES,
        }
    }

    /// Single-valued axes holding the family defaults.
    pub fn default_axes(&self) -> Vec<ParamAxis> {
        match self {
            RuleFamily::RsiReversal(_) => rsi_reversal::default_axes(),
            RuleFamily::MacdRsi(_) => macd_rsi::default_axes(),
            RuleFamily::DonchianLwti(_) => donchian_lwti::default_axes(),
        }
    }

    fn bind(&self, row: &ParamRow) -> Result<BoundRules, SignalError> {
        Ok(match self {
            RuleFamily::RsiReversal(s) => {
                BoundRules::RsiReversal(RsiReversalRules::from_row(row, *s)?)
            }
            RuleFamily::MacdRsi(s) => BoundRules::MacdRsi(MacdRsiRules::from_row(row, *s)?),
            RuleFamily::DonchianLwti(s) => {
                BoundRules::DonchianLwti(DonchianLwtiRules::from_row(row, *s)?)
            }
        })
    }
}

impl fmt::Display for RuleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A family's rules with every grid value resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum BoundRules {
    RsiReversal(RsiReversalRules),
    MacdRsi(MacdRsiRules),
    DonchianLwti(DonchianLwtiRules),
}

macro_rules! with_rules {
    ($bound:expr, $r:ident => $body:expr) => {
        match $bound {
            BoundRules::RsiReversal($r) => $body,
            BoundRules::MacdRsi($r) => $body,
            BoundRules::DonchianLwti($r) => $body,
        }
    };
}

// ─── State and output ────────────────────────────────────────────────

/// The selected row and its resolved rules. Created by `configure`,
/// replaced (never merged) by the next call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyState {
    pub row: ParamRow,
    pub rules: BoundRules,
}

impl StrategyState {
    pub fn row_index(&self) -> usize {
        self.row.index
    }
}

/// Output of one batch evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub state: StrategyState,
    pub entries: Vec<bool>,
    /// Exit price per bar; NaN where no exit rule fired.
    pub exit_prices: Vec<f64>,
    pub diagnostics: SeriesMap,
}

impl Evaluation {
    pub fn entry_indices(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, &e)| e.then_some(i))
            .collect()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.iter().filter(|&&e| e).count()
    }

    pub fn exit_count(&self) -> usize {
        self.exit_prices.iter().filter(|p| !p.is_nan()).count()
    }
}

// ─── Strategy ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    family: RuleFamily,
    side: Side,
    grid: ParamGrid,
}

impl Strategy {
    /// Fails if the grid lacks an axis the family reads, or holds it with
    /// the wrong kind (a real-valued axis where a length is expected).
    pub fn new(family: RuleFamily, side: Side, grid: ParamGrid) -> Result<Self, SignalError> {
        for expected in family.default_axes() {
            let Some(axis) = grid.axis(expected.name()) else {
                return Err(SignalError::invalid_parameter(
                    expected.name(),
                    format!("required by {family} but missing from the grid"),
                ));
            };
            if axis.kind() != expected.kind() {
                return Err(SignalError::invalid_parameter(
                    expected.name(),
                    format!(
                        "{family} expects a {:?} axis, got {:?}",
                        expected.kind(),
                        axis.kind()
                    ),
                ));
            }
        }
        Ok(Self { family, side, grid })
    }

    /// One-row grid with the family's default values.
    pub fn with_default_grid(family: RuleFamily, side: Side) -> Result<Self, SignalError> {
        let grid = ParamGrid::new(family.default_axes())?;
        Self::new(family, side, grid)
    }

    pub fn family(&self) -> &RuleFamily {
        &self.family
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn grid(&self) -> &ParamGrid {
        &self.grid
    }

    /// e.g. "donchian_lwti_long"
    pub fn name(&self) -> String {
        format!("{}_{}", self.family.name(), self.side)
    }

    pub fn configure(&self, row_index: usize) -> Result<StrategyState, SignalError> {
        let row = self.grid.row(row_index)?;
        let rules = self.family.bind(&row)?;
        Ok(StrategyState { row, rules })
    }

    /// Configure `row_index` and evaluate it over the full candle history.
    pub fn evaluate_batch(
        &self,
        candles: &[Candle],
        row_index: usize,
        ctx: &EvalContext<'_>,
    ) -> Result<Evaluation, SignalError> {
        let state = self
            .configure(row_index)
            .map_err(|e| e.in_stage(&self.name(), row_index, Stage::Configure))?;
        ctx.emit(&self.describe_settings(&state));
        self.evaluate_state(candles, &state, ctx)
    }

    /// Evaluate an already configured state over the full candle history.
    pub fn evaluate_state(
        &self,
        candles: &[Candle],
        state: &StrategyState,
        _ctx: &EvalContext<'_>,
    ) -> Result<Evaluation, SignalError> {
        let name = self.name();
        let row_index = state.row_index();
        validate_candles(candles).map_err(|e| e.in_stage(&name, row_index, Stage::Validation))?;

        let out = with_rules!(&state.rules, r => run_pipeline(r, self.side, candles, &name, row_index))?;

        Ok(Evaluation {
            state: state.clone(),
            entries: out.entries,
            exit_prices: out.exit_prices,
            diagnostics: out.diagnostics,
        })
    }

    /// Decision at the final candle only.
    ///
    /// Runs the batch rules over the trailing history, so the answer always
    /// equals the last element of `evaluate_batch(...).entries` for the same
    /// candles. Fails with `InsufficientHistory` below `warmup_bars`.
    pub fn evaluate_latest(
        &self,
        candles: &[Candle],
        state: &StrategyState,
        ctx: &EvalContext<'_>,
    ) -> Result<bool, SignalError> {
        let required = self.warmup_bars(state);
        if candles.len() < required {
            return Err(SignalError::InsufficientHistory {
                bars: candles.len(),
                required,
            }
            .in_stage(&self.name(), state.row_index(), Stage::Validation));
        }

        let evaluation = self.evaluate_state(candles, state, ctx)?;
        let last = candles.len() - 1;
        let fired = evaluation.entries.get(last).copied().unwrap_or(false);
        if fired {
            ctx.emit(&self.entry_message(&evaluation, last));
        } else {
            debug!(strategy = %self.name(), bar = last, "no entry");
        }
        Ok(fired)
    }

    /// Settings of the bound row: the grid values, then family settings.
    pub fn describe_settings(&self, state: &StrategyState) -> String {
        let mut text = format!("{} {}\n{}", self.family, self.side, state.row);
        let extra = with_rules!(&state.rules, r => r.settings_lines(self.side));
        for line in extra {
            text.push('\n');
            text.push_str(&line);
        }
        text
    }

    /// Human-readable reason for the entry at `bar`.
    pub fn entry_message(&self, evaluation: &Evaluation, bar: usize) -> String {
        with_rules!(&evaluation.state.rules, r => r.entry_message(self.side, &evaluation.diagnostics, bar))
    }

    pub fn warmup_bars(&self, state: &StrategyState) -> usize {
        with_rules!(&state.rules, r => r.warmup())
    }

    /// Filter distance the bound rules debounce with.
    pub fn filter_distance(&self, state: &StrategyState) -> usize {
        with_rules!(&state.rules, r => r.filter_distance())
    }
}
