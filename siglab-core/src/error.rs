//! Typed errors for grid construction, candle validation and strategy evaluation.
//!
//! Undefined (NaN) indicator values are not errors: they are the expected
//! warm-up path and make every comparison evaluate to `false`. The variants
//! below are hard failures that abort the current evaluation.

use std::fmt;
use thiserror::Error;

/// Pipeline stage an evaluation failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configure,
    Validation,
    Conditions,
    Debounce,
    Exits,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configure => "configure",
            Stage::Validation => "candle validation",
            Stage::Conditions => "conditions",
            Stage::Debounce => "debounce",
            Stage::Exits => "exit rules",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("invalid parameter '{axis}': {reason}")]
    InvalidParameter { axis: String, reason: String },

    #[error("parameter row {index} out of range (grid has {cardinality} rows)")]
    ParameterIndexOutOfRange { index: usize, cardinality: usize },

    #[error("insufficient history: have {bars} candles, need at least {required}")]
    InsufficientHistory { bars: usize, required: usize },

    #[error("invalid candle at index {index}: {reason}")]
    InvalidCandles { index: usize, reason: String },

    #[error("series length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("{strategy} row {row_index} failed during {stage}: {source}")]
    Evaluation {
        strategy: String,
        row_index: usize,
        stage: Stage,
        #[source]
        source: Box<SignalError>,
    },
}

impl SignalError {
    pub(crate) fn invalid_parameter(axis: impl Into<String>, reason: impl Into<String>) -> Self {
        SignalError::InvalidParameter {
            axis: axis.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an error with the strategy, parameter row and stage it came from.
    ///
    /// Already-wrapped errors are returned unchanged so the innermost context wins.
    pub fn in_stage(self, strategy: &str, row_index: usize, stage: Stage) -> Self {
        match self {
            wrapped @ SignalError::Evaluation { .. } => wrapped,
            other => SignalError::Evaluation {
                strategy: strategy.to_string(),
                row_index,
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping `Evaluation` context layers.
    pub fn root(&self) -> &SignalError {
        match self {
            SignalError::Evaluation { source, .. } => source.root(),
            other => other,
        }
    }
}
