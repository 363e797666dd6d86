//! Parameter grid: Cartesian product of named parameter axes.
//!
//! Rows are addressed by a single integer index. Axes keep their declaration
//! order and later axes vary fastest, so the same axis arrays always map the
//! same index to the same row. Sweeps can therefore be split, resumed or
//! distributed by index alone.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::SignalError;

/// Whether an axis holds whole numbers (lengths, periods) or real values (thresholds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisKind {
    Integral,
    Real,
}

/// One named, ordered dimension of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamAxis {
    name: String,
    kind: AxisKind,
    values: Vec<f64>,
}

impl ParamAxis {
    /// Integral axis. Values are truncated toward zero and must be positive.
    pub fn integral(name: impl Into<String>, values: impl Into<Vec<f64>>) -> Self {
        Self {
            name: name.into(),
            kind: AxisKind::Integral,
            values: values.into(),
        }
    }

    pub fn real(name: impl Into<String>, values: impl Into<Vec<f64>>) -> Self {
        Self {
            name: name.into(),
            kind: AxisKind::Real,
            values: values.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AxisKind {
        self.kind
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn validated(mut self) -> Result<Self, SignalError> {
        if self.values.is_empty() {
            return Err(SignalError::invalid_parameter(&self.name, "axis is empty"));
        }
        if let Some(bad) = self.values.iter().find(|v| !v.is_finite()) {
            return Err(SignalError::invalid_parameter(
                &self.name,
                format!("non-finite value {bad}"),
            ));
        }
        if self.kind == AxisKind::Integral {
            for v in self.values.iter_mut() {
                *v = v.trunc();
                if *v <= 0.0 {
                    return Err(SignalError::invalid_parameter(
                        &self.name,
                        format!("length-like axis requires positive values, got {v}"),
                    ));
                }
            }
        }
        Ok(self)
    }
}

/// Evenly spaced values in `[start, stop)`, like `numpy.arange`.
pub fn arange(start: f64, stop: f64, step: f64) -> Result<Vec<f64>, SignalError> {
    if !(step.is_finite() && step != 0.0 && start.is_finite() && stop.is_finite()) {
        return Err(SignalError::invalid_parameter(
            "range",
            format!("invalid range start={start} stop={stop} step={step}"),
        ));
    }
    let count = ((stop - start) / step).ceil();
    if count <= 0.0 {
        return Ok(Vec::new());
    }
    Ok((0..count as usize)
        .map(|i| start + i as f64 * step)
        .collect())
}

/// Cartesian product of validated axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    axes: Vec<ParamAxis>,
    cardinality: usize,
}

impl ParamGrid {
    pub fn new(axes: Vec<ParamAxis>) -> Result<Self, SignalError> {
        let mut seen = HashSet::new();
        let mut validated = Vec::with_capacity(axes.len());
        let mut cardinality: usize = 1;

        for axis in axes {
            if !seen.insert(axis.name.clone()) {
                return Err(SignalError::invalid_parameter(&axis.name, "duplicate axis"));
            }
            let axis = axis.validated()?;
            cardinality = cardinality.checked_mul(axis.len()).ok_or_else(|| {
                SignalError::invalid_parameter(&axis.name, "grid cardinality overflows usize")
            })?;
            validated.push(axis);
        }

        Ok(Self {
            axes: validated,
            cardinality,
        })
    }

    /// Total row count: the product of all axis lengths.
    pub fn len(&self) -> usize {
        self.cardinality
    }

    pub fn is_empty(&self) -> bool {
        self.cardinality == 0
    }

    pub fn axes(&self) -> &[ParamAxis] {
        &self.axes
    }

    pub fn axis(&self, name: &str) -> Option<&ParamAxis> {
        self.axes.iter().find(|a| a.name == name)
    }

    /// Row at `index`. The last axis varies fastest.
    pub fn row(&self, index: usize) -> Result<ParamRow, SignalError> {
        if index >= self.cardinality {
            return Err(SignalError::ParameterIndexOutOfRange {
                index,
                cardinality: self.cardinality,
            });
        }

        let mut values = vec![(String::new(), 0.0); self.axes.len()];
        let mut rest = index;
        for (slot, axis) in values.iter_mut().zip(self.axes.iter()).rev() {
            let len = axis.len();
            *slot = (axis.name.clone(), axis.values[rest % len]);
            rest /= len;
        }

        Ok(ParamRow { index, values })
    }

    /// All rows in index order.
    pub fn rows(&self) -> impl Iterator<Item = ParamRow> + '_ {
        (0..self.cardinality).filter_map(move |i| self.row(i).ok())
    }
}

/// One concrete assignment of a value to every axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamRow {
    pub index: usize,
    pub values: Vec<(String, f64)>,
}

impl ParamRow {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn get_usize(&self, name: &str) -> Option<usize> {
        self.get(name).map(|v| v as usize)
    }

    pub fn require(&self, name: &str) -> Result<f64, SignalError> {
        self.get(name)
            .ok_or_else(|| SignalError::invalid_parameter(name, "axis missing from parameter row"))
    }

    /// Positive whole-number value of a length-like axis.
    pub fn require_usize(&self, name: &str) -> Result<usize, SignalError> {
        let value = self.require(name)?;
        if !(value.is_finite() && value >= 1.0) {
            return Err(SignalError::invalid_parameter(
                name,
                format!("length-like axis requires positive values, got {value}"),
            ));
        }
        Ok(value as usize)
    }
}

impl fmt::Display for ParamRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Indicator Settings Index= {}", self.index)?;
        for (name, value) in &self.values {
            write!(f, "\n{name}= {value}")?;
        }
        Ok(())
    }
}
