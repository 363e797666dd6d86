//! Serializable sweep configuration.
//!
//! A config file names the rule family and its non-grid settings, the trade
//! side, the grid axis values and where candles come from:
//!
//! ```toml
//! side = "long"
//!
//! [strategy]
//! family = "donchian_lwti"
//! filter_distance = 24
//!
//! [axes]
//! period = { start = 48, stop = 144, step = 24 }
//!
//! [candles]
//! source = "csv"
//! path = "data/btcusdt_1h.csv"
//! ```
//!
//! Axes the file leaves out keep the family defaults. Axis order always
//! follows the family's declaration order, never the file's.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use siglab_core::{arange, ParamAxis, ParamGrid, RuleFamily, Side, SignalError, Strategy};

/// Unique identifier for a sweep configuration (content-addressable hash).
pub type ConfigId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("axis '{axis}' is not read by {family}")]
    UnknownAxis { axis: String, family: String },

    #[error("invalid grid: {0}")]
    Grid(#[from] SignalError),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("synthetic candle interval must be positive, got {interval_ms} ms")]
    InvalidInterval { interval_ms: i64 },
}

/// Values for one grid axis: a list, a single value, or an arange-style range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisSpec {
    Values(Vec<f64>),
    /// `[start, stop)` in increments of `step`.
    Range { start: f64, stop: f64, step: f64 },
    Single(f64),
}

impl AxisSpec {
    pub fn values(&self) -> Result<Vec<f64>, SignalError> {
        match self {
            AxisSpec::Values(v) => Ok(v.clone()),
            AxisSpec::Range { start, stop, step } => arange(*start, *stop, *step),
            AxisSpec::Single(v) => Ok(vec![*v]),
        }
    }
}

/// Where the candles for a run come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CandleSource {
    /// CSV with a `timestamp,open,high,low,close,volume` header.
    Csv { path: PathBuf },

    /// Deterministic random walk; `seed` is hashed into the RNG seed.
    Synthetic {
        seed: String,
        count: usize,
        #[serde(default = "default_start_ms")]
        start_ms: i64,
        #[serde(default = "default_interval_ms")]
        interval_ms: i64,
    },
}

fn default_start_ms() -> i64 {
    1_700_000_000_000
}

fn default_interval_ms() -> i64 {
    3_600_000
}

impl CandleSource {
    /// Reject settings that cannot produce strictly increasing timestamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            CandleSource::Synthetic { interval_ms, .. } if *interval_ms <= 0 => {
                Err(ConfigError::InvalidInterval {
                    interval_ms: *interval_ms,
                })
            }
            _ => Ok(()),
        }
    }

    /// Synthetic source with `count` candles. A synthetic source keeps its
    /// seed and spacing; a CSV source is replaced by the default generator.
    pub fn with_count(self, count: usize) -> Self {
        match self {
            CandleSource::Synthetic {
                seed,
                start_ms,
                interval_ms,
                ..
            } => CandleSource::Synthetic {
                seed,
                count,
                start_ms,
                interval_ms,
            },
            CandleSource::Csv { .. } => CandleSource::default().with_count(count),
        }
    }
}

impl Default for CandleSource {
    fn default() -> Self {
        CandleSource::Synthetic {
            seed: "siglab".into(),
            count: 2_000,
            start_ms: default_start_ms(),
            interval_ms: default_interval_ms(),
        }
    }
}

/// Everything needed to build a `Strategy` and feed it candles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub side: Side,

    /// Rule family tag plus its non-grid settings.
    pub strategy: RuleFamily,

    /// Grid values keyed by axis name. Missing axes use family defaults.
    #[serde(default)]
    pub axes: BTreeMap<String, AxisSpec>,

    #[serde(default)]
    pub candles: CandleSource,
}

impl SweepConfig {
    /// Config with the family's default grid and synthetic candles.
    pub fn new(strategy: RuleFamily, side: Side) -> Self {
        Self {
            side,
            strategy,
            axes: BTreeMap::new(),
            candles: CandleSource::default(),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.candles.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Grid in the family's axis order, overriding defaults with configured values.
    pub fn build_grid(&self) -> Result<ParamGrid, ConfigError> {
        let family_axes = self.strategy.axis_names();
        if let Some(unknown) = self
            .axes
            .keys()
            .find(|name| !family_axes.contains(&name.as_str()))
        {
            return Err(ConfigError::UnknownAxis {
                axis: unknown.clone(),
                family: self.strategy.name().to_string(),
            });
        }

        let axes = self
            .strategy
            .default_axes()
            .into_iter()
            .map(|axis| match self.axes.get(axis.name()) {
                None => Ok(axis),
                Some(spec) => {
                    let values = spec.values()?;
                    Ok(match axis.kind() {
                        siglab_core::AxisKind::Integral => ParamAxis::integral(axis.name(), values),
                        siglab_core::AxisKind::Real => ParamAxis::real(axis.name(), values),
                    })
                }
            })
            .collect::<Result<Vec<_>, SignalError>>()?;

        Ok(ParamGrid::new(axes)?)
    }

    pub fn build_strategy(&self) -> Result<Strategy, ConfigError> {
        let grid = self.build_grid()?;
        Ok(Strategy::new(self.strategy.clone(), self.side, grid)?)
    }

    /// Deterministic hash of the whole configuration.
    ///
    /// Two configs with the same content get the same id regardless of the
    /// key order in their source files.
    pub fn config_id(&self) -> Result<ConfigId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
