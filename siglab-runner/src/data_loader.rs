//! Candle loading for the runner.
//!
//! Two sources:
//! 1. CSV files with a `timestamp,open,high,low,close,volume` header
//!    (timestamp in epoch milliseconds)
//! 2. A deterministic synthetic random walk for development and tests
//!
//! Every loaded series is validated before it is returned, so downstream
//! evaluation never sees unordered or non-finite candles.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use siglab_core::{validate_candles, Candle, SignalError};

use crate::config::CandleSource;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read candles from {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("candle file {path} is empty")]
    Empty { path: PathBuf },

    #[error("candles rejected: {0}")]
    Invalid(#[from] SignalError),
}

/// Load candles from whichever source the config names.
pub fn load_candles(source: &CandleSource) -> Result<Vec<Candle>, LoadError> {
    match source {
        CandleSource::Csv { path } => load_candles_csv(path),
        CandleSource::Synthetic {
            seed,
            count,
            start_ms,
            interval_ms,
        } => {
            warn!(seed = %seed, count, "using synthetic candles");
            Ok(generate_synthetic_candles(seed, *count, *start_ms, *interval_ms))
        }
    }
}

/// Read and validate a candle CSV.
pub fn load_candles_csv(path: &Path) -> Result<Vec<Candle>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let candles = reader
        .deserialize::<Candle>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_err)?;

    if candles.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    validate_candles(&candles)?;

    debug!(path = %path.display(), count = candles.len(), "loaded candles");
    Ok(candles)
}

/// Deterministic BLAKE3 hash over all candle data.
pub fn dataset_hash(candles: &[Candle]) -> String {
    let mut hasher = blake3::Hasher::new();
    for c in candles {
        hasher.update(&c.timestamp.to_le_bytes());
        hasher.update(&c.open.to_le_bytes());
        hasher.update(&c.high.to_le_bytes());
        hasher.update(&c.low.to_le_bytes());
        hasher.update(&c.close.to_le_bytes());
        hasher.update(&c.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Random-walk candles starting at 100.0, one every `interval_ms`.
///
/// The same `seed` always yields the same series.
pub fn generate_synthetic_candles(
    seed: &str,
    count: usize,
    start_ms: i64,
    interval_ms: i64,
) -> Vec<Candle> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed_bytes = blake3::hash(seed.as_bytes());
    let mut rng = StdRng::from_seed(*seed_bytes.as_bytes());

    let mut candles = Vec::with_capacity(count);
    let mut price = 100.0_f64;

    for i in 0..count {
        let bar_return: f64 = rng.gen_range(-0.02..0.02);
        let open = price;
        let close = price * (1.0 + bar_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500.0..5_000.0);

        candles.push(Candle {
            timestamp: start_ms + i as i64 * interval_ms,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
    }

    candles
}
