//! Export of evaluations (JSON) and sweep summaries (CSV).
//!
//! Undefined series values are written as JSON `null` and as empty CSV cells.
//! Every JSON artifact carries a `schema_version`; newer versions are
//! rejected on load.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use siglab_core::{Candle, Evaluation, Strategy};

use crate::sweep::SweepResults;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported schema version {found} (max supported: {SCHEMA_VERSION})")]
    UnsupportedSchema { found: u32 },

    #[error("CSV output is not valid UTF-8")]
    Utf8,
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serializable snapshot of one evaluation, aligned with its candles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub schema_version: u32,
    pub strategy: String,
    pub row_index: usize,
    pub settings: String,
    pub timestamps: Vec<i64>,
    pub entry_indices: Vec<usize>,
    pub exit_prices: Vec<Option<f64>>,
    pub series: BTreeMap<String, Vec<Option<f64>>>,
    pub levels: BTreeMap<String, f64>,
}

fn defined(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|v| if v.is_nan() { None } else { Some(*v) })
        .collect()
}

impl EvaluationReport {
    pub fn new(strategy: &Strategy, eval: &Evaluation, candles: &[Candle]) -> Self {
        let series = eval
            .diagnostics
            .names()
            .filter_map(|name| {
                eval.diagnostics
                    .series(name)
                    .map(|values| (name.to_string(), defined(values)))
            })
            .collect();
        let levels = eval
            .diagnostics
            .levels()
            .map(|(name, value)| (name.to_string(), value))
            .collect();

        Self {
            schema_version: SCHEMA_VERSION,
            strategy: strategy.name(),
            row_index: eval.state.row_index(),
            settings: strategy.describe_settings(&eval.state),
            timestamps: candles.iter().map(|c| c.timestamp).collect(),
            entry_indices: eval.entry_indices(),
            exit_prices: defined(&eval.exit_prices),
            series,
            levels,
        }
    }
}

pub fn evaluation_to_json(report: &EvaluationReport) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Parse a report, rejecting newer schema versions.
pub fn evaluation_from_json(json: &str) -> Result<EvaluationReport, ExportError> {
    let report: EvaluationReport = serde_json::from_str(json)?;
    if report.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchema {
            found: report.schema_version,
        });
    }
    Ok(report)
}

pub fn write_evaluation_json(
    path: &Path,
    strategy: &Strategy,
    eval: &Evaluation,
    candles: &[Candle],
) -> Result<(), ExportError> {
    let json = evaluation_to_json(&EvaluationReport::new(strategy, eval, candles))?;
    write_file(path, json.as_bytes())
}

// ─── CSV export ─────────────────────────────────────────────────────

/// One line per row.
///
/// Columns: row_index, one column per axis, entry_count, exit_count,
/// first_entry, last_entry, fingerprint
pub fn sweep_to_csv(results: &SweepResults) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let axis_names: Vec<String> = results
        .all()
        .first()
        .map(|r| r.settings.iter().map(|(name, _)| name.clone()).collect())
        .unwrap_or_default();

    let mut header = vec!["row_index".to_string()];
    header.extend(axis_names.iter().cloned());
    header.extend(
        ["entry_count", "exit_count", "first_entry", "last_entry", "fingerprint"]
            .iter()
            .map(|s| s.to_string()),
    );
    wtr.write_record(&header)?;

    let opt = |v: Option<usize>| v.map(|i| i.to_string()).unwrap_or_default();
    for row in results.all() {
        let mut record = vec![row.row_index.to_string()];
        record.extend(row.settings.iter().map(|(_, v)| v.to_string()));
        record.push(row.entry_count.to_string());
        record.push(row.exit_count.to_string());
        record.push(opt(row.first_entry()));
        record.push(opt(row.last_entry()));
        record.push(row.fingerprint.clone());
        wtr.write_record(&record)?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    String::from_utf8(data).map_err(|_| ExportError::Utf8)
}

pub fn write_sweep_csv(path: &Path, results: &SweepResults) -> Result<(), ExportError> {
    let csv = sweep_to_csv(results)?;
    write_file(path, csv.as_bytes())
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    std::fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
