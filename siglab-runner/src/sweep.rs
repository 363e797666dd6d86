//! Parameter sweep: evaluate every grid row of one strategy over one candle series.
//!
//! Rows are independent, so the sweep runs them on the rayon pool by default.
//! Results are always returned in row-index order and are identical to the
//! sequential path.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::info;

use siglab_core::{Candle, EvalContext, Evaluation, SignalError, Strategy};

/// Per-row outcome of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSummary {
    pub row_index: usize,
    /// Grid values of the row, in axis order.
    pub settings: Vec<(String, f64)>,
    pub entry_count: usize,
    pub entry_indices: Vec<usize>,
    pub exit_count: usize,
    /// BLAKE3 over (family settings, side, row values).
    pub fingerprint: String,
}

impl RowSummary {
    fn from_evaluation(strategy: &Strategy, eval: &Evaluation) -> Self {
        let entry_indices = eval.entry_indices();
        Self {
            row_index: eval.state.row_index(),
            settings: eval.state.row.values.clone(),
            entry_count: entry_indices.len(),
            entry_indices,
            exit_count: eval.exit_count(),
            fingerprint: row_fingerprint(strategy, &eval.state.row.values),
        }
    }

    pub fn first_entry(&self) -> Option<usize> {
        self.entry_indices.first().copied()
    }

    pub fn last_entry(&self) -> Option<usize> {
        self.entry_indices.last().copied()
    }
}

/// Stable identity of one configured row, independent of candle data.
pub fn row_fingerprint(strategy: &Strategy, values: &[(String, f64)]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&serde_json::to_vec(strategy.family()).unwrap_or_default());
    hasher.update(strategy.side().as_str().as_bytes());
    for (name, value) in values {
        hasher.update(name.as_bytes());
        hasher.update(&value.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Parameter sweep executor.
pub struct ParamSweep {
    strategy: Strategy,
    parallel: bool,
    rows: Option<Range<usize>>,
}

impl ParamSweep {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            parallel: true,
            rows: None,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Restrict the sweep to a slice of row indices (clamped to the grid).
    pub fn with_rows(mut self, rows: Range<usize>) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    fn row_range(&self) -> Range<usize> {
        let len = self.strategy.grid().len();
        match &self.rows {
            Some(r) => r.start.min(len)..r.end.min(len),
            None => 0..len,
        }
    }

    fn evaluate_row(&self, candles: &[Candle], row_index: usize) -> Result<RowSummary, SignalError> {
        let eval = self
            .strategy
            .evaluate_batch(candles, row_index, &EvalContext::silent())?;
        Ok(RowSummary::from_evaluation(&self.strategy, &eval))
    }

    /// Evaluate every selected row. The first failing row aborts the sweep.
    pub fn sweep(&self, candles: &[Candle]) -> Result<SweepResults, SignalError> {
        self.sweep_with_progress(candles, |_, _, _| {})
    }

    /// Executes a sweep with progress reporting.
    ///
    /// The callback is invoked after each row completes with:
    /// - Row index
    /// - Total number of rows in the sweep
    /// - The row's summary
    ///
    /// With parallelism enabled the callback runs on worker threads in no
    /// particular order.
    pub fn sweep_with_progress<F>(
        &self,
        candles: &[Candle],
        progress_callback: F,
    ) -> Result<SweepResults, SignalError>
    where
        F: Fn(usize, usize, &RowSummary) + Send + Sync,
    {
        let range = self.row_range();
        let total = range.len();
        info!(
            strategy = %self.strategy.name(),
            rows = total,
            candles = candles.len(),
            parallel = self.parallel,
            "starting sweep"
        );

        let run = |row_index: usize| -> Result<RowSummary, SignalError> {
            let summary = self.evaluate_row(candles, row_index)?;
            progress_callback(row_index, total, &summary);
            Ok(summary)
        };

        let rows: Vec<RowSummary> = if self.parallel {
            range
                .into_par_iter()
                .map(run)
                .collect::<Result<Vec<_>, SignalError>>()?
        } else {
            range
                .map(run)
                .collect::<Result<Vec<_>, SignalError>>()?
        };

        Ok(SweepResults {
            strategy: self.strategy.name(),
            rows,
        })
    }
}

/// Results of a sweep, in row-index order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResults {
    pub strategy: String,
    rows: Vec<RowSummary>,
}

impl SweepResults {
    pub fn all(&self) -> &[RowSummary] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Gets a row summary by grid index.
    pub fn get(&self, row_index: usize) -> Option<&RowSummary> {
        self.rows
            .binary_search_by_key(&row_index, |r| r.row_index)
            .ok()
            .map(|i| &self.rows[i])
    }

    pub fn total_entries(&self) -> usize {
        self.rows.iter().map(|r| r.entry_count).sum()
    }

    /// Rows with the most entries first; ties keep row-index order.
    pub fn top_n_by_entries(&self, n: usize) -> Vec<&RowSummary> {
        let mut sorted: Vec<_> = self.rows.iter().collect();
        sorted.sort_by(|a, b| b.entry_count.cmp(&a.entry_count));
        sorted.into_iter().take(n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::generate_synthetic_candles;
    use siglab_core::{ParamAxis, ParamGrid, RuleFamily, Side};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn rsi_strategy() -> Strategy {
        let grid = ParamGrid::new(vec![
            ParamAxis::real("rsi_is_above", vec![60.0, 70.0]),
            ParamAxis::real("rsi_is_below", vec![30.0, 40.0]),
            ParamAxis::integral("rsi_length", vec![7.0, 14.0]),
        ])
        .unwrap();
        Strategy::new(RuleFamily::rsi_reversal(), Side::Long, grid).unwrap()
    }

    #[test]
    fn parallel_matches_sequential() {
        let candles = generate_synthetic_candles("sweep", 600, 0, 60_000);
        let sequential = ParamSweep::new(rsi_strategy())
            .with_parallelism(false)
            .sweep(&candles)
            .unwrap();
        let parallel = ParamSweep::new(rsi_strategy())
            .with_parallelism(true)
            .sweep(&candles)
            .unwrap();

        assert_eq!(sequential.len(), 8);
        assert_eq!(sequential, parallel);
        let indices: Vec<usize> = parallel.all().iter().map(|r| r.row_index).collect();
        assert_eq!(indices, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn progress_called_once_per_row() {
        let candles = generate_synthetic_candles("sweep", 200, 0, 60_000);
        let calls = AtomicUsize::new(0);
        let results = ParamSweep::new(rsi_strategy())
            .sweep_with_progress(&candles, |_, total, _| {
                assert_eq!(total, 8);
                calls.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), results.len());
    }

    #[test]
    fn row_slice_is_clamped() {
        let candles = generate_synthetic_candles("sweep", 200, 0, 60_000);
        let results = ParamSweep::new(rsi_strategy())
            .with_rows(6..20)
            .sweep(&candles)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.get(6).is_some());
        assert!(results.get(7).is_some());
        assert!(results.get(5).is_none());
    }

    #[test]
    fn fingerprints_differ_per_row_and_ignore_candles() {
        let a = ParamSweep::new(rsi_strategy())
            .sweep(&generate_synthetic_candles("a", 100, 0, 60_000))
            .unwrap();
        let b = ParamSweep::new(rsi_strategy())
            .sweep(&generate_synthetic_candles("b", 100, 0, 60_000))
            .unwrap();

        for (ra, rb) in a.all().iter().zip(b.all()) {
            assert_eq!(ra.fingerprint, rb.fingerprint);
        }
        let mut prints: Vec<&str> = a.all().iter().map(|r| r.fingerprint.as_str()).collect();
        prints.sort();
        prints.dedup();
        assert_eq!(prints.len(), a.len());
    }

    #[test]
    fn top_n_orders_by_entry_count() {
        let candles = generate_synthetic_candles("sweep", 800, 0, 60_000);
        let results = ParamSweep::new(rsi_strategy()).sweep(&candles).unwrap();
        let top = results.top_n_by_entries(3);
        assert_eq!(top.len(), 3);
        for pair in top.windows(2) {
            assert!(pair[0].entry_count >= pair[1].entry_count);
        }
        let max = results.all().iter().map(|r| r.entry_count).max().unwrap();
        assert_eq!(top[0].entry_count, max);
    }

    #[test]
    fn invalid_candles_abort_the_sweep() {
        let mut candles = generate_synthetic_candles("sweep", 100, 0, 60_000);
        candles[40].timestamp = candles[39].timestamp;
        let err = ParamSweep::new(rsi_strategy()).sweep(&candles).unwrap_err();
        assert!(matches!(
            err.root(),
            SignalError::InvalidCandles { index: 40, .. }
        ));
    }
}
