//! Diagnostic output of an evaluation: named series for charting and an
//! injectable message sink scoped to a single call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Named series aligned with the candle input, plus named horizontal levels
/// (threshold lines such as an RSI band).
///
/// Keys iterate in sorted order so exports are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesMap {
    series: BTreeMap<String, Vec<f64>>,
    levels: BTreeMap<String, f64>,
}

impl SeriesMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    pub fn insert_level(&mut self, name: impl Into<String>, value: f64) {
        self.levels.insert(name.into(), value);
    }

    /// Get the value of a named series at a specific bar index.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    pub fn series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn level(&self, name: &str) -> Option<f64> {
        self.levels.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn levels(&self) -> impl Iterator<Item = (&str, f64)> {
        self.levels.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of series stored (levels excluded).
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Receiver for human-readable evaluation messages (settings, entry details).
///
/// Implementations must not influence the evaluation they observe.
pub trait DiagnosticsSink: Send + Sync {
    fn message(&self, message: &str);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn message(&self, _message: &str) {}
}

/// Forwards messages to `tracing` at INFO under the `siglab::diagnostics` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn message(&self, message: &str) {
        tracing::info!(target: "siglab::diagnostics", "{message}");
    }
}

/// Collects messages in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticsSink for MemorySink {
    fn message(&self, message: &str) {
        let mut guard = match self.messages.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(message.to_string());
    }
}

static NULL_SINK: NullSink = NullSink;

/// Per-call context handed to every evaluation.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    sink: &'a dyn DiagnosticsSink,
}

impl<'a> EvalContext<'a> {
    pub fn new(sink: &'a dyn DiagnosticsSink) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &'a dyn DiagnosticsSink {
        self.sink
    }

    pub fn emit(&self, message: &str) {
        self.sink.message(message);
    }
}

impl EvalContext<'static> {
    /// Context whose messages go nowhere.
    pub fn silent() -> Self {
        Self { sink: &NULL_SINK }
    }
}

impl Default for EvalContext<'static> {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for EvalContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalContext").finish_non_exhaustive()
    }
}
