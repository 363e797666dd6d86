//! siglab runner: everything around a single evaluation.
//!
//! This crate builds on `siglab-core` to provide:
//! - TOML sweep configuration (family, side, axes, candle source)
//! - Candle loading from CSV plus a deterministic synthetic generator
//! - Parallel parameter sweeps with per-row summaries and fingerprints
//! - A live evaluator that notifies on entries at the latest candle
//! - JSON and CSV export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod live;
pub mod sweep;

pub use config::{AxisSpec, CandleSource, ConfigError, ConfigId, SweepConfig};
pub use data_loader::{
    dataset_hash, generate_synthetic_candles, load_candles, load_candles_csv, LoadError,
};
pub use export::{
    evaluation_from_json, evaluation_to_json, sweep_to_csv, write_evaluation_json,
    write_sweep_csv, EvaluationReport, ExportError,
};
pub use live::{
    LiveEvaluator, LogNotifier, MemoryNotifier, Notification, NotificationSink, NotifyError,
    RunError,
};
pub use sweep::{row_fingerprint, ParamSweep, RowSummary, SweepResults};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn sweep_types_are_send_sync() {
        assert_send::<ParamSweep>();
        assert_sync::<ParamSweep>();
        assert_send::<SweepResults>();
        assert_sync::<SweepResults>();
        assert_send::<RowSummary>();
        assert_sync::<RowSummary>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<SweepConfig>();
        assert_sync::<SweepConfig>();
        assert_send::<CandleSource>();
        assert_sync::<CandleSource>();
    }

    #[test]
    fn live_types_are_send() {
        assert_send::<LiveEvaluator>();
        assert_send::<MemoryNotifier>();
        assert_sync::<MemoryNotifier>();
        assert_send::<RunError>();
    }

    #[test]
    fn error_types_are_send_sync() {
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
        assert_send::<ExportError>();
        assert_sync::<ExportError>();
    }
}
