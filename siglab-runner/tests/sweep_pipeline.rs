//! End-to-end runner pipeline: TOML config -> candles -> sweep -> export.

use proptest::prelude::*;
use siglab_core::{validate_candles, EvalContext};
use siglab_runner::{
    dataset_hash, evaluation_from_json, generate_synthetic_candles, load_candles,
    load_candles_csv, sweep_to_csv, write_evaluation_json, CandleSource, EvaluationReport,
    ParamSweep, SweepConfig,
};

const MACD_CONFIG: &str = r#"
side = "long"

[strategy]
family = "macd_rsi"

[axes]
rsi_is_below = [30, 40]
ema_length = 50
fast_length = [8, 12]

[candles]
source = "synthetic"
seed = "pipeline"
count = 600
"#;

fn write_csv(path: &std::path::Path, candles: &[siglab_core::Candle]) {
    let mut wtr = csv::Writer::from_path(path).unwrap();
    for c in candles {
        wtr.serialize(c).unwrap();
    }
    wtr.flush().unwrap();
}

#[test]
fn config_to_sweep_csv() {
    let config = SweepConfig::from_toml_str(MACD_CONFIG).unwrap();
    let strategy = config.build_strategy().unwrap();
    assert_eq!(strategy.grid().len(), 4);

    let candles = load_candles(&config.candles).unwrap();
    assert_eq!(candles.len(), 600);

    let results = ParamSweep::new(strategy).sweep(&candles).unwrap();
    assert_eq!(results.len(), 4);
    for (i, row) in results.all().iter().enumerate() {
        assert_eq!(row.row_index, i);
        assert_eq!(row.entry_count, row.entry_indices.len());
    }

    let csv = sweep_to_csv(&results).unwrap();
    assert_eq!(csv.lines().count(), 5);
    assert!(csv.starts_with(
        "row_index,rsi_is_above,rsi_is_below,rsi_length,ema_length,fast_length,macd_below,"
    ));
}

#[test]
fn looser_threshold_never_fires_less() {
    let config = SweepConfig::from_toml_str(MACD_CONFIG).unwrap();
    let candles = load_candles(&config.candles).unwrap();
    let results = ParamSweep::new(config.build_strategy().unwrap())
        .sweep(&candles)
        .unwrap();

    // fast_length varies faster than rsi_is_below: rows (0, 2) and (1, 3)
    // differ only in the threshold, and filter_distance is 0 for this family.
    for pair in [(0, 2), (1, 3)] {
        let tight = results.get(pair.0).unwrap();
        let loose = results.get(pair.1).unwrap();
        assert!(tight
            .entry_indices
            .iter()
            .all(|i| loose.entry_indices.contains(i)));
    }
}

#[test]
fn csv_candles_match_synthetic_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("candles.csv");
    let candles = generate_synthetic_candles("pipeline-csv", 300, 1_700_000_000_000, 3_600_000);
    write_csv(&path, &candles);

    let loaded = load_candles_csv(&path).unwrap();
    assert_eq!(loaded.len(), candles.len());
    assert_eq!(
        loaded.iter().map(|c| c.timestamp).collect::<Vec<_>>(),
        candles.iter().map(|c| c.timestamp).collect::<Vec<_>>()
    );

    let from_source = load_candles(&CandleSource::Csv { path: path.clone() }).unwrap();
    assert_eq!(dataset_hash(&from_source), dataset_hash(&loaded));
}

#[test]
fn evaluation_export_roundtrip_from_config() {
    let config = SweepConfig::from_toml_str(MACD_CONFIG).unwrap();
    let strategy = config.build_strategy().unwrap();
    let candles = load_candles(&config.candles).unwrap();
    let eval = strategy
        .evaluate_batch(&candles, 3, &EvalContext::silent())
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eval.json");
    write_evaluation_json(&path, &strategy, &eval, &candles).unwrap();

    let back = evaluation_from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let fresh = EvaluationReport::new(&strategy, &eval, &candles);
    assert_eq!(back.row_index, 3);
    assert_eq!(back.entry_indices, fresh.entry_indices);
    assert_eq!(back.settings, fresh.settings);
    assert_eq!(back.timestamps.len(), 600);
    assert!(back.series.values().all(|s| s.len() == 600));
}

// ── Synthetic data properties ──

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn synthetic_candles_are_valid(seed in "[a-z]{1,8}", count in 1usize..400) {
        let candles = generate_synthetic_candles(&seed, count, 0, 60_000);
        prop_assert_eq!(candles.len(), count);
        prop_assert!(validate_candles(&candles).is_ok());
        prop_assert!(candles.windows(2).all(|w| w[1].timestamp - w[0].timestamp == 60_000));
    }

    #[test]
    fn synthetic_candles_are_deterministic(seed in "[a-z]{1,8}") {
        let a = generate_synthetic_candles(&seed, 50, 0, 60_000);
        let b = generate_synthetic_candles(&seed, 50, 0, 60_000);
        prop_assert_eq!(dataset_hash(&a), dataset_hash(&b));
    }
}

// ── Shipped configs ──

#[test]
fn shipped_configs_build() {
    let dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("configs");
    let expected = [
        ("rsi_reversal.toml", "rsi_reversal_long", 18),
        ("macd_rsi.toml", "macd_rsi_short", 24),
        ("donchian_lwti.toml", "donchian_lwti_long", 5),
    ];
    for (file, name, rows) in expected {
        let config = SweepConfig::load(&dir.join(file)).unwrap();
        let strategy = config.build_strategy().unwrap();
        assert_eq!(strategy.name(), name, "{file}");
        assert_eq!(strategy.grid().len(), rows, "{file}");
    }
}
