//! Pipeline orchestration
//!
//! Single-shot batch run: load → validate → extract → standardize → dump
//! matrices → cross-validate → fit → predict → write. Every stage logs
//! its progress, and a failure aborts the whole run with an error naming
//! the stage.

use std::path::Path;

use ndarray::Array2;
use tracing::info;

use somnia_core::SAMPLE_RATE_HZ;

use crate::config::{ClassifierKind, PipelineConfig};
use crate::dataset::{
    build_epochs, read_labels_csv, read_matrix, read_sample_ids, read_signal_csv, write_matrix,
    write_predictions, PREDICTIONS_FILE, SAMPLE_FILE, TEST_EEG1_FILE, TEST_EEG2_FILE,
    TEST_EMG_FILE, TEST_FEATURES_FILE, TRAIN_EEG1_FILE, TRAIN_EEG2_FILE, TRAIN_EMG_FILE,
    TRAIN_FEATURES_FILE, TRAIN_LABELS_FILE,
};
use crate::error::{PipelineError, PipelineResult};
use crate::features::FeatureExtractor;
use crate::ml::{build_classifier, cross_val_score, StandardScaler};

/// What a completed run produced.
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// Training epochs seen
    pub train_epochs: usize,
    /// Test epochs seen
    pub test_epochs: usize,
    /// Feature columns per epoch
    pub feature_columns: usize,
    /// Per-fold cross-validation micro-F1 scores (empty for grid search,
    /// which validates internally)
    pub cv_scores: Vec<f64>,
    /// Predictions written
    pub predictions: usize,
}

/// Execute one full pipeline run.
///
/// # Errors
///
/// Any stage failure aborts the run; the returned [`PipelineError`] names
/// the stage.
pub fn run(config: &PipelineConfig) -> PipelineResult<RunSummary> {
    let root = config.storage_root.as_path();
    let limit = config.row_limit();
    if let Some(cap) = limit {
        info!(cap, "smoke-test mode: row loading is capped");
    }

    let (x_train, x_test) = if config.recompute_features {
        compute_features(root, limit)?
    } else {
        info!("reloading standardized feature matrices from a previous run");
        let train =
            read_matrix(&root.join(TRAIN_FEATURES_FILE)).map_err(PipelineError::Read)?;
        let test = read_matrix(&root.join(TEST_FEATURES_FILE)).map_err(PipelineError::Read)?;
        (train, test)
    };

    let labels =
        read_labels_csv(&root.join(TRAIN_LABELS_FILE), limit).map_err(PipelineError::Read)?;
    if labels.len() != x_train.nrows() {
        return Err(PipelineError::LabelRowMismatch {
            rows: x_train.nrows(),
            labels: labels.len(),
        });
    }

    let cv_scores = match config.classifier {
        // Grid search runs its own cross-validation per candidate.
        ClassifierKind::GridSearchSvm => Vec::new(),
        _ => {
            let scores = cross_val_score(
                &|| build_classifier(config),
                &x_train,
                &labels,
                config.cv_folds,
            )
            .map_err(PipelineError::Fit)?;
            info!(scores = ?scores, "cross-validation micro-F1 per fold");
            scores
        }
    };

    info!(
        classifier = ?config.classifier,
        rows = x_train.nrows(),
        "fitting final model on all training data"
    );
    let mut model = build_classifier(config);
    model.fit(&x_train, &labels).map_err(PipelineError::Fit)?;

    let predictions = model.predict(&x_test).map_err(PipelineError::Predict)?;

    let mut ids = read_sample_ids(&root.join(SAMPLE_FILE)).map_err(PipelineError::Read)?;
    if let Some(cap) = limit {
        // The sample file is never row-capped on disk; align it with the
        // capped test split so smoke runs still produce output.
        ids.truncate(cap.min(predictions.len()));
    }
    write_predictions(&root.join(PREDICTIONS_FILE), &ids, &predictions)
        .map_err(PipelineError::Write)?;

    Ok(RunSummary {
        train_epochs: x_train.nrows(),
        test_epochs: x_test.nrows(),
        feature_columns: x_train.ncols(),
        cv_scores,
        predictions: predictions.len(),
    })
}

/// Load raw signals, extract features, standardize, and dump the matrices.
fn compute_features(
    root: &Path,
    limit: Option<usize>,
) -> PipelineResult<(Array2<f64>, Array2<f64>)> {
    info!("loading raw signal files");
    let train_eeg1 =
        read_signal_csv(&root.join(TRAIN_EEG1_FILE), limit).map_err(PipelineError::Read)?;
    let train_eeg2 =
        read_signal_csv(&root.join(TRAIN_EEG2_FILE), limit).map_err(PipelineError::Read)?;
    let train_emg =
        read_signal_csv(&root.join(TRAIN_EMG_FILE), limit).map_err(PipelineError::Read)?;
    let test_eeg1 =
        read_signal_csv(&root.join(TEST_EEG1_FILE), limit).map_err(PipelineError::Read)?;
    let test_eeg2 =
        read_signal_csv(&root.join(TEST_EEG2_FILE), limit).map_err(PipelineError::Read)?;
    let test_emg =
        read_signal_csv(&root.join(TEST_EMG_FILE), limit).map_err(PipelineError::Read)?;

    let train = build_epochs(train_eeg1, train_eeg2, train_emg).map_err(PipelineError::Read)?;
    let test = build_epochs(test_eeg1, test_eeg2, test_emg).map_err(PipelineError::Read)?;
    info!(
        train = train.len(),
        test = test.len(),
        "assembled validated epochs"
    );

    let extractor = FeatureExtractor::new(SAMPLE_RATE_HZ);
    let raw_train = extractor
        .extract_batch(&train)
        .map_err(PipelineError::Extract)?;
    let raw_test = extractor
        .extract_batch(&test)
        .map_err(PipelineError::Extract)?;
    info!(
        rows = raw_train.nrows(),
        cols = raw_train.ncols(),
        "extracted feature matrices"
    );

    let (scaler, x_train) =
        StandardScaler::fit_transform(&raw_train).map_err(PipelineError::Standardize)?;
    let x_test = scaler
        .transform(&raw_test)
        .map_err(PipelineError::Standardize)?;

    write_matrix(&root.join(TRAIN_FEATURES_FILE), &x_train).map_err(PipelineError::Write)?;
    write_matrix(&root.join(TEST_FEATURES_FILE), &x_test).map_err(PipelineError::Write)?;

    Ok((x_train, x_test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClassifierKind, PipelineConfig};
    use std::fmt::Write as _;
    use std::path::PathBuf;

    fn write_signal_file(path: &Path, rows: &[Vec<f64>]) {
        let mut out = String::from("Id");
        for i in 0..rows[0].len() {
            write!(out, ",x{i}").unwrap();
        }
        out.push('\n');
        for (id, row) in rows.iter().enumerate() {
            write!(out, "{id}").unwrap();
            for v in row {
                write!(out, ",{v}").unwrap();
            }
            out.push('\n');
        }
        std::fs::write(path, out).unwrap();
    }

    fn sine_row(freq: f64, amplitude: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                amplitude * (2.0 * std::f64::consts::PI * freq * i as f64 / SAMPLE_RATE_HZ).sin()
            })
            .collect()
    }

    fn noise_row(seed: u64, n: usize) -> Vec<f64> {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    /// Lay out a complete synthetic dataset: 12 training epochs across 3
    /// classes whose EEG frequency depends on the class, 5 test epochs.
    fn synthetic_dataset(dir: &Path) {
        let n = 128;
        let mut train_eeg1 = Vec::new();
        let mut train_eeg2 = Vec::new();
        let mut train_emg = Vec::new();
        let mut labels = String::from("Id,y\n");
        for i in 0..12 {
            let class = (i % 3) as i64 + 1;
            let base = 4.0 + 6.0 * class as f64;
            train_eeg1.push(sine_row(base, 1.0 + 0.01 * i as f64, n));
            train_eeg2.push(sine_row(base + 1.5, 1.0 + 0.02 * i as f64, n));
            train_emg.push(noise_row(i as u64, n));
            writeln!(labels, "{i},{class}").unwrap();
        }

        let mut test_eeg1 = Vec::new();
        let mut test_eeg2 = Vec::new();
        let mut test_emg = Vec::new();
        let mut sample = String::from("id,y\n");
        for i in 0..5 {
            let class = (i % 3) as i64 + 1;
            let base = 4.0 + 6.0 * class as f64;
            test_eeg1.push(sine_row(base + 0.2, 1.05, n));
            test_eeg2.push(sine_row(base + 1.7, 0.95, n));
            test_emg.push(noise_row(100 + i as u64, n));
            writeln!(sample, "{},0", 1000 + i).unwrap();
        }

        write_signal_file(&dir.join(TRAIN_EEG1_FILE), &train_eeg1);
        write_signal_file(&dir.join(TRAIN_EEG2_FILE), &train_eeg2);
        write_signal_file(&dir.join(TRAIN_EMG_FILE), &train_emg);
        write_signal_file(&dir.join(TEST_EEG1_FILE), &test_eeg1);
        write_signal_file(&dir.join(TEST_EEG2_FILE), &test_eeg2);
        write_signal_file(&dir.join(TEST_EMG_FILE), &test_emg);
        std::fs::write(dir.join(TRAIN_LABELS_FILE), labels).unwrap();
        std::fs::write(dir.join(SAMPLE_FILE), sample).unwrap();
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "somnia-pipeline-{}-{name}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn test_config(dir: &Path) -> PipelineConfig {
        PipelineConfig {
            storage_root: dir.to_path_buf(),
            recompute_features: true,
            smoke_test: false,
            cv_folds: 2,
            classifier: ClassifierKind::Svm,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn end_to_end_run_writes_predictions() {
        let dir = scratch_dir("e2e");
        synthetic_dataset(&dir);

        let summary = run(&test_config(&dir)).unwrap();

        assert_eq!(summary.train_epochs, 12);
        assert_eq!(summary.test_epochs, 5);
        assert_eq!(summary.feature_columns, 52);
        assert_eq!(summary.predictions, 5);
        assert_eq!(summary.cv_scores.len(), 2);

        let predictions = std::fs::read_to_string(dir.join(PREDICTIONS_FILE)).unwrap();
        let lines: Vec<&str> = predictions.lines().collect();
        assert_eq!(lines[0], "id,y");
        assert_eq!(lines.len(), 6);
        for (i, line) in lines[1..].iter().enumerate() {
            let (id, label) = line.split_once(',').unwrap();
            assert_eq!(id.parse::<i64>().unwrap(), 1000 + i as i64);
            assert!([1, 2, 3].contains(&label.parse::<i64>().unwrap()));
        }

        // Standardized matrix dumps exist for the reload path.
        assert!(dir.join(TRAIN_FEATURES_FILE).exists());
        assert!(dir.join(TEST_FEATURES_FILE).exists());
    }

    #[test]
    fn reload_path_skips_extraction() {
        let dir = scratch_dir("reload");
        synthetic_dataset(&dir);

        let first = run(&test_config(&dir)).unwrap();

        let mut config = test_config(&dir);
        config.recompute_features = false;
        let second = run(&config).unwrap();

        assert_eq!(first.train_epochs, second.train_epochs);
        assert_eq!(first.feature_columns, second.feature_columns);
        assert_eq!(first.predictions, second.predictions);
    }

    #[test]
    fn smoke_mode_caps_rows() {
        let dir = scratch_dir("smoke");
        synthetic_dataset(&dir);

        let mut config = test_config(&dir);
        config.smoke_test = true;
        config.smoke_rows = 9;
        let summary = run(&config).unwrap();

        assert_eq!(summary.train_epochs, 9);
        assert_eq!(summary.test_epochs, 5);
    }

    #[test]
    fn missing_input_aborts_in_read_stage() {
        let dir = scratch_dir("missing");
        // No dataset laid out.
        let err = run(&test_config(&dir)).unwrap_err();
        assert!(matches!(err, PipelineError::Read(_)));
    }
}
