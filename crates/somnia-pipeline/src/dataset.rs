//! Dataset I/O
//!
//! The dataset is a fixed family of delimited text files: per split, one
//! CSV per channel (`Id`-indexed, one epoch per row, columns are raw
//! samples), a labels CSV, and a sample/template CSV supplying the output
//! ids. The pipeline additionally dumps and reloads the standardized
//! feature matrices as whitespace-delimited, headerless text.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::Array2;
use tracing::info;

use somnia_core::Epoch;

use crate::error::{DatasetError, DatasetResult};

/// Training EEG channel 1 file name.
pub const TRAIN_EEG1_FILE: &str = "train_eeg1.csv";
/// Training EEG channel 2 file name.
pub const TRAIN_EEG2_FILE: &str = "train_eeg2.csv";
/// Training EMG channel file name.
pub const TRAIN_EMG_FILE: &str = "train_emg.csv";
/// Training labels file name.
pub const TRAIN_LABELS_FILE: &str = "train_labels.csv";
/// Test EEG channel 1 file name.
pub const TEST_EEG1_FILE: &str = "test_eeg1.csv";
/// Test EEG channel 2 file name.
pub const TEST_EEG2_FILE: &str = "test_eeg2.csv";
/// Test EMG channel file name.
pub const TEST_EMG_FILE: &str = "test_emg.csv";
/// Sample/template file supplying prediction ids.
pub const SAMPLE_FILE: &str = "sample.csv";
/// Dump of the standardized training feature matrix.
pub const TRAIN_FEATURES_FILE: &str = "x_train_std.csv";
/// Dump of the standardized test feature matrix.
pub const TEST_FEATURES_FILE: &str = "x_test_std.csv";
/// Prediction output file name.
pub const PREDICTIONS_FILE: &str = "predict_y.csv";

/// Read an `Id`-indexed signal CSV: one epoch per row, remaining columns
/// are raw sample values. `limit` caps the number of rows read
/// (smoke-test mode).
///
/// # Errors
///
/// I/O failures, a missing header, unparseable fields, and ragged rows
/// are all reported with file/line context.
pub fn read_signal_csv(path: &Path, limit: Option<usize>) -> DatasetResult<Vec<Vec<f64>>> {
    let reader = open(path)?;
    let mut lines = reader.lines().enumerate();

    lines
        .next()
        .ok_or_else(|| DatasetError::MissingHeader { path: path.into() })?
        .1
        .map_err(|source| DatasetError::Read {
            path: path.into(),
            source,
        })?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut expected_cols = None;

    for (index, line) in lines {
        if limit.is_some_and(|cap| rows.len() >= cap) {
            break;
        }
        let line = line.map_err(|source| DatasetError::Read {
            path: path.into(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        // Skip the leading Id field.
        let fields: Vec<&str> = line.split(',').collect();
        let samples = fields[1..]
            .iter()
            .map(|field| parse_f64(field, path, index + 1))
            .collect::<DatasetResult<Vec<f64>>>()?;

        let cols = *expected_cols.get_or_insert(samples.len());
        if samples.len() != cols {
            return Err(DatasetError::RaggedRow {
                path: path.into(),
                line: index + 1,
                got: samples.len(),
                expected: cols,
            });
        }
        rows.push(samples);
    }

    info!(file = %path.display(), rows = rows.len(), "loaded signal file");
    Ok(rows)
}

/// Read an `Id`-indexed labels CSV: one integer class label per epoch.
///
/// # Errors
///
/// Same taxonomy as [`read_signal_csv`].
pub fn read_labels_csv(path: &Path, limit: Option<usize>) -> DatasetResult<Vec<i64>> {
    let reader = open(path)?;
    let mut lines = reader.lines().enumerate();

    lines
        .next()
        .ok_or_else(|| DatasetError::MissingHeader { path: path.into() })?
        .1
        .map_err(|source| DatasetError::Read {
            path: path.into(),
            source,
        })?;

    let mut labels = Vec::new();
    for (index, line) in lines {
        if limit.is_some_and(|cap| labels.len() >= cap) {
            break;
        }
        let line = line.map_err(|source| DatasetError::Read {
            path: path.into(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 2 {
            return Err(DatasetError::RaggedRow {
                path: path.into(),
                line: index + 1,
                got: fields.len(),
                expected: 2,
            });
        }
        labels.push(parse_i64(fields[1], path, index + 1)?);
    }

    info!(file = %path.display(), rows = labels.len(), "loaded labels");
    Ok(labels)
}

/// Assemble per-channel row matrices into validated epochs.
///
/// # Errors
///
/// [`DatasetError::RowCountMismatch`] if the three files disagree on epoch
/// count; [`DatasetError::InvalidEpoch`] if any row triple fails epoch
/// validation (unequal or zero channel lengths).
pub fn build_epochs(
    eeg1: Vec<Vec<f64>>,
    eeg2: Vec<Vec<f64>>,
    emg: Vec<Vec<f64>>,
) -> DatasetResult<Vec<Epoch>> {
    if eeg1.len() != eeg2.len() || eeg1.len() != emg.len() {
        return Err(DatasetError::RowCountMismatch {
            eeg1: eeg1.len(),
            eeg2: eeg2.len(),
            emg: emg.len(),
        });
    }

    eeg1.into_iter()
        .zip(eeg2)
        .zip(emg)
        .enumerate()
        .map(|(row, ((e1, e2), em))| {
            Epoch::new(e1, e2, em).map_err(|source| DatasetError::InvalidEpoch { row, source })
        })
        .collect()
}

/// Dump a feature matrix as whitespace-delimited, headerless text.
///
/// # Errors
///
/// Reports I/O failures with the target path.
pub fn write_matrix(path: &Path, matrix: &Array2<f64>) -> DatasetResult<()> {
    let file = File::create(path).map_err(|source| DatasetError::Write {
        path: path.into(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let write_err = |source| DatasetError::Write {
        path: path.into(),
        source,
    };

    for row in matrix.rows() {
        let mut first = true;
        for value in row {
            if !first {
                write!(writer, " ").map_err(write_err)?;
            }
            write!(writer, "{value:.17e}").map_err(write_err)?;
            first = false;
        }
        writeln!(writer).map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;

    info!(file = %path.display(), rows = matrix.nrows(), cols = matrix.ncols(), "wrote feature matrix");
    Ok(())
}

/// Reload a matrix dumped by [`write_matrix`].
///
/// # Errors
///
/// Same taxonomy as [`read_signal_csv`]; an empty file yields a 0x0
/// matrix.
pub fn read_matrix(path: &Path) -> DatasetResult<Array2<f64>> {
    let reader = open(path)?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut expected_cols = None;

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| DatasetError::Read {
            path: path.into(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let values = line
            .split_whitespace()
            .map(|field| parse_f64(field, path, index + 1))
            .collect::<DatasetResult<Vec<f64>>>()?;

        let cols = *expected_cols.get_or_insert(values.len());
        if values.len() != cols {
            return Err(DatasetError::RaggedRow {
                path: path.into(),
                line: index + 1,
                got: values.len(),
                expected: cols,
            });
        }
        rows.push(values);
    }

    let ncols = expected_cols.unwrap_or(0);
    let mut matrix = Array2::zeros((rows.len(), ncols));
    for (i, row) in rows.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            matrix[[i, j]] = value;
        }
    }

    info!(file = %path.display(), rows = matrix.nrows(), cols = matrix.ncols(), "reloaded feature matrix");
    Ok(matrix)
}

/// Read the `id` column of the sample/template file, positionally.
///
/// # Errors
///
/// [`DatasetError::MissingColumn`] if the header has no `id` column, plus
/// the usual I/O and parse taxonomy.
pub fn read_sample_ids(path: &Path) -> DatasetResult<Vec<i64>> {
    let reader = open(path)?;
    let mut lines = reader.lines().enumerate();

    let header = lines
        .next()
        .ok_or_else(|| DatasetError::MissingHeader { path: path.into() })?
        .1
        .map_err(|source| DatasetError::Read {
            path: path.into(),
            source,
        })?;

    let id_column = header
        .split(',')
        .position(|field| field.trim().eq_ignore_ascii_case("id"))
        .ok_or_else(|| DatasetError::MissingColumn {
            path: path.into(),
            column: "id",
        })?;

    let mut ids = Vec::new();
    for (index, line) in lines {
        let line = line.map_err(|source| DatasetError::Read {
            path: path.into(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let field = line.split(',').nth(id_column).ok_or(DatasetError::RaggedRow {
            path: path.into(),
            line: index + 1,
            got: line.split(',').count(),
            expected: id_column + 1,
        })?;
        ids.push(parse_i64(field, path, index + 1)?);
    }

    Ok(ids)
}

/// Write the prediction file: `id,y` header, one row per epoch, ids taken
/// positionally from the sample file.
///
/// # Errors
///
/// [`DatasetError::PredictionCountMismatch`] if ids and predictions
/// disagree in length; I/O failures otherwise.
pub fn write_predictions(path: &Path, ids: &[i64], predictions: &[i64]) -> DatasetResult<()> {
    if ids.len() != predictions.len() {
        return Err(DatasetError::PredictionCountMismatch {
            ids: ids.len(),
            predictions: predictions.len(),
        });
    }

    let file = File::create(path).map_err(|source| DatasetError::Write {
        path: path.into(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let write_err = |source| DatasetError::Write {
        path: path.into(),
        source,
    };

    writeln!(writer, "id,y").map_err(write_err)?;
    for (id, label) in ids.iter().zip(predictions) {
        writeln!(writer, "{id},{label}").map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;

    info!(file = %path.display(), rows = predictions.len(), "wrote predictions");
    Ok(())
}

fn open(path: &Path) -> DatasetResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| DatasetError::Read {
            path: path.into(),
            source,
        })
}

fn parse_f64(field: &str, path: &Path, line: usize) -> DatasetResult<f64> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| DatasetError::Parse {
            path: path.into(),
            line,
            value: field.to_string(),
        })
}

fn parse_i64(field: &str, path: &Path, line: usize) -> DatasetResult<i64> {
    field
        .trim()
        .parse::<i64>()
        .map_err(|_| DatasetError::Parse {
            path: path.into(),
            line,
            value: field.to_string(),
        })
}
