//! Error types for the processing pipeline
//!
//! One enum per concern (`thiserror`), plus a stage-tagged [`PipelineError`]
//! so a failed run always names the stage that aborted it.

use std::path::PathBuf;

use somnia_core::CoreError;
use thiserror::Error;

/// Signal-processing errors.
#[derive(Error, Debug)]
pub enum DspError {
    /// Analytic signal of an empty sequence is undefined
    #[error("cannot compute analytic signal of an empty sequence")]
    EmptySignal,
}

/// Dataset I/O errors.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// File could not be opened or read
    #[error("failed to read {path}: {source}")]
    Read {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// File could not be created or written
    #[error("failed to write {path}: {source}")]
    Write {
        /// File being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// File is empty or has no header row
    #[error("missing header row in {path}")]
    MissingHeader {
        /// Offending file
        path: PathBuf,
    },

    /// Expected column absent from the header
    #[error("column {column:?} not found in {path}")]
    MissingColumn {
        /// Offending file
        path: PathBuf,
        /// Column that was looked up
        column: &'static str,
    },

    /// A field failed to parse as a number
    #[error("malformed value {value:?} at {path} line {line}")]
    Parse {
        /// Offending file
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// The unparseable field
        value: String,
    },

    /// A data row has a different number of fields than the first row
    #[error("row length mismatch in {path}: line {line} has {got} values, expected {expected}")]
    RaggedRow {
        /// Offending file
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Fields found on this row
        got: usize,
        /// Fields on the first data row
        expected: usize,
    },

    /// EEG1/EEG2/EMG files for one split disagree on epoch count
    #[error("row count mismatch across signal files: eeg1={eeg1}, eeg2={eeg2}, emg={emg}")]
    RowCountMismatch {
        /// Rows in the EEG1 file
        eeg1: usize,
        /// Rows in the EEG2 file
        eeg2: usize,
        /// Rows in the EMG file
        emg: usize,
    },

    /// A row could not be assembled into a valid epoch
    #[error("invalid epoch at row {row}: {source}")]
    InvalidEpoch {
        /// 0-based epoch index
        row: usize,
        /// Underlying validation failure
        source: CoreError,
    },

    /// Prediction count differs from the id column of the sample file
    #[error("prediction count {predictions} does not match {ids} sample ids")]
    PredictionCountMismatch {
        /// Ids read from the sample file
        ids: usize,
        /// Predictions produced by the classifier
        predictions: usize,
    },
}

/// Classifier and standardization errors.
#[derive(Error, Debug)]
pub enum MlError {
    /// Training set holds no rows
    #[error("training set is empty")]
    EmptyTrainingSet,

    /// Label vector length differs from the feature matrix row count
    #[error("label count mismatch: {rows} feature rows, {labels} labels")]
    LabelCountMismatch {
        /// Feature matrix rows
        rows: usize,
        /// Labels supplied
        labels: usize,
    },

    /// Column count differs between fit and transform/predict input
    #[error("feature column mismatch: fitted on {fitted}, got {got}")]
    ColumnMismatch {
        /// Columns seen at fit time
        fitted: usize,
        /// Columns in the offending matrix
        got: usize,
    },

    /// Training data contains fewer than two classes
    #[error("training labels contain a single class ({label})")]
    SingleClass {
        /// The only label present
        label: i64,
    },

    /// Predict called before fit
    #[error("classifier used before fit")]
    NotFitted,

    /// A hyperparameter is outside its valid range
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Pipeline failure, tagged with the stage that aborted the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Read stage failed
    #[error("read stage failed: {0}")]
    Read(DatasetError),

    /// Feature extraction stage failed
    #[error("feature extraction stage failed: {0}")]
    Extract(DspError),

    /// Standardization stage failed
    #[error("standardize stage failed: {0}")]
    Standardize(MlError),

    /// Cross-validation or final fit failed
    #[error("fit stage failed: {0}")]
    Fit(MlError),

    /// Prediction stage failed
    #[error("predict stage failed: {0}")]
    Predict(MlError),

    /// Output writing failed
    #[error("write stage failed: {0}")]
    Write(DatasetError),

    /// Label file disagrees with the training feature matrix
    #[error("label rows ({labels}) do not match training feature rows ({rows})")]
    LabelRowMismatch {
        /// Rows in the training feature matrix
        rows: usize,
        /// Labels read from the labels file
        labels: usize,
    },
}

/// Result type for DSP operations
pub type DspResult<T> = Result<T, DspError>;

/// Result type for dataset I/O
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Result type for ML operations
pub type MlResult<T> = Result<T, MlError>;

/// Result type for whole-pipeline runs
pub type PipelineResult<T> = Result<T, PipelineError>;
