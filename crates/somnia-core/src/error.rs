//! Core error types

use thiserror::Error;

/// Errors raised while constructing core data types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Channel sequences within one epoch have different lengths
    #[error("channel length mismatch within epoch: eeg1={eeg1}, eeg2={eeg2}, emg={emg}")]
    ChannelLengthMismatch {
        /// Samples in the first EEG channel
        eeg1: usize,
        /// Samples in the second EEG channel
        eeg2: usize,
        /// Samples in the EMG channel
        emg: usize,
    },

    /// Epoch holds no samples
    #[error("epoch holds no samples")]
    EmptyEpoch,
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
