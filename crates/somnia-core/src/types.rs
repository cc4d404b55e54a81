//! Core data types for sleep-stage classification
//!
//! An [`Epoch`] is the unit of classification: a fixed-duration window of
//! synchronized samples from two EEG channels and one EMG channel. The
//! recordings in the target dataset are sampled at a constant 128 Hz.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Sampling rate of the recordings, in Hz. Constant across the dataset.
pub const SAMPLE_RATE_HZ: f64 = 128.0;

/// Canonical EEG frequency bands used for sleep scoring.
///
/// The alpha band is split into low/high halves; the split and the outer
/// cutoffs follow the ranges conventional in sleep EEG toolkits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EegBand {
    /// Theta: 4-8 Hz (drowsiness, light sleep)
    Theta,
    /// Low alpha: 8-10 Hz (relaxed wakefulness)
    AlphaLow,
    /// High alpha: 10-13 Hz (relaxed wakefulness)
    AlphaHigh,
    /// Beta: 13-25 Hz (active wakefulness)
    Beta,
    /// Gamma: 25-40 Hz (high-frequency activity)
    Gamma,
}

impl EegBand {
    /// All bands in fixed feature order.
    ///
    /// This order defines the column layout of every feature vector; it
    /// must be identical between training and prediction.
    pub const ALL: [EegBand; 5] = [
        EegBand::Theta,
        EegBand::AlphaLow,
        EegBand::AlphaHigh,
        EegBand::Beta,
        EegBand::Gamma,
    ];

    /// Frequency range of this band as (low, high) in Hz.
    #[inline]
    #[must_use]
    pub const fn range_hz(self) -> (f64, f64) {
        match self {
            Self::Theta => (4.0, 8.0),
            Self::AlphaLow => (8.0, 10.0),
            Self::AlphaHigh => (10.0, 13.0),
            Self::Beta => (13.0, 25.0),
            Self::Gamma => (25.0, 40.0),
        }
    }

    /// Band name for logging and display.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Theta => "theta",
            Self::AlphaLow => "alpha-low",
            Self::AlphaHigh => "alpha-high",
            Self::Beta => "beta",
            Self::Gamma => "gamma",
        }
    }
}

/// One epoch of synchronized three-channel signal data.
///
/// Invariant: all three channels hold the same number of samples, and that
/// number is non-zero. [`Epoch::new`] enforces this at construction, so the
/// rest of the pipeline can index channels without re-checking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Epoch {
    eeg1: Vec<f64>,
    eeg2: Vec<f64>,
    emg: Vec<f64>,
}

impl Epoch {
    /// Build an epoch from the three channel sequences.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyEpoch`] if the channels hold no samples,
    /// or [`CoreError::ChannelLengthMismatch`] if their lengths differ.
    pub fn new(eeg1: Vec<f64>, eeg2: Vec<f64>, emg: Vec<f64>) -> CoreResult<Self> {
        if eeg1.len() != eeg2.len() || eeg1.len() != emg.len() {
            return Err(CoreError::ChannelLengthMismatch {
                eeg1: eeg1.len(),
                eeg2: eeg2.len(),
                emg: emg.len(),
            });
        }
        if eeg1.is_empty() {
            return Err(CoreError::EmptyEpoch);
        }
        Ok(Self { eeg1, eeg2, emg })
    }

    /// Number of samples per channel.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.eeg1.len()
    }

    /// Always false: zero-length epochs are rejected at construction.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.eeg1.is_empty()
    }

    /// First EEG channel.
    #[inline]
    #[must_use]
    pub fn eeg1(&self) -> &[f64] {
        &self.eeg1
    }

    /// Second EEG channel.
    #[inline]
    #[must_use]
    pub fn eeg2(&self) -> &[f64] {
        &self.eeg2
    }

    /// EMG channel.
    #[inline]
    #[must_use]
    pub fn emg(&self) -> &[f64] {
        &self.emg
    }

    /// Epoch duration in seconds at the dataset sampling rate.
    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        self.len() as f64 / SAMPLE_RATE_HZ
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_order_is_stable() {
        let names: Vec<&str> = EegBand::ALL.iter().map(|b| b.name()).collect();
        assert_eq!(
            names,
            ["theta", "alpha-low", "alpha-high", "beta", "gamma"]
        );
    }

    #[test]
    fn band_ranges_are_contiguous() {
        for pair in EegBand::ALL.windows(2) {
            let (_, high) = pair[0].range_hz();
            let (low, _) = pair[1].range_hz();
            assert_eq!(high, low);
        }
    }

    #[test]
    fn epoch_rejects_mismatched_channels() {
        let err = Epoch::new(vec![0.0; 128], vec![0.0; 128], vec![0.0; 64]);
        assert!(matches!(
            err,
            Err(CoreError::ChannelLengthMismatch { emg: 64, .. })
        ));
    }

    #[test]
    fn epoch_rejects_empty_channels() {
        let err = Epoch::new(vec![], vec![], vec![]);
        assert!(matches!(err, Err(CoreError::EmptyEpoch)));
    }

    #[test]
    fn epoch_duration_uses_dataset_rate() {
        let epoch = Epoch::new(vec![0.0; 512], vec![0.0; 512], vec![0.0; 512]).unwrap();
        assert!((epoch.duration_seconds() - 4.0).abs() < 1e-12);
    }
}
