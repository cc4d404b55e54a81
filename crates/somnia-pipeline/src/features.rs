//! Feature extraction for sleep-stage classification
//!
//! Turns one epoch into a fixed-schema feature vector: per sub-band and
//! per EEG channel the 4-tuple statistics of the band-filtered signal,
//! followed by the statistics of the EEG amplitude envelopes and of the
//! EMG amplitude envelope. Batches over epochs into the feature matrix
//! consumed by the classifiers.

use ndarray::Array2;
use tracing::warn;

use somnia_core::{Epoch, SignalStats};

use crate::dsp::decompose::SubbandDecomposer;
use crate::dsp::hilbert::amplitude_envelope;
use crate::error::DspResult;

/// Feature vector for one epoch.
///
/// Field order is the column schema: 5 bands x 2 EEG channels x 4 stats
/// (40 values), then the EEG1/EEG2 envelope stats (8 values), then the
/// EMG envelope stats (4 values).
#[derive(Clone, Debug, Default)]
pub struct FeatureVector {
    /// Per-band statistics, indexed [band][channel]
    pub band_stats: [[SignalStats; 2]; 5],
    /// Statistics of the EEG1 amplitude envelope
    pub eeg1_envelope: SignalStats,
    /// Statistics of the EEG2 amplitude envelope
    pub eeg2_envelope: SignalStats,
    /// Statistics of the EMG amplitude envelope
    pub emg_envelope: SignalStats,
}

impl FeatureVector {
    /// Total number of features per epoch.
    #[must_use]
    pub const fn feature_count() -> usize {
        // 5 bands x 2 channels x 4 stats + 2 envelopes x 4 + EMG envelope x 4
        5 * 2 * SignalStats::LEN + 2 * SignalStats::LEN + SignalStats::LEN
    }

    /// Flatten into the fixed column order.
    #[must_use]
    pub fn to_array(&self) -> Vec<f64> {
        let mut features = Vec::with_capacity(Self::feature_count());

        for channels in &self.band_stats {
            for stats in channels {
                features.extend_from_slice(&stats.to_array());
            }
        }

        features.extend_from_slice(&self.eeg1_envelope.to_array());
        features.extend_from_slice(&self.eeg2_envelope.to_array());
        features.extend_from_slice(&self.emg_envelope.to_array());

        features
    }
}

/// Per-epoch feature extractor.
///
/// Holds no state across epochs; every epoch is processed independently.
pub struct FeatureExtractor {
    decomposer: SubbandDecomposer,
}

impl FeatureExtractor {
    /// Create an extractor for signals at the given sampling rate.
    #[must_use]
    pub fn new(sample_rate_hz: f64) -> Self {
        Self {
            decomposer: SubbandDecomposer::new(sample_rate_hz),
        }
    }

    /// Extract the feature vector of a single epoch.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::error::DspError`] from the analytic-signal
    /// transform; epochs are validated non-empty at construction, so this
    /// only fires on misuse.
    pub fn extract(&self, epoch: &Epoch) -> DspResult<FeatureVector> {
        if is_constant(epoch.eeg1()) || is_constant(epoch.eeg2()) || is_constant(epoch.emg()) {
            warn!(
                samples = epoch.len(),
                "degenerate epoch: at least one channel is constant"
            );
        }

        let subbands = self.decomposer.decompose(epoch);
        let mut band_stats = [[SignalStats::default(); 2]; 5];
        for (slot, subband) in band_stats.iter_mut().zip(&subbands) {
            slot[0] = SignalStats::from_samples(&subband.eeg1);
            slot[1] = SignalStats::from_samples(&subband.eeg2);
        }

        let eeg1_envelope = SignalStats::from_samples(&amplitude_envelope(epoch.eeg1())?);
        let eeg2_envelope = SignalStats::from_samples(&amplitude_envelope(epoch.eeg2())?);
        let emg_envelope = SignalStats::from_samples(&amplitude_envelope(epoch.emg())?);

        Ok(FeatureVector {
            band_stats,
            eeg1_envelope,
            eeg2_envelope,
            emg_envelope,
        })
    }

    /// Extract features for a batch of epochs into one matrix.
    ///
    /// Row `i` of the output corresponds to epoch `i` of the input; labels
    /// are matched by position downstream, so order is preserved.
    ///
    /// # Errors
    ///
    /// Propagates the first per-epoch extraction failure.
    pub fn extract_batch(&self, epochs: &[Epoch]) -> DspResult<Array2<f64>> {
        let mut matrix = Array2::zeros((epochs.len(), FeatureVector::feature_count()));
        for (i, epoch) in epochs.iter().enumerate() {
            let row = self.extract(epoch)?.to_array();
            for (j, value) in row.into_iter().enumerate() {
                matrix[[i, j]] = value;
            }
        }
        Ok(matrix)
    }
}

fn is_constant(signal: &[f64]) -> bool {
    signal.windows(2).all(|w| w[0] == w[1])
}
