//! Statistic summarizer
//!
//! Reduces any numeric sequence to the 4-tuple (mean, population variance,
//! max, min) used as the building block of every feature vector.

use serde::{Deserialize, Serialize};

/// Summary statistics of one numeric sequence.
///
/// Field order matches the flattened feature layout: mean, variance, max,
/// min. Immutable once computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalStats {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population variance (divisor N, not N-1).
    pub variance: f64,
    /// Maximum sample value.
    pub max: f64,
    /// Minimum sample value.
    pub min: f64,
}

impl SignalStats {
    /// Number of values contributed to a flattened feature vector.
    pub const LEN: usize = 4;

    /// Summarize a sequence.
    ///
    /// An empty slice yields NaN in every field, matching numeric-library
    /// convention; callers that care should check before reducing.
    #[must_use]
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self {
                mean: f64::NAN,
                variance: f64::NAN,
                max: f64::NAN,
                min: f64::NAN,
            };
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;

        let mut sum_sq = 0.0;
        let mut max = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;
        for &v in samples {
            let diff = v - mean;
            sum_sq += diff * diff;
            max = max.max(v);
            min = min.min(v);
        }

        Self {
            mean,
            variance: sum_sq / n,
            max,
            min,
        }
    }

    /// Flatten into feature order.
    #[inline]
    #[must_use]
    pub fn to_array(self) -> [f64; Self::LEN] {
        [self.mean, self.variance, self.max, self.min]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_between_min_and_max() {
        let samples = [3.0, -1.5, 7.25, 0.0, 2.5];
        let stats = SignalStats::from_samples(&samples);
        assert!(stats.min <= stats.mean);
        assert!(stats.mean <= stats.max);
        assert!(stats.variance >= 0.0);
    }

    #[test]
    fn constant_sequence_collapses() {
        let stats = SignalStats::from_samples(&[4.2; 17]);
        assert_eq!(stats.mean, 4.2);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.max, 4.2);
        assert_eq!(stats.min, 4.2);
    }

    #[test]
    fn single_sample() {
        let stats = SignalStats::from_samples(&[-3.0]);
        assert_eq!(stats.to_array(), [-3.0, 0.0, -3.0, -3.0]);
    }

    #[test]
    fn empty_sequence_is_nan() {
        let stats = SignalStats::from_samples(&[]);
        assert!(stats.mean.is_nan());
        assert!(stats.variance.is_nan());
        assert!(stats.max.is_nan());
        assert!(stats.min.is_nan());
    }

    #[test]
    fn population_variance() {
        // Var([1, 2, 3, 4]) with divisor N is 1.25.
        let stats = SignalStats::from_samples(&[1.0, 2.0, 3.0, 4.0]);
        assert!((stats.variance - 1.25).abs() < 1e-12);
    }
}
