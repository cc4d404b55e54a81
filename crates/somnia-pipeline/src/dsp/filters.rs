//! Digital filters for EEG sub-band isolation
//!
//! Butterworth IIR sections combined into a 4th-order band-pass, applied
//! forward-backward so the sub-band signals carry no phase distortion
//! relative to the raw epoch.

use somnia_core::EegBand;

/// Butterworth IIR filter coefficients (second-order section).
#[derive(Clone, Copy, Debug)]
pub struct BiquadCoeffs {
    /// Numerator coefficients [b0, b1, b2]
    pub b: [f64; 3],
    /// Denominator coefficients [a0=1, a1, a2]
    pub a: [f64; 3],
}

/// Second-order biquad filter section (transposed direct form II).
#[derive(Clone, Debug)]
pub struct Biquad {
    coeffs: BiquadCoeffs,
    /// State: [z1, z2]
    state: [f64; 2],
}

impl Biquad {
    /// Create a new biquad section with given coefficients.
    #[must_use]
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            state: [0.0, 0.0],
        }
    }

    /// Create a second-order Butterworth lowpass filter.
    #[must_use]
    pub fn lowpass(sample_rate: f64, cutoff: f64) -> Self {
        let k = (std::f64::consts::PI * cutoff / sample_rate).tan();
        let k2 = k * k;
        let sqrt2 = std::f64::consts::SQRT_2;

        let norm = 1.0 / (1.0 + sqrt2 * k + k2);

        Self::new(BiquadCoeffs {
            b: [k2 * norm, 2.0 * k2 * norm, k2 * norm],
            a: [1.0, 2.0 * (k2 - 1.0) * norm, (1.0 - sqrt2 * k + k2) * norm],
        })
    }

    /// Create a second-order Butterworth highpass filter.
    #[must_use]
    pub fn highpass(sample_rate: f64, cutoff: f64) -> Self {
        let k = (std::f64::consts::PI * cutoff / sample_rate).tan();
        let k2 = k * k;
        let sqrt2 = std::f64::consts::SQRT_2;

        let norm = 1.0 / (1.0 + sqrt2 * k + k2);

        Self::new(BiquadCoeffs {
            b: [norm, -2.0 * norm, norm],
            a: [1.0, 2.0 * (k2 - 1.0) * norm, (1.0 - sqrt2 * k + k2) * norm],
        })
    }

    /// Process a single sample.
    pub fn filter(&mut self, input: f64) -> f64 {
        let output = self.coeffs.b[0] * input + self.state[0];
        self.state[0] = self.coeffs.b[1] * input - self.coeffs.a[1] * output + self.state[1];
        self.state[1] = self.coeffs.b[2] * input - self.coeffs.a[2] * output;
        output
    }

    /// Reset filter state.
    pub fn reset(&mut self) {
        self.state = [0.0, 0.0];
    }
}

/// 4th-order Butterworth band-pass: two highpass sections at the low
/// cutoff cascaded with two lowpass sections at the high cutoff.
#[derive(Clone, Debug)]
pub struct BandpassFilter {
    highpass: [Biquad; 2],
    lowpass: [Biquad; 2],
}

impl BandpassFilter {
    /// Create a band-pass filter for a frequency range.
    #[must_use]
    pub fn new(sample_rate: f64, low_cutoff: f64, high_cutoff: f64) -> Self {
        Self {
            highpass: [
                Biquad::highpass(sample_rate, low_cutoff),
                Biquad::highpass(sample_rate, low_cutoff),
            ],
            lowpass: [
                Biquad::lowpass(sample_rate, high_cutoff),
                Biquad::lowpass(sample_rate, high_cutoff),
            ],
        }
    }

    /// Create a band-pass filter for a standard EEG band.
    #[must_use]
    pub fn for_band(sample_rate: f64, band: EegBand) -> Self {
        let (low, high) = band.range_hz();
        Self::new(sample_rate, low, high)
    }

    /// Process a single sample through all sections.
    pub fn filter(&mut self, input: f64) -> f64 {
        let mut x = input;
        for section in &mut self.highpass {
            x = section.filter(x);
        }
        for section in &mut self.lowpass {
            x = section.filter(x);
        }
        x
    }

    /// Process a whole sequence, preserving length.
    #[must_use]
    pub fn apply(&mut self, signal: &[f64]) -> Vec<f64> {
        signal.iter().map(|&s| self.filter(s)).collect()
    }

    /// Reset all section state.
    pub fn reset(&mut self) {
        for section in &mut self.highpass {
            section.reset();
        }
        for section in &mut self.lowpass {
            section.reset();
        }
    }
}

/// Zero-phase band-pass: filter forward, then filter the reversed output
/// and reverse again. Doubles the effective order and cancels the phase
/// shift of the causal pass. Length-preserving.
#[must_use]
pub fn zero_phase_bandpass(sample_rate: f64, band: EegBand, signal: &[f64]) -> Vec<f64> {
    let mut filter = BandpassFilter::for_band(sample_rate, band);

    let mut forward = filter.apply(signal);
    forward.reverse();

    filter.reset();
    let mut backward = filter.apply(&forward);
    backward.reverse();
    backward
}
