//! Analytic signal via the Hilbert transform
//!
//! FFT-based construction: forward transform, double the positive
//! frequencies, zero the negative ones, inverse transform. The modulus of
//! the result is the instantaneous amplitude envelope.

use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

use crate::error::{DspError, DspResult};

/// Compute the analytic signal of a real sequence.
///
/// The result has the same length as the input; its real part reproduces
/// the input and its imaginary part is the Hilbert transform.
///
/// # Errors
///
/// Returns [`DspError::EmptySignal`] for an empty input.
pub fn analytic_signal(signal: &[f64]) -> DspResult<Vec<Complex64>> {
    if signal.is_empty() {
        return Err(DspError::EmptySignal);
    }

    let n = signal.len();
    let mut buffer: Vec<Complex64> = signal.iter().map(|&v| Complex64::new(v, 0.0)).collect();

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    // Double positive frequencies, zero negative ones. DC stays, and for
    // even lengths the Nyquist bin stays as well.
    let half = n / 2;
    if n % 2 == 0 {
        for bin in &mut buffer[1..half] {
            *bin *= 2.0;
        }
        for bin in &mut buffer[half + 1..] {
            *bin = Complex64::new(0.0, 0.0);
        }
    } else {
        for bin in &mut buffer[1..=half] {
            *bin *= 2.0;
        }
        for bin in &mut buffer[half + 1..] {
            *bin = Complex64::new(0.0, 0.0);
        }
    }

    planner.plan_fft_inverse(n).process(&mut buffer);

    let scale = 1.0 / n as f64;
    for bin in &mut buffer {
        *bin *= scale;
    }

    Ok(buffer)
}

/// Instantaneous amplitude envelope: the modulus of the analytic signal.
///
/// Elementwise non-negative; a zero input yields a zero envelope.
///
/// # Errors
///
/// Returns [`DspError::EmptySignal`] for an empty input.
pub fn amplitude_envelope(signal: &[f64]) -> DspResult<Vec<f64>> {
    Ok(analytic_signal(signal)?
        .into_iter()
        .map(|bin| bin.norm())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use somnia_core::SAMPLE_RATE_HZ;

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(analytic_signal(&[]), Err(DspError::EmptySignal)));
        assert!(matches!(amplitude_envelope(&[]), Err(DspError::EmptySignal)));
    }

    #[test]
    fn real_part_reproduces_input() {
        let signal: Vec<f64> = (0..256)
            .map(|i| (2.0 * std::f64::consts::PI * 5.0 * i as f64 / SAMPLE_RATE_HZ).sin())
            .collect();
        let analytic = analytic_signal(&signal).unwrap();
        for (sample, bin) in signal.iter().zip(&analytic) {
            assert!((sample - bin.re).abs() < 1e-9);
        }
    }

    #[test]
    fn envelope_is_non_negative() {
        let signal: Vec<f64> = (0..300).map(|i| ((i * 37) % 13) as f64 - 6.0).collect();
        let envelope = amplitude_envelope(&signal).unwrap();
        assert_eq!(envelope.len(), signal.len());
        assert!(envelope.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn zero_input_gives_zero_envelope() {
        let envelope = amplitude_envelope(&[0.0; 128]).unwrap();
        assert!(envelope.iter().all(|&v| v.abs() < 1e-12));
    }

    #[test]
    fn sinusoid_envelope_tracks_amplitude() {
        // Envelope of A*sin(wt) is flat at A, away from the edge bins.
        let amp = 2.5;
        let n = 512;
        let signal: Vec<f64> = (0..n)
            .map(|i| amp * (2.0 * std::f64::consts::PI * 8.0 * i as f64 / SAMPLE_RATE_HZ).sin())
            .collect();
        let envelope = amplitude_envelope(&signal).unwrap();
        for &v in &envelope[n / 4..3 * n / 4] {
            assert!((v - amp).abs() < 0.1 * amp, "envelope {v} far from {amp}");
        }
    }

    #[test]
    fn odd_length_input_round_trips() {
        let signal: Vec<f64> = (0..255)
            .map(|i| (2.0 * std::f64::consts::PI * 3.0 * i as f64 / SAMPLE_RATE_HZ).cos())
            .collect();
        let analytic = analytic_signal(&signal).unwrap();
        assert_eq!(analytic.len(), 255);
        for (sample, bin) in signal.iter().zip(&analytic) {
            assert!((sample - bin.re).abs() < 1e-9);
        }
    }
}
