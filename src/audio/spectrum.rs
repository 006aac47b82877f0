//! Magnitude spectrum computation for the headphone equalization export

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Compute the magnitude spectrum of a buffer in dB over the positive
/// frequency half. Returns (frequency in Hz, magnitude in dB) pairs,
/// DC bin included.
pub fn magnitude_spectrum(samples: &[f64], sample_rate: u32) -> Vec<(f64, f64)> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);

    let mut spectrum: Vec<Complex<f64>> = samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
    fft.process(&mut spectrum);

    let df = sample_rate as f64 / n as f64;
    let half = n.div_ceil(2);

    spectrum[..half]
        .iter()
        .enumerate()
        .map(|(k, bin)| {
            let magnitude = 20.0 * bin.norm().max(1e-12).log10();
            (k as f64 * df, magnitude)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_peak_bin() {
        let fs = 1024;
        // 64 Hz sine over exactly one FFT frame
        let samples: Vec<f64> = (0..1024)
            .map(|i| (2.0 * std::f64::consts::PI * 64.0 * i as f64 / fs as f64).sin())
            .collect();

        let spectrum = magnitude_spectrum(&samples, fs as u32);
        assert_eq!(spectrum.len(), 512);

        let (peak_freq, peak_mag) = spectrum
            .iter()
            .cloned()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .unwrap();
        assert_eq!(peak_freq, 64.0);
        // Bin magnitude of a unit sine is N/2
        assert!((peak_mag - 20.0 * 512f64.log10()).abs() < 1e-6);
    }

    #[test]
    fn test_frequency_axis_step() {
        let samples = vec![0.0; 100];
        let spectrum = magnitude_spectrum(&samples, 1000);
        assert_eq!(spectrum.len(), 50);
        assert!((spectrum[1].0 - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        assert!(magnitude_spectrum(&[], 48000).is_empty());
    }
}
