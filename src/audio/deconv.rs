//! Impulse response recovery by deconvolving excerpts against the stimulus

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DeconvError;

/// Deconvolution algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Spectral division: fast, assumes the stimulus spectrum has no
    /// near-zero bins (a well designed sweep has none)
    Frequency,
    /// Least squares against a Toeplitz convolution matrix: numerically
    /// heavier, kept as the literal formulation for validation
    Time,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Frequency => write!(f, "frequency"),
            Domain::Time => write!(f, "time"),
        }
    }
}

impl FromStr for Domain {
    type Err = DeconvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "frequency" => Ok(Domain::Frequency),
            "time" => Ok(Domain::Time),
            _ => Err(DeconvError::UnsupportedDomain(s.to_string())),
        }
    }
}

/// Recover the impulse response `h` from a recorded excerpt `y` and the
/// known test stimulus `x`, such that `x * h ≈ y` (convolution).
///
/// The stimulus is zero padded to the excerpt length; an excerpt shorter
/// than the stimulus is an error.
pub fn deconvolve(y: &[f64], x: &[f64], domain: Domain) -> Result<Vec<f64>, DeconvError> {
    if y.len() < x.len() {
        return Err(DeconvError::TooShort {
            recording: y.len(),
            stimulus: x.len(),
        });
    }

    let mut x_padded = x.to_vec();
    x_padded.resize(y.len(), 0.0);

    debug!("Deconvolving {} samples in {} domain", y.len(), domain);

    match domain {
        Domain::Frequency => Ok(deconvolve_frequency(y, &x_padded)),
        Domain::Time => deconvolve_time(y, &x_padded),
    }
}

/// Division in the frequency domain is deconvolution in the time domain
fn deconvolve_frequency(y: &[f64], x: &[f64]) -> Vec<f64> {
    let n = y.len();
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let ifft = planner.plan_fft_inverse(n);

    let mut spectrum_y: Vec<Complex<f64>> = y.iter().map(|&s| Complex::new(s, 0.0)).collect();
    let mut spectrum_x: Vec<Complex<f64>> = x.iter().map(|&s| Complex::new(s, 0.0)).collect();
    fft.process(&mut spectrum_y);
    fft.process(&mut spectrum_x);

    let mut spectrum_h: Vec<Complex<f64>> = spectrum_y
        .iter()
        .zip(&spectrum_x)
        .map(|(yk, xk)| yk / xk)
        .collect();
    ifft.process(&mut spectrum_h);

    // rustfft leaves the inverse transform unnormalized
    let scale = 1.0 / n as f64;
    spectrum_h.iter().map(|h| h.re * scale).collect()
}

/// Least squares solve `h = (XᵀX)⁻¹ Xᵀ y` where `X` is the Toeplitz
/// convolution matrix of the stimulus: each column a one sample shifted,
/// zero padded copy of `x`. Solved with an LU decomposition rather than an
/// explicit inverse.
fn deconvolve_time(y: &[f64], x: &[f64]) -> Result<Vec<f64>, DeconvError> {
    let n = y.len();
    let toeplitz = DMatrix::from_fn(n, n, |i, j| if i >= j { x[i - j] } else { 0.0 });
    let rhs = DVector::from_column_slice(y);

    let normal = toeplitz.transpose() * &toeplitz;
    let projected = toeplitz.transpose() * rhs;

    let h = normal
        .lu()
        .solve(&projected)
        .ok_or(DeconvError::SingularMatrix)?;

    Ok(h.as_slice().to_vec())
}
