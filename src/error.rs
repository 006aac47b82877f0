//! Custom error types for the HRIR extraction pipeline

use thiserror::Error;

use crate::channel::Channel;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum HrirError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("WAV error: {0}")]
    Wav(#[from] WavError),

    #[error("Deconvolution error: {0}")]
    Deconv(#[from] DeconvError),

    #[error("Alignment error: {0}")]
    Align(#[from] AlignError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and session construction errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Parameter \"{0}\" is required for this stage")]
    MissingParameter(&'static str),

    #[error("Unknown channel name: {0}")]
    UnknownChannel(String),

    #[error("Recording must have an even number of tracks, got {0}")]
    OddTrackCount(usize),

    #[error("{speakers} speakers cannot be distributed over {tracks} recording tracks")]
    SpeakerTrackMismatch { speakers: usize, tracks: usize },
}

/// WAV file reading/writing errors
#[derive(Error, Debug)]
pub enum WavError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: hound::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: hound::Error,
    },

    #[error("Unsupported sample format: {0}-bit {1}")]
    UnsupportedFormat(u16, String),

    #[error("File {0} contains no audio tracks")]
    Empty(String),

    #[error("Expected {expected} tracks, got {actual}")]
    TrackCount { expected: usize, actual: usize },
}

/// Deconvolution errors
#[derive(Error, Debug)]
pub enum DeconvError {
    #[error("\"{0}\" is not one of the supported domains \"time\" or \"frequency\"")]
    UnsupportedDomain(String),

    #[error(
        "Sample rate of test stimulus ({stimulus} Hz) does not match recording ({recording} Hz)"
    )]
    SampleRateMismatch { recording: u32, stimulus: u32 },

    #[error("Recording is shorter than the test stimulus ({recording} < {stimulus} samples)")]
    TooShort { recording: usize, stimulus: usize },

    #[error("Convolution matrix is singular, cannot solve for the impulse response")]
    SingularMatrix,
}

/// Response alignment and cropping errors
#[derive(Error, Debug)]
pub enum AlignError {
    /// Measured onset order contradicts the position's nominal side.
    /// Almost always a wiring or track order mistake in the recording.
    #[error(
        "{channel} impulse response arrives at the {measured} ear first, \
         which contradicts its position"
    )]
    DirectionMismatch {
        channel: Channel,
        measured: &'static str,
    },

    #[error("No impulse peak above threshold found for {channel} ({ear} ear)")]
    NoPeak { channel: Channel, ear: &'static str },
}

pub type Result<T> = std::result::Result<T, HrirError>;
