//! HRIR Extraction Pipeline
//!
//! Converts a raw multi-speaker sine sweep measurement recording into a
//! cleaned, time-aligned set of stereo impulse responses suitable for
//! binaural headphone virtualization via convolution.
//!
//! # Architecture
//!
//! The pipeline runs four stages strictly forward, each independently
//! invocable:
//!
//! - `audio::segment`: split the recording into per-speaker, per-ear
//!   excerpts and reorder them into the canonical 14-slot layout
//! - `audio::deconv`: recover impulse responses by deconvolving each
//!   excerpt against the known test stimulus
//! - `audio::crop`: tail crop, onset detection and inter-aural alignment
//! - `audio::pack`: zero pad to a common length and emit the canonical
//!   and HeSuVi channel orders
//!
//! Supporting modules: `channel` (positions, ears and layout tables),
//! `audio::wav` (file I/O), `config` and `error`.
//!
//! # Example
//!
//! ```no_run
//! use hrir_rs::{deconvolve, process_pair, AlignmentConfig, Channel, Domain};
//!
//! let stimulus = hrir_rs::read_mono("sweep.wav").unwrap().0;
//! let recording = hrir_rs::read_tracks("fl.wav").unwrap();
//!
//! let left = deconvolve(&recording.tracks[0], &stimulus, Domain::Frequency).unwrap();
//! let right = deconvolve(&recording.tracks[1], &stimulus, Domain::Frequency).unwrap();
//!
//! let config = AlignmentConfig::default();
//! let (left, right) = process_pair(
//!     &left,
//!     &right,
//!     Channel::Fl,
//!     recording.sample_rate(),
//!     &config,
//!     2.0 / 32768.0,
//! )
//! .unwrap();
//! ```

pub mod audio;
pub mod channel;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use audio::crop::{crop_head, crop_tail, process_pair};
pub use audio::deconv::{deconvolve, Domain};
pub use audio::pack::{pad_to_longest, reorder};
pub use audio::segment::{reorder_to_canonical, split_recording};
pub use audio::session::RecordingSession;
pub use audio::spectrum::magnitude_spectrum;
pub use audio::wav::{read_mono, read_tracks, write_tracks, SampleSpec, WavContents};
pub use audio::{normalize_tracks, rms};
pub use channel::{
    canonical_index, parse_speakers, Channel, Ear, Side, Slot, CANONICAL_ORDER, CHANNELS,
    HESUVI_ORDER,
};
pub use config::{AlignmentConfig, Config, DeconvolutionConfig, OutputConfig, SegmentationConfig};
pub use error::{AlignError, ConfigError, DeconvError, HrirError, Result, WavError};
