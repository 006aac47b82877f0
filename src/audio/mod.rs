//! Audio processing modules

pub mod crop;
pub mod deconv;
pub mod pack;
pub mod segment;
pub mod session;
pub mod spectrum;
pub mod wav;

pub use crop::{crop_head, crop_tail};
pub use deconv::{deconvolve, Domain};
pub use pack::{pad_to_longest, reorder};
pub use segment::{reorder_to_canonical, split_recording};
pub use session::RecordingSession;
pub use wav::{read_mono, read_tracks, write_tracks, SampleSpec, WavContents};

/// Root-mean-square level of a normalized sample buffer
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64).sqrt()
}

/// Scale all tracks by one common gain so the joint peak lands at -0.1 dB.
/// Relative track levels are measurement data and must not change.
pub fn normalize_tracks(tracks: &mut [Vec<f64>]) {
    let peak = tracks
        .iter()
        .flat_map(|t| t.iter())
        .map(|s| s.abs())
        .fold(0.0f64, f64::max);

    if peak < 1e-9 {
        return;
    }

    let target = 10f64.powf(-0.1 / 20.0);
    let gain = target / peak;
    for track in tracks.iter_mut() {
        for sample in track.iter_mut() {
            *sample *= gain;
        }
    }
}
