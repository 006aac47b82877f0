//! Splitting a multi-track sweep recording into per-speaker, per-ear excerpts

use tracing::debug;

use crate::channel::{Channel, Ear, CANONICAL_ORDER};

/// Split a sweep recording into individual speaker-ear excerpts.
///
/// The recording looks something like this (stereo example):
///
/// ```text
/// --/\/\/\----/\/\/\--
/// ---/\/\/\--/\/\/\---
/// ```
///
/// There is one track per ear microphone. Dashes are silence, sawtooths are
/// the recorded sweeps. The first sweep of both tracks was played on the
/// first speaker in `speakers`, the second on the second speaker, and so on.
/// Any even number of tracks is allowed; speakers are read left to right,
/// top to bottom across the track pairs.
///
/// Output is two excerpts per speaker in the order of `speakers`, left ear
/// first. Each excerpt is `silence_gap + stimulus_len` long (zero padded at
/// the end of the recording). The caller is responsible for having validated
/// that `speakers` is consistent with the track count.
pub fn split_recording(
    tracks: &[Vec<f64>],
    stimulus_len: usize,
    speakers: &[Channel],
    silence_gap: f64,
    sample_rate: u32,
) -> Vec<Vec<f64>> {
    let gap = (silence_gap * sample_rate as f64) as usize;
    let column_len = gap + stimulus_len;

    // Speakers excited per track pair
    let n_columns = speakers.len() / (tracks.len() / 2);

    debug!(
        "Splitting {} tracks into {} columns of {} samples (gap {} samples)",
        tracks.len(),
        n_columns,
        column_len,
        gap
    );

    let mut excerpts = Vec::with_capacity(speakers.len() * 2);
    for pair in tracks.chunks_exact(2) {
        for column in 0..n_columns {
            // Initial silence is skipped, then the time axis is cut into
            // equal length columns
            let start = gap + column * column_len;
            excerpts.push(slice_padded(&pair[0], start, column_len));
            excerpts.push(slice_padded(&pair[1], start, column_len));
        }
    }

    excerpts
}

/// Copy `len` samples starting at `start`, zero padding past the end
fn slice_padded(track: &[f64], start: usize, len: usize) -> Vec<f64> {
    let end = (start + len).min(track.len());
    let mut out = if start < track.len() {
        track[start..end].to_vec()
    } else {
        Vec::new()
    };
    out.resize(len, 0.0);
    out
}

/// Place speaker-ear excerpts into the canonical 14-slot order.
///
/// `excerpts` must be in `speakers` order, left ear first, as produced by
/// [`split_recording`]. Canonical slots whose speaker was not excited are
/// filled with silence of one excerpt length, so the output always has
/// exactly 14 equal length tracks.
pub fn reorder_to_canonical(excerpts: &[Vec<f64>], speakers: &[Channel]) -> Vec<Vec<f64>> {
    let excerpt_len = excerpts.first().map_or(0, |e| e.len());

    CANONICAL_ORDER
        .iter()
        .map(|&(channel, ear)| {
            match speakers.iter().position(|&s| s == channel) {
                Some(i) => {
                    let offset = match ear {
                        Ear::Left => 0,
                        Ear::Right => 1,
                    };
                    excerpts[i * 2 + offset].clone()
                }
                None => vec![0.0; excerpt_len],
            }
        })
        .collect()
}
