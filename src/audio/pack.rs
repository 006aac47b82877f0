//! Zero padding and channel ordering of the final impulse response set

use tracing::debug;

use crate::channel::{canonical_index, Slot};

/// Zero pad every buffer on its trailing edge to the length of the longest,
/// making the set rectangular for an interleaved multichannel container
pub fn pad_to_longest(tracks: &mut [Vec<f64>]) {
    let max_len = tracks.iter().map(Vec::len).max().unwrap_or(0);
    debug!("Padding {} tracks to {} samples", tracks.len(), max_len);
    for track in tracks.iter_mut() {
        track.resize(max_len, 0.0);
    }
}

/// Reorder canonical-order tracks into the given slot order. No content
/// transformation, only a permutation.
pub fn reorder(tracks: &[Vec<f64>], order: &[Slot; 14]) -> Vec<Vec<f64>> {
    order
        .iter()
        .map(|&slot| tracks[canonical_index(slot)].clone())
        .collect()
}
