//! Impulse response tail cropping, onset alignment and inter-aural timing

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::audio::rms;
use crate::channel::{Channel, Side};
use crate::config::AlignmentConfig;
use crate::error::AlignError;

/// Absolute noise floor, -60 dB on a power scale. A very quiet tail must
/// not drive the estimated floor below this.
const ABSOLUTE_FLOOR: f64 = 1e-6;

/// Number of trailing RMS windows used to estimate the ambient level
const TRAILING_WINDOWS: usize = 10;

/// Trailing windows are accepted as an ambient noise estimate only when
/// their levels are flat to within this factor of their mean
const TRAILING_FLATNESS: f64 = 1.25;

/// Crop the silent tail of an impulse response.
///
/// The buffer is scanned in one millisecond RMS windows. The noise floor is
/// ten times the trailing ambient level, but never below the absolute -60 dB
/// floor; a trailing level that is not flat is decaying signal, not ambient
/// noise, and only the absolute floor applies. Everything after the last
/// window that exceeds the floor is cut.
pub fn crop_tail(samples: &[f64], sample_rate: u32) -> Vec<f64> {
    let window = (sample_rate as usize / 1000).max(1);
    let windows: Vec<f64> = samples.chunks_exact(window).map(rms).collect();
    if windows.is_empty() {
        return samples.to_vec();
    }

    let trailing = &windows[windows.len().saturating_sub(TRAILING_WINDOWS)..];
    let mean_trailing = trailing.iter().sum::<f64>() / trailing.len() as f64;
    let max_trailing = trailing.iter().cloned().fold(0.0f64, f64::max);

    // A flat trailing level measures ambient noise. A buffer already
    // cropped to its last informative window ends in decaying signal
    // instead, and a floor derived from decay would cut further into the
    // response on every pass; only the absolute floor applies then.
    let noise_floor = if max_trailing <= TRAILING_FLATNESS * mean_trailing {
        (10.0 * mean_trailing).max(ABSOLUTE_FLOOR)
    } else {
        ABSOLUTE_FLOOR
    };

    let end = match windows.iter().rposition(|&w| w > noise_floor) {
        Some(last) => (last + 1) * window,
        // Nothing above the floor anywhere: degenerate, crop maximally
        None => window,
    };

    trace!(
        "Tail crop: floor {:.2e}, keeping {}/{} samples",
        noise_floor,
        end,
        samples.len()
    );
    samples[..end.min(samples.len())].to_vec()
}

/// First local maximum whose peak-normalized height exceeds `threshold`,
/// locating the direct sound arrival. Buffer edges count as maxima so an
/// already aligned response with its peak at sample 0 is still detected.
fn find_onset(samples: &[f64], threshold: f64) -> Option<usize> {
    let peak = samples.iter().map(|s| s.abs()).fold(0.0f64, f64::max);
    if peak <= 0.0 {
        return None;
    }

    for i in 0..samples.len() {
        let v = samples[i] / peak;
        let rising = i == 0 || samples[i] > samples[i - 1];
        let falling = i == samples.len() - 1 || samples[i] > samples[i + 1];
        if v > threshold && rising && falling {
            return Some(i);
        }
    }
    None
}

/// Drop `cut` samples from the head, or prepend silence when the onset
/// already sits earlier than the target delay
fn trim_head(samples: &[f64], cut: isize) -> Vec<f64> {
    if cut >= 0 {
        samples[(cut as usize).min(samples.len())..].to_vec()
    } else {
        let mut out = vec![0.0; (-cut) as usize];
        out.extend_from_slice(samples);
        out
    }
}

/// Short linear fade so the response starts from true silence instead of a
/// truncation discontinuity
fn fade_in(samples: &mut [f64], fade_samples: usize) {
    let n = fade_samples.min(samples.len());
    for (i, sample) in samples.iter_mut().take(n).enumerate() {
        *sample *= i as f64 / fade_samples as f64;
    }
}

/// Crop the silent head of a left/right ear impulse response pair and anchor
/// its timing to the speaker position's expected delay.
///
/// The onset is detected independently per ear; the inter-aural time
/// difference is preserved while the near ear onset is moved to exactly the
/// configured delay. An onset order that contradicts the position's nominal
/// side is a recording fault and fails with the channel named.
pub fn crop_head(
    left: &[f64],
    right: &[f64],
    channel: Channel,
    sample_rate: u32,
    config: &AlignmentConfig,
) -> Result<(Vec<f64>, Vec<f64>), AlignError> {
    let onset_left = find_onset(left, config.peak_threshold).ok_or(AlignError::NoPeak {
        channel,
        ear: "left",
    })?;
    let onset_right = find_onset(right, config.peak_threshold).ok_or(AlignError::NoPeak {
        channel,
        ear: "right",
    })?;

    let itd_ms = (onset_left as f64 - onset_right as f64).abs() / sample_rate as f64 * 1000.0;
    debug!(
        "{}: onsets L {} R {} samples, ITD {:.3} ms",
        channel, onset_left, onset_right, itd_ms
    );

    // The ear on the speaker's side must hear the impulse first
    match onset_left.cmp(&onset_right) {
        Ordering::Less => {
            if channel.side() == Side::Right {
                return Err(AlignError::DirectionMismatch {
                    channel,
                    measured: "left",
                });
            }
        }
        Ordering::Greater => {
            if channel.side() == Side::Left {
                return Err(AlignError::DirectionMismatch {
                    channel,
                    measured: "right",
                });
            }
        }
        // Simultaneous arrival carries no side information
        Ordering::Equal => {}
    }

    // Moving the near ear onset to the configured delay moves the far ear
    // onset to delay + ITD with the same cut
    let delay_samples =
        (channel.expected_delay_ms() / 1000.0 * sample_rate as f64).round() as isize;
    let cut = onset_left.min(onset_right) as isize - delay_samples;

    let mut left = trim_head(left, cut);
    let mut right = trim_head(right, cut);
    fade_in(&mut left, config.fade_in_samples);
    fade_in(&mut right, config.fade_in_samples);

    Ok((left, right))
}

/// Run one channel's response pair through tail cropping and head alignment.
///
/// A pair where either ear sits at or below the silence threshold carries no
/// usable content and collapses to single sample placeholders, keeping the
/// slot present without processing numerically meaningless data.
pub fn process_pair(
    left: &[f64],
    right: &[f64],
    channel: Channel,
    sample_rate: u32,
    config: &AlignmentConfig,
    silence_threshold: f64,
) -> Result<(Vec<f64>, Vec<f64>), AlignError> {
    if rms(left) <= silence_threshold || rms(right) <= silence_threshold {
        debug!("{}: below silence threshold, keeping placeholder", channel);
        return Ok((vec![0.0], vec![0.0]));
    }

    let left = crop_tail(left, sample_rate);
    let right = crop_tail(right, sample_rate);
    crop_head(&left, &right, channel, sample_rate, config)
}
