//! Recording session: one multichannel sweep capture plus its metadata

use tracing::info;

use crate::audio::segment::{reorder_to_canonical, split_recording};
use crate::channel::Channel;
use crate::error::{ConfigError, DeconvError, HrirError};

/// The top level unit of work: a multichannel sweep capture, the test
/// stimulus it was made with, the order of excited speakers and the silence
/// gap between sweeps.
///
/// Construction validates what the segmenter itself assumes: an even track
/// count, a speaker list that distributes evenly over the track pairs, and
/// matching sample rates.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    recording: Vec<Vec<f64>>,
    stimulus: Vec<f64>,
    speakers: Vec<Channel>,
    silence_gap: f64,
    sample_rate: u32,
}

impl RecordingSession {
    pub fn new(
        recording: Vec<Vec<f64>>,
        recording_rate: u32,
        stimulus: Vec<f64>,
        stimulus_rate: u32,
        speakers: Vec<Channel>,
        silence_gap: f64,
    ) -> Result<Self, HrirError> {
        if speakers.is_empty() {
            return Err(ConfigError::MissingParameter("speakers").into());
        }
        if recording.len() % 2 != 0 || recording.is_empty() {
            return Err(ConfigError::OddTrackCount(recording.len()).into());
        }
        let pairs = recording.len() / 2;
        if speakers.len() % pairs != 0 {
            return Err(ConfigError::SpeakerTrackMismatch {
                speakers: speakers.len(),
                tracks: recording.len(),
            }
            .into());
        }
        if recording_rate != stimulus_rate {
            return Err(DeconvError::SampleRateMismatch {
                recording: recording_rate,
                stimulus: stimulus_rate,
            }
            .into());
        }

        Ok(Self {
            recording,
            stimulus,
            speakers,
            silence_gap,
            sample_rate: recording_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn stimulus(&self) -> &[f64] {
        &self.stimulus
    }

    pub fn speakers(&self) -> &[Channel] {
        &self.speakers
    }

    /// Segment the recording and place the excerpts into the canonical
    /// 14-slot track order, silence filled for unexcited positions
    pub fn segment(&self) -> Vec<Vec<f64>> {
        info!(
            "Segmenting {} tracks for speakers {:?}, {:.1} s gap",
            self.recording.len(),
            self.speakers,
            self.silence_gap
        );

        let excerpts = split_recording(
            &self.recording,
            self.stimulus.len(),
            &self.speakers,
            self.silence_gap,
            self.sample_rate,
        );

        reorder_to_canonical(&excerpts, &self.speakers)
    }
}
