//! Integration tests for hrir-rs

use hrir_rs::{
    deconvolve, normalize_tracks, pad_to_longest, process_pair, read_tracks, reorder, rms,
    write_tracks, AlignError, AlignmentConfig, Channel, Config, Domain, RecordingSession,
    SampleSpec, CHANNELS, HESUVI_ORDER,
};

const FS: u32 = 48000;
const SILENCE_THRESHOLD: f64 = 2.0 / 32768.0;

/// Linear sweep from DC to Nyquist. Starts at full scale so its spectrum
/// has no empty bins and spectral division stays well conditioned.
fn sweep(len: usize, sample_rate: u32) -> Vec<f64> {
    let fs = sample_rate as f64;
    let duration = len as f64 / fs;
    (0..len)
        .map(|i| {
            let t = i as f64 / fs;
            (std::f64::consts::PI * (fs / 2.0) / duration * t * t).cos()
        })
        .collect()
}

/// A plausible single ear response: arrival peak at `delay` followed by a
/// short exponential decay
fn ear_response(delay: usize, gain: f64) -> Vec<f64> {
    let mut h = vec![0.0; delay + 21];
    h[delay] = gain;
    for i in 1..=20 {
        h[delay + i] = gain * 0.3 * (-(i as f64) / 6.0).exp();
    }
    h
}

/// Full linear convolution
fn convolve(x: &[f64], h: &[f64]) -> Vec<f64> {
    let mut y = vec![0.0; x.len() + h.len() - 1];
    for (i, &xi) in x.iter().enumerate() {
        for (j, &hj) in h.iter().enumerate() {
            y[i + j] += xi * hj;
        }
    }
    y
}

fn argmax(samples: &[f64]) -> usize {
    samples
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.abs().partial_cmp(&b.1.abs()).unwrap())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn place(track: &mut [f64], offset: usize, samples: &[f64]) {
    track[offset..offset + samples.len()].copy_from_slice(samples);
}

/// Stereo capture of FL and FR sweeps played back to back, with known
/// per-ear arrival times (near ear 100 samples, far ear 120)
fn synthetic_recording(stimulus: &[f64], gap: usize) -> Vec<Vec<f64>> {
    let column = gap + stimulus.len();
    let total = gap + 2 * column;
    let mut left = vec![0.0; total];
    let mut right = vec![0.0; total];

    let near = ear_response(100, 0.9);
    let far = ear_response(120, 0.8);

    place(&mut left, gap, &convolve(stimulus, &near));
    place(&mut right, gap, &convolve(stimulus, &far));
    place(&mut left, gap + column, &convolve(stimulus, &far));
    place(&mut right, gap + column, &convolve(stimulus, &near));

    vec![left, right]
}

/// Segment, deconvolve, crop and pack a two speaker measurement and check
/// the timing of every resulting track
#[test]
fn test_full_pipeline_stereo_pair() {
    let stimulus = sweep(4096, FS);
    let gap = 2400; // 50 ms
    let recording = synthetic_recording(&stimulus, gap);

    let session = RecordingSession::new(
        recording,
        FS,
        stimulus.clone(),
        FS,
        vec![Channel::Fl, Channel::Fr],
        gap as f64 / FS as f64,
    )
    .unwrap();

    let mut tracks = session.segment();
    assert_eq!(tracks.len(), 14);
    normalize_tracks(&mut tracks);

    let responses: Vec<Vec<f64>> = tracks
        .iter()
        .map(|track| {
            if rms(track) > SILENCE_THRESHOLD {
                deconvolve(track, session.stimulus(), Domain::Frequency).unwrap()
            } else {
                track.clone()
            }
        })
        .collect();

    // Raw responses recover the planted arrival times exactly
    assert_eq!(argmax(&responses[0]), 100);
    assert_eq!(argmax(&responses[1]), 120);
    assert_eq!(argmax(&responses[2]), 120);
    assert_eq!(argmax(&responses[3]), 100);

    let config = AlignmentConfig::default();
    let mut cropped = Vec::new();
    for (channel, pair) in CHANNELS.iter().zip(responses.chunks_exact(2)) {
        let (left, right) = process_pair(
            &pair[0],
            &pair[1],
            *channel,
            FS,
            &config,
            SILENCE_THRESHOLD,
        )
        .unwrap();
        cropped.push(left);
        cropped.push(right);
    }
    pad_to_longest(&mut cropped);

    let len = cropped[0].len();
    assert!(len > 0);
    assert!(cropped.iter().all(|t| t.len() == len));

    // The near ear onset sits at the position's expected delay and the
    // 20 sample inter-aural difference survives the alignment
    let delay = (Channel::Fl.expected_delay_ms() / 1000.0 * FS as f64).round() as usize;
    assert_eq!(argmax(&cropped[0]), delay);
    assert_eq!(argmax(&cropped[1]), delay + 20);
    assert_eq!(argmax(&cropped[2]), delay + 20);
    assert_eq!(argmax(&cropped[3]), delay);

    // Slots without a measured speaker stay silent
    for track in &cropped[4..] {
        assert!(track.iter().all(|&s| s == 0.0));
    }

    // The HeSuVi file is a pure permutation of the canonical one
    let hesuvi = reorder(&cropped, &HESUVI_ORDER);
    assert_eq!(hesuvi[0], cropped[0]); // FL left leads both orders
    assert_eq!(hesuvi[7], cropped[3]); // FR right
    assert_eq!(hesuvi[8], cropped[2]); // FR left
    assert_eq!(hesuvi[13], cropped[5]); // FC right closes the file
}

#[test]
fn test_silent_recording_collapses_to_placeholders() {
    let stimulus = sweep(1024, FS);
    let gap = 480;
    let column = gap + stimulus.len();
    let tracks = vec![vec![0.0; gap + 2 * column]; 2];

    let session = RecordingSession::new(
        tracks,
        FS,
        stimulus,
        FS,
        vec![Channel::Fl, Channel::Fr],
        gap as f64 / FS as f64,
    )
    .unwrap();

    let mut segmented = session.segment();
    normalize_tracks(&mut segmented);

    let config = AlignmentConfig::default();
    let mut cropped = Vec::new();
    for (channel, pair) in CHANNELS.iter().zip(segmented.chunks_exact(2)) {
        let (left, right) = process_pair(
            &pair[0],
            &pair[1],
            *channel,
            FS,
            &config,
            SILENCE_THRESHOLD,
        )
        .unwrap();
        cropped.push(left);
        cropped.push(right);
    }
    pad_to_longest(&mut cropped);

    assert_eq!(cropped.len(), 14);
    assert!(cropped.iter().all(|t| t == &vec![0.0]));
}

#[test]
fn test_direction_mismatch_is_rejected() {
    // Right ear leads on a nominally left side position
    let mut left = ear_response(120, 0.8);
    let mut right = ear_response(100, 0.9);
    left.resize(4000, 0.0);
    right.resize(4000, 0.0);

    let config = AlignmentConfig::default();
    let result = process_pair(&left, &right, Channel::Fl, FS, &config, SILENCE_THRESHOLD);
    assert!(matches!(
        result,
        Err(AlignError::DirectionMismatch {
            channel: Channel::Fl,
            measured: "right"
        })
    ));
}

#[test]
fn test_deconvolution_domains_agree() {
    let stimulus = sweep(128, FS);
    let mut recording = convolve(&stimulus, &ear_response(10, 0.7));
    recording.resize(256, 0.0);

    let frequency = deconvolve(&recording, &stimulus, Domain::Frequency).unwrap();
    let time = deconvolve(&recording, &stimulus, Domain::Time).unwrap();

    assert_eq!(frequency.len(), time.len());
    for (a, b) in frequency.iter().zip(&time) {
        assert!((a - b).abs() < 1e-6);
    }
}

#[test]
fn test_wav_round_trip_int32() {
    let tracks: Vec<Vec<f64>> = (0..14)
        .map(|i| {
            (0..256)
                .map(|j| ((i * 31 + j * 7) as f64 * 0.37).sin() * 0.5)
                .collect()
        })
        .collect();

    let path = std::env::temp_dir().join("hrir_rs_integration_round_trip.wav");
    write_tracks(&path, &tracks, SampleSpec::int32(FS)).unwrap();
    let contents = read_tracks(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(contents.tracks.len(), 14);
    assert_eq!(contents.sample_rate(), FS);
    for (original, read) in tracks.iter().zip(&contents.tracks) {
        for (a, b) in original.iter().zip(read) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}

#[test]
fn test_config_file_round_trip() {
    let toml = r#"
        [segmentation]
        silence_gap = 1.5
        speakers = ["FL", "FR", "FC"]

        [deconvolution]
        domain = "time"

        [output]
        dir = "measurements"
    "#;

    let path = std::env::temp_dir().join("hrir_rs_integration_config.toml");
    std::fs::write(&path, toml).unwrap();
    let config = Config::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.segmentation.silence_gap, 1.5);
    assert_eq!(
        config.segmentation.speakers,
        vec![Channel::Fl, Channel::Fr, Channel::Fc]
    );
    assert_eq!(config.deconvolution.domain, Domain::Time);
    assert_eq!(config.output.dir, std::path::PathBuf::from("measurements"));
    // Unspecified sections keep their defaults
    assert_eq!(config.alignment.fade_in_samples, 2);
}
