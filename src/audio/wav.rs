//! Multichannel WAV reading/writing and sample format conversion

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::error::WavError;

/// Sample format of a WAV file, carried alongside decoded tracks so
/// outputs can preserve the input format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSpec {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub sample_format: SampleFormat,
}

impl SampleSpec {
    /// 32-bit integer spec at the given rate, the format impulse response
    /// outputs are written in
    pub fn int32(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Int,
        }
    }
}

/// Decoded contents of a WAV file: per-track normalized sample buffers
#[derive(Debug, Clone)]
pub struct WavContents {
    /// One buffer per channel, samples in -1.0..1.0
    pub tracks: Vec<Vec<f64>>,
    pub spec: SampleSpec,
}

impl WavContents {
    pub fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }
}

/// Read a WAV file fully into memory as per-channel normalized buffers
pub fn read_tracks<P: AsRef<Path>>(path: P) -> Result<WavContents, WavError> {
    let path = path.as_ref();
    let mut reader = WavReader::open(path).map_err(|source| WavError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(WavError::Empty(path.display().to_string()));
    }

    debug!(
        "Reading {}: {} channels, {} Hz, {}-bit {:?}",
        path.display(),
        spec.channels,
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format
    );

    let interleaved: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(WavError::UnsupportedFormat(
                    spec.bits_per_sample,
                    "float".to_string(),
                ));
            }
            reader
                .samples::<f32>()
                .map(|s| s.map(f64::from))
                .collect::<Result<_, _>>()
                .map_err(|source| WavError::Read {
                    path: path.display().to_string(),
                    source,
                })?
        }
        SampleFormat::Int => {
            if spec.bits_per_sample > 32 {
                return Err(WavError::UnsupportedFormat(
                    spec.bits_per_sample,
                    "int".to_string(),
                ));
            }
            let full_scale = full_scale(spec.bits_per_sample);
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(|source| WavError::Read {
                    path: path.display().to_string(),
                    source,
                })?
        }
    };

    let mut tracks = vec![Vec::with_capacity(interleaved.len() / channels); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (track, &sample) in tracks.iter_mut().zip(frame) {
            track.push(sample);
        }
    }

    Ok(WavContents {
        tracks,
        spec: SampleSpec {
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: spec.sample_format,
        },
    })
}

/// Read a mono WAV file (the test stimulus)
pub fn read_mono<P: AsRef<Path>>(path: P) -> Result<(Vec<f64>, SampleSpec), WavError> {
    let path = path.as_ref();
    let contents = read_tracks(path)?;
    if contents.tracks.len() != 1 {
        return Err(WavError::TrackCount {
            expected: 1,
            actual: contents.tracks.len(),
        });
    }
    let spec = contents.spec;
    let mut tracks = contents.tracks;
    Ok((tracks.remove(0), spec))
}

/// Write normalized per-channel buffers as an interleaved multichannel WAV
/// file. All tracks must have the same length.
pub fn write_tracks<P: AsRef<Path>>(
    path: P,
    tracks: &[Vec<f64>],
    spec: SampleSpec,
) -> Result<(), WavError> {
    let path = path.as_ref();
    let len = tracks.first().map_or(0, |t| t.len());
    debug_assert!(tracks.iter().all(|t| t.len() == len));

    let wav_spec = WavSpec {
        channels: tracks.len() as u16,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        sample_format: spec.sample_format,
    };

    let mut writer = WavWriter::create(path, wav_spec).map_err(|source| WavError::Write {
        path: path.display().to_string(),
        source,
    })?;

    let write_err = |source| WavError::Write {
        path: path.display().to_string(),
        source,
    };

    match spec.sample_format {
        SampleFormat::Float => {
            for i in 0..len {
                for track in tracks {
                    writer.write_sample(track[i] as f32).map_err(write_err)?;
                }
            }
        }
        SampleFormat::Int => {
            let full = full_scale(spec.bits_per_sample);
            let max = full - 1.0;
            for i in 0..len {
                for track in tracks {
                    let v = (track[i] * full).clamp(-full, max) as i32;
                    writer.write_sample(v).map_err(write_err)?;
                }
            }
        }
    }

    writer.finalize().map_err(|source| WavError::Write {
        path: path.display().to_string(),
        source,
    })?;

    debug!("Wrote {} ({} tracks, {} samples)", path.display(), tracks.len(), len);
    Ok(())
}

/// Full scale value for a signed integer width (e.g. 32768 for 16-bit)
fn full_scale(bits: u16) -> f64 {
    (1i64 << (bits - 1)) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_wav(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("hrir-rs-{}-{}.wav", std::process::id(), name))
    }

    #[test]
    fn test_full_scale() {
        assert_eq!(full_scale(16), 32768.0);
        assert_eq!(full_scale(8), 128.0);
        assert_eq!(full_scale(32), 2147483648.0);
    }

    #[test]
    fn test_write_read_round_trip_int16() {
        let path = temp_wav("rt16");
        let tracks = vec![vec![0.0, 0.5, -0.5, 0.25], vec![0.1, -0.1, 0.9, -0.9]];
        let spec = SampleSpec {
            sample_rate: 48000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        write_tracks(&path, &tracks, spec).unwrap();
        let contents = read_tracks(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(contents.tracks.len(), 2);
        assert_eq!(contents.spec, spec);
        for (orig, read) in tracks.iter().zip(&contents.tracks) {
            for (&a, &b) in orig.iter().zip(read) {
                assert!((a - b).abs() < 1.0 / 32768.0, "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_write_read_round_trip_float() {
        let path = temp_wav("rtf32");
        let tracks = vec![vec![0.0, 0.123, -0.456]];
        let spec = SampleSpec {
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        write_tracks(&path, &tracks, spec).unwrap();
        let (mono, read_spec) = read_mono(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(read_spec.sample_rate, 44100);
        for (&a, &b) in tracks[0].iter().zip(&mono) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_read_mono_rejects_multichannel() {
        let path = temp_wav("multi");
        let tracks = vec![vec![0.0; 4], vec![0.0; 4]];
        write_tracks(&path, &tracks, SampleSpec::int32(48000)).unwrap();

        let result = read_mono(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            result,
            Err(WavError::TrackCount {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_int32_clamps_full_scale() {
        let path = temp_wav("clamp");
        // 1.0 does not fit in signed full scale and must clamp, not wrap
        let tracks = vec![vec![1.0, -1.0, 2.0, -2.0]];
        write_tracks(&path, &tracks, SampleSpec::int32(48000)).unwrap();

        let contents = read_tracks(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        let t = &contents.tracks[0];
        assert!(t[0] > 0.99 && t[0] < 1.0);
        assert!((t[1] + 1.0).abs() < 1e-9);
        assert!(t[2] > 0.99 && t[2] < 1.0);
        assert!((t[3] + 1.0).abs() < 1e-9);
    }
}
