//! Configuration structures for the HRIR extraction pipeline

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::audio::deconv::Domain;
use crate::channel::Channel;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub segmentation: SegmentationConfig,
    pub deconvolution: DeconvolutionConfig,
    pub alignment: AlignmentConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self, crate::error::ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| crate::error::ConfigError::FileNotFound(path.display().to_string()))?;

        toml::from_str(&content).map_err(|e| crate::error::ConfigError::Parse(e.to_string()))
    }
}

/// Sweep recording segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Length of silence in the beginning, end and between test signals (seconds)
    pub silence_gap: f64,
    /// Order of excited speakers in the recording (empty = must come from CLI)
    pub speakers: Vec<Channel>,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            silence_gap: 2.0,
            speakers: Vec::new(),
        }
    }
}

/// Deconvolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeconvolutionConfig {
    /// Deconvolution domain
    pub domain: Domain,
    /// Normalized RMS level at or below which a track is treated as silence
    /// and passed through unprocessed
    pub silence_threshold: f64,
}

impl Default for DeconvolutionConfig {
    fn default() -> Self {
        Self {
            domain: Domain::Frequency,
            // Two LSB of a 16-bit capture, the near-silence level of the
            // measurement chain
            silence_threshold: 2.0 / 32768.0,
        }
    }
}

/// Response alignment and cropping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Peak detection height threshold on peak-normalized samples (0.0 - 1.0)
    pub peak_threshold: f64,
    /// Length of the fade-in applied after head cropping (samples)
    pub fade_in_samples: usize,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            peak_threshold: 0.1,
            fade_in_samples: 2,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory all output files are written to (created if missing)
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.segmentation.silence_gap, 2.0);
        assert!(config.segmentation.speakers.is_empty());
        assert_eq!(config.deconvolution.domain, Domain::Frequency);
        assert_eq!(config.alignment.peak_threshold, 0.1);
        assert_eq!(config.output.dir, PathBuf::from("out"));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
            [segmentation]
            silence_gap = 1.5
            speakers = ["FL", "FR"]

            [deconvolution]
            domain = "time"

            [output]
            dir = "responses"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.segmentation.silence_gap, 1.5);
        assert_eq!(config.segmentation.speakers, vec![Channel::Fl, Channel::Fr]);
        assert_eq!(config.deconvolution.domain, Domain::Time);
        assert_eq!(config.output.dir, PathBuf::from("responses"));
        // Untouched sections keep their defaults
        assert_eq!(config.alignment.fade_in_samples, 2);
    }
}
