//! HRIR extraction CLI application

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use hrir_rs::audio::{self, wav};
use hrir_rs::{
    parse_speakers, process_pair, Config, DeconvError, HrirError, RecordingSession, SampleSpec,
    WavError, CHANNELS, HESUVI_ORDER,
};

/// HRIR extraction pipeline
#[derive(Parser)]
#[command(name = "hrir-rs")]
#[command(about = "Extracts binaural impulse responses from sine sweep recordings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a sweep recording into per-speaker tracks in canonical order
    Preprocess {
        /// Path to the sine sweep recording
        #[arg(short, long)]
        recording: PathBuf,

        /// Path to the sine sweep test signal
        #[arg(short, long)]
        test: PathBuf,

        /// Order of speakers in the recording, comma separated (FL,FR,FC,BL,BR,SL,SR)
        #[arg(short, long)]
        speakers: Option<String>,

        /// Length of silence in the beginning, end and between sweeps (seconds)
        #[arg(short = 'g', long)]
        silence_gap: Option<f64>,
    },

    /// Deconvolve a preprocessed recording into raw impulse responses
    Deconvolve {
        /// Path to the preprocessed 14-track recording
        #[arg(short, long)]
        recording: PathBuf,

        /// Path to the sine sweep test signal
        #[arg(short, long)]
        test: PathBuf,

        /// Deconvolution domain (frequency or time)
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Align, crop and pack impulse responses into the final HRIR files
    Postprocess {
        /// Path to the 14-track raw impulse responses
        #[arg(short, long)]
        responses: PathBuf,
    },

    /// Run the whole pipeline: preprocess, deconvolve, postprocess
    Run {
        /// Path to the sine sweep recording
        #[arg(short, long)]
        recording: PathBuf,

        /// Path to the sine sweep test signal
        #[arg(short, long)]
        test: PathBuf,

        /// Order of speakers in the recording, comma separated (FL,FR,FC,BL,BR,SL,SR)
        #[arg(short, long)]
        speakers: Option<String>,

        /// Length of silence in the beginning, end and between sweeps (seconds)
        #[arg(short = 'g', long)]
        silence_gap: Option<f64>,

        /// Deconvolution domain (frequency or time)
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Export headphone magnitude responses as CSV for equalization
    Equalize {
        /// Path to a stereo headphone sweep recording
        #[arg(long)]
        headphones: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging - quiet by default, use -v for more
    let log_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    // Load configuration
    let mut config = if let Some(ref config_path) = cli.config {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Preprocess {
            recording,
            test,
            speakers,
            silence_gap,
        } => {
            apply_segmentation_overrides(&mut config, speakers, silence_gap)?;
            std::fs::create_dir_all(&config.output.dir)?;
            run_preprocess(&config, &recording, &test)?;
            Ok(())
        }
        Commands::Deconvolve {
            recording,
            test,
            domain,
        } => {
            if let Some(domain) = domain {
                config.deconvolution.domain = domain.parse().map_err(HrirError::from)?;
            }
            std::fs::create_dir_all(&config.output.dir)?;

            let preprocessed = wav::read_tracks(&recording).map_err(HrirError::from)?;
            expect_tracks(&preprocessed, 14)?;
            let (stimulus, stimulus_spec) = wav::read_mono(&test).map_err(HrirError::from)?;
            if stimulus_spec.sample_rate != preprocessed.sample_rate() {
                return Err(HrirError::from(DeconvError::SampleRateMismatch {
                    recording: preprocessed.sample_rate(),
                    stimulus: stimulus_spec.sample_rate,
                })
                .into());
            }

            run_deconvolve(
                &config,
                &preprocessed.tracks,
                &stimulus,
                preprocessed.sample_rate(),
            )?;
            Ok(())
        }
        Commands::Postprocess { responses } => {
            std::fs::create_dir_all(&config.output.dir)?;
            let contents = wav::read_tracks(&responses).map_err(HrirError::from)?;
            expect_tracks(&contents, 14)?;
            run_postprocess(&config, &contents.tracks, contents.sample_rate())
        }
        Commands::Run {
            recording,
            test,
            speakers,
            silence_gap,
            domain,
        } => {
            apply_segmentation_overrides(&mut config, speakers, silence_gap)?;
            if let Some(domain) = domain {
                config.deconvolution.domain = domain.parse().map_err(HrirError::from)?;
            }
            std::fs::create_dir_all(&config.output.dir)?;

            let (tracks, spec, stimulus) = run_preprocess(&config, &recording, &test)?;
            let responses = run_deconvolve(&config, &tracks, &stimulus, spec.sample_rate)?;
            run_postprocess(&config, &responses, spec.sample_rate)
        }
        Commands::Equalize { headphones } => {
            std::fs::create_dir_all(&config.output.dir)?;
            run_equalize(&config, &headphones)
        }
    }
}

fn apply_segmentation_overrides(
    config: &mut Config,
    speakers: Option<String>,
    silence_gap: Option<f64>,
) -> Result<()> {
    if let Some(speakers) = speakers {
        config.segmentation.speakers = parse_speakers(&speakers).map_err(HrirError::from)?;
    }
    if let Some(silence_gap) = silence_gap {
        config.segmentation.silence_gap = silence_gap;
    }
    Ok(())
}

fn expect_tracks(contents: &wav::WavContents, expected: usize) -> Result<()> {
    if contents.tracks.len() != expected {
        return Err(HrirError::from(WavError::TrackCount {
            expected,
            actual: contents.tracks.len(),
        })
        .into());
    }
    Ok(())
}

/// Segment the recording into the canonical 14-track layout and write the
/// preprocessed sweeps plus the duplicated test signal (for use with an
/// external deconvolver)
fn run_preprocess(
    config: &Config,
    recording_path: &Path,
    test_path: &Path,
) -> Result<(Vec<Vec<f64>>, SampleSpec, Vec<f64>)> {
    info!("Pre-processing {}", recording_path.display());

    let recording = wav::read_tracks(recording_path)
        .map_err(HrirError::from)
        .with_context(|| format!("Failed to read recording {}", recording_path.display()))?;
    let (stimulus, stimulus_spec) = wav::read_mono(test_path)
        .map_err(HrirError::from)
        .with_context(|| format!("Failed to read test signal {}", test_path.display()))?;

    let spec = recording.spec;
    let session = RecordingSession::new(
        recording.tracks,
        spec.sample_rate,
        stimulus,
        stimulus_spec.sample_rate,
        config.segmentation.speakers.clone(),
        config.segmentation.silence_gap,
    )?;

    let mut tracks = session.segment();
    audio::normalize_tracks(&mut tracks);

    let preprocessed_path = config.output.dir.join("preprocessed.wav");
    wav::write_tracks(&preprocessed_path, &tracks, spec).map_err(HrirError::from)?;
    info!("Wrote {}", preprocessed_path.display());

    // The same stimulus on every track, for an external deconvolution tool
    let duplicated: Vec<Vec<f64>> = vec![session.stimulus().to_vec(); tracks.len()];
    let tests_path = config.output.dir.join("tests.wav");
    wav::write_tracks(&tests_path, &duplicated, stimulus_spec).map_err(HrirError::from)?;
    info!("Wrote {}", tests_path.display());

    let stimulus = session.stimulus().to_vec();
    Ok((tracks, spec, stimulus))
}

/// Deconvolve all 14 tracks against the stimulus and write the raw impulse
/// responses. Near-silent tracks (unexcited positions) pass through.
fn run_deconvolve(
    config: &Config,
    tracks: &[Vec<f64>],
    stimulus: &[f64],
    sample_rate: u32,
) -> Result<Vec<Vec<f64>>> {
    info!(
        "Deconvolving {} tracks in {} domain",
        tracks.len(),
        config.deconvolution.domain
    );

    let threshold = config.deconvolution.silence_threshold;
    let mut responses = Vec::with_capacity(tracks.len());
    for track in tracks {
        if audio::rms(track) > threshold {
            let h = hrir_rs::deconvolve(track, stimulus, config.deconvolution.domain)
                .map_err(HrirError::from)?;
            responses.push(h);
        } else {
            // Deconvolving near-zero signal is numerically meaningless
            responses.push(track.clone());
        }
    }

    let responses_path = config.output.dir.join("responses.wav");
    wav::write_tracks(&responses_path, &responses, SampleSpec::int32(sample_rate))
        .map_err(HrirError::from)?;
    info!("Wrote {}", responses_path.display());

    Ok(responses)
}

/// Crop and align all response pairs, pad them to a common length and write
/// the canonical and HeSuVi order HRIR files
fn run_postprocess(config: &Config, responses: &[Vec<f64>], sample_rate: u32) -> Result<()> {
    info!("Post-processing {} responses", responses.len());

    let mut cropped = Vec::with_capacity(responses.len());
    for (channel, pair) in CHANNELS.iter().zip(responses.chunks_exact(2)) {
        let (left, right) = process_pair(
            &pair[0],
            &pair[1],
            *channel,
            sample_rate,
            &config.alignment,
            config.deconvolution.silence_threshold,
        )
        .map_err(HrirError::from)
        .with_context(|| format!("Failed to align channel {}", channel))?;
        cropped.push(left);
        cropped.push(right);
    }

    hrir_rs::pad_to_longest(&mut cropped);

    let spec = SampleSpec::int32(sample_rate);
    let hrir_path = config.output.dir.join("hrir.wav");
    wav::write_tracks(&hrir_path, &cropped, spec).map_err(HrirError::from)?;
    info!("Wrote {}", hrir_path.display());

    let hesuvi = hrir_rs::reorder(&cropped, &HESUVI_ORDER);
    let hesuvi_path = config.output.dir.join("hesuvi.wav");
    wav::write_tracks(&hesuvi_path, &hesuvi, spec).map_err(HrirError::from)?;
    info!("Wrote {}", hesuvi_path.display());

    Ok(())
}

/// Write per-ear magnitude response CSVs from a stereo headphone sweep
/// recording, in the format the equalizer tooling expects
fn run_equalize(config: &Config, headphones_path: &Path) -> Result<()> {
    info!("Equalizing from {}", headphones_path.display());

    let contents = wav::read_tracks(headphones_path).map_err(HrirError::from)?;
    expect_tracks(&contents, 2)?;

    for (track, ear) in contents.tracks.iter().zip(["left", "right"]) {
        let spectrum = hrir_rs::magnitude_spectrum(track, contents.sample_rate());

        let path = config.output.dir.join(format!("headphones-{}.csv", ear));
        let mut file =
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        writeln!(file, "frequency,raw")?;
        // The DC bin carries no equalization information
        for (frequency, magnitude) in spectrum.iter().skip(1) {
            writeln!(file, "{:.2},{:.2}", frequency, magnitude)?;
        }
        info!("Wrote {}", path.display());
    }

    Ok(())
}
