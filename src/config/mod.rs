//! Command-line parsing and validation helpers.


use crate::audio::{DetectorConfig, SAMPLE_RATE};
use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_STREAM_THRESHOLD: f32 = 500.0;
pub const DEFAULT_OFFLINE_THRESHOLD: f32 = 0.015;
pub const DEFAULT_MIN_GAP_SECS: f32 = 0.1;
pub const DEFAULT_WINDOW_SECS: f32 = 0.05;
pub const DEFAULT_MIN_SEGMENT_SECS: f32 = 0.05;
pub const DEFAULT_OUTPUT_DIR: &str = "split_audio";
pub const DEFAULT_LOG_FILE: &str = "keystroke_log.json";

const MIN_SAMPLE_RATE: u32 = 8_000;
const MAX_SAMPLE_RATE: u32 = 192_000;

/// CLI options for the keysplit binary. Validated values keep the
/// detectors and file writers within sane operating ranges.
#[derive(Debug, Parser)]
#[command(name = "keysplit", about = "Keystroke-triggered audio splitter", author, version)]
pub struct AppConfig {
    /// Enable debug file logging
    #[arg(long = "logs", env = "KEYSPLIT_LOGS", global = true)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "KEYSPLIT_NO_LOGS", global = true)]
    pub no_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record live from the microphone, log ground-truth key presses, and
    /// split the recording at detected keystrokes
    Stream(StreamArgs),
    /// Analyze a recorded WAV file and split it at detected keystrokes
    Split(SplitArgs),
}

#[derive(Debug, Args, Clone)]
pub struct StreamArgs {
    /// Amplitude threshold for keystroke detection (raw i16 units)
    #[arg(long, default_value_t = DEFAULT_STREAM_THRESHOLD)]
    pub threshold: f32,

    /// Minimum time gap between accepted keystrokes (seconds)
    #[arg(long = "min-gap", default_value_t = DEFAULT_MIN_GAP_SECS)]
    pub min_gap: f32,

    /// Directory for the emitted segment files
    #[arg(long = "output-dir", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Destination for the ground-truth keystroke log
    #[arg(long = "log-file", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Preferred audio input device name
    #[arg(long = "input-device")]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices")]
    pub list_input_devices: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SplitArgs {
    /// Path to the input WAV file
    #[arg(long = "input-file")]
    pub input_file: PathBuf,

    /// Energy threshold for keystroke detection (normalized domain)
    #[arg(long, default_value_t = DEFAULT_OFFLINE_THRESHOLD)]
    pub threshold: f32,

    /// Minimum gap between accepted keystrokes (seconds)
    #[arg(long = "min-gap", default_value_t = DEFAULT_MIN_GAP_SECS)]
    pub min_gap: f32,

    /// Local-maximum half-window for the peak scan (seconds)
    #[arg(long = "window-duration", default_value_t = DEFAULT_WINDOW_SECS)]
    pub window_duration: f32,

    /// Minimum emitted segment duration (seconds)
    #[arg(long = "min-segment-duration", default_value_t = DEFAULT_MIN_SEGMENT_SECS)]
    pub min_segment_duration: f32,

    /// Analysis sample rate; the input is resampled to this (Hz)
    #[arg(long = "sample-rate", default_value_t = SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Directory for the emitted segment files
    #[arg(long = "output-dir", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Destination for the detected-peak log
    #[arg(long = "log-file", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,
}

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match &self.command {
            Command::Stream(args) => args.validate(),
            Command::Split(args) => args.validate(),
        }
    }
}

impl StreamArgs {
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            bail!("--threshold must be a positive amplitude, got {}", self.threshold);
        }
        if !self.min_gap.is_finite() || self.min_gap <= 0.0 {
            bail!("--min-gap must be a positive duration, got {}", self.min_gap);
        }
        Ok(())
    }

    /// Streaming preset with the CLI overrides applied.
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            threshold: self.threshold,
            min_gap_secs: self.min_gap,
            ..DetectorConfig::streaming()
        }
    }
}

impl SplitArgs {
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            bail!("--threshold must be a positive energy value, got {}", self.threshold);
        }
        if !self.min_gap.is_finite() || self.min_gap <= 0.0 {
            bail!("--min-gap must be a positive duration, got {}", self.min_gap);
        }
        if !self.window_duration.is_finite() || self.window_duration <= 0.0 {
            bail!(
                "--window-duration must be a positive duration, got {}",
                self.window_duration
            );
        }
        if !self.min_segment_duration.is_finite() || self.min_segment_duration <= 0.0 {
            bail!(
                "--min-segment-duration must be a positive duration, got {}",
                self.min_segment_duration
            );
        }
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            bail!(
                "--sample-rate must be between {MIN_SAMPLE_RATE} and {MAX_SAMPLE_RATE} Hz, got {}",
                self.sample_rate
            );
        }
        Ok(())
    }

    /// Offline preset with the CLI overrides applied.
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            threshold: self.threshold,
            min_gap_secs: self.min_gap,
            window_secs: self.window_duration,
            ..DetectorConfig::offline()
        }
    }

    pub fn min_segment_samples(&self) -> usize {
        (self.min_segment_duration as f64 * f64::from(self.sample_rate)) as usize
    }
}
