//! Keystroke-peak detection and audio segmentation pipeline.
//!
//! Audio is captured via CPAL (streaming mode) or decoded from a WAV file
//! (offline mode), reduced to an energy profile, scanned for amplitude
//! peaks, and split into per-keystroke segments at the accepted peaks.

/// Capture sample rate for streaming mode (Hz, mono).
pub const SAMPLE_RATE: u32 = 44_100;

/// Samples per capture chunk in streaming mode. Streaming peak positions
/// are expressed in multiples of this.
pub const CHUNK_SAMPLES: usize = 1_024;

mod capture;
mod detector;
mod dispatch;
mod energy;
mod segment;

pub use capture::{Recorder, StreamingRun};
pub use detector::{detect_peaks, DetectorConfig, StreamingDetector};
pub use energy::{energy_profile, mean_amplitude, EnergyMode};
pub use segment::{plan_offline, plan_streaming, split_points, Segment};
