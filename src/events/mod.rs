//! Keystroke event records and the JSON log recorder.
//!
//! Two record shapes exist and are never mixed in one file: ground-truth
//! key presses captured from the OS hook (streaming mode), and detected
//! peaks (offline mode). Both logs are full-file rewrites, so the last
//! completed write wins.

mod listener;
#[cfg(test)]
mod tests;

pub use listener::{run_key_logger, spawn_key_hook, RawKeyPress};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Ground-truth key presses flushed to disk every this many events (plus
/// once at shutdown).
pub const LOG_FLUSH_EVERY: usize = 5;

/// One accepted detector peak. `position` is a chunk index when produced
/// by the streaming detector and a sample index when produced by the
/// offline scan; the two spaces are not comparable and are kept apart on
/// purpose. `time_secs` is seconds since the run start (streaming) or
/// since the start of the buffer (offline).
#[derive(Debug, Clone, PartialEq)]
pub struct PeakEvent {
    pub position: usize,
    pub value: f32,
    pub time_secs: f64,
}

/// Serialized form of an offline detected peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakRecord {
    pub sample_index: usize,
    pub time: String,
    pub amplitude: f32,
}

impl PeakRecord {
    /// Build the log record for a peak at `sample_index`. The timestamp is
    /// the buffer offset rendered as an instant relative to the Unix epoch.
    pub fn from_sample_peak(sample_index: usize, amplitude: f32, sample_rate: u32) -> Self {
        let offset_secs = sample_index as f64 / f64::from(sample_rate.max(1));
        Self {
            sample_index,
            time: rfc3339_from_epoch_secs(offset_secs),
            amplitude,
        }
    }
}

/// One ground-truth key press. `frame_index` is the capture chunk count at
/// the time of the press, or `None` when capture was not active yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPressEvent {
    pub key: String,
    pub time: String,
    pub frame_index: Option<usize>,
}

/// Append-only accumulator for ground-truth presses with periodic
/// full-rewrite persistence.
pub struct KeystrokeLog {
    events: Vec<KeyPressEvent>,
    path: PathBuf,
    flush_every: usize,
}

impl KeystrokeLog {
    pub fn new(path: impl Into<PathBuf>, flush_every: usize) -> Self {
        Self {
            events: Vec::new(),
            path: path.into(),
            flush_every: flush_every.max(1),
        }
    }

    /// Record a press; rewrites the log whenever the accumulated count hits
    /// a multiple of the batch size.
    pub fn push(&mut self, event: KeyPressEvent) -> Result<()> {
        self.events.push(event);
        if self.events.len() % self.flush_every == 0 {
            self.save()?;
        }
        Ok(())
    }

    /// Rewrite the destination with every accumulated record, in insertion
    /// order.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.events)
            .context("failed to serialize keystroke log")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write keystroke log {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[KeyPressEvent] {
        &self.events
    }
}

/// Rewrite the detected-peak log in full.
pub fn write_peak_log(records: &[PeakRecord], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(records).context("failed to serialize peak log")?;
    fs::write(path, json).with_context(|| format!("failed to write peak log {}", path.display()))
}

/// Current wall-clock time as RFC 3339.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("unknown"))
}

fn rfc3339_from_epoch_secs(secs: f64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos((secs * 1e9) as i128)
        .ok()
        .and_then(|ts| ts.format(&Rfc3339).ok())
        .unwrap_or_else(|| format!("{secs:.6}"))
}
