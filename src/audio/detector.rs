//! Threshold-plus-local-maximum peak detection.
//!
//! One configuration type covers both detection variants so the defaults
//! live in named presets instead of drifting across copies. The streaming
//! detector is causal and cheap (one decision per capture chunk); the
//! offline detector scans a full energy profile with a true symmetric
//! local-maximum test.

use super::energy::{mean_amplitude, EnergyMode};
use crate::events::PeakEvent;
use std::collections::VecDeque;

/// Tunables shared by both detector variants.
///
/// `threshold` is compared in the same numeric domain as the signal the
/// detector sees: raw i16 amplitude units for streaming capture, the
/// normalized `[-1, 1]` domain for decoded files. No rescaling happens
/// on this side.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub threshold: f32,
    pub min_gap_secs: f32,
    /// Half-width of the offline local-maximum window, in seconds.
    pub window_secs: f32,
    /// Capacity of the streaming mean-amplitude ring window, in chunks.
    pub window_chunks: usize,
    pub energy_mode: EnergyMode,
}

impl DetectorConfig {
    /// Live-capture preset: raw i16 amplitude units, causal window of 5
    /// chunk means.
    pub fn streaming() -> Self {
        Self {
            threshold: 500.0,
            min_gap_secs: 0.1,
            window_secs: 0.05,
            window_chunks: 5,
            energy_mode: EnergyMode::Amplitude,
        }
    }

    /// File-analysis preset: normalized squared-amplitude domain.
    pub fn offline() -> Self {
        Self {
            threshold: 0.015,
            min_gap_secs: 0.1,
            window_secs: 0.05,
            window_chunks: 5,
            energy_mode: EnergyMode::Energy,
        }
    }

    pub fn min_gap_samples(&self, sample_rate: u32) -> usize {
        (self.min_gap_secs as f64 * f64::from(sample_rate)) as usize
    }

    pub fn window_samples(&self, sample_rate: u32) -> usize {
        (self.window_secs as f64 * f64::from(sample_rate)) as usize
    }
}

/// Causal per-chunk peak detector for live capture.
///
/// Accepted peak positions are **chunk indices** (the count of chunks seen
/// when the peak fired, minus one), not sample indices; they are only
/// comparable to other chunk-indexed quantities. A peak is flagged at the
/// first chunk exceeding the threshold once the ring window has filled and
/// the wall-clock gap since the last acceptance has elapsed, so it is not
/// guaranteed to be the true local maximum.
pub struct StreamingDetector {
    threshold: f32,
    min_gap_secs: f64,
    window: VecDeque<f32>,
    capacity: usize,
    chunks_seen: usize,
    last_peak_secs: f64,
    peaks: Vec<PeakEvent>,
}

impl StreamingDetector {
    pub fn new(cfg: &DetectorConfig) -> Self {
        Self {
            threshold: cfg.threshold,
            min_gap_secs: f64::from(cfg.min_gap_secs),
            window: VecDeque::with_capacity(cfg.window_chunks.max(1)),
            capacity: cfg.window_chunks.max(1),
            chunks_seen: 0,
            last_peak_secs: f64::NEG_INFINITY,
            peaks: Vec::new(),
        }
    }

    /// Feed one capture chunk. `now_secs` is the caller's clock (seconds
    /// since the start of the run); tests drive it directly, the capture
    /// loop feeds it from `Instant::elapsed`.
    pub fn push_chunk(&mut self, chunk: &[i16], now_secs: f64) -> Option<&PeakEvent> {
        self.observe(mean_amplitude(chunk), now_secs)
    }

    /// Feed one pre-computed chunk mean.
    pub fn observe(&mut self, current: f32, now_secs: f64) -> Option<&PeakEvent> {
        self.chunks_seen += 1;
        self.window.push_back(current);
        if self.window.len() > self.capacity {
            self.window.pop_front();
        }

        let window_full = self.window.len() == self.capacity;
        if window_full
            && current > self.threshold
            && now_secs - self.last_peak_secs > self.min_gap_secs
        {
            self.last_peak_secs = now_secs;
            self.peaks.push(PeakEvent {
                position: self.chunks_seen - 1,
                value: current,
                time_secs: now_secs,
            });
            return self.peaks.last();
        }
        None
    }

    pub fn peaks(&self) -> &[PeakEvent] {
        &self.peaks
    }

    pub fn into_peaks(self) -> Vec<PeakEvent> {
        self.peaks
    }
}

/// Full-buffer peak scan over an energy profile.
///
/// Returns **sample indices**, strictly increasing and pairwise separated
/// by more than `min_gap` samples. A position qualifies when it exceeds the
/// threshold, clears the gap to the previous acceptance, and equals the
/// maximum of the inclusive window `energy[i-window ..= i+window]`. The
/// scan is strictly left-to-right, so ties inside a window resolve to the
/// earliest qualifying index.
pub fn detect_peaks(energy: &[f32], threshold: f32, min_gap: usize, window: usize) -> Vec<usize> {
    let mut peaks = Vec::new();
    if energy.len() <= window * 2 {
        return peaks;
    }

    let mut last_peak = -(min_gap as i64);
    for i in window..energy.len() - window {
        if energy[i] <= threshold {
            continue;
        }
        if i as i64 - last_peak <= min_gap as i64 {
            continue;
        }
        let window_max = energy[i - window..=i + window]
            .iter()
            .fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
        if energy[i] == window_max {
            peaks.push(i);
            last_peak = i as i64;
        }
    }
    peaks
}
