//! Energy profile construction.
//!
//! Converts raw PCM into the per-position scalar series the peak detectors
//! scan. The output is index-aligned with the input; no resampling or
//! normalization happens here, so thresholds must live in the same numeric
//! domain as the samples (raw i16 amplitudes for streaming capture,
//! `[-1, 1]` floats for decoded files).

/// How a sample maps onto the detector's scalar signal.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EnergyMode {
    /// `|sample|` — streaming capture default.
    Amplitude,
    /// `sample * sample` — offline analysis default.
    Energy,
}

/// Per-sample energy profile. One output value per input sample.
pub fn energy_profile(samples: &[f32], mode: EnergyMode) -> Vec<f32> {
    match mode {
        EnergyMode::Amplitude => samples.iter().map(|s| s.abs()).collect(),
        EnergyMode::Energy => samples.iter().map(|s| s * s).collect(),
    }
}

/// Mean absolute amplitude of one capture chunk, the streaming detector's
/// per-chunk statistic.
pub fn mean_amplitude(chunk: &[i16]) -> f32 {
    if chunk.is_empty() {
        return 0.0;
    }
    let sum: f64 = chunk.iter().map(|s| f64::from(s.unsigned_abs())).sum();
    (sum / chunk.len() as f64) as f32
}
