//! WAV decode/encode for offline analysis and segment output.
//!
//! Decoding normalizes everything to mono f32 in `[-1, 1]` at the
//! requested sample rate; files at a different rate are linearly
//! resampled. Segment writers come in two flavors matching the two modes:
//! 16-bit PCM for streaming capture chunks, 32-bit float for offline
//! analysis output.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

/// Decode a WAV file to normalized mono f32 at `target_rate`.
pub fn load_mono(path: &Path, target_rate: u32) -> Result<Vec<f32>> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("failed to decode {}", path.display()))?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .with_context(|| format!("failed to decode {}", path.display()))?
        }
    };

    let mono = downmix_to_mono(&interleaved, channels);
    if spec.sample_rate == target_rate || mono.is_empty() {
        return Ok(mono);
    }
    Ok(resample_linear(
        &mono,
        target_rate as f32 / spec.sample_rate as f32,
    ))
}

/// Write a segment of 16-bit PCM samples (streaming mode output).
pub fn write_pcm16(path: &Path, samples: &[i16], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer
        .finalize()
        .with_context(|| format!("failed to finalize {}", path.display()))
}

/// Write a segment of normalized f32 samples (offline mode output).
pub fn write_float(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer
        .finalize()
        .with_context(|| format!("failed to finalize {}", path.display()))
}

/// Average interleaved frames down to one channel.
fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Linear-interpolation resampler. Good enough for rate adaptation of
/// already-recorded material; the detector only needs amplitude envelopes
/// to survive.
fn resample_linear(input: &[f32], ratio: f32) -> Vec<f32> {
    let input_len = input.len();
    let output_len = (input_len as f32 * ratio).round() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_idx = i as f32 / ratio;
        let idx = src_idx.floor() as usize;
        let frac = src_idx - idx as f32;

        if idx + 1 < input_len {
            let sample = input[idx] * (1.0 - frac) + input[idx + 1] * frac;
            output.push(sample);
        } else {
            let pad = input.last().copied().unwrap_or(0.0);
            output.push(pad);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_interleaved_frames() {
        let interleaved = [1.0f32, -1.0, 0.5, 0.5];
        assert_eq!(downmix_to_mono(&interleaved, 2), vec![0.0, 0.5]);
    }

    #[test]
    fn downmix_preserves_mono() {
        let samples = [0.1f32, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&samples, 1), samples.to_vec());
    }

    #[test]
    fn downmix_averages_partial_trailing_frame() {
        let interleaved = [1.0f32, 3.0, 5.0];
        assert_eq!(downmix_to_mono(&interleaved, 2), vec![2.0, 5.0]);
    }

    #[test]
    fn resample_linear_scales_length() {
        let input = vec![0.0f32, 1.0, 2.0, 3.0];
        let result = resample_linear(&input, 0.5);
        assert_eq!(result.len(), 2);
        assert!((result[0] - 0.0).abs() < 1e-6);
    }

    #[test]
    fn resample_linear_interpolates_midpoints() {
        let input = vec![0.0f32, 1.0];
        let output = resample_linear(&input, 2.0);
        assert_eq!(output, vec![0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn pcm16_round_trips_through_load_mono() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tone.wav");
        let samples: Vec<i16> = (0..64).map(|i| (i * 256) as i16).collect();
        write_pcm16(&path, &samples, 8_000).expect("write wav");

        let loaded = load_mono(&path, 8_000).expect("load wav");
        assert_eq!(loaded.len(), samples.len());
        assert!((loaded[1] - samples[1] as f32 / 32_768.0).abs() < 1e-6);
    }

    #[test]
    fn float_segments_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("seg.wav");
        let samples = vec![0.0f32, 0.25, -0.25, 1.0];
        write_float(&path, &samples, 44_100).expect("write wav");

        let loaded = load_mono(&path, 44_100).expect("load wav");
        assert_eq!(loaded, samples);
    }

    #[test]
    fn load_mono_resamples_when_rates_differ() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rate.wav");
        let samples = vec![0.5f32; 100];
        write_float(&path, &samples, 22_050).expect("write wav");

        let loaded = load_mono(&path, 44_100).expect("load wav");
        assert_eq!(loaded.len(), 200);
        assert!(loaded.iter().all(|s| (s - 0.5).abs() < 1e-3));
    }
}
