//! System microphone capture via CPAL.
//!
//! Handles device enumeration, format conversion into the raw i16
//! amplitude domain, and the control loop that feeds the streaming peak
//! detector while capture runs. The CPAL callback only downmixes and
//! re-chunks; everything stateful happens on the control thread.

use super::detector::{DetectorConfig, StreamingDetector};
use super::dispatch::ChunkDispatcher;
use super::{CHUNK_SAMPLES, SAMPLE_RATE};
use crate::events::PeakEvent;
use crate::log_debug;
use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, StreamConfig};
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Max chunks buffered between the capture callback and the control
/// thread before the callback starts dropping.
const CHANNEL_CAPACITY: usize = 64;

/// How often the control loop re-checks the stop flag while idle.
const STOP_POLL: Duration = Duration::from_millis(100);

/// Everything a finished streaming run hands to the splitter: the full
/// chunk buffer, the accepted peaks (chunk-indexed), and how many chunks
/// the callback had to drop on channel overflow.
#[derive(Debug)]
pub struct StreamingRun {
    pub chunks: Vec<Vec<i16>>,
    pub peaks: Vec<PeakEvent>,
    pub chunks_dropped: usize,
}

impl StreamingRun {
    pub fn total_samples(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }
}

/// Audio input device wrapper.
pub struct Recorder {
    device: cpal::Device,
}

impl Recorder {
    /// List microphone names so the CLI can expose a human-friendly selector.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Create a recorder, optionally forcing a specific device so users can
    /// pick the right microphone when a machine exposes multiple inputs.
    pub fn new(preferred_device: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match preferred_device {
            Some(name) => {
                let mut devices = host.input_devices().context("no input devices available")?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| anyhow!("input device '{name}' not found"))?
            }
            None => host
                .default_input_device()
                .context("no default input device available")?,
        };
        Ok(Self { device })
    }

    /// Get the name of the active recording device.
    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }

    /// Capture mono 44.1 kHz chunks until `stop_flag` is set, running the
    /// streaming peak detector as chunks arrive.
    ///
    /// `chunk_count` is published after every appended chunk so the key
    /// logger can snapshot the capture position without touching the
    /// buffer itself. The capture stream is stopped and released before
    /// this returns, on every path.
    pub fn record_keystrokes(
        &self,
        cfg: &DetectorConfig,
        stop_flag: &Arc<AtomicBool>,
        chunk_count: &Arc<AtomicUsize>,
    ) -> Result<StreamingRun> {
        let default_config = self
            .device
            .default_input_config()
            .context("failed to query input device configuration")?;
        let format = default_config.sample_format();
        let channels = usize::from(default_config.channels().max(1));
        // Fixed capture rate keeps chunk indices meaningful as split
        // boundaries; hosts that cannot deliver it fail the stream build.
        let device_config = StreamConfig {
            channels: default_config.channels().max(1),
            sample_rate: cpal::SampleRate(SAMPLE_RATE),
            buffer_size: BufferSize::Default,
        };
        log_debug(&format!(
            "capture config: format={format:?} rate={SAMPLE_RATE}Hz channels={channels}"
        ));

        let (sender, receiver) = bounded::<Vec<i16>>(CHANNEL_CAPACITY);
        let dropped = Arc::new(AtomicUsize::new(0));
        let dispatcher = Arc::new(Mutex::new(ChunkDispatcher::new(
            CHUNK_SAMPLES,
            sender,
            dropped.clone(),
        )));

        let err_fn = |err| log_debug(&format!("audio_stream_error: {err}"));
        let stream = match format {
            SampleFormat::F32 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[f32], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| sample * 32_767.0);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::I16 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[i16], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, f32::from);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[u16], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| f32::from(sample) - 32_768.0);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            other => return Err(anyhow!("unsupported sample format: {other:?}")),
        };

        stream.play().context("failed to start audio capture")?;

        let started = Instant::now();
        let mut detector = StreamingDetector::new(cfg);
        let mut chunks: Vec<Vec<i16>> = Vec::new();

        while !stop_flag.load(Ordering::Relaxed) {
            match receiver.recv_timeout(STOP_POLL) {
                Ok(chunk) => {
                    if let Some(peak) = detector.push_chunk(&chunk, started.elapsed().as_secs_f64())
                    {
                        log_debug(&format!(
                            "peak accepted: chunk={} value={:.1}",
                            peak.position, peak.value
                        ));
                    }
                    chunks.push(chunk);
                    chunk_count.store(chunks.len(), Ordering::Relaxed);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    if let Err(err) = stream.pause() {
                        log_debug(&format!("failed to pause audio stream: {err}"));
                    }
                    bail!("audio stream disconnected");
                }
            }
        }

        if let Err(err) = stream.pause() {
            log_debug(&format!("failed to pause audio stream: {err}"));
        }
        drop(stream);

        Ok(StreamingRun {
            chunks,
            peaks: detector.into_peaks(),
            chunks_dropped: dropped.load(Ordering::Relaxed),
        })
    }
}
