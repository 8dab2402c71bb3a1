//! Live recording run.
//!
//! Wires together the three concurrent pieces: the CPAL capture loop on
//! this thread, the OS key hook on its detached thread, and the joinable
//! key-logger thread. Escape raises the shared stop flag; the capture
//! loop drains, the logger is joined, and only then is the buffer split.

use anyhow::{anyhow, Context, Result};
use keysplit::audio::{plan_streaming, Recorder, StreamingRun, SAMPLE_RATE};
use keysplit::config::StreamArgs;
use keysplit::events::{run_key_logger, spawn_key_hook, KeystrokeLog, LOG_FLUSH_EVERY};
use keysplit::{log_debug, wav};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

pub fn run(args: &StreamArgs) -> Result<()> {
    if args.list_input_devices {
        return list_input_devices();
    }

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            args.output_dir.display()
        )
    })?;

    let recorder = Recorder::new(args.input_device.as_deref())?;
    println!("Recording from '{}'...", recorder.device_name());
    println!("Amplitude threshold: {}", args.threshold);
    println!("Press ESC to stop and split by detected keystrokes");

    let stop_flag = Arc::new(AtomicBool::new(false));
    let chunk_count = Arc::new(AtomicUsize::new(0));
    let capturing = Arc::new(AtomicBool::new(true));

    let presses = spawn_key_hook()?;
    let log = KeystrokeLog::new(&args.log_file, LOG_FLUSH_EVERY);
    let logger = {
        let stop_flag = stop_flag.clone();
        let chunk_count = chunk_count.clone();
        let capturing = capturing.clone();
        thread::Builder::new()
            .name("keysplit-key-logger".to_string())
            .spawn(move || run_key_logger(presses, log, stop_flag, chunk_count, capturing))
            .context("failed to spawn key logger thread")?
    };

    let run_result = recorder.record_keystrokes(&args.detector_config(), &stop_flag, &chunk_count);

    // Capture is over (cleanly or not): unwind the logger before deciding
    // whether to split, so the log and hook shut down on every path.
    capturing.store(false, Ordering::Relaxed);
    stop_flag.store(true, Ordering::Relaxed);
    let log = logger
        .join()
        .map_err(|_| anyhow!("key logger thread panicked"))?;
    let run = run_result?;
    println!(
        "Recording stopped ({:.1}s captured).",
        run.total_samples() as f64 / f64::from(SAMPLE_RATE)
    );

    if run.chunks_dropped > 0 {
        log_debug(&format!(
            "capture overflow: {} chunks dropped",
            run.chunks_dropped
        ));
    }

    println!("\nDetected {} keystrokes by amplitude", run.peaks.len());
    write_segments(&run, &args.output_dir)?;

    log.save()
        .context("failed to write final keystroke log")?;
    println!("\nActual keystrokes logged to {}", args.log_file.display());
    println!("Audio segments saved to '{}'", args.output_dir.display());
    Ok(())
}

fn write_segments(run: &StreamingRun, output_dir: &Path) -> Result<()> {
    if run.peaks.is_empty() {
        println!("No keystrokes detected");
        return Ok(());
    }

    let positions: Vec<usize> = run.peaks.iter().map(|peak| peak.position).collect();
    for segment in plan_streaming(&positions, run.chunks.len()) {
        let filename = output_dir.join(format!("segment_{}.wav", segment.index));
        let samples: Vec<i16> = run.chunks[segment.start..segment.end]
            .iter()
            .flat_map(|chunk| chunk.iter().copied())
            .collect();
        wav::write_pcm16(&filename, &samples, SAMPLE_RATE)?;
        println!(
            "Saved {} (chunks {}-{})",
            filename.display(),
            segment.start,
            segment.end
        );
    }
    Ok(())
}

fn list_input_devices() -> Result<()> {
    match Recorder::list_devices() {
        Ok(names) if names.is_empty() => println!("No audio input devices detected."),
        Ok(names) => {
            println!("Detected audio input devices:");
            for name in names {
                println!("  - {name}");
            }
        }
        Err(err) => println!("Failed to list audio input devices: {err}"),
    }
    Ok(())
}
