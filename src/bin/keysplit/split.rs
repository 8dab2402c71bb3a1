//! Offline analysis run: decode, detect, segment, log.

use anyhow::{Context, Result};
use keysplit::audio::{detect_peaks, energy_profile, plan_offline};
use keysplit::config::SplitArgs;
use keysplit::events::{write_peak_log, PeakRecord};
use keysplit::wav;
use std::fs;

pub fn run(args: &SplitArgs) -> Result<()> {
    println!("Processing audio file: {}", args.input_file.display());
    println!(
        "Energy threshold: {}, min keystroke gap: {}s",
        args.threshold, args.min_gap
    );
    println!("Output directory: {}", args.output_dir.display());

    let samples = wav::load_mono(&args.input_file, args.sample_rate)?;
    println!(
        "Loaded audio: {} samples, {:.2}s, {} Hz",
        samples.len(),
        samples.len() as f64 / f64::from(args.sample_rate),
        args.sample_rate
    );
    if samples.is_empty() {
        println!("Input file contains no samples; nothing to do");
        return Ok(());
    }

    let cfg = args.detector_config();
    let energy = energy_profile(&samples, cfg.energy_mode);
    let peaks = detect_peaks(
        &energy,
        cfg.threshold,
        cfg.min_gap_samples(args.sample_rate),
        cfg.window_samples(args.sample_rate),
    );

    if peaks.is_empty() {
        println!("No keystrokes detected");
    } else {
        println!("Detected {} keystrokes", peaks.len());
        fs::create_dir_all(&args.output_dir).with_context(|| {
            format!(
                "failed to create output directory {}",
                args.output_dir.display()
            )
        })?;

        let segments = plan_offline(&peaks, samples.len(), args.min_segment_samples());
        for segment in &segments {
            let filename = args.output_dir.join(format!("segment_{}.wav", segment.index));
            wav::write_float(&filename, &samples[segment.start..segment.end], args.sample_rate)?;
            println!(
                "Saved {} (samples {}-{}, duration {:.2}s)",
                filename.display(),
                segment.start,
                segment.end,
                segment.len() as f64 / f64::from(args.sample_rate)
            );
        }
        println!("Saved {} audio segments", segments.len());
    }

    let records: Vec<PeakRecord> = peaks
        .iter()
        .map(|&peak| PeakRecord::from_sample_peak(peak, samples[peak].abs(), args.sample_rate))
        .collect();
    write_peak_log(&records, &args.log_file)?;
    println!("Keystroke log saved to {}", args.log_file.display());
    Ok(())
}
