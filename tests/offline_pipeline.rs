use std::path::Path;
use std::process::Command;

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn keysplit_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_keysplit").expect("keysplit test binary not built")
}

fn write_test_wav(path: &Path, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44_100,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create test wav");
    for &sample in samples {
        writer.write_sample(sample).expect("write sample");
    }
    writer.finalize().expect("finalize test wav");
}

fn wav_sample_count(path: &Path) -> usize {
    hound::WavReader::open(path)
        .expect("open segment")
        .duration() as usize
}

#[test]
fn keysplit_help_mentions_name() {
    let output = Command::new(keysplit_bin())
        .arg("--help")
        .output()
        .expect("run keysplit --help");
    assert!(output.status.success());
    assert!(combined_output(&output).contains("keysplit"));
}

#[test]
fn split_run_detects_two_keystrokes_and_writes_three_segments() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("typing.wav");
    let output_dir = dir.path().join("segments");
    let log_file = dir.path().join("peaks.json");

    // 1 s of near-silence with keystroke transients at 10000 and 30000.
    let mut samples = vec![0.0f32; 44_100];
    samples[10_000] = 0.9;
    samples[30_000] = 0.8;
    write_test_wav(&input, &samples);

    let output = Command::new(keysplit_bin())
        .arg("split")
        .arg("--input-file")
        .arg(&input)
        .arg("--output-dir")
        .arg(&output_dir)
        .arg("--log-file")
        .arg(&log_file)
        .output()
        .expect("run keysplit split");
    let combined = combined_output(&output);
    assert!(output.status.success(), "split failed: {combined}");
    assert!(combined.contains("Detected 2 keystrokes"), "{combined}");

    // Segments padded by 1102 samples (half of the 2205-sample minimum)
    // and clamped at the buffer edges.
    assert_eq!(wav_sample_count(&output_dir.join("segment_1.wav")), 11_102);
    assert_eq!(wav_sample_count(&output_dir.join("segment_2.wav")), 22_204);
    assert_eq!(wav_sample_count(&output_dir.join("segment_3.wav")), 15_202);
    assert!(!output_dir.join("segment_4.wav").exists());

    let log: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&log_file).expect("read peak log"))
            .expect("parse peak log");
    let records = log.as_array().expect("peak log array");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["sample_index"], 10_000);
    assert_eq!(records[1]["sample_index"], 30_000);
    assert!((records[0]["amplitude"].as_f64().expect("amplitude") - 0.9).abs() < 1e-6);
}

#[test]
fn split_run_reports_when_nothing_is_detected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("silence.wav");
    let output_dir = dir.path().join("segments");
    let log_file = dir.path().join("peaks.json");

    write_test_wav(&input, &vec![0.001f32; 22_050]);

    let output = Command::new(keysplit_bin())
        .arg("split")
        .arg("--input-file")
        .arg(&input)
        .arg("--output-dir")
        .arg(&output_dir)
        .arg("--log-file")
        .arg(&log_file)
        .output()
        .expect("run keysplit split");
    let combined = combined_output(&output);
    assert!(output.status.success(), "split failed: {combined}");
    assert!(combined.contains("No keystrokes detected"), "{combined}");
    assert!(!output_dir.join("segment_1.wav").exists());

    let log: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&log_file).expect("read peak log"))
            .expect("parse peak log");
    assert_eq!(log.as_array().expect("peak log array").len(), 0);
}

#[test]
fn split_run_fails_cleanly_on_missing_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = Command::new(keysplit_bin())
        .arg("split")
        .arg("--input-file")
        .arg(dir.path().join("does_not_exist.wav"))
        .output()
        .expect("run keysplit split");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("does_not_exist.wav"));
}
