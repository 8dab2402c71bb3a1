use super::listener::{run_key_logger, RawKeyPress};
use super::{KeyPressEvent, KeystrokeLog, PeakRecord};
use crossbeam_channel::bounded;
use rdev::Key;
use std::fs;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

#[test]
fn peak_record_time_is_buffer_offset_from_epoch() {
    let record = PeakRecord::from_sample_peak(44_100, 0.5, 44_100);
    assert_eq!(record.sample_index, 44_100);
    assert_eq!(record.amplitude, 0.5);
    assert_eq!(record.time, "1970-01-01T00:00:01Z");
}

#[test]
fn peak_record_serializes_expected_shape() {
    let record = PeakRecord::from_sample_peak(10_000, 0.25, 44_100);
    let json = serde_json::to_value(&record).expect("serialize peak record");
    let object = json.as_object().expect("object");
    assert_eq!(object.len(), 3);
    assert_eq!(object["sample_index"], 10_000);
    assert!(object["time"].is_string());
    assert_eq!(object["amplitude"], 0.25);
}

#[test]
fn key_press_serializes_null_frame_index() {
    let event = KeyPressEvent {
        key: "KeyA".to_string(),
        time: "2026-01-01T00:00:00Z".to_string(),
        frame_index: None,
    };
    let json = serde_json::to_value(&event).expect("serialize key press");
    assert!(json["frame_index"].is_null());

    let event = KeyPressEvent {
        frame_index: Some(42),
        ..event
    };
    let json = serde_json::to_value(&event).expect("serialize key press");
    assert_eq!(json["frame_index"], 42);
}

fn press(key: &str, frame_index: Option<usize>) -> KeyPressEvent {
    KeyPressEvent {
        key: key.to_string(),
        time: super::now_rfc3339(),
        frame_index,
    }
}

#[test]
fn keystroke_log_flushes_on_batch_boundary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("keys.json");
    let mut log = KeystrokeLog::new(&path, 2);

    log.push(press("KeyA", None)).expect("push");
    assert!(!path.exists(), "no flush before the batch fills");

    log.push(press("KeyB", Some(3))).expect("push");
    let written: Vec<KeyPressEvent> =
        serde_json::from_str(&fs::read_to_string(&path).expect("read log")).expect("parse log");
    assert_eq!(written.len(), 2);

    // Third push is off the batch boundary; the file keeps the old contents.
    log.push(press("KeyC", Some(4))).expect("push");
    let written: Vec<KeyPressEvent> =
        serde_json::from_str(&fs::read_to_string(&path).expect("read log")).expect("parse log");
    assert_eq!(written.len(), 2);
}

#[test]
fn keystroke_log_save_rewrites_everything_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("keys.json");
    let mut log = KeystrokeLog::new(&path, 100);

    for key in ["KeyA", "KeyB", "KeyC"] {
        log.push(press(key, None)).expect("push");
    }
    log.save().expect("save");

    let written: Vec<KeyPressEvent> =
        serde_json::from_str(&fs::read_to_string(&path).expect("read log")).expect("parse log");
    let keys: Vec<&str> = written.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["KeyA", "KeyB", "KeyC"]);
}

#[test]
fn write_peak_log_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("peaks.json");
    let records = vec![
        PeakRecord::from_sample_peak(10_000, 0.9, 44_100),
        PeakRecord::from_sample_peak(30_000, 0.8, 44_100),
    ];
    super::write_peak_log(&records, &path).expect("write peak log");

    let written: Vec<PeakRecord> =
        serde_json::from_str(&fs::read_to_string(&path).expect("read log")).expect("parse log");
    assert_eq!(written, records);
}

#[test]
fn key_logger_records_presses_and_stops_on_escape() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("keys.json");
    let log = KeystrokeLog::new(&path, 100);

    let (tx, rx) = bounded::<RawKeyPress>(8);
    let stop_flag = Arc::new(AtomicBool::new(false));
    let chunk_count = Arc::new(AtomicUsize::new(7));
    let capturing = Arc::new(AtomicBool::new(true));

    tx.send(RawKeyPress {
        key: Key::KeyA,
        at: SystemTime::now(),
    })
    .expect("send");
    tx.send(RawKeyPress {
        key: Key::Escape,
        at: SystemTime::now(),
    })
    .expect("send");

    let log = run_key_logger(
        rx,
        log,
        stop_flag.clone(),
        chunk_count,
        capturing,
    );

    assert!(stop_flag.load(Ordering::Relaxed), "escape raises the stop flag");
    assert_eq!(log.len(), 2, "escape itself is recorded as ground truth");
    assert_eq!(log.events()[0].key, "KeyA");
    assert_eq!(log.events()[0].frame_index, Some(7));
    assert_eq!(log.events()[1].key, "Escape");
}

#[test]
fn key_logger_leaves_frame_index_empty_without_capture() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("keys.json");
    let log = KeystrokeLog::new(&path, 100);

    let (tx, rx) = bounded::<RawKeyPress>(8);
    let stop_flag = Arc::new(AtomicBool::new(false));
    let chunk_count = Arc::new(AtomicUsize::new(12));
    let capturing = Arc::new(AtomicBool::new(false));

    tx.send(RawKeyPress {
        key: Key::KeyB,
        at: SystemTime::now(),
    })
    .expect("send");
    drop(tx); // disconnect ends the loop without the stop flag

    let log = run_key_logger(rx, log, stop_flag, chunk_count, capturing);
    assert_eq!(log.len(), 1);
    assert_eq!(log.events()[0].frame_index, None);
}

#[test]
fn key_logger_exits_when_stop_flag_preset() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("keys.json");
    let log = KeystrokeLog::new(&path, 100);

    let (_tx, rx) = bounded::<RawKeyPress>(8);
    let stop_flag = Arc::new(AtomicBool::new(true));
    let log = run_key_logger(
        rx,
        log,
        stop_flag,
        Arc::new(AtomicUsize::new(0)),
        Arc::new(AtomicBool::new(false)),
    );
    assert!(log.is_empty());
}
