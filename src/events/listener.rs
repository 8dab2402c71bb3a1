//! Global key hook and the ground-truth keystroke logger loop.
//!
//! The OS hook (rdev) delivers every key transition on its own thread;
//! that callback only filters for presses and forwards them over a
//! bounded channel. The logger loop runs on a joinable thread, polls the
//! channel on a short interval so it can observe the stop flag, and owns
//! the keystroke log for the duration of the run.

use super::{KeyPressEvent, KeystrokeLog};
use crate::log_debug;
use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use rdev::{listen, EventType, Key};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

/// Stop-flag poll interval for the logger loop.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Max presses buffered between the OS hook and the logger loop.
const HOOK_CHANNEL_CAPACITY: usize = 256;

/// One key press as delivered by the OS hook, before logging.
#[derive(Debug, Clone)]
pub struct RawKeyPress {
    pub key: Key,
    pub at: SystemTime,
}

/// Start the OS key hook on a detached thread and return the press
/// channel. `rdev::listen` never returns on success, so the hook thread
/// is not joinable; it dies with the process. Releases are filtered out
/// here so the logger only ever sees presses.
pub fn spawn_key_hook() -> Result<Receiver<RawKeyPress>> {
    let (sender, receiver) = bounded::<RawKeyPress>(HOOK_CHANNEL_CAPACITY);
    thread::Builder::new()
        .name("keysplit-key-hook".to_string())
        .spawn(move || {
            let result = listen(move |event| {
                if let EventType::KeyPress(key) = event.event_type {
                    let _ = sender.try_send(RawKeyPress {
                        key,
                        at: event.time,
                    });
                }
            });
            if let Err(err) = result {
                log_debug(&format!("key hook failed: {err:?}"));
            }
        })
        .map_err(|err| anyhow!("failed to spawn key hook thread: {err}"))?;
    Ok(receiver)
}

/// Consume presses until the stop flag is set, recording each with the
/// capture position snapshot. Escape is recorded like any other press and
/// then raises the stop flag, ending both this loop and the capture loop.
///
/// Returns the log so the caller can run the final unconditional save.
pub fn run_key_logger(
    presses: Receiver<RawKeyPress>,
    mut log: KeystrokeLog,
    stop_flag: Arc<AtomicBool>,
    chunk_count: Arc<AtomicUsize>,
    capturing: Arc<AtomicBool>,
) -> KeystrokeLog {
    while !stop_flag.load(Ordering::Relaxed) {
        match presses.recv_timeout(POLL_INTERVAL) {
            Ok(press) => {
                let frame_index = capturing
                    .load(Ordering::Relaxed)
                    .then(|| chunk_count.load(Ordering::Relaxed));
                let event = KeyPressEvent {
                    key: format!("{:?}", press.key),
                    time: rfc3339_from_system_time(press.at),
                    frame_index,
                };
                if let Err(err) = log.push(event) {
                    eprintln!("keystroke log flush failed: {err:#}");
                }
                if press.key == Key::Escape {
                    stop_flag.store(true, Ordering::Relaxed);
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    log
}

fn rfc3339_from_system_time(at: SystemTime) -> String {
    time::OffsetDateTime::from(at)
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| super::now_rfc3339())
}
