//! keysplit CLI entrypoint.
//!
//! Two modes share one detector core: `stream` records live microphone
//! audio while logging ground-truth key presses, `split` re-analyzes a
//! previously recorded WAV. Both end by cutting the audio at the accepted
//! keystroke peaks.

mod split;
mod stream;

use anyhow::Result;
use keysplit::config::{AppConfig, Command};
use keysplit::init_logging;

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_logging(config.logs, config.no_logs);

    match config.command {
        Command::Stream(args) => stream::run(&args),
        Command::Split(args) => split::run(&args),
    }
}
