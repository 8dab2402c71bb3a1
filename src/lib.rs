pub mod audio;
pub mod config;
pub mod events;
pub mod logging;
pub mod wav;

pub use logging::{init_logging, log_debug, log_file_path};
