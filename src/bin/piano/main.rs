//! piano - Terminal virtual piano
//!
//! Run with: cargo run --bin piano [-- -v]
//!
//! Play with the mouse or the computer keyboard, record with F1 and replay
//! with F2. Diagnostics go to `saavy_piano.log` in the temp directory so the
//! TUI stays clean; `-v` turns on debug logging.

mod app;
mod keymap;
mod ui;

use std::fs::File;

use app::PianoApp;
use saavy_piano::PianoConfig;

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let log_path = std::env::temp_dir().join("saavy_piano.log");

    // Logging is optional: if the file can't be created the piano still plays
    if let Ok(log_file) = File::create(&log_path) {
        let _ = WriteLogger::init(log_level, Config::default(), log_file);
    }

    log::info!("saavy piano starting (log level: {:?})", log_level);
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let verbose = std::env::args().skip(1).any(|a| a == "-v" || a == "--verbose");
    init_logging(verbose);

    PianoApp::new(PianoConfig::default()).run()
}
