//! Log sink setup on top of `simplelog`: terminal output plus an optional log file.
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;
use std::io;
use std::path::Path;

/// Installs a `CombinedLogger` of a terminal logger and, if `log_file` is given, a file logger.
///
/// The file is created (truncated) before the logger is installed, so a bad path is an
/// `io::Error`. Returns `Ok(false)` when a global logger was already set; the earlier one
/// stays in place.
pub fn init_logger(level: LevelFilter, log_file: Option<&Path>) -> io::Result<bool> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    // Console logger
    loggers.push(TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));
    // File logger
    if let Some(path) = log_file {
        let file = File::create(path)?;
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }
    Ok(CombinedLogger::init(loggers).is_ok())
}
