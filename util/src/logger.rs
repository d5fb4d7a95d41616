//! Logging setup
//!
//! Every line carries the seconds elapsed since the session epoch, a coloured level tag and the
//! name of the thread it was logged from, so the camera, control and flush threads can be told
//! apart in the log.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use std::{fmt, thread};
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tag used for threads without a name.
const UNNAMED_THREAD: &str = "?";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The minimum log level must include INFO, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Could not open the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("Could not install the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger, writing to the session's log file and optionally to stdout.
///
/// `to_stdout` must be false when stdout carries binary data, such as a recording.
///
/// `min_level` must be at least `Info`. May only be called once per process.
pub fn logger_init(
    min_level: LevelFilter,
    to_stdout: bool,
    session: &Session
) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let mut dispatch = build_dispatch(min_level).chain(log_file);
    if to_stdout {
        dispatch = dispatch.chain(std::io::stdout());
    }
    dispatch.apply().map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised at {:?}", min_level);
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log file: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Base dispatch with the line format and level, without any outputs.
fn build_dispatch(min_level: LevelFilter) -> fern::Dispatch {
    fern::Dispatch::new()
        .format(|out, message, record| {
            let thread = thread::current();
            out.finish(format_args!(
                "[{:10.6} {} {}] {}",
                session::get_elapsed_seconds(),
                level_tag(record.level()),
                thread.name().unwrap_or(UNNAMED_THREAD),
                Body { message, record }
            ))
        })
        .level(min_level)
}

/// Message body, prefixed by the target below `Info`.
struct Body<'a> {
    message: &'a fmt::Arguments<'a>,
    record: &'a Record<'a>,
}

impl<'a> fmt::Display for Body<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.record.level() > Level::Info {
            write!(f, "{}: {}", self.record.target(), self.message)
        }
        else {
            write!(f, "{}", self.message)
        }
    }
}

fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERR".red().bold(),
        Level::Warn  => "WRN".yellow(),
        Level::Info  => "INF".normal(),
        Level::Debug => "DBG".dimmed(),
        Level::Trace => "TRC".dimmed().italic(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn body(level: Level) -> String {
        Body {
            message: &format_args!("x = {}", 1),
            record: &Record::builder()
                .args(format_args!("x = {}", 1))
                .level(level)
                .target("drive_lib::driver")
                .build()
        }.to_string()
    }

    #[test]
    fn test_body_target() {
        assert_eq!(body(Level::Debug), "drive_lib::driver: x = 1");
        assert_eq!(body(Level::Info), "x = 1");
    }

    #[test]
    fn test_level_tag() {
        colored::control::set_override(false);
        assert_eq!(level_tag(Level::Warn).to_string(), "WRN");
        assert_eq!(level_tag(Level::Trace).to_string(), "TRC");
    }
}
