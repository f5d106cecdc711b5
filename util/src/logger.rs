//! Logger initialisation
//!
//! Records go both to stdout and to the session's log file. Each line starts with the seconds
//! elapsed since the session began and a coloured level tag:
//!
//! ```text
//! [  1.250000 INF] Iteration 3 best error = 0.0421
//! [  1.251230 DBG] steer_lib::trial: Starting trial with Gains { .. }
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, Level};
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Targets which are capped below the session's level.
///
/// The kinematic model traces its full state on every step, which swamps a tuning log.
const QUIET_TARGETS: &[(&str, LevelFilter)] = &[
    ("zmq", LevelFilter::Info),
    ("steer_lib::plant::kin_sim", LevelFilter::Debug),
];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The log level must include INFO records, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` must include `Info`, the progress of a tuning run is reported at that level.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let dispatch = QUIET_TARGETS
        .iter()
        .fold(fern::Dispatch::new().level(min_level), |d, &(target, cap)| {
            d.level_for(target, cap.min(min_level))
        });

    dispatch
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(
                    session::get_elapsed_seconds(),
                    record.level(),
                    record.target(),
                    message
                )
            ))
        })
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised at {:?}", min_level);
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Build one log line. Debug and trace lines name their target.
fn format_line(
    elapsed_s: f64,
    level: Level,
    target: &str,
    message: &std::fmt::Arguments
) -> String {
    match level {
        Level::Debug | Level::Trace => format!(
            "[{:10.6} {}] {}: {}",
            elapsed_s, level_tag(level), target, message
        ),
        _ => format!("[{:10.6} {}] {}", elapsed_s, level_tag(level), message),
    }
}

/// Three letter tag of a level
fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info  => "INF".normal(),
        Level::Warn  => "WRN".yellow(),
        Level::Error => "ERR".red().bold()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
