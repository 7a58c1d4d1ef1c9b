#![deny(missing_docs)]
//! Shared logging utilities for the scribe workspace.
//!
//! This crate provides the `scribe_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger.
//!
//! Every macro accepts an optional `op = <id>;` prefix. Lines logged that way
//! carry an `[op N]` tag so the events of a single AI operation can be picked
//! out of an interleaved log.

use log::LevelFilter;

/// Environment variable consulted for the log level.
pub const LOG_LEVEL_ENV: &str = "SCRIBE_LOG";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! scribe_trace {
    (op = $op:expr; $($arg:tt)+) => {{
        log::trace!("[op {}] {}", $op, format_args!($($arg)+));
    }};
    ($($arg:tt)+) => {{
        log::trace!($($arg)+);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! scribe_info {
    (op = $op:expr; $($arg:tt)+) => {{
        log::info!("[op {}] {}", $op, format_args!($($arg)+));
    }};
    ($($arg:tt)+) => {{
        log::info!($($arg)+);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! scribe_debug {
    (op = $op:expr; $($arg:tt)+) => {{
        log::debug!("[op {}] {}", $op, format_args!($($arg)+));
    }};
    ($($arg:tt)+) => {{
        log::debug!($($arg)+);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! scribe_warn {
    (op = $op:expr; $($arg:tt)+) => {{
        log::warn!("[op {}] {}", $op, format_args!($($arg)+));
    }};
    ($($arg:tt)+) => {{
        log::warn!($($arg)+);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! scribe_error {
    (op = $op:expr; $($arg:tt)+) => {{
        log::error!("[op {}] {}", $op, format_args!($($arg)+));
    }};
    ($($arg:tt)+) => {{
        log::error!($($arg)+);
    }};
}

/// Reads a level filter (`off`, `error`, `warn`, `info`, `debug`, `trace`)
/// from the environment variable `var`.
///
/// Falls back to `fallback` when the variable is unset or unparsable.
pub fn level_from_env(var: &str, fallback: LevelFilter) -> LevelFilter {
    std::env::var(var)
        .ok()
        .and_then(|raw| raw.trim().parse::<LevelFilter>().ok())
        .unwrap_or(fallback)
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let default_level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let level = level_from_env(LOG_LEVEL_ENV, default_level);

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_uses_fallback() {
        let level = level_from_env("SCRIBE_LOG_TEST_UNSET_VARIABLE", LevelFilter::Warn);
        assert_eq!(level, LevelFilter::Warn);
    }

    #[test]
    fn op_prefixed_macros_expand() {
        initialize_for_tests();
        scribe_debug!(op = 7; "dispatching {} bytes", 12);
        scribe_info!("plain message {}", 1);
    }
}
