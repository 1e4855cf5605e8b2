#![deny(missing_docs)]
//! Shared logging utilities for the watcher workspace.
//!
//! This crate provides the `watch_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger.

use std::cell::Cell;

thread_local! {
    /// Thread-local storage for the current poll-cycle number.
    static POLL_CYCLE: Cell<u64> = const { Cell::new(0) };
}

/// Sets the poll-cycle number for the current thread.
/// The poll runner calls this once at the start of each cycle so log lines
/// can be correlated to a cycle.
pub fn set_poll_cycle(cycle: u64) {
    POLL_CYCLE.with(|v| v.set(cycle));
}

/// Retrieves the poll-cycle number for the current thread.
/// Returns 0 if no cycle has started yet.
pub fn get_poll_cycle() -> u64 {
    POLL_CYCLE.with(|v| v.get())
}

/// Logs a trace-level message tagged with the current poll cycle.
#[macro_export]
macro_rules! watch_trace {
    ($($arg:tt)*) => {{
        log::trace!("[cycle {}] {}", $crate::get_poll_cycle(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the current poll cycle.
#[macro_export]
macro_rules! watch_info {
    ($($arg:tt)*) => {{
        log::info!("[cycle {}] {}", $crate::get_poll_cycle(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the current poll cycle.
#[macro_export]
macro_rules! watch_debug {
    ($($arg:tt)*) => {{
        log::debug!("[cycle {}] {}", $crate::get_poll_cycle(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the current poll cycle.
#[macro_export]
macro_rules! watch_warn {
    ($($arg:tt)*) => {{
        log::warn!("[cycle {}] {}", $crate::get_poll_cycle(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the current poll cycle.
#[macro_export]
macro_rules! watch_error {
    ($($arg:tt)*) => {{
        log::error!("[cycle {}] {}", $crate::get_poll_cycle(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
