//! Structured tagged logging for the notification hub
//!
//! This module provides a small, ergonomic logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-component debug control via --debug-<tag> flags
//! - Dual output: colored console + optional file persistence
//!
//! ## Usage
//!
//! ```rust
//! use notification_hub::logger::{self, LogTag};
//!
//! logger::error(LogTag::Store, "Failed to persist notification");
//! logger::warning(LogTag::Dispatch, "Dispatch queue is full");
//! logger::info(LogTag::Webserver, "Listening on 127.0.0.1:8080");
//! logger::debug(LogTag::Session, "Command received"); // Only with --debug-session
//! ```
//!
//! ## Initialization
//!
//! Call once at startup, before any logging occurs:
//! ```rust
//! notification_hub::logger::init();
//! ```
//! Logging before `init` falls back to the default configuration (info level,
//! console only).

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger from command-line arguments with console output only
pub fn init() {
    config::init_from_args();
}

/// Initialize the logger and enable appending to `<log_dir>/notification-hub.log`
pub fn init_with_file(log_dir: &str) {
    config::init_from_args();
    file::init_file_logging(log_dir);
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level
///
/// Shown by default, including under --quiet.
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Only shown when the matching --debug-<tag> flag is provided.
///
/// # Example
/// ```rust
/// use notification_hub::logger::{self, LogTag};
/// // Only shown with --debug-dispatch
/// logger::debug(LogTag::Dispatch, "Enqueued notification for U1");
/// ```
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (only with --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Force flush pending file writes
///
/// Call during shutdown so the log file is complete.
pub fn flush() {
    file::flush_file_logging();
}
