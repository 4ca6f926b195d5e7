/// Logger configuration derived from command-line flags
///
/// Flags:
/// - `--debug-<tag>`: enable DEBUG output for one tag
/// - `--verbose`: enable VERBOSE output for all tags
/// - `--verbose-<tag>`: enable VERBOSE output for one tag
/// - `--quiet`: only warnings and errors
use super::levels::LogLevel;
use super::tags::LogTag;
use crate::arguments;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Minimum level threshold (levels above it are dropped)
    pub min_level: LogLevel,

    /// Tags with DEBUG output enabled (debug keys)
    pub debug_tags: HashSet<String>,

    /// Tags with VERBOSE output enabled (debug keys)
    pub verbose_tags: HashSet<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            verbose_tags: HashSet::new(),
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> = Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

/// Build the configuration from an explicit argument list
pub fn config_from_args(args: &[String]) -> LoggerConfig {
    let mut config = LoggerConfig::default();

    for arg in args {
        if arg == "--quiet" {
            config.min_level = LogLevel::Warning;
        } else if arg == "--verbose" {
            config.min_level = LogLevel::Verbose;
        } else if let Some(key) = arg.strip_prefix("--debug-") {
            if LogTag::from_debug_key(key).is_some() {
                config.debug_tags.insert(key.to_string());
                if config.min_level < LogLevel::Debug {
                    config.min_level = LogLevel::Debug;
                }
            }
        } else if let Some(key) = arg.strip_prefix("--verbose-") {
            if LogTag::from_debug_key(key).is_some() {
                config.verbose_tags.insert(key.to_string());
                config.min_level = LogLevel::Verbose;
            }
        }
    }

    config
}

/// Scan the process arguments and install the resulting configuration
pub fn init_from_args() {
    set_logger_config(config_from_args(&arguments::get_cmd_args()));
}

pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    let config = LOGGER_CONFIG.read();
    let key = tag.to_debug_key();
    config.debug_tags.contains(&key) || config.verbose_tags.contains(&key)
}

pub fn is_verbose_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().verbose_tags.contains(&tag.to_debug_key())
}
