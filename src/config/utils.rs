/// Configuration utilities - loading and access helpers
///
/// The process-wide configuration is loaded once by `main` and read through
/// `with_config`. Library components (the hub, the stores) never read the
/// global; they receive their section explicitly.
use super::schemas::Config;
use crate::errors::{HubError, HubResult};
use crate::logger::{self, LogTag};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::RwLock;

/// Global configuration instance
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Parse a configuration document
pub fn parse_config(contents: &str) -> HubResult<Config> {
    toml::from_str::<Config>(contents)
        .map_err(|e| HubError::Config(format!("Failed to parse config: {}", e)))
}

/// Read a configuration file, falling back to defaults when it does not exist
pub fn read_config_file(path: &str) -> HubResult<Config> {
    if !Path::new(path).exists() {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path),
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| HubError::Config(format!("Failed to read config file '{}': {}", path, e)))?;

    parse_config(&contents)
        .map_err(|e| HubError::Config(format!("{} ('{}')", e, path)))
}

/// Load configuration from a file path and initialize the global CONFIG
pub fn load_config_from_path(path: &str) -> HubResult<()> {
    let config = read_config_file(path)?;

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| HubError::Config("Config already initialized".to_string()))?;

    logger::debug(LogTag::Config, &format!("Configuration loaded from '{}'", path));
    Ok(())
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults if `load_config_from_path` was never called.
///
/// ```
/// use notification_hub::config::with_config;
///
/// let port = with_config(|cfg| cfg.webserver.port);
/// ```
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get() {
        Some(lock) => match lock.read() {
            Ok(config) => f(&config),
            Err(poisoned) => f(&poisoned.into_inner()),
        },
        None => f(&Config::default()),
    }
}

/// Get a clone of the entire configuration (for use across await points)
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}
