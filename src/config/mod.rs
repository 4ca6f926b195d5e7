/// Configuration system
///
/// - `macros`: `config_struct!` for sections with inline defaults
/// - `schemas`: all configuration sections
/// - `utils`: loading and global access
pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::{Config, HubConfig, LoggingConfig, StorageConfig, WebserverConfig};
pub use utils::{get_config_clone, load_config_from_path, parse_config, read_config_file, with_config};
