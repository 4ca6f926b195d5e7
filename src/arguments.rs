/// Centralized argument handling for the notification hub
///
/// Arguments are collected once into a global store so the logger, the
/// config loader and `main` all see the same view. Tests override it with
/// `set_cmd_args`.
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "data/config.toml";

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
pub fn get_arg_value(flag: &str) -> Option<String> {
    get_arg_values(flag).into_iter().next()
}

/// Gets every value following a repeatable flag
pub fn get_arg_values(flag: &str) -> Vec<String> {
    let args = get_cmd_args();
    args.windows(2)
        .filter(|pair| pair[0] == flag)
        .map(|pair| pair[1].clone())
        .collect()
}

/// Configuration file path (--config <path>)
pub fn config_path() -> String {
    get_arg_value("--config").unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

/// Users to register as known recipients at startup (--seed-user <id>, repeatable)
pub fn seed_users() -> Vec<String> {
    get_arg_values("--seed-user")
}

pub fn is_help_requested() -> bool {
    has_arg("--help") || has_arg("-h")
}

pub fn print_help() {
    println!("notification-hub - real-time notification delivery over WebSocket");
    println!();
    println!("USAGE:");
    println!("    notification-hub [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --config <path>      Configuration file (default: {})", DEFAULT_CONFIG_PATH);
    println!("    --seed-user <id>     Register a known recipient at startup (repeatable)");
    println!("    --quiet              Only log warnings and errors");
    println!("    --verbose            Enable verbose logging for all components");
    println!("    --debug-<tag>        Enable debug logging for one component");
    println!("                         (system, config, hub, dispatch, session, store, webserver)");
    println!("    -h, --help           Print this help");
}
