/// Configuration schemas
///
/// Every section is declared with `config_struct!`, so a partial TOML file
/// only needs to mention the values it overrides.
use crate::config_struct;

// ============================================================================
// WEBSERVER CONFIGURATION
// ============================================================================

config_struct! {
    /// HTTP/WebSocket listener configuration
    pub struct WebserverConfig {
        host: String = "127.0.0.1".to_string(),
        port: u16 = 8080,

        /// Upper bound for the upgrade request, including recipient validation
        handshake_timeout_secs: u64 = 10,

        /// Accept WebSocket upgrades from any origin (mobile clients send none)
        cors_allow_any_origin: bool = true,
    }
}

// ============================================================================
// HUB CONFIGURATION
// ============================================================================

config_struct! {
    /// Notification hub tuning
    pub struct HubConfig {
        /// Outbound queue capacity per live session
        session_buffer_size: usize = 64,

        /// Number of dispatch worker tasks
        dispatch_workers: usize = 8,
    }
}

// ============================================================================
// STORAGE CONFIGURATION
// ============================================================================

config_struct! {
    /// Notification store configuration
    pub struct StorageConfig {
        database_path: String = "data/notifications.db".to_string(),
    }
}

// ============================================================================
// LOGGING CONFIGURATION
// ============================================================================

config_struct! {
    pub struct LoggingConfig {
        file_logging: bool = true,
        log_dir: String = "logs".to_string(),
    }
}

// ============================================================================
// ROOT
// ============================================================================

config_struct! {
    /// Root configuration
    pub struct Config {
        webserver: WebserverConfig = WebserverConfig::default(),
        hub: HubConfig = HubConfig::default(),
        storage: StorageConfig = StorageConfig::default(),
        logging: LoggingConfig = LoggingConfig::default(),
    }
}

impl WebserverConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_missing_sections() {
        let config: Config = toml::from_str(
            r#"
            [webserver]
            port = 9090

            [hub]
            dispatch_workers = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.webserver.port, 9090);
        assert_eq!(config.webserver.host, "127.0.0.1");
        assert_eq!(config.webserver.handshake_timeout_secs, 10);
        assert_eq!(config.hub.dispatch_workers, 2);
        assert_eq!(config.hub.session_buffer_size, 64);
        assert_eq!(config.storage, StorageConfig::default());
        assert_eq!(config.webserver.bind_address(), "127.0.0.1:9090");
    }

    #[test]
    fn test_empty_document_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }
}
