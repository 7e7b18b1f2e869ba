//! Catalog server configuration.
//!
//! Read from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;

use famyank_sync::DEFAULT_SERVER_PORT;

/// Catalog server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to listen on
    pub bind: String,

    /// HTTP port
    pub port: u16,

    /// SQLite file for the catalog. In-memory when unset.
    pub database_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = lookup("FAMYANK_SERVER_BIND")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "0.0.0.0".to_string());

        // PORT wins so the usual platform convention works unchanged.
        let port = match lookup("PORT").or_else(|| lookup("FAMYANK_SERVER_PORT")) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
            None => DEFAULT_SERVER_PORT,
        };

        let database_path = lookup("FAMYANK_SERVER_DB")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(ServerConfig {
            bind,
            port,
            database_path,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_port_precedence() {
        let config = load(&[("FAMYANK_SERVER_PORT", "4000")]).unwrap();
        assert_eq!(config.port, 4000);

        let config = load(&[("PORT", "8080"), ("FAMYANK_SERVER_PORT", "4000")]).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_port() {
        assert!(matches!(
            load(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_database_path() {
        let config = load(&[
            ("FAMYANK_SERVER_DB", "/var/lib/famyank/catalog.db"),
            ("FAMYANK_SERVER_BIND", "127.0.0.1"),
        ])
        .unwrap();
        assert_eq!(
            config.database_path,
            Some(PathBuf::from("/var/lib/famyank/catalog.db"))
        );
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }
}
