use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 4001;
pub const DEFAULT_DATA_FILE: &str = "data.json";

/// Startup settings read once from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `PORT`
    pub port: u16,
    /// `DATA_FILE`: path of the JSON store document.
    pub data_file: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Invalid values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = match lookup("PORT") {
            Some(port_str) => match u16::from_str(port_str.trim()) {
                Ok(port_num) => {
                    info!("Using port {} from environment variable PORT.", port_num);
                    port_num
                }
                Err(_) => {
                    warn!(
                        "Invalid PORT value '{}' in environment variable. Using default port {}.",
                        port_str, DEFAULT_PORT
                    );
                    DEFAULT_PORT
                }
            },
            None => {
                info!(
                    "PORT environment variable not set. Using default port {}.",
                    DEFAULT_PORT
                );
                DEFAULT_PORT
            }
        };

        let data_file = match lookup("DATA_FILE") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            Some(_) => {
                warn!("Empty DATA_FILE value. Using default '{}'.", DEFAULT_DATA_FILE);
                PathBuf::from(DEFAULT_DATA_FILE)
            }
            None => PathBuf::from(DEFAULT_DATA_FILE),
        };

        Self { port, data_file }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config_from(&[]), ServerConfig::default());
        assert_eq!(ServerConfig::default().port, 4001);
    }

    #[test]
    fn reads_port_and_data_file() {
        let config = config_from(&[("PORT", "8080"), ("DATA_FILE", "/var/lib/portfolio/db.json")]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_file, PathBuf::from("/var/lib/portfolio/db.json"));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[("PORT", "eighty"), ("DATA_FILE", "  ")]);
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config_from(&[("PORT", "70000")]).port, DEFAULT_PORT);
    }
}
