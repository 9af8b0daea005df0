use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Connection string for the route store.
    #[serde(default = "Config::default_database_url")]
    pub database_url: String,
    /// Address the HTTP server binds to.
    #[serde(default = "Config::default_bind_addr")]
    pub bind_addr: String,
    /// Allowed CORS origins. Required unless cors_permissive is true.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Explicitly allow all origins (development only). Defaults to false.
    #[serde(default)]
    pub cors_permissive: bool,
    /// Upload endpoint limits
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Limits for the CSV upload endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted CSV body size in bytes (default: 10 MiB)
    #[serde(default = "UploadConfig::default_max_csv_bytes")]
    pub max_csv_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_csv_bytes: Self::default_max_csv_bytes(),
        }
    }
}

impl UploadConfig {
    fn default_max_csv_bytes() -> usize {
        10 * 1024 * 1024
    }
}

impl Config {
    fn default_database_url() -> String {
        "sqlite:database/raileats.db?mode=rwc".to_string()
    }

    fn default_bind_addr() -> String {
        "0.0.0.0:3000".to_string()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_empty_config() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.database_url, "sqlite:database/raileats.db?mode=rwc");
        assert!(config.cors_origins.is_empty());
        assert!(!config.cors_permissive);
        assert_eq!(config.upload.max_csv_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let yaml = r#"
bind_addr: "127.0.0.1:8080"
cors_origins:
  - "https://admin.raileats.example"
upload:
  max_csv_bytes: 1024
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.cors_origins.len(), 1);
        assert_eq!(config.upload.max_csv_bytes, 1024);
    }
}
