use serde::{Deserialize, Serialize};

use crate::seed::STORAGE_KEY;
use crate::store::{FileStorage, KeyValueStorage, MemoryStorage};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory with the built dashboard assets, served for non-API paths
    pub static_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: String,
    pub key: String,
    pub max_bytes: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            static_dir: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: "data".to_string(),
            key: STORAGE_KEY.to_string(),
            max_bytes: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("config").required(false));

        // Environment variables, e.g. PULSE_SERVER__PORT or PULSE_STORAGE__DATA_DIR
        config = config.add_source(
            config::Environment::with_prefix("PULSE")
                .separator("__")
                .prefix_separator("_"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Get the server bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl StorageConfig {
    /// Build the configured storage medium
    pub fn open(&self) -> Box<dyn KeyValueStorage> {
        match self.backend {
            StorageBackend::File => Box::new(FileStorage::new(&self.data_dir)),
            StorageBackend::Memory => match self.max_bytes {
                Some(limit) => Box::new(MemoryStorage::with_limit(limit)),
                None => Box::new(MemoryStorage::new()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server_address(), "127.0.0.1:3001");
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.key, "realestate_properties");
    }

    #[test]
    fn test_defaults_survive_config_round_trip() {
        let built = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default()).unwrap())
            .set_override("storage.backend", "memory")
            .unwrap()
            .build()
            .unwrap();
        let config: AppConfig = built.try_deserialize().unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.storage.data_dir, "data");
    }

    #[test]
    fn test_open_memory_backend() {
        let storage = StorageConfig {
            backend: StorageBackend::Memory,
            max_bytes: Some(16),
            ..Default::default()
        }
        .open();

        storage.set("k", "small").unwrap();
        assert!(storage.set("k", "far too large for the limit").is_err());
    }
}
