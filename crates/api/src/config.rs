//! Server configuration

use ::config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use storage::StoreConfig;

/// Settings file looked up in the working directory (any format `config` understands)
const CONFIG_FILE: &str = "notes";

/// Environment variable prefix, e.g. `NOTES_LISTEN_ADDR`
const ENV_PREFIX: &str = "NOTES";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Socket address to listen on
    pub listen_addr: String,

    /// SQLite file holding the entries table
    pub database_path: PathBuf,

    /// Maximum pooled store connections
    pub max_connections: u32,

    /// Lock wait before a write fails (milliseconds)
    pub busy_timeout_ms: u64,

    /// Directory served under `/static`
    pub static_dir: PathBuf,

    /// Max tracing level (`error`, `warn`, `info`, `debug`, `trace`)
    pub log_level: String,

    /// Install the Prometheus recorder and serve `/metrics`
    pub metrics_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            database_path: PathBuf::from("app.db"),
            max_connections: 4,
            busy_timeout_ms: 5000,
            static_dir: PathBuf::from("static"),
            log_level: "info".to_string(),
            metrics_enabled: false,
        }
    }
}

impl AppConfig {
    /// Load from `notes.*` in the working directory and `NOTES_*` variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load with an explicit settings file name; a missing file is not an error
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Config::builder()
            .set_default("listen_addr", defaults.listen_addr)?
            .set_default("database_path", defaults.database_path.to_string_lossy().into_owned())?
            .set_default("max_connections", i64::from(defaults.max_connections))?
            .set_default("busy_timeout_ms", defaults.busy_timeout_ms as i64)?
            .set_default("static_dir", defaults.static_dir.to_string_lossy().into_owned())?
            .set_default("log_level", defaults.log_level)?
            .set_default("metrics_enabled", defaults.metrics_enabled)?
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Store settings derived from this configuration
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            database_path: self.database_path.clone(),
            max_connections: self.max_connections,
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }
}
