//! # Process Configuration
//!
//! Loads `MediaflowConfig` from `config/default.toml` (when present),
//! overridable by `MEDIAFLOW_*` environment variables, following the
//! teacher's `config` + `dotenvy` layering. Every field has a sane
//! default so tests never need a config file on disk.

use serde::{Deserialize, Serialize};

/// Top-level process configuration for the orchestration server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaflowConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub execution: ExecutionConfig,
}

impl Default for MediaflowConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub shutdown_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8787".to_string(),
            shutdown_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. `":memory:"` is accepted for
    /// tests and ephemeral runs.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "mediaflow.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Upper bound on concurrently running Background/Pipeline workers
    /// Workers are dispatched to a bounded pool sized by this value.
    pub max_concurrent_workers: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_workers: 8,
        }
    }
}

impl MediaflowConfig {
    /// Load configuration from (in increasing precedence order):
    /// built-in defaults, `config/default.toml` if present, then
    /// environment variables prefixed `MEDIAFLOW__` (double underscore
    /// separates nesting, e.g. `MEDIAFLOW__SERVER__BIND_ADDRESS`).
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&defaults)?)
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("MEDIAFLOW").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = MediaflowConfig::default();
        assert_eq!(cfg.server.bind_address, "0.0.0.0:8787");
        assert_eq!(cfg.database.path, "mediaflow.db");
        assert!(cfg.execution.max_concurrent_workers > 0);
    }

    #[test]
    fn load_falls_back_to_defaults_without_file_or_env() {
        let cfg = MediaflowConfig::load().expect("config loads from defaults alone");
        assert_eq!(cfg.server.shutdown_timeout_ms, 30_000);
    }

    #[test]
    fn env_override_takes_precedence() {
        std::env::set_var("MEDIAFLOW__DATABASE__PATH", "/tmp/override.db");
        let cfg = MediaflowConfig::load().expect("config loads with env override");
        assert_eq!(cfg.database.path, "/tmp/override.db");
        std::env::remove_var("MEDIAFLOW__DATABASE__PATH");
    }
}
