// common/src/config.rs
use config::{Config as ConfigFile, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Central configuration for the publish gateway
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub gateway_addr: String,
    pub staging_root: String,
    pub jwt_secret: String, // HS256 secret for identity tokens

    // Backend publishing service configuration
    pub backend: BackendConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackendConfig {
    pub rpc_url: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_addr: "127.0.0.1:8080".to_string(),
            staging_root: "/tmp/uploads".to_string(),
            jwt_secret: "dev_secret".to_string(),

            backend: BackendConfig {
                rpc_url: "http://localhost:5279".to_string(),
                timeout_secs: 30,
            },
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        // Get the run mode, defaulting to "development"
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        // Locate the config directory
        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        // Build configuration
        let config = ConfigFile::builder()
            // Start with defaults
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add environment specific config
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            // Add a local config file for local overrides
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment variables with prefix "APP"
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Build and deserialize
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load from environment variables directly (backward compatibility)
    pub fn from_env() -> Self {
        // Try to load from file first
        match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");

                // Fall back to plain environment variables
                let gateway_addr = env::var("GATEWAY_ADDR")
                    .unwrap_or_else(|_| "127.0.0.1:8080".to_string());

                let staging_root = env::var("STAGING_ROOT")
                    .unwrap_or_else(|_| "/tmp/uploads".to_string());

                let jwt_secret = env::var("JWT_SECRET")
                    .unwrap_or_else(|_| "dev_secret".to_string());

                let backend_rpc_url = env::var("BACKEND_RPC_URL")
                    .unwrap_or_else(|_| "http://localhost:5279".to_string());

                let backend_timeout_secs = env::var("BACKEND_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(30);

                Self {
                    gateway_addr,
                    staging_root,
                    jwt_secret,
                    backend: BackendConfig {
                        rpc_url: backend_rpc_url,
                        timeout_secs: backend_timeout_secs,
                    },
                }
            }
        }
    }
}
