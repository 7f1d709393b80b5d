//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//!
//! ## Environment Variables
//! - `CARELOG_DB_PATH`: Database file path
//! - `CARELOG_DB_POOL_SIZE`: Connection pool size
//! - `CARELOG_WEBHOOK_URL`: Operator webhook endpoint (optional)
//! - `CARELOG_GEOCODE_BASE_URL`: Reverse-geocoding endpoint (optional)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.toml` (current working directory)
//! 2. `./carelog.toml` (current working directory)
//! 3. `../config.toml` (parent directory)

use std::path::{Path, PathBuf};

use carelog_domain::{
    CarelogConfig, CarelogError, DatabaseConfig, GeocodeConfig, NotifyConfig, Result,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `CarelogError::Config` if configuration cannot be loaded from
/// either source.
pub fn load() -> Result<CarelogConfig> {
    // Make .env contents visible before probing the environment.
    dotenvy::dotenv().ok();

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `CarelogError::Config` if required variables are missing or have
/// invalid values.
pub fn load_from_env() -> Result<CarelogConfig> {
    let db_path = env_var("CARELOG_DB_PATH")?;
    let db_pool_size = env_var("CARELOG_DB_POOL_SIZE").and_then(|s| {
        s.parse::<u32>().map_err(|e| CarelogError::Config(format!("Invalid pool size: {e}")))
    })?;

    let webhook_url = std::env::var("CARELOG_WEBHOOK_URL").ok();
    let geocode_base_url = std::env::var("CARELOG_GEOCODE_BASE_URL")
        .unwrap_or_else(|_| CarelogConfig::default().geocode.base_url);

    Ok(CarelogConfig {
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        notify: NotifyConfig { webhook_url },
        geocode: GeocodeConfig { base_url: geocode_base_url },
    })
}

/// Load configuration from a TOML file
///
/// When `path` is `None`, probes the default locations listed in the module
/// documentation.
///
/// # Errors
/// Returns `CarelogError::Config` if no file is found or parsing fails.
pub fn load_from_file(path: Option<&Path>) -> Result<CarelogConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => probe_config_paths().ok_or_else(|| {
            CarelogError::Config("no configuration file found in probed locations".to_owned())
        })?,
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        CarelogError::Config(format!("failed to read {}: {e}", path.display()))
    })?;

    let config: CarelogConfig = toml::from_str(&contents).map_err(|e| {
        CarelogError::Config(format!("failed to parse {}: {e}", path.display()))
    })?;

    tracing::info!(path = %path.display(), "Configuration loaded from file");
    Ok(config)
}

fn probe_config_paths() -> Option<PathBuf> {
    ["config.toml", "carelog.toml", "../config.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_file())
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| CarelogError::Config(format!("missing environment variable {name}")))
}
