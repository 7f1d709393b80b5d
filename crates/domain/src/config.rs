//! Configuration management

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarelogConfig {
    pub database: DatabaseConfig,
    pub notify: NotifyConfig,
    pub geocode: GeocodeConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// Operator webhook notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Webhook endpoint for operator error reports. `None` disables
    /// delivery (reports are logged instead).
    pub webhook_url: Option<String>,
}

/// Reverse-geocoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeConfig {
    pub base_url: String,
}

impl Default for CarelogConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig { path: "carelog.db".to_string(), pool_size: 8 },
            notify: NotifyConfig { webhook_url: None },
            geocode: GeocodeConfig {
                base_url: "https://nominatim.openstreetmap.org".to_string(),
            },
        }
    }
}
