//! Nominatim implementation of the AddressLookup port.
//!
//! Display-only enrichment: any failure (network, non-success status,
//! unexpected body) degrades to `None` rather than an error.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use carelog_core::AddressLookup;
use carelog_domain::{GeoPoint, GeocodeConfig};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const USER_AGENT: &str = concat!("carelog/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

/// Reverse-geocoding client against a Nominatim-compatible endpoint.
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    /// Build a client from configuration.
    #[must_use]
    pub fn new(config: &GeocodeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self { client, base_url: config.base_url.trim_end_matches('/').to_owned() }
    }
}

#[async_trait]
impl AddressLookup for NominatimClient {
    async fn reverse(&self, point: GeoPoint) -> Option<String> {
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=json",
            self.base_url, point.lat, point.lng
        );

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "reverse geocoding request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "reverse geocoding returned an error status");
            return None;
        }

        match response.json::<ReverseResponse>().await {
            Ok(body) => {
                debug!(found = body.display_name.is_some(), "reverse geocoding resolved");
                body.display_name
            }
            Err(err) => {
                warn!(error = %err, "reverse geocoding returned an unexpected body");
                None
            }
        }
    }
}
