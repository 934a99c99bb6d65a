use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    display_name: Option<String>,
}

/// Reverse geocoding against Nominatim (OpenStreetMap). Free, no API key.
#[derive(Clone)]
pub struct GeocodingClient {
    client: reqwest::Client,
}

impl GeocodingClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Resolve coordinates to a display address. Failures are logged and
    /// swallowed; location text is never required.
    pub async fn reverse(&self, latitude: f64, longitude: f64) -> Option<String> {
        let result = self
            .client
            .get("https://nominatim.openstreetmap.org/reverse")
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .header("User-Agent", "CampusCart/1.0")
            .send()
            .await;

        match result {
            Ok(response) => match response.json::<NominatimResponse>().await {
                Ok(body) => body.display_name,
                Err(e) => {
                    warn!("Failed to parse reverse geocoding response: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Reverse geocoding request failed: {}", e);
                None
            }
        }
    }
}

impl Default for GeocodingClient {
    fn default() -> Self {
        Self::new()
    }
}
