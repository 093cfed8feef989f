use crate::error::{Result, ScraperError};
use crate::ports::{GeocodeMatch, Geocoder};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

const AGENT: &str = concat!("venue_harvester/", env!("CARGO_PKG_VERSION"));

/// Free-text search against a Nominatim-compatible endpoint, asking for the
/// single best match with a detailed address breakdown.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
}

/// The service returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    address: HashMap<String, serde_json::Value>,
}

impl NominatimGeocoder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn lookup(&self, query: &str) -> Result<Vec<GeocodeMatch>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .header(USER_AGENT, AGENT)
            .query(&[
                ("format", "json"),
                ("q", query),
                ("limit", "1"),
                ("addressdetails", "1"),
                ("extratags", "1"),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ScraperError::Status {
                url: self.endpoint.clone(),
                status: resp.status().as_u16(),
            });
        }

        let places: Vec<Place> = resp.json().await?;
        let mut matches = Vec::new();
        for place in places {
            match (place.lat.parse::<f64>(), place.lon.parse::<f64>()) {
                (Ok(lat), Ok(lon)) => {
                    let address = place
                        .address
                        .into_iter()
                        .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
                        .collect();
                    matches.push(GeocodeMatch { lat, lon, address });
                }
                _ => warn!("discarding candidate with unparsable coordinates for '{query}'"),
            }
        }
        Ok(matches)
    }
}
