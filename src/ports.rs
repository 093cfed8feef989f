use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// One candidate match returned by the geocoding service.
#[derive(Debug, Clone, Default)]
pub struct GeocodeMatch {
    pub lat: f64,
    pub lon: f64,
    /// Flat address-component breakdown (suburb, postcode, ...).
    pub address: HashMap<String, String>,
}

/// Fetches one page of markup from the listing source.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Resolves a free-text query to zero or more candidate matches.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<Vec<GeocodeMatch>>;
}

/// Waits between external requests. The pipeline never touches the clock
/// directly, so tests can verify pacing without real sleeps.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, wait: Duration);
}
