use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Runtime configuration, read from `config.toml` when present. Every field
/// has a compiled-in default so the binary runs without a config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub geocoding: GeocodingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    /// Listing path including the fixed locality filter query.
    pub listing_path: String,
    /// Region tag embedded in every output filename.
    pub region: String,
    pub locality: String,
    pub country: String,
    /// URL path segment that marks a venue detail link.
    pub merchant_path: String,
    /// Delay before every listing and detail request.
    pub page_delay_ms: u64,
    pub max_pages: u32,
    pub test_max_pages: u32,
    /// Rough venues-per-page figure used to estimate a resume page.
    pub items_per_page_estimate: usize,
    /// Directory holding all output and checkpoint files.
    pub data_dir: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://atentogutschein.de".to_string(),
            listing_path:
                "/en/communities/lokale-favoriten-gutschein?q%5Bcity_or_address_postal_code_cont%5D=Berlin"
                    .to_string(),
            region: "berlin".to_string(),
            locality: "Berlin".to_string(),
            country: "Germany".to_string(),
            merchant_path: "/marketplace_merchants/".to_string(),
            page_delay_ms: 300,
            max_pages: 89,
            test_max_pages: 2,
            items_per_page_estimate: 22,
            data_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub endpoint: String,
    /// Minimum delay before every lookup, per the service's rate policy.
    pub delay_ms: u64,
    pub batch_size: usize,
    /// Pause after each batch, regardless of batch content.
    pub batch_pause_ms: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
            delay_ms: 1200,
            batch_size: 20,
            batch_pause_ms: 2000,
        }
    }
}

impl SourceConfig {
    pub fn listing_url(&self) -> String {
        format!("{}{}", self.base_url, self.listing_path)
    }

    /// Host portion of the base URL, used to tell external website links
    /// apart from internal ones on detail pages.
    pub fn host(&self) -> &str {
        self.base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_field() {
        let config = Config::default();
        assert_eq!(config.source.page_delay_ms, 300);
        assert_eq!(config.source.items_per_page_estimate, 22);
        assert_eq!(config.geocoding.delay_ms, 1200);
        assert_eq!(config.geocoding.batch_size, 20);
        assert_eq!(config.source.host(), "atentogutschein.de");
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [source]
            region = "hamburg"
            max_pages = 12
            "#,
        )
        .unwrap();
        assert_eq!(config.source.region, "hamburg");
        assert_eq!(config.source.max_pages, 12);
        assert_eq!(config.source.page_delay_ms, 300);
        assert_eq!(config.geocoding.batch_pause_ms, 2000);
    }
}
