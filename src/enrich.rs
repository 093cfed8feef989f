use crate::artifacts::{timestamp, ArtifactCatalog};
use crate::checkpoint;
use crate::config::GeocodingConfig;
use crate::error::Result;
use crate::ports::{GeocodeMatch, Geocoder, Pacer};
use crate::types::{Coordinates, Venue, UNKNOWN};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Address-component keys that can carry the district, most specific first.
const DISTRICT_KEYS: [&str; 5] = [
    "suburb",
    "neighbourhood",
    "city_district",
    "quarter",
    "district",
];

/// Postcode fallback for the inner-city codes the address breakdown
/// sometimes misses. Incomplete, but it covers the bulk of the dataset.
static DISTRICTS_BY_POSTCODE: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("10115", "Mitte"),
        ("10117", "Mitte"),
        ("10119", "Mitte"),
        ("10178", "Mitte"),
        ("10179", "Mitte"),
        ("10435", "Prenzlauer Berg"),
        ("10437", "Prenzlauer Berg"),
        ("10439", "Prenzlauer Berg"),
        ("10247", "Friedrichshain"),
        ("10249", "Friedrichshain"),
        ("10551", "Moabit"),
        ("10553", "Moabit"),
        ("10555", "Moabit"),
        ("10559", "Moabit"),
        ("10623", "Charlottenburg"),
        ("10625", "Charlottenburg"),
        ("10627", "Charlottenburg"),
        ("10777", "Schöneberg"),
        ("10779", "Schöneberg"),
        ("10781", "Schöneberg"),
        ("10963", "Kreuzberg"),
        ("10965", "Kreuzberg"),
        ("10967", "Kreuzberg"),
        ("10969", "Kreuzberg"),
        ("12043", "Neukölln"),
        ("12045", "Neukölln"),
        ("12047", "Neukölln"),
        ("12049", "Neukölln"),
        ("12051", "Neukölln"),
        ("12053", "Neukölln"),
        ("12055", "Neukölln"),
        ("12057", "Neukölln"),
        ("12059", "Neukölln"),
        ("12099", "Tempelhof"),
        ("12101", "Tempelhof"),
        ("12103", "Tempelhof"),
        ("12105", "Tempelhof"),
        ("12107", "Tempelhof"),
        ("12109", "Tempelhof"),
    ])
});

/// Picks a district out of the address-component breakdown, falling back to
/// the postcode table. The locality name itself and one-or-two-character
/// values never count as districts.
pub fn extract_district(address: &HashMap<String, String>, locality: &str) -> Option<String> {
    for key in DISTRICT_KEYS {
        if let Some(value) = address.get(key) {
            if value.as_str() != locality && value.chars().count() > 2 {
                return Some(value.clone());
            }
        }
    }
    address
        .get("postcode")
        .and_then(|code| DISTRICTS_BY_POSTCODE.get(code.as_str()))
        .map(|district| district.to_string())
}

/// Outcome of a completed enrichment run.
#[derive(Debug)]
pub struct EnrichReport {
    pub venues: Vec<Venue>,
    /// Records that actually went out to the geocoding service.
    pub looked_up: usize,
    /// Records left with "unknown" sentinels after both queries.
    pub unresolved: usize,
}

pub struct Enricher {
    geocoder: Arc<dyn Geocoder>,
    pacer: Arc<dyn Pacer>,
    catalog: ArtifactCatalog,
    cfg: GeocodingConfig,
    locality: String,
    country: String,
}

impl Enricher {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        pacer: Arc<dyn Pacer>,
        catalog: ArtifactCatalog,
        cfg: GeocodingConfig,
        locality: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            geocoder,
            pacer,
            catalog,
            cfg,
            locality: locality.into(),
            country: country.into(),
        }
    }

    /// Geocodes every record that still lacks location data, in fixed-size
    /// batches with their own progress checkpoint. Resume is positional:
    /// records already present in the checkpoint are never reprocessed.
    pub async fn run(&self, venues: Vec<Venue>) -> Result<EnrichReport> {
        let progress_path = self.catalog.geocoding_progress();
        let mut enriched = checkpoint::load_snapshot_or_empty(&progress_path);
        if !enriched.is_empty() {
            info!("resuming with {} venues already enriched", enriched.len());
        }

        let total = venues.len();
        let start = enriched.len().min(total);
        let batch_size = self.cfg.batch_size.max(1);
        let total_batches = (total + batch_size - 1) / batch_size;
        let mut looked_up = 0;
        let mut unresolved = 0;

        let mut index = start;
        while index < total {
            let end = (index + batch_size).min(total);
            let batch_num = index / batch_size + 1;
            info!(
                "processing batch {}/{} (venues {}-{})",
                batch_num,
                total_batches,
                index + 1,
                end
            );

            for venue in &venues[index..end] {
                let mut venue = venue.clone();
                if venue.is_enriched() {
                    debug!("'{}' already has coordinates and district", venue.name);
                } else {
                    looked_up += 1;
                    if !self.enrich_one(&mut venue).await {
                        unresolved += 1;
                    }
                }
                enriched.push(venue);
            }

            checkpoint::save_snapshot(&progress_path, &enriched)?;
            info!("batch {} complete, progress saved", batch_num);

            if batch_num % 5 == 0 {
                let milestone = self.catalog.enrichment_milestone(batch_num);
                checkpoint::save_snapshot(&milestone, &enriched)?;
                info!("milestone snapshot: {}", milestone.display());
            }

            self.pacer
                .pause(Duration::from_millis(self.cfg.batch_pause_ms))
                .await;
            index = end;
        }

        self.finalize(&enriched)?;
        checkpoint::remove_if_exists(&progress_path)?;

        Ok(EnrichReport {
            venues: enriched,
            looked_up,
            unresolved,
        })
    }

    /// Resolves one venue, leaving "unknown" sentinels on both fields when
    /// neither query produced a candidate. Returns false in that case.
    async fn enrich_one(&self, venue: &mut Venue) -> bool {
        match self.geocode(&venue.address).await {
            Some(found) => {
                let district = extract_district(&found.address, &self.locality);
                venue.coordinates = Some(Coordinates::Point(found.lat, found.lon));
                venue.district = Some(district.unwrap_or_else(|| UNKNOWN.to_string()));
                true
            }
            None => {
                warn!("could not geocode '{}': {}", venue.name, venue.address);
                venue.coordinates = Some(Coordinates::unknown());
                venue.district = Some(UNKNOWN.to_string());
                false
            }
        }
    }

    /// Primary query with the full address, then one simplified fallback
    /// with the street segment only.
    async fn geocode(&self, address: &str) -> Option<GeocodeMatch> {
        let primary = format!("{}, {}, {}", address, self.locality, self.country);
        if let Some(found) = self.query(&primary).await {
            return Some(found);
        }
        let street = address.split(',').next().unwrap_or_default();
        let fallback = format!("{}, {}", street, self.locality);
        self.query(&fallback).await
    }

    /// One rate-limited lookup. The pause comes first unconditionally; the
    /// service's rate policy applies per request, not per venue.
    async fn query(&self, query: &str) -> Option<GeocodeMatch> {
        self.pacer
            .pause(Duration::from_millis(self.cfg.delay_ms))
            .await;
        match self.geocoder.lookup(query).await {
            Ok(matches) => matches.into_iter().next(),
            Err(e) => {
                warn!("geocoding lookup failed for '{}': {}", query, e);
                None
            }
        }
    }

    fn finalize(&self, venues: &[Venue]) -> Result<()> {
        let stable = self.catalog.stable_output();
        checkpoint::save_snapshot(&stable, venues)?;
        let backup = self.catalog.geocoded_backup(&timestamp());
        checkpoint::save_snapshot(&backup, venues)?;
        info!(
            "enriched dataset saved to {} (backup {})",
            stable.display(),
            backup.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn suburb_wins_over_later_keys() {
        let address = components(&[("suburb", "Prenzlauer Berg"), ("quarter", "Kollwitzkiez")]);
        assert_eq!(
            extract_district(&address, "Berlin"),
            Some("Prenzlauer Berg".to_string())
        );
    }

    #[test]
    fn locality_named_component_is_rejected() {
        // A suburb that just repeats the city name says nothing; the
        // postcode table gets the final word.
        let address = components(&[("suburb", "Berlin"), ("postcode", "10437")]);
        assert_eq!(
            extract_district(&address, "Berlin"),
            Some("Prenzlauer Berg".to_string())
        );
    }

    #[test]
    fn short_values_are_rejected() {
        let address = components(&[("suburb", "N1"), ("neighbourhood", "Moabit")]);
        assert_eq!(extract_district(&address, "Berlin"), Some("Moabit".to_string()));
    }

    #[test]
    fn unknown_postcode_yields_none() {
        let address = components(&[("postcode", "99999")]);
        assert_eq!(extract_district(&address, "Berlin"), None);
        assert_eq!(extract_district(&HashMap::new(), "Berlin"), None);
    }

    #[test]
    fn postcode_table_covers_outer_districts() {
        let address = components(&[("postcode", "12047")]);
        assert_eq!(
            extract_district(&address, "Berlin"),
            Some("Neukölln".to_string())
        );
    }
}
