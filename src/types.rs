use serde::{Deserialize, Serialize};

/// Sentinel recorded when geocoding could not resolve a value.
pub const UNKNOWN: &str = "unknown";

/// A resolved latitude/longitude pair, or the explicit `"unknown"` sentinel
/// left behind when both geocoding queries came back empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinates {
    Point(f64, f64),
    Unknown(String),
}

impl Coordinates {
    pub fn unknown() -> Self {
        Coordinates::Unknown(UNKNOWN.to_string())
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Coordinates::Point(_, _))
    }
}

/// One venue as harvested from the directory listing, progressively filled
/// in by the detail fetch and the enrichment pass.
///
/// `name` is the dedup identity and the only field guaranteed non-empty.
/// Optional fields are omitted from JSON entirely while absent, so a record
/// whose detail fetch failed carries no `about`/`website` keys and an
/// unenriched record carries no `coordinates`/`district` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub detail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
}

impl Venue {
    /// True once the enrichment pass has recorded both location fields,
    /// sentinels included. Such a record is carried forward without a fresh
    /// lookup.
    pub fn is_enriched(&self) -> bool {
        self.coordinates.is_some() && self.district.is_some()
    }

    pub fn has_known_location(&self) -> bool {
        matches!(self.coordinates, Some(Coordinates::Point(_, _)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal(name: &str) -> Venue {
        Venue {
            name: name.to_string(),
            slug: name.to_lowercase(),
            address: String::new(),
            tags: Vec::new(),
            detail_url: format!("https://venues.test/marketplace_merchants/{name}"),
            about: None,
            website: None,
            coordinates: None,
            district: None,
        }
    }

    #[test]
    fn absent_optionals_are_omitted_from_json() {
        let value = serde_json::to_value(minimal("Cafe A")).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("about"));
        assert!(!object.contains_key("website"));
        assert!(!object.contains_key("coordinates"));
        assert!(!object.contains_key("district"));
    }

    #[test]
    fn coordinates_serialize_as_pair_or_sentinel() {
        let mut venue = minimal("Cafe A");
        venue.coordinates = Some(Coordinates::Point(52.52, 13.4));
        let value = serde_json::to_value(&venue).unwrap();
        assert_eq!(value["coordinates"], json!([52.52, 13.4]));

        venue.coordinates = Some(Coordinates::unknown());
        let value = serde_json::to_value(&venue).unwrap();
        assert_eq!(value["coordinates"], json!("unknown"));
    }

    #[test]
    fn coordinates_roundtrip_from_json() {
        let parsed: Venue = serde_json::from_value(json!({
            "name": "Cafe A",
            "slug": "cafe-a",
            "address": "Teststraße 1",
            "tags": ["Cafe"],
            "detail_url": "https://venues.test/marketplace_merchants/cafe-a",
            "coordinates": [52.52, 13.4],
            "district": "Mitte"
        }))
        .unwrap();
        assert_eq!(parsed.coordinates, Some(Coordinates::Point(52.52, 13.4)));
        assert!(parsed.is_enriched());
        assert!(parsed.has_known_location());

        let parsed: Venue = serde_json::from_value(json!({
            "name": "Cafe B",
            "slug": "cafe-b",
            "detail_url": "https://venues.test/marketplace_merchants/cafe-b",
            "coordinates": "unknown",
            "district": "unknown"
        }))
        .unwrap();
        assert_eq!(parsed.coordinates, Some(Coordinates::unknown()));
        assert!(parsed.is_enriched());
        assert!(!parsed.has_known_location());
    }

    #[test]
    fn record_without_location_is_not_enriched() {
        let mut venue = minimal("Cafe A");
        assert!(!venue.is_enriched());
        // A mixed state never counts as enriched.
        venue.coordinates = Some(Coordinates::Point(52.52, 13.4));
        assert!(!venue.is_enriched());
    }
}
