use crate::error::Result;
use crate::types::Venue;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Writes a full snapshot of the record sequence as pretty-printed JSON.
///
/// The write replaces the whole file in one go; an interrupted run never
/// leaves a partially appended checkpoint behind.
pub fn save_snapshot(path: &Path, venues: &[Venue]) -> Result<()> {
    let json = serde_json::to_string_pretty(venues)?;
    fs::write(path, json)?;
    debug!("saved {} venues to {}", venues.len(), path.display());
    Ok(())
}

/// Loads a snapshot, treating a missing file as an empty sequence. A
/// checkpoint that cannot be read or parsed is logged and skipped rather
/// than aborting the run.
pub fn load_snapshot_or_empty(path: &Path) -> Vec<Venue> {
    if !path.exists() {
        return Vec::new();
    }
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<Vec<Venue>>(&content) {
            Ok(venues) => {
                info!("loaded {} venues from {}", venues.len(), path.display());
                venues
            }
            Err(e) => {
                warn!("could not parse checkpoint {}: {}", path.display(), e);
                Vec::new()
            }
        },
        Err(e) => {
            warn!("could not read checkpoint {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Loads a snapshot that must exist and parse, for stage input files.
pub fn load_snapshot(path: &Path) -> Result<Vec<Venue>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn remove_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
        info!("cleaned up {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(name: &str) -> Venue {
        Venue {
            name: name.to_string(),
            slug: name.to_lowercase(),
            address: "Teststraße 1, 10115 Berlin".to_string(),
            tags: vec!["Cafe".to_string()],
            detail_url: format!("https://venues.test/marketplace_merchants/{name}"),
            about: None,
            website: None,
            coordinates: None,
            district: None,
        }
    }

    #[test]
    fn snapshot_roundtrip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let venues = vec![venue("B"), venue("A"), venue("C")];

        save_snapshot(&path, &venues).unwrap();
        assert_eq!(load_snapshot_or_empty(&path), venues);
        assert_eq!(load_snapshot(&path).unwrap(), venues);
    }

    #[test]
    fn missing_snapshot_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_snapshot_or_empty(&dir.path().join("nope.json")).is_empty());
    }

    #[test]
    fn malformed_snapshot_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_snapshot_or_empty(&path).is_empty());
        // The strict loader used for stage inputs does propagate.
        assert!(load_snapshot(&path).is_err());
    }

    #[test]
    fn remove_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.json");
        remove_if_exists(&path).unwrap();
        fs::write(&path, "[]").unwrap();
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }
}
