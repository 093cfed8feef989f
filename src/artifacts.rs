use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

/// Canonical paths for every file the pipeline reads or writes.
///
/// The stages hand off through filename conventions, so the patterns live in
/// one place instead of being re-spelled by each stage.
#[derive(Debug, Clone)]
pub struct ArtifactCatalog {
    dir: PathBuf,
    region: String,
}

impl ArtifactCatalog {
    pub fn new(dir: impl Into<PathBuf>, region: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            region: region.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stable harvest output, overwritten in place by the enrichment pass.
    pub fn stable_output(&self) -> PathBuf {
        self.dir.join(format!("venues_{}.json", self.region))
    }

    /// Mutable harvest checkpoint, deleted on successful completion.
    pub fn harvest_progress(&self) -> PathBuf {
        self.dir.join(format!("venues_{}_progress.json", self.region))
    }

    /// Immutable snapshot taken every 10th page.
    pub fn harvest_milestone(&self, page: u32, timestamp: &str) -> PathBuf {
        self.dir.join(format!(
            "venues_{}_milestone_p{}_{}.json",
            self.region, page, timestamp
        ))
    }

    pub fn harvest_backup(&self, timestamp: &str) -> PathBuf {
        self.dir
            .join(format!("venues_{}_backup_{}.json", self.region, timestamp))
    }

    /// Mutable enrichment checkpoint, deleted on successful completion.
    pub fn geocoding_progress(&self) -> PathBuf {
        self.dir
            .join(format!("venues_{}_geocoding_progress.json", self.region))
    }

    /// Immutable snapshot taken every 5th enrichment batch.
    pub fn enrichment_milestone(&self, batch: usize) -> PathBuf {
        self.dir
            .join(format!("venues_enhanced_milestone_batch_{}.json", batch))
    }

    pub fn geocoded_backup(&self, timestamp: &str) -> PathBuf {
        self.dir
            .join(format!("venues_{}_geocoded_{}.json", self.region, timestamp))
    }

    pub fn clean_output(&self) -> PathBuf {
        self.dir.join(format!("venues_{}_clean.json", self.region))
    }

    /// Input for the enrichment stage: the stable harvest output, else the
    /// newest completion backup.
    pub fn find_enrichment_input(&self) -> Option<PathBuf> {
        let stable = self.stable_output();
        if stable.exists() {
            return Some(stable);
        }
        self.newest_matching(&format!("venues_{}_backup_", self.region))
    }

    /// Input for the dedup stage: the stable output, else the newest
    /// geocoded backup, else the newest harvest backup.
    pub fn find_dedup_input(&self) -> Option<PathBuf> {
        let stable = self.stable_output();
        if stable.exists() {
            return Some(stable);
        }
        self.newest_matching(&format!("venues_{}_geocoded_", self.region))
            .or_else(|| self.newest_matching(&format!("venues_{}_backup_", self.region)))
    }

    pub fn milestone_snapshots(&self) -> Vec<PathBuf> {
        self.matching(&format!("venues_{}_milestone_", self.region))
    }

    pub fn backup_snapshots(&self) -> Vec<PathBuf> {
        self.matching(&format!("venues_{}_backup_", self.region))
    }

    fn matching(&self, prefix: &str) -> Vec<PathBuf> {
        let mut found = Vec::new();
        if let Ok(entries) = fs::read_dir(&self.dir) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with(prefix) && name.ends_with(".json") {
                    found.push(entry.path());
                }
            }
        }
        found.sort();
        found
    }

    fn newest_matching(&self, prefix: &str) -> Option<PathBuf> {
        // Timestamped names sort chronologically, so the last one is newest.
        self.matching(prefix).pop()
    }
}

/// Timestamp fragment used in milestone and backup filenames.
pub fn timestamp() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}
