use crate::artifacts::{timestamp, ArtifactCatalog};
use crate::checkpoint;
use crate::config::SourceConfig;
use crate::error::Result;
use crate::extract::{extract_details, extract_listing};
use crate::ports::{PageFetcher, Pacer};
use crate::types::Venue;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Bounds for one harvest run.
#[derive(Debug, Clone, Default)]
pub struct HarvestBounds {
    pub max_pages: u32,
    /// Stop as soon as this many records have accumulated, even mid-page.
    pub max_venues: Option<usize>,
    /// Explicit start page; when absent, a resumed run estimates one from
    /// the progress checkpoint.
    pub start_page: Option<u32>,
}

/// Outcome of a harvest run that reached normal termination.
#[derive(Debug)]
pub struct HarvestReport {
    pub venues: Vec<Venue>,
    pub new_venues: usize,
    pub pages_visited: u32,
    pub output_file: PathBuf,
}

pub struct Harvester {
    fetcher: Arc<dyn PageFetcher>,
    pacer: Arc<dyn Pacer>,
    catalog: ArtifactCatalog,
    cfg: SourceConfig,
}

impl Harvester {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        pacer: Arc<dyn Pacer>,
        catalog: ArtifactCatalog,
        cfg: SourceConfig,
    ) -> Self {
        Self {
            fetcher,
            pacer,
            catalog,
            cfg,
        }
    }

    /// Walks the listing pages in order, appending detail-enriched records
    /// and checkpointing after every page. A failed page fetch aborts the
    /// whole run; the checkpoint written after the previous page remains
    /// the resume point for the next invocation.
    pub async fn run(&self, bounds: HarvestBounds) -> Result<HarvestReport> {
        let progress_path = self.catalog.harvest_progress();
        let mut venues = checkpoint::load_snapshot_or_empty(&progress_path);
        let initial_count = venues.len();

        let start_page = match bounds.start_page {
            Some(page) => page,
            None if !venues.is_empty() => {
                let estimated = self.estimate_resume_page(venues.len());
                info!(
                    "found {} existing venues, resuming from estimated page {}",
                    venues.len(),
                    estimated
                );
                estimated
            }
            None => 1,
        };

        info!("harvesting pages {} to {}", start_page, bounds.max_pages);

        let mut pages_visited = 0;
        for page in start_page..=bounds.max_pages {
            info!("processing page {}/{}", page, bounds.max_pages);

            let html = match self.get_page(&self.page_url(page)).await {
                Ok(html) => html,
                Err(e) => {
                    error!("failed to fetch page {}, stopping: {}", page, e);
                    return Err(e);
                }
            };
            pages_visited += 1;

            let summaries = extract_listing(&html, &self.cfg);
            info!("found {} venues on page {}", summaries.len(), page);

            let mut bound_reached = false;
            for summary in summaries {
                let mut venue = summary.into_venue();
                self.fetch_details(&mut venue).await;
                venues.push(venue);
                if bounds.max_venues.map_or(false, |max| venues.len() >= max) {
                    info!("reached venue limit ({})", venues.len());
                    bound_reached = true;
                    break;
                }
            }

            checkpoint::save_snapshot(&progress_path, &venues)?;
            info!("progress saved: {} total venues", venues.len());

            if page % 10 == 0 {
                let milestone = self.catalog.harvest_milestone(page, &timestamp());
                checkpoint::save_snapshot(&milestone, &venues)?;
                info!("milestone snapshot: {}", milestone.display());
            }

            if bound_reached {
                break;
            }
        }

        let output_file = self.finalize(&venues)?;
        checkpoint::remove_if_exists(&progress_path)?;

        info!(
            "harvest complete: {} venues ({} new)",
            venues.len(),
            venues.len() - initial_count
        );

        Ok(HarvestReport {
            new_venues: venues.len() - initial_count,
            pages_visited,
            output_file,
            venues,
        })
    }

    /// Approximate by design: the checkpoint stores no page offset, so a
    /// resumed run may re-fetch or skip a handful of boundary items.
    fn estimate_resume_page(&self, existing: usize) -> u32 {
        ((existing / self.cfg.items_per_page_estimate.max(1)) as u32).max(1)
    }

    fn page_url(&self, page: u32) -> String {
        if page == 1 {
            self.cfg.listing_url()
        } else {
            format!("{}&page={}", self.cfg.listing_url(), page)
        }
    }

    /// One rate-limited request. Every listing and detail fetch funnels
    /// through here so the inter-request delay holds across both.
    async fn get_page(&self, url: &str) -> Result<String> {
        self.pacer
            .pause(Duration::from_millis(self.cfg.page_delay_ms))
            .await;
        self.fetcher.fetch_page(url).await
    }

    /// Merges the detail-page fields into the record. A failed detail fetch
    /// keeps the record with its summary fields only.
    async fn fetch_details(&self, venue: &mut Venue) {
        match self.get_page(&venue.detail_url).await {
            Ok(html) => {
                let details = extract_details(&html, &self.cfg);
                venue.about = Some(details.about);
                venue.website = Some(details.website);
            }
            Err(e) => {
                warn!(
                    "detail fetch failed for '{}', keeping summary fields only: {}",
                    venue.name, e
                );
            }
        }
    }

    fn finalize(&self, venues: &[Venue]) -> Result<PathBuf> {
        let stable = self.catalog.stable_output();
        checkpoint::save_snapshot(&stable, venues)?;
        let backup = self.catalog.harvest_backup(&timestamp());
        checkpoint::save_snapshot(&backup, venues)?;
        info!(
            "final output saved to {} (backup {})",
            stable.display(),
            backup.display()
        );
        Ok(stable)
    }
}
