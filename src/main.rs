use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::error;

use venue_harvester::artifacts::ArtifactCatalog;
use venue_harvester::checkpoint;
use venue_harvester::config::Config;
use venue_harvester::dedup::dedup_by_name;
use venue_harvester::enrich::Enricher;
use venue_harvester::error::ScraperError;
use venue_harvester::harvester::{HarvestBounds, Harvester};
use venue_harvester::infra::{NominatimGeocoder, ReqwestFetcher, TokioPacer};
use venue_harvester::logging;
use venue_harvester::types::{Venue, UNKNOWN};

#[derive(Parser)]
#[command(name = "venue_harvester")]
#[command(about = "Berlin venue directory harvester with geocoding enrichment")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the listing pages and collect venue records
    Harvest {
        /// Reduced scope: a couple of pages for a quick check
        #[arg(long)]
        test: bool,
        /// Maximum pages to visit
        #[arg(long)]
        max_pages: Option<u32>,
        /// Stop after this many venues
        #[arg(long)]
        max_venues: Option<usize>,
        /// Explicit starting page (skips the resume estimate)
        #[arg(long)]
        start_page: Option<u32>,
    },
    /// Attach coordinates and district labels to harvested venues
    Enrich,
    /// Collapse duplicate venues into the clean dataset
    Dedup,
    /// Report the state of output and checkpoint files
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;
    let catalog = ArtifactCatalog::new(
        config.source.data_dir.clone(),
        config.source.region.clone(),
    );

    match cli.command {
        Commands::Harvest {
            test,
            max_pages,
            max_venues,
            start_page,
        } => run_harvest(&config, catalog, test, max_pages, max_venues, start_page).await,
        Commands::Enrich => run_enrich(&config, catalog).await,
        Commands::Dedup => run_dedup(catalog),
        Commands::Status => {
            run_status(&catalog);
            Ok(())
        }
    }
}

async fn run_harvest(
    config: &Config,
    catalog: ArtifactCatalog,
    test: bool,
    max_pages: Option<u32>,
    max_venues: Option<usize>,
    start_page: Option<u32>,
) -> anyhow::Result<()> {
    let max_pages = max_pages.unwrap_or(if test {
        config.source.test_max_pages
    } else {
        config.source.max_pages
    });

    println!(
        "🚀 Harvesting venues ({} mode, up to {} pages)",
        if test { "TEST" } else { "FULL" },
        max_pages
    );
    if let Some(max) = max_venues {
        println!("   Venue limit: {max}");
    }

    let harvester = Harvester::new(
        Arc::new(ReqwestFetcher::new()),
        Arc::new(TokioPacer),
        catalog,
        config.source.clone(),
    );

    match harvester
        .run(HarvestBounds {
            max_pages,
            max_venues,
            start_page,
        })
        .await
    {
        Ok(report) => {
            println!("\n🎉 Harvest complete!");
            println!("   Total venues: {}", report.venues.len());
            println!("   New venues: {}", report.new_venues);
            println!("   Pages visited: {}", report.pages_visited);
            println!("   Output file: {}", report.output_file.display());
            Ok(())
        }
        Err(e) => {
            error!("harvest aborted: {}", e);
            println!("❌ Harvest aborted: {e}");
            println!("   Progress checkpoint kept; re-run to resume.");
            Err(e.into())
        }
    }
}

async fn run_enrich(config: &Config, catalog: ArtifactCatalog) -> anyhow::Result<()> {
    let input = catalog
        .find_enrichment_input()
        .ok_or_else(|| ScraperError::MissingInput(catalog.dir().display().to_string()))?;
    let venues = checkpoint::load_snapshot(&input)?;

    println!("🌍 Geocoding {} venues from {}", venues.len(), input.display());

    let enricher = Enricher::new(
        Arc::new(NominatimGeocoder::new(config.geocoding.endpoint.clone())),
        Arc::new(TokioPacer),
        catalog,
        config.geocoding.clone(),
        config.source.locality.clone(),
        config.source.country.clone(),
    );

    let report = enricher.run(venues).await?;

    let total = report.venues.len();
    let with_coords = report.venues.iter().filter(|v| v.has_known_location()).count();
    let districts: HashSet<&str> = report
        .venues
        .iter()
        .filter_map(|v| v.district.as_deref())
        .filter(|d| *d != UNKNOWN)
        .collect();

    println!("\n🎉 Geocoding complete!");
    println!("   Venues processed: {total}");
    println!("   Lookups performed: {}", report.looked_up);
    println!("   Unresolved: {}", report.unresolved);
    println!("   With coordinates: {with_coords}/{total}");
    println!("   Districts found: {}", districts.len());
    Ok(())
}

fn run_dedup(catalog: ArtifactCatalog) -> anyhow::Result<()> {
    let input = catalog
        .find_dedup_input()
        .ok_or_else(|| ScraperError::MissingInput(catalog.dir().display().to_string()))?;
    let venues = checkpoint::load_snapshot(&input)?;

    println!("🧹 Deduplicating {} venues from {}", venues.len(), input.display());

    let outcome = dedup_by_name(&venues);
    for (name, count) in &outcome.removed {
        println!("   removed {count} duplicate(s) of '{name}'");
    }

    let output = catalog.clean_output();
    checkpoint::save_snapshot(&output, &outcome.venues)?;

    println!("\n📊 Results:");
    println!("   Original: {} venues", venues.len());
    println!("   Removed: {} duplicates", outcome.total_removed());
    println!("   Final: {} unique venues", outcome.venues.len());
    println!("   Clean dataset: {}", output.display());
    Ok(())
}

fn run_status(catalog: &ArtifactCatalog) {
    println!("🏛️  VENUE PIPELINE STATUS");
    println!("{}", "=".repeat(50));

    let main_files = [
        ("stable output", catalog.stable_output()),
        ("harvest progress", catalog.harvest_progress()),
        ("geocoding progress", catalog.geocoding_progress()),
        ("clean dataset", catalog.clean_output()),
    ];

    let mut found_any = false;
    for (label, path) in main_files {
        if !path.exists() {
            println!("❌ {} - not found", path.display());
            continue;
        }
        found_any = true;
        println!("✅ {} ({})", path.display(), label);
        match checkpoint::load_snapshot(&path) {
            Ok(venues) => print_stats(&venues),
            Err(e) => println!("   ⚠️  unreadable: {e}"),
        }
    }

    let milestones = catalog.milestone_snapshots();
    if !milestones.is_empty() {
        println!("\n🏁 Milestones ({}):", milestones.len());
        for snapshot in milestones.iter().rev().take(5) {
            println!("   {}", snapshot.display());
        }
    }
    let backups = catalog.backup_snapshots();
    if !backups.is_empty() {
        println!("\n💾 Backups ({}):", backups.len());
        for snapshot in backups.iter().rev().take(3) {
            println!("   {}", snapshot.display());
        }
    }

    if !found_any {
        println!("\nNo venue data yet. Start with: venue_harvester harvest --test");
    }
}

fn print_stats(venues: &[Venue]) {
    let total = venues.len();
    println!("   Venues: {total}");
    if total == 0 {
        return;
    }
    let pct = |n: usize| n as f64 / total as f64 * 100.0;

    let with_address = venues.iter().filter(|v| !v.address.is_empty()).count();
    let with_about = venues
        .iter()
        .filter(|v| v.about.as_deref().map_or(false, |a| !a.is_empty()))
        .count();
    let with_website = venues
        .iter()
        .filter(|v| v.website.as_deref().map_or(false, |w| !w.is_empty()))
        .count();
    let with_tags = venues.iter().filter(|v| !v.tags.is_empty()).count();
    let with_coords = venues.iter().filter(|v| v.has_known_location()).count();

    let tags: HashSet<&str> = venues
        .iter()
        .flat_map(|v| v.tags.iter().map(String::as_str))
        .collect();
    let districts: HashSet<&str> = venues
        .iter()
        .filter_map(|v| v.district.as_deref())
        .filter(|d| *d != UNKNOWN)
        .collect();

    println!("   Address: {}/{} ({:.1}%)", with_address, total, pct(with_address));
    println!("   Description: {}/{} ({:.1}%)", with_about, total, pct(with_about));
    println!("   Website: {}/{} ({:.1}%)", with_website, total, pct(with_website));
    println!("   Tags: {}/{} ({:.1}%)", with_tags, total, pct(with_tags));
    if with_coords > 0 {
        println!("   Coordinates: {}/{} ({:.1}%)", with_coords, total, pct(with_coords));
    }
    println!("   Unique tags: {}", tags.len());
    if !districts.is_empty() {
        println!("   Districts: {}", districts.len());
    }
}
