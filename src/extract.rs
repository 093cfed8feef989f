use crate::config::SourceConfig;
use crate::types::Venue;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};

static LEADING_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\W+").unwrap());

/// Words that mark a paragraph as a street address in the source markup.
const STREET_WORDS: [&str; 4] = ["str", "straße", "platz", "allee"];

/// Summary-level fields pulled from one listing-page container.
#[derive(Debug, Clone, PartialEq)]
pub struct VenueSummary {
    pub name: String,
    pub slug: String,
    pub address: String,
    pub tags: Vec<String>,
    pub detail_url: String,
}

impl VenueSummary {
    pub fn into_venue(self) -> Venue {
        Venue {
            name: self.name,
            slug: self.slug,
            address: self.address,
            tags: self.tags,
            detail_url: self.detail_url,
            about: None,
            website: None,
            coordinates: None,
            district: None,
        }
    }
}

/// Long-form fields extracted from a venue's detail page. Missing sections
/// simply come back empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VenueDetails {
    pub about: String,
    pub website: String,
}

fn sel(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

fn text_of(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Applies the extraction strategies in order and returns the first
/// non-empty result. The upstream markup is not contractually stable, so a
/// strict selector is tried first and progressively looser ones after it.
pub fn extract_listing(html: &str, cfg: &SourceConfig) -> Vec<VenueSummary> {
    let doc = Html::parse_document(html);
    let strategies: [(&str, fn(&Html, &SourceConfig) -> Vec<VenueSummary>); 3] = [
        ("primary", extract_primary),
        ("loose", extract_loose),
        ("heuristic", extract_heuristic),
    ];
    for (name, strategy) in strategies {
        let venues = strategy(&doc, cfg);
        if !venues.is_empty() {
            debug!("extraction strategy '{}' matched {} venues", name, venues.len());
            return venues;
        }
    }
    warn!("no extraction strategy matched any venue on this page");
    Vec::new()
}

fn extract_primary(doc: &Html, cfg: &SourceConfig) -> Vec<VenueSummary> {
    collect(doc.select(&sel("div.p-4")), cfg)
}

fn extract_loose(doc: &Html, cfg: &SourceConfig) -> Vec<VenueSummary> {
    collect(doc.select(&sel(r#"div[class*="p-4"]"#)), cfg)
}

/// Last resort: any innermost div holding both a heading and a venue detail
/// link.
fn extract_heuristic(doc: &Html, cfg: &SourceConfig) -> Vec<VenueSummary> {
    let div = sel("div");
    let candidates: Vec<ElementRef> = doc
        .select(&div)
        .filter(|el| holds_venue_heading(el, cfg))
        .collect();
    let innermost = candidates
        .iter()
        .copied()
        .filter(|el| !el.select(&div).any(|child| holds_venue_heading(&child, cfg)));
    collect(innermost, cfg)
}

fn holds_venue_heading(el: &ElementRef, cfg: &SourceConfig) -> bool {
    el.select(&sel("h3")).next().is_some()
        && el.select(&sel("a")).any(|a| {
            a.value()
                .attr("href")
                .map_or(false, |href| href.contains(&cfg.merchant_path))
        })
}

fn collect<'a>(
    containers: impl Iterator<Item = ElementRef<'a>>,
    cfg: &SourceConfig,
) -> Vec<VenueSummary> {
    containers
        .filter_map(|container| extract_from_container(&container, cfg))
        .collect()
}

/// Pulls the summary fields out of one listing container. Containers
/// without a named detail link are not venues.
fn extract_from_container(container: &ElementRef, cfg: &SourceConfig) -> Option<VenueSummary> {
    let h3 = container.select(&sel("h3")).next()?;
    let link = h3.select(&sel("a")).find(|a| {
        a.value()
            .attr("href")
            .map_or(false, |href| href.contains(&cfg.merchant_path))
    })?;

    let name = text_of(&link);
    if name.is_empty() {
        return None;
    }
    let href = link.value().attr("href")?;
    let slug = href
        .split(cfg.merchant_path.as_str())
        .last()
        .unwrap_or_default()
        .split('?')
        .next()
        .unwrap_or_default()
        .to_string();

    let address = extract_address(container, cfg);
    let tags = extract_tags(container, &name, &address);
    let detail_url = format!("{}{}", cfg.base_url, href);

    Some(VenueSummary {
        name,
        slug,
        address,
        tags,
        detail_url,
    })
}

fn extract_address(container: &ElementRef, cfg: &SourceConfig) -> String {
    let strict = sel("p.text-gray-600");
    let loose = sel(r#"p[class*="text-gray"]"#);
    let any_p = sel("p");

    let found = container
        .select(&strict)
        .next()
        .or_else(|| container.select(&loose).next())
        .or_else(|| {
            let locality = cfg.locality.to_lowercase();
            container.select(&any_p).find(|p| {
                let text = text_of(p).to_lowercase();
                text.contains(&locality) && STREET_WORDS.iter().any(|w| text.contains(w))
            })
        });

    match found {
        Some(p) => LEADING_PUNCT.replace(&text_of(&p), "").trim().to_string(),
        None => String::new(),
    }
}

fn extract_tags(container: &ElementRef, name: &str, address: &str) -> Vec<String> {
    let badge = sel("span.inline-block");
    let blue = sel(r#"span[class*="bg-blue"]"#);
    let rounded = sel(r#"span[class*="rounded"]"#);
    let any_span = sel("span");

    let mut texts: Vec<String> = container.select(&badge).map(|s| text_of(&s)).collect();
    if texts.is_empty() {
        texts = container.select(&blue).map(|s| text_of(&s)).collect();
    }
    if texts.is_empty() {
        texts = container.select(&rounded).map(|s| text_of(&s)).collect();
    }
    if texts.is_empty() {
        texts = container
            .select(&any_span)
            .map(|s| text_of(&s))
            .filter(|t| !t.is_empty() && t.chars().count() < 25)
            .collect();
    }

    let mut seen = HashSet::new();
    texts
        .into_iter()
        .filter(|t| {
            !t.is_empty() && t != name && !address.contains(t.as_str()) && t.chars().count() < 30
        })
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

pub fn extract_details(html: &str, cfg: &SourceConfig) -> VenueDetails {
    let doc = Html::parse_document(html);
    VenueDetails {
        about: extract_about(&doc),
        website: extract_website(&doc, cfg),
    }
}

/// The description sits in whatever element follows the "About" heading;
/// skip filler nodes until something with substantial text shows up.
fn extract_about(doc: &Html) -> String {
    for h3 in doc.select(&sel("h3")) {
        if !text_of(&h3).contains("About") {
            continue;
        }
        for node in h3.next_siblings() {
            if let Some(el) = ElementRef::wrap(node) {
                let text = text_of(&el);
                if text.chars().count() > 50 {
                    return text;
                }
            }
        }
    }
    String::new()
}

/// First external link presented as the venue's website.
fn extract_website(doc: &Html, cfg: &SourceConfig) -> String {
    for link in doc.select(&sel("a")) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.starts_with("http") || href.contains(cfg.host()) {
            continue;
        }
        if text_of(&link).to_lowercase().contains("website") {
            return href.to_string();
        }
    }
    String::new()
}
