use crate::types::Venue;
use std::collections::{BTreeMap, HashSet};

/// A deduplicated copy of the input plus what was dropped to get there.
#[derive(Debug, Default)]
pub struct DedupOutcome {
    pub venues: Vec<Venue>,
    /// How many later duplicates were removed, per name.
    pub removed: BTreeMap<String, usize>,
}

impl DedupOutcome {
    pub fn total_removed(&self) -> usize {
        self.removed.values().sum()
    }
}

/// Collapses the sequence to one record per exact `name`, keeping the first
/// occurrence and dropping everything after it, even when a later duplicate
/// carries more complete data. Names differing only in case or whitespace
/// count as distinct venues; no normalization or merging is attempted.
pub fn dedup_by_name(venues: &[Venue]) -> DedupOutcome {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut outcome = DedupOutcome::default();
    for venue in venues {
        if seen.insert(venue.name.as_str()) {
            outcome.venues.push(venue.clone());
        } else {
            *outcome.removed.entry(venue.name.clone()).or_insert(0) += 1;
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(name: &str, address: &str) -> Venue {
        Venue {
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            address: address.to_string(),
            tags: Vec::new(),
            detail_url: format!("https://venues.test/marketplace_merchants/{name}"),
            about: None,
            website: None,
            coordinates: None,
            district: None,
        }
    }

    #[test]
    fn keeps_first_occurrence_and_reports_removals() {
        let input = vec![
            venue("Cafe A", ""),
            venue("Cafe B", ""),
            venue("Cafe A", "Oderberger Straße 12"),
        ];
        let outcome = dedup_by_name(&input);

        let names: Vec<&str> = outcome.venues.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Cafe A", "Cafe B"]);
        // First occurrence wins even though the duplicate had an address.
        assert_eq!(outcome.venues[0].address, "");
        assert_eq!(outcome.removed.get("Cafe A"), Some(&1));
        assert_eq!(outcome.total_removed(), 1);
    }

    #[test]
    fn no_duplicates_returns_equal_sequence_with_zero_removals() {
        let input = vec![venue("Cafe A", ""), venue("Cafe B", ""), venue("Cafe C", "")];
        let outcome = dedup_by_name(&input);
        assert_eq!(outcome.venues, input);
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn dedup_is_idempotent() {
        let input = vec![
            venue("Cafe A", ""),
            venue("Bar B", ""),
            venue("Cafe A", ""),
            venue("Bar B", ""),
            venue("Cafe A", ""),
        ];
        let once = dedup_by_name(&input);
        let twice = dedup_by_name(&once.venues);
        assert_eq!(once.venues, twice.venues);
        assert_eq!(twice.total_removed(), 0);
    }

    #[test]
    fn preserves_relative_order_of_first_occurrences() {
        let input = vec![
            venue("Z", ""),
            venue("A", ""),
            venue("Z", ""),
            venue("M", ""),
            venue("A", ""),
        ];
        let names: Vec<String> = dedup_by_name(&input)
            .venues
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["Z", "A", "M"]);
    }

    #[test]
    fn output_never_exceeds_input_length() {
        let input = vec![venue("A", ""), venue("A", ""), venue("A", "")];
        let outcome = dedup_by_name(&input);
        assert_eq!(outcome.venues.len(), 1);
        assert_eq!(outcome.removed.get("A"), Some(&2));
    }

    #[test]
    fn names_are_compared_exactly() {
        // Case and whitespace variants are distinct venues here, by policy.
        let input = vec![venue("Cafe A", ""), venue("cafe a", ""), venue("Cafe A ", "")];
        let outcome = dedup_by_name(&input);
        assert_eq!(outcome.venues.len(), 3);
        assert_eq!(outcome.total_removed(), 0);
    }
}
