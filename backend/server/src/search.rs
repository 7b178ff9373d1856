//! # Search
//!
//! Common-name search behind the quick-search dropdown.
//!
//! The species table is small and immutable, so search runs in memory over the dropdown labels
//! (`Common (Genus species)`). Only species with a Wikipedia page are offered, the panel has
//! nothing to show for the rest.
//!
//! ## Ranking
//! 1. Common or scientific name starts with the query
//! 2. Label contains the query anywhere
//!
//! Ties are alphabetical by label. Matching is case-insensitive.
use bank::SpeciesBank;
use serde::Serialize;

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesOption {
    pub label: String,
    pub value: String,
}

pub fn search(bank: &SpeciesBank, query: &str, limit: usize) -> Vec<SpeciesOption> {
    let query = query.trim().to_lowercase();
    let limit = limit.min(MAX_LIMIT);

    let mut hits: Vec<(u8, String, SpeciesOption)> = bank
        .with_wiki()
        .filter_map(|species| {
            let label = species.dropdown_label();
            let folded = label.to_lowercase();

            let prefix = species.name.to_lowercase().starts_with(&query)
                || species
                    .common_name
                    .as_ref()
                    .is_some_and(|common| common.to_lowercase().starts_with(&query));

            let tier = if prefix {
                0
            } else if folded.contains(&query) {
                1
            } else {
                return None;
            };

            Some((
                tier,
                folded,
                SpeciesOption {
                    label,
                    value: species.name.clone(),
                },
            ))
        })
        .collect();

    hits.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    hits.truncate(limit);

    hits.into_iter().map(|(_, _, option)| option).collect()
}
