use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::species::{Bank, SpeciesEntry};

pub const FISHBASE: i32 = 1;
pub const SEALIFEBASE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepthPair {
    pub shallow: f64,
    pub deep: f64,
}

impl DepthPair {
    fn from_bounds(shallow: Option<f64>, deep: Option<f64>) -> Option<Self> {
        match (shallow, deep) {
            (Some(shallow), Some(deep)) if shallow.is_finite() && deep.is_finite() => {
                Some(Self { shallow, deep })
            }
            _ => None,
        }
    }
}

/// Which of the record's bound pairs ended up as the preferred one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthSource {
    Commercial,
    General,
    /// Neither pair is complete, only a shallow bound survived.
    ShallowOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CitationKind {
    HasComments { text: String },
    Curated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    FishBase,
    SeaLifeBase,
    HandEntered { sentinel: i32, citation: CitationKind },
}

impl Provenance {
    /// Resolves the raw `database` code of a bank entry. Unknown positive codes yield `None`.
    pub fn resolve(code: i32, comments: Option<&str>) -> Option<Self> {
        match code {
            FISHBASE => Some(Self::FishBase),
            SEALIFEBASE => Some(Self::SeaLifeBase),
            sentinel if sentinel <= 0 => {
                let citation = match comments.map(str::trim) {
                    Some(text) if !text.is_empty() => CitationKind::HasComments {
                        text: text.to_string(),
                    },
                    _ => CitationKind::Curated,
                };

                Some(Self::HandEntered { sentinel, citation })
            }
            _ => None,
        }
    }

    pub fn citation(&self) -> String {
        match self {
            Self::FishBase => {
                "Species metadata (taxonomy, length, depth) from FishBase (www.fishbase.org)".into()
            }
            Self::SeaLifeBase => {
                "Species metadata (taxonomy, length, depth) from SeaLifeBase (www.sealifebase.org)"
                    .into()
            }
            Self::HandEntered {
                citation: CitationKind::HasComments { text },
                ..
            } => text.clone(),
            Self::HandEntered {
                citation: CitationKind::Curated,
                ..
            } => "Species metadata entered by hand by the Pelagica maintainers".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Taxonomy {
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
}

impl Taxonomy {
    /// Kingdom to genus, blanks as `None`.
    pub fn lineage(&self) -> [Option<&str>; 6] {
        [
            &self.kingdom,
            &self.phylum,
            &self.class,
            &self.order,
            &self.family,
            &self.genus,
        ]
        .map(|rank| rank.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Species {
    /// Canonical `Genus species`.
    pub name: String,
    pub genus: String,
    pub epithet: String,
    pub common_name: Option<String>,
    pub has_wiki_page: bool,
    pub length_cm: Option<f64>,
    pub commercial_depth: Option<DepthPair>,
    pub general_depth: Option<DepthPair>,
    pub preferred_depth: Option<(DepthPair, DepthSource)>,
    pub taxonomy: Taxonomy,
    pub habitat: Option<String>,
    pub fresh: bool,
    pub brackish: bool,
    pub saltwater: bool,
    pub longevity_years: Option<f64>,
    pub dangerous: Option<String>,
    pub provenance: Provenance,
}

impl Species {
    fn from_entry(entry: SpeciesEntry) -> Option<Self> {
        let genus = entry.genus.trim().to_string();
        let epithet = entry.species.trim().to_string();

        if genus.is_empty() || epithet.is_empty() {
            return None;
        }

        let name = format!("{genus} {epithet}");
        let Some(provenance) = Provenance::resolve(entry.database, entry.comments.as_deref())
        else {
            warn!("Skipping {name}: unknown provenance code {}", entry.database);
            return None;
        };

        let commercial_depth = DepthPair::from_bounds(entry.depth_com_shallow, entry.depth_com_deep);
        let general_depth = DepthPair::from_bounds(entry.depth_shallow, entry.depth_deep);

        let preferred_depth = match (commercial_depth, general_depth) {
            (Some(pair), _) => Some((pair, DepthSource::Commercial)),
            (None, Some(pair)) => Some((pair, DepthSource::General)),
            (None, None) => entry
                .depth_com_shallow
                .or(entry.depth_shallow)
                .filter(|shallow| shallow.is_finite())
                .map(|shallow| {
                    (
                        DepthPair {
                            shallow,
                            deep: shallow,
                        },
                        DepthSource::ShallowOnly,
                    )
                }),
        };

        let taxonomy = Taxonomy {
            kingdom: non_blank(entry.kingdom),
            phylum: non_blank(entry.phylum),
            class: non_blank(entry.class),
            order: non_blank(entry.order),
            family: non_blank(entry.family),
            genus: Some(genus.clone()),
        };

        Some(Self {
            name,
            genus,
            epithet,
            common_name: non_blank(entry.common_name),
            has_wiki_page: entry.has_wiki_page,
            length_cm: entry.length_cm.filter(|cm| cm.is_finite()),
            commercial_depth,
            general_depth,
            preferred_depth,
            taxonomy,
            habitat: non_blank(entry.habitat),
            fresh: entry.fresh,
            brackish: entry.brackish,
            saltwater: entry.saltwater,
            longevity_years: entry.longevity_years.filter(|years| years.is_finite()),
            dangerous: non_blank(entry.dangerous),
            provenance,
        })
    }

    /// `Common (Genus species)`, or just the scientific name.
    pub fn dropdown_label(&self) -> String {
        match &self.common_name {
            Some(common) => format!("{common} ({})", self.name),
            None => self.name.clone(),
        }
    }

    pub fn depth_bounds(&self) -> Option<DepthPair> {
        self.preferred_depth.map(|(pair, _)| pair)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn cm_to_in(cm: f64) -> f64 {
    round_tenth(cm / 2.54)
}

pub fn m_to_ft(m: f64) -> f64 {
    round_tenth(m * 3.28084)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Resolved, immutable species table. Sorted by canonical name.
#[derive(Debug, Default)]
pub struct SpeciesBank {
    species: Vec<Species>,
    by_name: HashMap<String, usize>,
}

impl SpeciesBank {
    pub fn from_bank(bank: Bank) -> Self {
        let mut species: Vec<Species> = Vec::with_capacity(bank.species.len());
        let mut seen = HashMap::new();

        for entry in bank.species {
            let Some(record) = Species::from_entry(entry) else {
                continue;
            };

            if seen.insert(record.name.clone(), ()).is_some() {
                warn!("Skipping duplicate species {}", record.name);
                continue;
            }

            species.push(record);
        }

        species.sort_by(|a, b| a.name.cmp(&b.name));

        let by_name = species
            .iter()
            .enumerate()
            .map(|(index, record)| (record.name.clone(), index))
            .collect();

        Self { species, by_name }
    }

    pub fn get(&self, name: &str) -> Option<&Species> {
        self.by_name.get(name).map(|&index| &self.species[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    pub fn with_wiki(&self) -> impl Iterator<Item = &Species> {
        self.species.iter().filter(|record| record.has_wiki_page)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Genera that have at least one species with a Wikipedia page.
    pub fn genera(&self) -> Vec<&str> {
        let mut genera: Vec<&str> = self.with_wiki().map(|record| record.genus.as_str()).collect();
        genera.dedup();

        genera
    }

    pub fn epithets(&self, genus: &str) -> Vec<&str> {
        self.with_wiki()
            .filter(|record| record.genus == genus)
            .map(|record| record.epithet.as_str())
            .collect()
    }
}
