//! # Dive
//!
//! Session-local depth assignment.
//!
//! Every browser session carries a random 32-bit seed. Each species gets one "current depth" drawn
//! from its documented shallow/deep bounds with a stream derived from that seed and the species
//! name, so re-renders in one session agree and different sessions differ. The filtered set is
//! then ordered by that depth for stepping deeper or shallower.
//!
//! ## Bias
//! Large depth bands are not described uniformly. A near-surface species listed to 190 m is mostly
//! seen near the top of that band, an abyssal one mostly near the bottom.
//! - `s < 200`: `s + u^1.3 (d - s)`
//! - `200 <= s < 2000`: uniform
//! - `s >= 2000`: `s + (1 - (1 - u)^2) (d - s)`
//!
//! ## Notes
//! - Inverted pairs (`d < s`) are swapped before sampling.
//! - Marine mammals are recorded with their dive limits but are watched at the surface, they are
//!   pinned to 0-5 m.
use std::collections::{HashMap, HashSet};

use bank::{DepthPair, Species};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

pub const SURFACE_SPECIES: [&str; 7] = [
    "Balaenoptera musculus",
    "Delphinus delphis",
    "Enhydra lutris",
    "Megaptera novaeangliae",
    "Orcinus orca",
    "Tursiops truncatus",
    "Homo sapiens",
];

pub const SURFACE_BOUNDS: DepthPair = DepthPair {
    shallow: 0.0,
    deep: 5.0,
};

const SHALLOW_BAND: f64 = 200.0;
const ABYSSAL_BAND: f64 = 2000.0;

/// FNV-1a, stable across builds and platforms.
pub fn species_hash(name: &str) -> u64 {
    name.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

fn stream(seed: u32, name: &str) -> StdRng {
    StdRng::seed_from_u64(species_hash(name) ^ u64::from(seed).wrapping_mul(0x9e37_79b9_7f4a_7c15))
}

/// Maps a uniform `u` in `[0, 1)` to a fraction of the band, biased by where the band starts.
pub fn biased_fraction(shallow: f64, u: f64) -> f64 {
    if shallow < SHALLOW_BAND {
        u.powf(1.3)
    } else if shallow < ABYSSAL_BAND {
        u
    } else {
        1.0 - (1.0 - u).powi(2)
    }
}

pub fn sample_depth(name: &str, shallow: Option<f64>, deep: Option<f64>, seed: u32) -> Option<f64> {
    let (shallow, deep) = if SURFACE_SPECIES.contains(&name) {
        (Some(SURFACE_BOUNDS.shallow), Some(SURFACE_BOUNDS.deep))
    } else {
        (shallow, deep)
    };

    let (s, d) = match (shallow, deep) {
        (Some(s), Some(d)) if s != d => (s.min(d), s.max(d)),
        (shallow, _) => return shallow,
    };

    let u: f64 = stream(seed, name).random();

    Some((s + biased_fraction(s, u) * (d - s)).clamp(s, d))
}

pub fn sample_species(species: &Species, seed: u32) -> Option<f64> {
    let bounds = species.depth_bounds();

    sample_depth(
        &species.name,
        bounds.map(|pair| pair.shallow),
        bounds.map(|pair| pair.deep),
        seed,
    )
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeciesFilter {
    pub min_length_cm: Option<f64>,
    pub max_length_cm: Option<f64>,
    pub min_depth_m: Option<f64>,
    pub max_depth_m: Option<f64>,
    #[serde(default)]
    pub wiki_only: bool,
    /// Minimum number of sessions currently favouriting the species.
    pub min_favourites: Option<u32>,
    /// Restrict to what this session has favourited.
    pub favourites_of: Option<String>,
}

impl SpeciesFilter {
    fn admits(&self, species: &Species) -> bool {
        if self.wiki_only && !species.has_wiki_page {
            return false;
        }

        if self.min_length_cm.is_some() || self.max_length_cm.is_some() {
            let Some(length) = species.length_cm else {
                return false;
            };

            if self.min_length_cm.is_some_and(|min| length < min)
                || self.max_length_cm.is_some_and(|max| length > max)
            {
                return false;
            }
        }

        true
    }

    fn admits_depth(&self, depth: f64) -> bool {
        !(self.min_depth_m.is_some_and(|min| depth < min)
            || self.max_depth_m.is_some_and(|max| depth > max))
    }

    /// Whether the filter needs favourite data to be applied.
    pub fn uses_favourites(&self) -> bool {
        self.min_favourites.is_some() || self.favourites_of.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Previous,
    Shallowest,
    Deepest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placed {
    pub species: String,
    pub depth: f64,
}

/// Filtered species totally ordered by sampled depth, ties by name.
#[derive(Debug, Default)]
pub struct DepthOrder {
    entries: Vec<Placed>,
    positions: HashMap<String, usize>,
}

impl DepthOrder {
    /// `allowed`, when given, is the set of species that passed the favourite-based filters.
    pub fn build<'a>(
        species: impl IntoIterator<Item = &'a Species>,
        seed: u32,
        filter: &SpeciesFilter,
        allowed: Option<&HashSet<String>>,
    ) -> Self {
        let mut entries: Vec<Placed> = species
            .into_iter()
            .filter(|record| filter.admits(record))
            .filter(|record| allowed.is_none_or(|allowed| allowed.contains(&record.name)))
            .filter_map(|record| {
                sample_species(record, seed).map(|depth| Placed {
                    species: record.name.clone(),
                    depth,
                })
            })
            .filter(|placed| filter.admits_depth(placed.depth))
            .collect();

        entries.sort_by(|a, b| {
            a.depth
                .total_cmp(&b.depth)
                .then_with(|| a.species.cmp(&b.species))
        });

        let positions = entries
            .iter()
            .enumerate()
            .map(|(index, placed)| (placed.species.clone(), index))
            .collect();

        Self { entries, positions }
    }

    pub fn entries(&self) -> &[Placed] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn depth_of(&self, name: &str) -> Option<f64> {
        self.position(name).map(|index| self.entries[index].depth)
    }

    pub fn shallowest(&self) -> Option<&Placed> {
        self.entries.first()
    }

    pub fn deepest(&self) -> Option<&Placed> {
        self.entries.last()
    }

    /// Clamped: the deepest species has no next, it stays put.
    pub fn next(&self, name: &str) -> Option<&Placed> {
        let index = self.position(name)?;
        self.entries.get(index + 1).or(self.entries.get(index))
    }

    pub fn previous(&self, name: &str) -> Option<&Placed> {
        let index = self.position(name)?;
        self.entries.get(index.saturating_sub(1))
    }

    /// Steps from `current` (name and its own sampled depth). A current species outside the order is
    /// placed by its depth first. Without a current species every direction lands on the shallowest.
    pub fn step(&self, current: Option<(&str, f64)>, direction: Direction) -> Option<&Placed> {
        match direction {
            Direction::Shallowest => return self.shallowest(),
            Direction::Deepest => return self.deepest(),
            Direction::Next | Direction::Previous => {}
        }

        let Some((name, depth)) = current else {
            return self.shallowest();
        };

        if self.position(name).is_some() {
            return match direction {
                Direction::Next => self.next(name),
                _ => self.previous(name),
            };
        }

        let insert_at = self.entries.partition_point(|placed| {
            placed
                .depth
                .total_cmp(&depth)
                .then_with(|| placed.species.as_str().cmp(name))
                .is_lt()
        });

        match direction {
            Direction::Next => self.entries.get(insert_at).or(self.deepest()),
            _ => insert_at
                .checked_sub(1)
                .and_then(|index| self.entries.get(index))
                .or(self.shallowest()),
        }
    }
}
