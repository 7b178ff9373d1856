use bank::{
    DepthSource, Provenance, Species,
    reference::{cm_to_in, m_to_ft},
};
use serde::Serialize;

use crate::error::AppError;

/// `Genus species` with whitespace collapsed. Anything without both parts is rejected.
pub fn normalize_name(raw: &str) -> Result<String, AppError> {
    let parts: Vec<&str> = raw.split_whitespace().collect();

    if parts.len() < 2 {
        return Err(AppError::BadArgs);
    }

    Ok(parts.join(" "))
}

#[derive(Debug, Serialize)]
pub struct Length {
    pub cm: f64,
    pub inches: f64,
}

#[derive(Debug, Serialize)]
pub struct DepthRange {
    pub shallow_m: f64,
    pub deep_m: f64,
    pub shallow_ft: f64,
    pub deep_ft: f64,
    pub source: DepthSource,
}

#[derive(Debug, Serialize)]
pub struct SpeciesPanel {
    pub name: String,
    pub genus: String,
    pub epithet: String,
    pub common_name: Option<String>,
    pub label: String,
    pub has_wiki_page: bool,
    pub length: Option<Length>,
    pub depth: Option<DepthRange>,
    pub habitat: Option<String>,
    pub zones: Vec<&'static str>,
    pub longevity_years: Option<f64>,
    pub dangerous: Option<String>,
    pub provenance: Provenance,
    pub citation: String,
}

pub fn panel(species: &Species) -> SpeciesPanel {
    let zones = [
        (species.fresh, "freshwater"),
        (species.brackish, "brackish"),
        (species.saltwater, "saltwater"),
    ]
    .into_iter()
    .filter_map(|(present, zone)| present.then_some(zone))
    .collect();

    SpeciesPanel {
        name: species.name.clone(),
        genus: species.genus.clone(),
        epithet: species.epithet.clone(),
        common_name: species.common_name.clone(),
        label: species.dropdown_label(),
        has_wiki_page: species.has_wiki_page,
        length: species.length_cm.map(|cm| Length {
            cm,
            inches: cm_to_in(cm),
        }),
        depth: species.preferred_depth.map(|(pair, source)| DepthRange {
            shallow_m: pair.shallow,
            deep_m: pair.deep,
            shallow_ft: m_to_ft(pair.shallow),
            deep_ft: m_to_ft(pair.deep),
            source,
        }),
        habitat: species.habitat.clone(),
        zones,
        longevity_years: species.longevity_years,
        dangerous: species.dangerous.clone(),
        provenance: species.provenance.clone(),
        citation: species.provenance.citation(),
    }
}
