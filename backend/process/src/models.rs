use bank::species::SpeciesEntry;
use serde::Deserialize;

/// Sentinel for species added by hand with their own citation in `comments`.
pub const HAND_ENTERED: i32 = -1;

/// One row of the combined FishBase/SeaLifeBase export.
///
/// Numeric columns stay strings here, the R export writes missing values as `NA`.
#[derive(Deserialize, Debug)]
pub struct SpeciesRow {
    #[serde(rename = "Genus")]
    pub genus: String,
    #[serde(rename = "Species")]
    pub species: String,
    #[serde(rename = "FBname", default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub has_wiki_page: Option<String>,

    #[serde(rename = "Length", default)]
    pub length: Option<String>,
    #[serde(rename = "DepthRangeComShallow", default)]
    pub depth_com_shallow: Option<String>,
    #[serde(rename = "DepthRangeComDeep", default)]
    pub depth_com_deep: Option<String>,
    #[serde(rename = "DepthRangeShallow", default)]
    pub depth_shallow: Option<String>,
    #[serde(rename = "DepthRangeDeep", default)]
    pub depth_deep: Option<String>,

    #[serde(default)]
    pub kingdom: Option<String>,
    #[serde(default)]
    pub phylum: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub family: Option<String>,

    #[serde(rename = "DemersPelag", default)]
    pub demers_pelag: Option<String>,
    #[serde(rename = "Fresh", default)]
    pub fresh: Option<String>,
    #[serde(rename = "Brack", default)]
    pub brack: Option<String>,
    #[serde(rename = "Saltwater", default)]
    pub saltwater: Option<String>,
    #[serde(rename = "LongevityWild", default)]
    pub longevity_wild: Option<String>,
    #[serde(rename = "Dangerous", default)]
    pub dangerous: Option<String>,
    #[serde(rename = "Database", default)]
    pub database: Option<String>,
    #[serde(rename = "Comments", default)]
    pub comments: Option<String>,
}

/// Species that are in neither database but belong in the explorer.
pub fn hand_entered() -> Vec<SpeciesEntry> {
    vec![SpeciesEntry {
        genus: "Homo".into(),
        species: "sapiens".into(),
        common_name: Some("Human".into()),
        has_wiki_page: true,
        length_cm: Some(165.0),
        depth_shallow: Some(0.0),
        depth_deep: Some(103.0),
        kingdom: Some("Animalia".into()),
        phylum: Some("Chordata".into()),
        class: Some("Mammalia".into()),
        order: Some("Primates".into()),
        family: Some("Hominidae".into()),
        habitat: Some("others".into()),
        longevity_years: Some(73.0),
        dangerous: Some("extreme".into()),
        database: HAND_ENTERED,
        comments: Some(
            "Human length and depth figures entered by hand; 103 m is the no-limits freediving record"
                .into(),
        ),
        ..Default::default()
    }]
}
