use std::sync::LazyLock;

use bank::{reference::FISHBASE, reference::SEALIFEBASE, species::SpeciesEntry};
use regex::Regex;

use crate::models::SpeciesRow;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Trims and collapses inner whitespace. Case is kept, `Genus species` is case-sensitive.
pub fn sanitize(input: &str) -> String {
    WHITESPACE.replace_all(input.trim(), " ").into_owned()
}

pub fn canonical_name(entry: &SpeciesEntry) -> String {
    format!("{} {}", entry.genus, entry.species)
}

/// `NA`, blanks and unparsable cells are missing values.
pub fn parse_number(cell: Option<&str>) -> Option<f64> {
    let cell = cell?.trim();

    if cell.is_empty() || cell.eq_ignore_ascii_case("na") {
        return None;
    }

    cell.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// FishBase marks yes as `-1`, other exports use `1` or `TRUE`.
pub fn parse_flag(cell: Option<&str>) -> bool {
    match cell.map(str::trim) {
        Some(cell) if cell.eq_ignore_ascii_case("true") => true,
        Some(cell) => parse_number(Some(cell)).is_some_and(|value| value != 0.0),
        None => false,
    }
}

pub fn parse_database(cell: Option<&str>) -> Option<i32> {
    match cell.map(|c| c.trim().to_lowercase()).as_deref() {
        Some("fishbase") => Some(FISHBASE),
        Some("sealifebase") => Some(SEALIFEBASE),
        _ => None,
    }
}

fn text(cell: Option<String>) -> Option<String> {
    cell.map(|c| sanitize(&c))
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("na"))
}

/// `None` when the row has no usable name, no known source, or neither depth pair is complete.
pub fn to_entry(row: SpeciesRow) -> Option<SpeciesEntry> {
    let genus = sanitize(&row.genus);
    let species = sanitize(&row.species);

    if genus.is_empty() || species.is_empty() {
        return None;
    }

    let database = parse_database(row.database.as_deref())?;

    let depth_com_shallow = parse_number(row.depth_com_shallow.as_deref());
    let depth_com_deep = parse_number(row.depth_com_deep.as_deref());
    let depth_shallow = parse_number(row.depth_shallow.as_deref());
    let depth_deep = parse_number(row.depth_deep.as_deref());

    let no_commercial = depth_com_shallow.is_none() || depth_com_deep.is_none();
    let no_general = depth_shallow.is_none() || depth_deep.is_none();
    if no_commercial && no_general {
        return None;
    }

    Some(SpeciesEntry {
        genus,
        species,
        common_name: text(row.common_name),
        has_wiki_page: row
            .has_wiki_page
            .as_deref()
            .map_or(true, |cell| parse_flag(Some(cell))),
        length_cm: parse_number(row.length.as_deref()),
        depth_com_shallow,
        depth_com_deep,
        depth_shallow,
        depth_deep,
        kingdom: text(row.kingdom),
        phylum: text(row.phylum),
        class: text(row.class),
        order: text(row.order),
        family: text(row.family),
        habitat: text(row.demers_pelag),
        fresh: parse_flag(row.fresh.as_deref()),
        brackish: parse_flag(row.brack.as_deref()),
        saltwater: parse_flag(row.saltwater.as_deref()),
        longevity_years: parse_number(row.longevity_wild.as_deref()),
        dangerous: text(row.dangerous),
        database,
        comments: text(row.comments),
    })
}
