//! # Bank Processing
//!
//! Turns the combined FishBase/SeaLifeBase CSV export into `bank.bin`.
//!
//! ## Steps
//! 1. Read every row of the export. Numeric cells may be `NA`.
//!
//! 2. Sanitize names: trim, collapse whitespace. Rows without genus or species are dropped.
//!
//! 3. Drop rows where neither depth pair (commercial or general) is complete. The explorer is
//!    organised by depth, a species without one cannot be placed.
//!
//! 4. Keep the first row per `Genus species`. Later duplicates are counted and dropped.
//!
//! 5. Append the hand-entered species (sentinel provenance codes) unless the export already has them.
//!
//! 6. Encode and write the bank.
//!
//! ## Notes
//! - The Wikipedia availability flag comes from the optional `has_wiki_page` column. Without it every
//!   species is assumed to have a page.
use std::{
    collections::{HashMap, hash_map::Entry},
    path::Path,
};

use anyhow::{Context, Result};
use bank::{species::Bank, write_bank};
use indicatif::{ProgressBar, ProgressStyle};

pub mod models;
pub mod utils;

use models::{SpeciesRow, hand_entered};
use utils::{canonical_name, to_entry};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub rows: usize,
    pub kept: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub hand_entered: usize,
}

pub fn load_species(input: &Path, output: &Path) -> Result<Summary> {
    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} rows {msg}")?,
    );

    let mut summary = Summary::default();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut bank = Bank::default();

    for record in reader.deserialize::<SpeciesRow>() {
        let row = record.with_context(|| format!("Malformed row {}", summary.rows + 1))?;
        summary.rows += 1;
        pb.inc(1);

        let Some(entry) = to_entry(row) else {
            summary.rejected += 1;
            continue;
        };

        match positions.entry(canonical_name(&entry)) {
            Entry::Vacant(slot) => {
                #[cfg(feature = "verbose")]
                println!("New species! {}", slot.key());

                slot.insert(bank.species.len());
                bank.species.push(entry);
                summary.kept += 1;
            }
            Entry::Occupied(_) => summary.duplicates += 1,
        }
    }

    pb.finish_with_message("read");

    for entry in hand_entered() {
        if let Entry::Vacant(slot) = positions.entry(canonical_name(&entry)) {
            slot.insert(bank.species.len());
            bank.species.push(entry);
            summary.hand_entered += 1;
        }
    }

    println!("Rows: {}", summary.rows);
    println!("Kept: {}", summary.kept);
    println!("Rejected: {}", summary.rejected);
    println!("Duplicates: {}", summary.duplicates);
    println!("Hand entered: {}\n", summary.hand_entered);

    write_bank(output, &bank)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(summary)
}
