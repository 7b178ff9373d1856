//! # Species Bank
//!
//! Read-only species reference data.
//!
//! The bank is a single protobuf file (`bank.bin`) produced by the `process` crate from the
//! FishBase/SeaLifeBase export. The server loads it once at startup, either from disk or from a
//! remote URL, and resolves it into a [`SpeciesBank`] that every request borrows.
use std::{fs, io, path::Path};

use prost::Message;
use reqwest::get;
use thiserror::Error;

pub mod reference;
pub mod species;

pub use reference::{CitationKind, DepthPair, DepthSource, Provenance, Species, SpeciesBank, Taxonomy};
use species::Bank;

#[derive(Error, Debug)]
pub enum BankError {
    #[error("Failed to read bank: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to decode bank: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Failed to fetch remote bank: {0}")]
    Remote(#[from] reqwest::Error),
}

pub fn get_bank(path: impl AsRef<Path>) -> Result<Bank, BankError> {
    let data = fs::read(path)?;

    Ok(Bank::decode(&*data)?)
}

pub async fn get_bank_remote(url: &str) -> Result<Bank, BankError> {
    let response = get(url).await?.error_for_status()?;
    let bytes = response.bytes().await?;

    Ok(Bank::decode(&*bytes)?)
}

pub fn write_bank(path: impl AsRef<Path>, bank: &Bank) -> Result<(), BankError> {
    fs::write(path, bank.encode_to_vec())?;

    Ok(())
}
