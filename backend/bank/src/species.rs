//! # Bank Schema
//!
//! Protobuf messages stored in `bank.bin`. Written by the `process` crate and read by the server
//! at startup.
//!
//! Field tags are part of the file format, never renumber them. New fields get the next free tag.
//!
//! Depths are meters, lengths centimeters. Absent numeric values are encoded as unset optionals,
//! not zero, since zero is a real depth.

use prost::Message;

#[derive(Clone, PartialEq, Message)]
pub struct Bank {
    #[prost(message, repeated, tag = "1")]
    pub species: Vec<SpeciesEntry>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SpeciesEntry {
    #[prost(string, tag = "1")]
    pub genus: String,
    #[prost(string, tag = "2")]
    pub species: String,
    #[prost(string, optional, tag = "3")]
    pub common_name: Option<String>,
    #[prost(bool, tag = "4")]
    pub has_wiki_page: bool,
    #[prost(double, optional, tag = "5")]
    pub length_cm: Option<f64>,

    #[prost(double, optional, tag = "6")]
    pub depth_com_shallow: Option<f64>,
    #[prost(double, optional, tag = "7")]
    pub depth_com_deep: Option<f64>,
    #[prost(double, optional, tag = "8")]
    pub depth_shallow: Option<f64>,
    #[prost(double, optional, tag = "9")]
    pub depth_deep: Option<f64>,

    #[prost(string, optional, tag = "10")]
    pub kingdom: Option<String>,
    #[prost(string, optional, tag = "11")]
    pub phylum: Option<String>,
    #[prost(string, optional, tag = "12")]
    pub class: Option<String>,
    #[prost(string, optional, tag = "13")]
    pub order: Option<String>,
    #[prost(string, optional, tag = "14")]
    pub family: Option<String>,

    #[prost(string, optional, tag = "15")]
    pub habitat: Option<String>,
    #[prost(bool, tag = "16")]
    pub fresh: bool,
    #[prost(bool, tag = "17")]
    pub brackish: bool,
    #[prost(bool, tag = "18")]
    pub saltwater: bool,
    #[prost(double, optional, tag = "19")]
    pub longevity_years: Option<f64>,
    #[prost(string, optional, tag = "20")]
    pub dangerous: Option<String>,

    /// 1 = FishBase, 2 = SeaLifeBase, zero or negative = hand-entered.
    #[prost(sint32, tag = "21")]
    pub database: i32,
    #[prost(string, optional, tag = "22")]
    pub comments: Option<String>,
}
