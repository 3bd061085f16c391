//! Availability files.
//!
//! JSON files hold either a bare array of records or an object with a
//! `records` array and an optional explicit `keys` order. TOML files use a
//! top-level `records` array (`[[records]]` tables or inline tables) with the
//! same optional `keys`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::availability::Availability;
use crate::core::record::Record;
use crate::util::data::read_data_file;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AvailabilityFile {
    Records(Vec<Record>),
    Table {
        records: Vec<Record>,
        #[serde(default)]
        keys: Option<Vec<String>>,
    },
}

pub(crate) fn load(path: &Path) -> Result<Availability> {
    let file: AvailabilityFile = read_data_file(path)?;

    let (records, keys) = match file {
        AvailabilityFile::Records(records) => (records, None),
        AvailabilityFile::Table { records, keys } => (records, keys),
    };

    tracing::debug!(
        "loaded {} availability records from {}",
        records.len(),
        path.display()
    );

    let table = match keys {
        Some(keys) => Availability::with_keys(keys, records),
        None => Availability::from_records(records),
    };
    table.with_context(|| format!("invalid availability file: {}", path.display()))
}
