//! Whole-argument-set validation against an availability table.

use std::collections::{BTreeMap, BTreeSet};

use crate::availability::Availability;
use crate::core::args::Kwargs;
use crate::core::value::Value;
use crate::errors::ArgError;

/// A pipeline entry that checks normalized arguments against a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Guard {
    table: Availability,
    values: BTreeMap<String, BTreeSet<Value>>,
}

impl Guard {
    pub(crate) fn new(table: Availability) -> Self {
        let values = table.unique_values();
        Guard { table, values }
    }

    pub fn table(&self) -> &Availability {
        &self.table
    }

    /// Check the subset of `kwargs` covered by the table.
    ///
    /// Values are compared on their textual form when they are not table
    /// values already, so a key no normalizer rewrote still matches `"36"`
    /// against `36`.
    pub fn check(&self, kwargs: &Kwargs) -> Result<(), ArgError> {
        let covered: Kwargs = kwargs
            .iter()
            .filter_map(|(name, value)| {
                let values = self.values.get(name)?;
                Some((name.clone(), canonical(values, value)))
            })
            .collect();

        self.table.check(&covered).map_err(|no_match| {
            tracing::debug!("guard rejected: {}", no_match);
            ArgError::from(no_match)
        })
    }
}

/// Map `value`, or each element of a list, onto the table value with the
/// same textual form. Values with no such counterpart are left as they are.
fn canonical(values: &BTreeSet<Value>, value: &Value) -> Value {
    match value {
        Value::List(items) => Value::List(items.iter().map(|v| canonical(values, v)).collect()),
        scalar if scalar.is_null() || values.contains(scalar) => scalar.clone(),
        scalar => scalar
            .text()
            .and_then(|text| {
                values
                    .iter()
                    .find(|candidate| candidate.text().as_deref() == Some(text.as_str()))
            })
            .cloned()
            .unwrap_or_else(|| scalar.clone()),
    }
}
