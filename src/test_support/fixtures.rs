//! Test fixtures for common test scenarios.
//!
//! Pre-built availability records and data file contents shared by the unit
//! tests.

use crate::availability::Availability;
use crate::core::record::Record;
use crate::core::value::Value;

/// Records of a small forecast table over `level`, `param`, `step`:
/// `{500, Z, 24}`, `{500, Z, 36}`, `{1000, Z, 24}`.
pub fn forecast_records() -> Vec<Record> {
    [(500, 24), (500, 36), (1000, 24)]
        .into_iter()
        .map(|(level, step)| {
            Record::from([
                ("level", Value::from(level)),
                ("param", Value::from("Z")),
                ("step", Value::from(step)),
            ])
        })
        .collect()
}

/// The forecast table built from [`forecast_records`].
pub fn forecast_table() -> Availability {
    Availability::from_records(forecast_records()).expect("forecast fixture is valid")
}

/// JSON availability file holding the forecast records with string levels.
pub fn forecast_json_with_string_levels() -> &'static str {
    r#"{
  "records": [
    {"level": "500", "param": "Z", "step": 24},
    {"level": "500", "param": "Z", "step": 36},
    {"level": "1000", "param": "Z", "step": 24}
  ]
}"#
}

/// TOML availability file with grouped records.
pub fn ensemble_toml() -> &'static str {
    r#"
[[records]]
origin = "ecmwf"
number = [1, 2, 3]
param = ["2t", "tp"]

[[records]]
origin = "dwd"
number = [1, 2]
param = "2t"
"#
}
