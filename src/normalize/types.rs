//! Target types for type-mode normalizers and their coercions.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::value::Value;

/// Canonical textual date format produced by the `date` type.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Compact date format accepted as input (`20200102`).
const COMPACT_DATE_FORMAT: &str = "%Y%m%d";

/// Type a normalizer coerces values to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[serde(alias = "integer")]
    Int,
    Float,
    #[serde(alias = "string")]
    Str,
    #[serde(alias = "boolean")]
    Bool,
    Date,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "str",
            ValueType::Bool => "bool",
            ValueType::Date => "date",
        }
    }

    /// Coerce a scalar to this type. Returns `None` when the value cannot
    /// be represented.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match self {
            ValueType::Int => coerce_int(value),
            ValueType::Float => coerce_float(value),
            ValueType::Str => value.text().map(Value::Str),
            ValueType::Bool => coerce_bool(value),
            ValueType::Date => coerce_date(value),
        }
    }
}

/// 2^63, the first float above the `i64` range.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn coerce_int(value: &Value) -> Option<Value> {
    match value {
        Value::Int(i) => Some(Value::Int(*i)),
        Value::Float(f) if f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(f) => {
            Some(Value::Int(*f as i64))
        }
        Value::Str(s) => s.trim().parse::<i64>().ok().map(Value::Int),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<Value> {
    match value {
        Value::Int(i) => Some(Value::Float(*i as f64)),
        Value::Float(f) => Some(Value::Float(*f)),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(b) => Some(Value::Bool(*b)),
        Value::Int(0) => Some(Value::Bool(false)),
        Value::Int(1) => Some(Value::Bool(true)),
        Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_date(value: &Value) -> Option<Value> {
    let text = match value {
        Value::Str(s) => s.trim().to_string(),
        Value::Int(i) => i.to_string(),
        _ => return None,
    };

    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(&text, COMPACT_DATE_FORMAT))
        .ok()
        .map(|d| Value::Str(d.format(DATE_FORMAT).to_string()))
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error parsing a type name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown type `{0}` (expected one of: int, float, str, bool, date)")]
pub struct ValueTypeParseError(String);

impl FromStr for ValueType {
    type Err = ValueTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" | "integer" => Ok(ValueType::Int),
            "float" => Ok(ValueType::Float),
            "str" | "string" => Ok(ValueType::Str),
            "bool" | "boolean" => Ok(ValueType::Bool),
            "date" => Ok(ValueType::Date),
            _ => Err(ValueTypeParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_coercion() {
        assert_eq!(ValueType::Int.coerce(&Value::from("500")), Some(Value::Int(500)));
        assert_eq!(ValueType::Int.coerce(&Value::from(" 24 ")), Some(Value::Int(24)));
        assert_eq!(ValueType::Int.coerce(&Value::from(850.0)), Some(Value::Int(850)));
        assert_eq!(ValueType::Int.coerce(&Value::from(850.5)), None);
        assert_eq!(ValueType::Int.coerce(&Value::from("Z")), None);
        assert_eq!(ValueType::Int.coerce(&Value::from(true)), None);
    }

    #[test]
    fn test_int_coercion_rejects_out_of_range_floats() {
        assert_eq!(ValueType::Int.coerce(&Value::from(9_223_372_036_854_775_808.0)), None);
        assert_eq!(ValueType::Int.coerce(&Value::from(1e300)), None);
        assert_eq!(ValueType::Int.coerce(&Value::from(f64::NAN)), None);
        assert_eq!(
            ValueType::Int.coerce(&Value::from(-9_223_372_036_854_775_808.0)),
            Some(Value::Int(i64::MIN))
        );
    }

    #[test]
    fn test_str_coercion() {
        assert_eq!(ValueType::Str.coerce(&Value::from(500)), Some(Value::from("500")));
        assert_eq!(ValueType::Str.coerce(&Value::Null), None);
    }

    #[test]
    fn test_bool_coercion() {
        assert_eq!(ValueType::Bool.coerce(&Value::from("Yes")), Some(Value::Bool(true)));
        assert_eq!(ValueType::Bool.coerce(&Value::from(0)), Some(Value::Bool(false)));
        assert_eq!(ValueType::Bool.coerce(&Value::from(2)), None);
    }

    #[test]
    fn test_date_coercion() {
        let expected = Some(Value::from("2020-01-09"));
        assert_eq!(ValueType::Date.coerce(&Value::from("2020-01-09")), expected);
        assert_eq!(ValueType::Date.coerce(&Value::from("20200109")), expected);
        assert_eq!(ValueType::Date.coerce(&Value::from(20200109)), expected);
        assert_eq!(ValueType::Date.coerce(&Value::from("2020-02-30")), None);
    }

    #[test]
    fn test_parse_type_name() {
        assert_eq!("integer".parse::<ValueType>(), Ok(ValueType::Int));
        assert_eq!("date".parse::<ValueType>(), Ok(ValueType::Date));
        assert!("decimal".parse::<ValueType>().is_err());
    }
}
