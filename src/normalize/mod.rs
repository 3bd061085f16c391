//! Per-parameter normalizers.
//!
//! A normalizer validates and coerces the value of one named parameter:
//!
//! - **Values mode** accepts members of an enumerated set, optionally after
//!   alias substitution. Matching is exact first, then case-insensitive for
//!   strings, then by textual form (`"500"` matches a legal `500`). The
//!   member of the legal set is returned, so the set decides the canonical
//!   spelling and type.
//! - **Type mode** coerces to a [`ValueType`].
//! - **Any mode** accepts everything and only applies multiplicity.
//!
//! Multiplicity decides the shape of the result: `Single` yields a scalar
//! (a one-element list degrades to its element), `Multiple` always yields a
//! list.

pub mod types;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::value::{join_values, Value};
use crate::errors::{ArgError, Expected};
use crate::util::data::read_data_file;

pub use types::{ValueType, ValueTypeParseError, DATE_FORMAT};

/// Shape of a normalized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    #[default]
    Single,
    Multiple,
}

/// An enumerated set of legal values with an optional alias table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSet {
    values: BTreeSet<Value>,
    alias: BTreeMap<Value, Value>,
}

impl ValueSet {
    pub fn new(values: impl IntoIterator<Item = Value>) -> Self {
        ValueSet {
            values: values.into_iter().collect(),
            alias: BTreeMap::new(),
        }
    }

    pub fn with_alias(mut self, alias: BTreeMap<Value, Value>) -> Self {
        self.alias = alias;
        self
    }

    pub fn values(&self) -> &BTreeSet<Value> {
        &self.values
    }

    pub fn alias(&self) -> &BTreeMap<Value, Value> {
        &self.alias
    }

    /// Map a raw value onto a member of the set.
    pub fn resolve(&self, raw: &Value) -> Option<Value> {
        let value = self.alias.get(raw).unwrap_or(raw);

        if self.values.contains(value) {
            return Some(value.clone());
        }

        if let Some(s) = value.as_str() {
            let folded = self.values.iter().find(|candidate| {
                candidate
                    .as_str()
                    .is_some_and(|c| c.eq_ignore_ascii_case(s))
            });
            if let Some(found) = folded {
                return Some(found.clone());
            }
        }

        let text = value.text()?;
        self.values
            .iter()
            .find(|candidate| candidate.text().as_deref() == Some(text.as_str()))
            .cloned()
    }
}

/// How a normalizer checks a scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Any,
    Values(ValueSet),
    Type(ValueType),
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Any => write!(f, "any value"),
            Mode::Values(set) => write!(f, "one of {}", join_values(set.values())),
            Mode::Type(ty) => write!(f, "type {}", ty),
        }
    }
}

/// A built, immutable normalizer for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalizer {
    name: String,
    mode: Mode,
    multiplicity: Multiplicity,
    implicit: bool,
}

impl Normalizer {
    /// A value-set normalizer derived from availability data rather than
    /// declared explicitly.
    pub(crate) fn implicit(name: &str, values: BTreeSet<Value>) -> Self {
        Normalizer {
            name: name.to_string(),
            mode: Mode::Values(ValueSet::new(values)),
            multiplicity: Multiplicity::Single,
            implicit: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    /// Whether this normalizer was added by an availability layer.
    pub fn is_implicit(&self) -> bool {
        self.implicit
    }

    /// Normalize one argument value, applying multiplicity.
    ///
    /// `Null` stands for "no value" and passes through untouched.
    pub fn apply(&self, raw: &Value) -> Result<Value, ArgError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }

        match self.multiplicity {
            Multiplicity::Multiple => raw
                .items()
                .iter()
                .map(|item| self.normalize_scalar(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Multiplicity::Single => match raw {
                Value::List(items) if items.len() == 1 => self.normalize_scalar(&items[0]),
                Value::List(_) => Err(ArgError::invalid(&self.name, raw, Expected::Single)),
                scalar => self.normalize_scalar(scalar),
            },
        }
    }

    /// Normalize a single scalar, ignoring multiplicity.
    pub fn normalize_scalar(&self, value: &Value) -> Result<Value, ArgError> {
        match &self.mode {
            Mode::Any => Ok(value.clone()),
            Mode::Values(set) => set.resolve(value).ok_or_else(|| {
                ArgError::invalid(&self.name, value, Expected::OneOf(set.values().clone()))
            }),
            Mode::Type(ty) => ty
                .coerce(value)
                .ok_or_else(|| ArgError::invalid(&self.name, value, Expected::Type(*ty))),
        }
    }

    /// Turn an any-mode normalizer into a value-set one, keeping its
    /// multiplicity. Other modes are left alone.
    pub(crate) fn refine(&mut self, values: &BTreeSet<Value>) -> bool {
        if self.mode != Mode::Any {
            return false;
        }
        self.mode = Mode::Values(ValueSet::new(values.iter().cloned()));
        true
    }

    /// Check that `next`, stacked after `self` on the same parameter, can
    /// accept at least some of what `self` produces.
    pub(crate) fn check_compatible(&self, next: &Normalizer) -> Result<(), ArgError> {
        let compatible = match (&self.mode, &next.mode) {
            (Mode::Any, _) | (_, Mode::Any) => true,
            (Mode::Values(a), Mode::Values(b)) => {
                a.values().iter().any(|v| b.resolve(v).is_some())
                    || b.values().iter().any(|v| a.resolve(v).is_some())
            }
            (Mode::Values(set), Mode::Type(ty)) | (Mode::Type(ty), Mode::Values(set)) => {
                set.values().iter().any(|v| ty.coerce(v).is_some())
            }
            (Mode::Type(a), Mode::Type(b)) => a == b,
        };

        if compatible {
            Ok(())
        } else {
            Err(ArgError::configuration(
                &self.name,
                format!(
                    "cannot stack a normalizer accepting {} on one accepting {}",
                    next.mode, self.mode
                ),
            ))
        }
    }
}

impl fmt::Display for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.mode)?;
        if self.multiplicity == Multiplicity::Multiple {
            write!(f, " (multiple)")?;
        }
        if self.implicit {
            write!(f, " [from availability]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Source {
    Any,
    Values(Vec<Value>),
    Type(ValueType),
}

/// Layout of a values file: a bare list, or a table with a `values` key.
#[derive(Deserialize)]
#[serde(untagged)]
enum ValuesFile {
    List(Vec<Value>),
    Table { values: Vec<Value> },
}

/// Declaration of a normalizer, built with [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizerSpec {
    name: String,
    source: Source,
    alias: BTreeMap<Value, Value>,
    multiplicity: Multiplicity,
}

/// Start declaring a normalizer for parameter `name`.
///
/// Without `values` or `of_type` the normalizer is in any mode.
pub fn normalize(name: impl Into<String>) -> NormalizerSpec {
    NormalizerSpec {
        name: name.into(),
        source: Source::Any,
        alias: BTreeMap::new(),
        multiplicity: Multiplicity::Single,
    }
}

impl NormalizerSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accept an enumerated set of values.
    pub fn values<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.source = Source::Values(values.into_iter().map(Into::into).collect());
        self
    }

    /// Accept the values listed in a `.json` or `.toml` file.
    pub fn values_from_path(self, path: impl AsRef<Path>) -> Result<Self> {
        let values = match read_data_file::<ValuesFile>(path.as_ref())? {
            ValuesFile::List(values) | ValuesFile::Table { values } => values,
        };
        Ok(self.values(values))
    }

    /// Coerce to a type.
    pub fn of_type(mut self, ty: ValueType) -> Self {
        self.source = Source::Type(ty);
        self
    }

    /// Map alternate spellings onto canonical values.
    pub fn alias<K: Into<Value>, V: Into<Value>>(
        mut self,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.alias
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiplicity = Multiplicity::Multiple;
        self
    }

    pub fn single(mut self) -> Self {
        self.multiplicity = Multiplicity::Single;
        self
    }

    pub fn multiplicity(mut self, multiplicity: Multiplicity) -> Self {
        self.multiplicity = multiplicity;
        self
    }

    /// Build the normalizer.
    ///
    /// Fails with a configuration error when an alias table is declared on
    /// a mode without alias support, or when an alias points outside the
    /// legal set.
    pub fn build(self) -> Result<Normalizer, ArgError> {
        let mode = match self.source {
            Source::Any => Mode::Any,
            Source::Values(values) => Mode::Values(ValueSet::new(values)),
            Source::Type(ty) => Mode::Type(ty),
        };

        let mode = match mode {
            mode if self.alias.is_empty() => mode,
            Mode::Values(set) => {
                let set = set.with_alias(self.alias);
                for (from, to) in set.alias() {
                    if set.resolve(to).is_none() {
                        return Err(ArgError::configuration(
                            &self.name,
                            format!(
                                "alias `{}` points to `{}`, which is not a legal value",
                                from, to
                            ),
                        ));
                    }
                }
                Mode::Values(set)
            }
            other => {
                return Err(ArgError::configuration(
                    &self.name,
                    format!("a normalizer accepting {} does not support aliases", other),
                ))
            }
        };

        Ok(Normalizer {
            name: self.name,
            mode,
            multiplicity: self.multiplicity,
            implicit: false,
        })
    }
}
