//! Call arguments before and after binding.

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::core::value::Value;

/// Raw arguments of one call: positional values followed by keywords.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    pub(crate) positional: Vec<Value>,
    pub(crate) keywords: BTreeMap<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Args::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument. A repeated keyword replaces the earlier value.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keywords(&self) -> &BTreeMap<String, Value> {
        &self.keywords
    }
}

/// The canonical keyword-only argument mapping produced by binding.
///
/// Keys are ordered by name so iteration (and therefore error ordering)
/// is stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kwargs {
    values: BTreeMap<String, Value>,
}

impl Kwargs {
    pub fn new() -> Self {
        Kwargs::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Get a string argument.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Get an integer argument.
    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    /// Get a list argument.
    pub fn list(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_list)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.values.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.values
    }
}

impl From<BTreeMap<String, Value>> for Kwargs {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Kwargs { values }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Kwargs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Kwargs {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Kwargs {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
