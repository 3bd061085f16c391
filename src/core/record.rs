//! Combination records: one row of availability data.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::value::Value;

/// An ordered mapping from parameter name to value.
///
/// Key order is significant: the first record of an availability table
/// fixes the depth order of its tree. A record whose values are lists is a
/// grouped record and stands for the cartesian product of those lists
/// (see [`Record::expand`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    /// Set a field, keeping its original position if it already exists.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether any value is a list.
    pub fn is_grouped(&self) -> bool {
        self.fields.iter().any(|(_, v)| v.is_list())
    }

    /// Expand a grouped record into flat records.
    ///
    /// List values are multiplied out in key order; scalar values are
    /// repeated. A record with an empty list expands to nothing.
    pub fn expand(&self) -> Vec<Record> {
        let mut out = vec![Record::new()];
        for (key, value) in &self.fields {
            let items = value.items();
            let mut next = Vec::with_capacity(out.len() * items.len());
            for partial in &out {
                for item in items {
                    let mut record = partial.clone();
                    record.fields.push((key.clone(), item.clone()));
                    next.push(record);
                }
            }
            out = next;
        }
        out
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Record {
    fn from(fields: [(K, V); N]) -> Self {
        fields.into_iter().collect()
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.fields.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a map of parameter names to values")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Record, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut record = Record::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    record.set(key, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}
