//! Availability tables.
//!
//! An [`Availability`] is built once from a collection of combination
//! records and answers whether a (partial) set of arguments is jointly
//! attainable. Records are folded into a tree whose depth order is the key
//! order of the table, so membership and partial-match queries only walk
//! the branches the supplied values select.

mod load;
mod tree;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use anyhow::Result;

use crate::core::args::Kwargs;
use crate::core::record::Record;
use crate::core::value::Value;
use crate::errors::ArgError;

use tree::Node;

/// Parameter name used in configuration errors about a table as a whole.
const TABLE: &str = "availability";

/// A combination rejected by an availability table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoMatch {
    /// The offending combination, in table key order.
    pub combination: Vec<(String, Value)>,
    /// Per key, the values that would have been accepted with every other
    /// supplied key held fixed. Keys with no such value are omitted.
    pub candidates: BTreeMap<String, BTreeSet<Value>>,
}

impl NoMatch {
    pub fn candidates_for(&self, key: &str) -> Option<&BTreeSet<Value>> {
        self.candidates.get(key)
    }
}

impl fmt::Display for NoMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .combination
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "invalid combination ({})", pairs.join(", "))
    }
}

impl std::error::Error for NoMatch {}

/// A compressed table of legal parameter combinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    keys: Vec<String>,
    root: Node,
    len: usize,
}

impl Availability {
    /// Build a table whose key order is taken from the first record.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Result<Self, ArgError> {
        let mut records = records.into_iter().peekable();
        let keys: Vec<String> = match records.peek() {
            Some(first) => first.keys().map(str::to_string).collect(),
            None => {
                return Err(ArgError::configuration(
                    TABLE,
                    "an availability table needs at least one record",
                ))
            }
        };
        Availability::with_keys(keys, records)
    }

    /// Build a table with an explicit key order.
    pub fn with_keys(
        keys: Vec<String>,
        records: impl IntoIterator<Item = Record>,
    ) -> Result<Self, ArgError> {
        if keys.is_empty() {
            return Err(ArgError::configuration(
                TABLE,
                "an availability table needs at least one key",
            ));
        }

        let mut table = Availability {
            keys,
            root: Node::default(),
            len: 0,
        };

        for record in records {
            table.insert(&record)?;
        }

        if table.len == 0 {
            return Err(ArgError::configuration(
                TABLE,
                "an availability table needs at least one combination",
            ));
        }

        tracing::debug!(
            "built availability table over ({}) with {} combinations",
            table.keys.join(", "),
            table.len
        );

        Ok(table)
    }

    /// Load a table from a `.json` or `.toml` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        load::load(path.as_ref())
    }

    fn insert(&mut self, record: &Record) -> Result<(), ArgError> {
        for key in record.keys() {
            if !self.keys.iter().any(|k| k == key) {
                return Err(ArgError::configuration(
                    key,
                    format!(
                        "record ({}) has a key outside the table keys ({})",
                        record,
                        self.keys.join(", ")
                    ),
                ));
            }
        }

        if let Some(missing) = self.keys.iter().find(|k| record.get(k).is_none()) {
            return Err(ArgError::configuration(
                missing,
                format!("record ({}) has no value", record),
            ));
        }

        for flat in record.expand() {
            let mut path = Vec::with_capacity(self.keys.len());
            for key in &self.keys {
                let value = flat.get(key).unwrap_or(&Value::Null);
                if value.is_null() || value.is_list() {
                    return Err(ArgError::configuration(
                        key,
                        format!("record ({}) holds `{}`, expected a scalar", record, value),
                    ));
                }
                path.push(value.clone());
            }
            if self.root.insert(&path) {
                self.len += 1;
            }
        }

        Ok(())
    }

    /// Key order of the table; the first key is the root branching.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Number of distinct combinations.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Every value observed for `key`.
    pub fn values_of(&self, key: &str) -> Option<BTreeSet<Value>> {
        let depth = self.keys.iter().position(|k| k == key)?;
        let mut out = BTreeSet::new();
        self.root.values_at(depth, &mut out);
        Some(out)
    }

    /// Every value observed per key.
    pub fn unique_values(&self) -> BTreeMap<String, BTreeSet<Value>> {
        self.keys
            .iter()
            .enumerate()
            .map(|(depth, key)| {
                let mut out = BTreeSet::new();
                self.root.values_at(depth, &mut out);
                (key.clone(), out)
            })
            .collect()
    }

    /// Every distinct combination as a flat record, in value order.
    pub fn combinations(&self) -> Vec<Record> {
        let mut paths = Vec::with_capacity(self.len);
        self.root.paths(&mut Vec::new(), &mut paths);
        paths
            .into_iter()
            .map(|path| self.keys.iter().cloned().zip(path).collect())
            .collect()
    }

    /// Check a partial combination.
    ///
    /// Keys outside the table are ignored and absent or null keys are
    /// wildcards. A list value requires every element to be available with
    /// the rest of the combination.
    pub fn check(&self, kwargs: &Kwargs) -> Result<(), NoMatch> {
        let choices: Vec<Option<&[Value]>> = self
            .keys
            .iter()
            .map(|key| match kwargs.get(key) {
                None | Some(Value::Null) => None,
                Some(value) => Some(value.items()),
            })
            .collect();

        let mut combos: Vec<Vec<Option<&Value>>> = vec![Vec::with_capacity(self.keys.len())];
        for choice in &choices {
            combos = match choice {
                None => combos
                    .into_iter()
                    .map(|mut combo| {
                        combo.push(None);
                        combo
                    })
                    .collect(),
                Some(items) => combos
                    .iter()
                    .flat_map(|combo| {
                        items.iter().map(move |item| {
                            let mut combo = combo.clone();
                            combo.push(Some(item));
                            combo
                        })
                    })
                    .collect(),
            };
        }

        match combos.iter().find(|combo| !self.root.matches(combo)) {
            Some(combo) => Err(self.no_match(combo)),
            None => Ok(()),
        }
    }

    fn no_match(&self, combo: &[Option<&Value>]) -> NoMatch {
        let combination = self
            .keys
            .iter()
            .zip(combo)
            .filter_map(|(key, value)| value.map(|v| (key.clone(), v.clone())))
            .collect();

        let mut candidates = BTreeMap::new();
        for (depth, constraint) in combo.iter().enumerate() {
            if constraint.is_none() {
                continue;
            }
            let mut relaxed = BTreeSet::new();
            self.root.relaxed(combo, depth, &mut relaxed);
            if !relaxed.is_empty() {
                candidates.insert(self.keys[depth].clone(), relaxed);
            }
        }

        NoMatch {
            combination,
            candidates,
        }
    }

    /// Rebuild the table with every value passed through `f`.
    ///
    /// `f` returns `Ok(None)` to drop the combination holding the value and
    /// an error to abort. Dropping every combination is a configuration
    /// error.
    pub fn normalized_with<F>(&self, mut f: F) -> Result<Availability, ArgError>
    where
        F: FnMut(&str, &Value) -> Result<Option<Value>, ArgError>,
    {
        let mut records = Vec::with_capacity(self.len);

        'combinations: for combination in self.combinations() {
            let mut record = Record::new();
            for (key, value) in combination.iter() {
                match f(key, value)? {
                    Some(normalized) => record.set(key, normalized),
                    None => {
                        tracing::debug!("dropping unreachable combination ({})", combination);
                        continue 'combinations;
                    }
                }
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(ArgError::configuration(
                TABLE,
                format!(
                    "no combination over ({}) survives the attached normalizers",
                    self.keys.join(", ")
                ),
            ));
        }

        Availability::with_keys(self.keys.clone(), records)
    }

    /// Render the tree, one `key=value` line per node.
    pub fn render_tree(&self, max_depth: Option<usize>) -> String {
        let mut out = String::new();
        self.root.render(
            &self.keys,
            0,
            max_depth.unwrap_or(usize::MAX),
            &mut out,
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures;

    fn kwargs(pairs: &[(&str, Value)]) -> Kwargs {
        pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    #[test]
    fn test_exact_membership() {
        let table = fixtures::forecast_table();
        assert!(table
            .check(&kwargs(&[
                ("level", Value::from(500)),
                ("param", Value::from("Z")),
                ("step", Value::from(24)),
            ]))
            .is_ok());
    }

    #[test]
    fn test_no_match_candidates() {
        let table = fixtures::forecast_table();
        let err = table
            .check(&kwargs(&[
                ("level", Value::from(1000)),
                ("param", Value::from("Z")),
                ("step", Value::from(36)),
            ]))
            .unwrap_err();

        assert_eq!(err.to_string(), "invalid combination (level=1000, param=Z, step=36)");
        assert_eq!(
            err.candidates_for("step"),
            Some(&[Value::from(24)].into_iter().collect())
        );
        assert_eq!(
            err.candidates_for("level"),
            Some(&[Value::from(500)].into_iter().collect())
        );
        assert_eq!(err.candidates_for("param"), None);
    }

    #[test]
    fn test_partial_check_and_foreign_keys() {
        let table = fixtures::forecast_table();
        assert!(table
            .check(&kwargs(&[("step", Value::from(36)), ("grid", Value::from("1/1"))]))
            .is_ok());
        assert!(table
            .check(&kwargs(&[("level", Value::from(1000)), ("step", Value::Null)]))
            .is_ok());
        assert!(table.check(&Kwargs::new()).is_ok());
    }

    #[test]
    fn test_list_values_must_all_match() {
        let table = fixtures::forecast_table();
        assert!(table
            .check(&kwargs(&[("level", Value::from(vec![500, 1000])), ("step", Value::from(24))]))
            .is_ok());

        let err = table
            .check(&kwargs(&[("level", Value::from(vec![500, 1000])), ("step", Value::from(36))]))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid combination (level=1000, step=36)");

        assert!(table
            .check(&kwargs(&[("level", Value::List(Vec::new()))]))
            .is_ok());
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut records = fixtures::forecast_records();
        let forward = Availability::from_records(records.clone()).unwrap();
        records.reverse();
        let backward =
            Availability::with_keys(forward.keys().to_vec(), records).unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward.combinations(), backward.combinations());
    }

    #[test]
    fn test_grouped_records_expand_to_flat_set() {
        let grouped = Availability::from_records([
            Record::from([
                ("level", Value::from(500)),
                ("param", Value::from("Z")),
                ("step", Value::from(vec![24, 36])),
            ]),
            Record::from([
                ("level", Value::from(1000)),
                ("param", Value::from("Z")),
                ("step", Value::from(24)),
            ]),
        ])
        .unwrap();

        assert_eq!(grouped, fixtures::forecast_table());
        assert_eq!(grouped.len(), 3);
    }

    #[test]
    fn test_duplicates_collapse() {
        let mut records = fixtures::forecast_records();
        records.extend(fixtures::forecast_records());
        let table = Availability::from_records(records).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_unique_values() {
        let values = fixtures::forecast_table().unique_values();
        assert_eq!(
            values["level"],
            [Value::from(500), Value::from(1000)].into_iter().collect()
        );
        assert_eq!(
            values["step"],
            [Value::from(24), Value::from(36)].into_iter().collect()
        );
    }

    #[test]
    fn test_inconsistent_keys_are_rejected() {
        let err = Availability::from_records([
            Record::new().with("a", 1).with("b", 2),
            Record::new().with("a", 1),
        ])
        .unwrap_err();
        assert_eq!(err.parameter(), Some("b"));

        let err = Availability::from_records([
            Record::new().with("a", 1),
            Record::new().with("a", 1).with("c", 3),
        ])
        .unwrap_err();
        assert_eq!(err.parameter(), Some("c"));

        assert!(Availability::from_records(Vec::new()).is_err());
    }

    #[test]
    fn test_table_without_combinations_is_rejected() {
        let err = Availability::from_records([Record::new().with("level", Value::List(vec![]))])
            .unwrap_err();
        assert!(matches!(err, ArgError::Configuration { parameter, .. } if parameter == TABLE));

        let err = Availability::from_records([
            Record::new()
                .with("level", Value::List(vec![]))
                .with("param", "Z"),
            Record::new()
                .with("level", Value::List(vec![]))
                .with("param", "T"),
        ])
        .unwrap_err();
        assert!(matches!(err, ArgError::Configuration { .. }));
    }

    #[test]
    fn test_normalized_with_drops_and_converts() {
        let table = Availability::from_records([
            Record::new().with("level", "500").with("param", "Z"),
            Record::new().with("level", "850").with("param", "T"),
        ])
        .unwrap();

        let normalized = table
            .normalized_with(|key, value| match (key, value.as_str()) {
                ("level", Some(s)) => Ok(s.parse::<i64>().ok().map(Value::from)),
                ("param", Some("T")) => Ok(None),
                _ => Ok(Some(value.clone())),
            })
            .unwrap();

        assert_eq!(normalized.len(), 1);
        assert_eq!(
            normalized.values_of("level"),
            Some([Value::from(500)].into_iter().collect())
        );

        let err = table.normalized_with(|_, _| Ok(None)).unwrap_err();
        assert!(matches!(err, ArgError::Configuration { .. }));
    }

    #[test]
    fn test_render_tree() {
        let rendered = fixtures::forecast_table().render_tree(None);
        let expected = "\
level=500
├── param=Z
│   ├── step=24
│   ├── step=36
level=1000
├── param=Z
│   ├── step=24
";
        assert_eq!(rendered, expected);

        let shallow = fixtures::forecast_table().render_tree(Some(1));
        assert_eq!(shallow, "level=500\nlevel=1000\n");
    }
}
