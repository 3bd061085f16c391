//! The compressed availability tree.
//!
//! Depth `d` branches on the value of key `d`. A path from the root to a
//! leaf is one attainable combination. Lookups take a constraint per depth,
//! where `None` is a wildcard.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use crate::core::value::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Node {
    children: BTreeMap<Value, Node>,
}

impl Node {
    /// Insert a full path. Returns `true` if the combination was new.
    pub(crate) fn insert(&mut self, path: &[Value]) -> bool {
        let Some((first, rest)) = path.split_first() else {
            return false;
        };

        match self.children.get_mut(first) {
            Some(child) => child.insert(rest),
            None => {
                let mut child = Node::default();
                child.insert(rest);
                self.children.insert(first.clone(), child);
                true
            }
        }
    }

    /// Whether some path below this node satisfies every constraint.
    pub(crate) fn matches(&self, constraints: &[Option<&Value>]) -> bool {
        let Some((first, rest)) = constraints.split_first() else {
            return true;
        };

        match first {
            Some(value) => self
                .children
                .get(*value)
                .is_some_and(|child| child.matches(rest)),
            None => self.children.values().any(|child| child.matches(rest)),
        }
    }

    /// Collect the values at depth `target` on paths that satisfy every
    /// constraint except the one at `target`.
    pub(crate) fn relaxed(
        &self,
        constraints: &[Option<&Value>],
        target: usize,
        out: &mut BTreeSet<Value>,
    ) {
        let Some((first, rest)) = constraints.split_first() else {
            return;
        };

        if target == 0 {
            for (value, child) in &self.children {
                if child.matches(rest) {
                    out.insert(value.clone());
                }
            }
            return;
        }

        match first {
            Some(value) => {
                if let Some(child) = self.children.get(*value) {
                    child.relaxed(rest, target - 1, out);
                }
            }
            None => {
                for child in self.children.values() {
                    child.relaxed(rest, target - 1, out);
                }
            }
        }
    }

    /// Every value observed at `depth`.
    pub(crate) fn values_at(&self, depth: usize, out: &mut BTreeSet<Value>) {
        if depth == 0 {
            out.extend(self.children.keys().cloned());
            return;
        }
        for child in self.children.values() {
            child.values_at(depth - 1, out);
        }
    }

    /// Every full path, in value order.
    pub(crate) fn paths(&self, prefix: &mut Vec<Value>, out: &mut Vec<Vec<Value>>) {
        if self.children.is_empty() {
            out.push(prefix.clone());
            return;
        }
        for (value, child) in &self.children {
            prefix.push(value.clone());
            child.paths(prefix, out);
            prefix.pop();
        }
    }

    pub(crate) fn render(
        &self,
        keys: &[String],
        depth: usize,
        max_depth: usize,
        out: &mut String,
    ) {
        if depth >= max_depth {
            return;
        }
        let Some(key) = keys.get(depth) else {
            return;
        };

        for (value, child) in &self.children {
            let prefix = if depth == 0 {
                String::new()
            } else {
                format!("{}├── ", "│   ".repeat(depth - 1))
            };
            let _ = writeln!(out, "{}{}={}", prefix, key, value);
            child.render(keys, depth + 1, max_depth, out);
        }
    }
}
