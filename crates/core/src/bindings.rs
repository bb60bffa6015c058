//! Immutable local bindings
//!
//! `Bindings` is the frozen name → value map a snapshot carries. It is built
//! once at capture time and never mutated afterwards; resumes copy it into a
//! fresh working frame instead of writing through it.

use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Frozen copy of an activation's locals
///
/// Cloning is O(1): the map lives behind an `Arc` and is shared by every
/// clone. Equality is structural.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    entries: Arc<BTreeMap<String, Value>>,
}

impl Bindings {
    /// Freeze a map of locals
    pub fn new(entries: BTreeMap<String, Value>) -> Self {
        Bindings {
            entries: Arc::new(entries),
        }
    }

    /// Bindings with no locals
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a local
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Check whether a name is bound
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of bound locals
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no locals are bound
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate locals in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Bound names in order
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Owned copy of the locals, used to seed a new working frame
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        (*self.entries).clone()
    }
}

impl FromIterator<(String, Value)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Bindings::new(iter.into_iter().collect())
    }
}
