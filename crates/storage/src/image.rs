//! Frozen copies of the shared store
//!
//! A `StoreImage` is a point-in-time clone of the store's contents. Resumes
//! never read from an image; images exist so a driver or test can reset the
//! live store to a known state between resumes.

use reprise_core::Value;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::shared::VersionedValue;

/// Clone-based, immutable copy of the shared store
///
/// # Example
///
/// ```
/// use reprise_storage::SharedStore;
/// use reprise_core::Value;
///
/// let store = SharedStore::new();
/// store.set("counter", Value::Int(1));
/// let image = store.checkpoint();
///
/// store.set("counter", Value::Int(2));
/// assert_eq!(image.get("counter"), Some(&Value::Int(1)));
///
/// store.restore(&image);
/// assert_eq!(store.get("counter"), Some(Value::Int(1)));
/// ```
#[derive(Debug, Clone)]
pub struct StoreImage {
    /// Store version when the image was taken
    version: u64,
    /// Immutable clone of the store data
    data: Arc<FxHashMap<String, VersionedValue>>,
}

impl StoreImage {
    pub(crate) fn new(version: u64, data: FxHashMap<String, VersionedValue>) -> Self {
        StoreImage {
            version,
            data: Arc::new(data),
        }
    }

    /// Store version at the time the image was taken
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Value of a name as of the image
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name).map(|vv| &vv.value)
    }

    /// Number of names in the image
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the image holds no names
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&String, &VersionedValue)> {
        self.data.iter()
    }
}
