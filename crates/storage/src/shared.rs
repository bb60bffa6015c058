//! SharedStore: process-wide mutable state seen by every activation
//!
//! This module implements the shared state store using:
//! - `FxHashMap<String, VersionedValue>` for name lookup
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for a monotonically increasing write version
//!
//! # Design Notes
//!
//! - **Live reads**: nothing caches store values. Every `get` observes the
//!   latest completed write, which is what lets two resumes of one snapshot
//!   take different branches.
//! - **Last write wins**: no transactions or isolation between writers.
//! - **Version allocated under the write lock**: version order is the real
//!   write order, so `version()` can be used to assert sequencing in tests.
//! - **Atomic read-modify-write**: `update`, `fetch_add`, `fetch_add_if` and
//!   `compare_and_swap` hold the write lock across the read and the write.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use reprise_core::{RepriseError, RepriseResult, Value};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::image::StoreImage;

/// A stored value with the version of the write that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedValue {
    /// The stored value
    pub value: Value,
    /// Store version assigned by the write
    pub version: u64,
}

#[derive(Debug, Default)]
struct StoreInner {
    data: RwLock<FxHashMap<String, VersionedValue>>,
    version: AtomicU64,
}

/// Handle to the shared state store
///
/// Cloning the handle is O(1) and every clone refers to the same state.
/// The store is passed explicitly to each activation; there is no ambient
/// global instance.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<StoreInner>,
}

impl SharedStore {
    /// Create a new empty store at version 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Current store version (number of writes applied so far)
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    /// Allocate the next version
    ///
    /// Callers must hold the data write lock.
    fn next_version(&self) -> u64 {
        self.inner.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Read the live value of a name
    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner.data.read().get(name).map(|vv| vv.value.clone())
    }

    /// Read the live value of a name, or `default` if it is unset
    pub fn get_or(&self, name: &str, default: Value) -> Value {
        self.get(name).unwrap_or(default)
    }

    /// Read an integer
    ///
    /// Returns `Ok(None)` if the name is unset and `TypeMismatch` if it holds
    /// something other than an `Int`.
    pub fn get_int(&self, name: &str) -> RepriseResult<Option<i64>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Int(i)) => Ok(Some(i)),
            Some(other) => Err(RepriseError::type_mismatch(name, "Int", other.type_name())),
        }
    }

    /// Read a value together with the version that wrote it
    pub fn get_versioned(&self, name: &str) -> Option<VersionedValue> {
        self.inner.data.read().get(name).cloned()
    }

    /// Write a value, returning the version assigned to the write
    pub fn set(&self, name: impl Into<String>, value: Value) -> u64 {
        let name = name.into();
        let mut data = self.inner.data.write();
        let version = self.next_version();
        trace!(target: "reprise::store", name = %name, version, "set");
        data.insert(name, VersionedValue { value, version });
        version
    }

    /// Atomic read-modify-write
    ///
    /// `f` receives the current value (if any) and returns the value to
    /// store. The write lock is held for the whole call, so `f` must not
    /// touch the store.
    pub fn update<F>(&self, name: &str, f: F) -> u64
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        let mut data = self.inner.data.write();
        let next = f(data.get(name).map(|vv| &vv.value));
        let version = self.next_version();
        trace!(target: "reprise::store", name = %name, version, "update");
        data.insert(
            name.to_string(),
            VersionedValue {
                value: next,
                version,
            },
        );
        version
    }

    /// Atomically add `delta` to an integer, treating an unset name as 0
    ///
    /// Returns the new value. Fails with `TypeMismatch` (and writes nothing)
    /// if the name holds a non-integer.
    pub fn fetch_add(&self, name: &str, delta: i64) -> RepriseResult<i64> {
        let mut data = self.inner.data.write();
        let current = match data.get(name).map(|vv| &vv.value) {
            None => 0,
            Some(Value::Int(i)) => *i,
            Some(other) => {
                return Err(RepriseError::type_mismatch(name, "Int", other.type_name()))
            }
        };
        let next = current.wrapping_add(delta);
        let version = self.next_version();
        trace!(target: "reprise::store", name = %name, version, value = next, "fetch_add");
        data.insert(
            name.to_string(),
            VersionedValue {
                value: Value::Int(next),
                version,
            },
        );
        Ok(next)
    }

    /// Atomically replace a value only if it currently equals `expected`
    ///
    /// `expected == None` matches an unset name. Returns the version of the
    /// write on success, `None` (and writes nothing) on a mismatch.
    pub fn compare_and_swap(
        &self,
        name: &str,
        expected: Option<&Value>,
        new: Value,
    ) -> Option<u64> {
        let mut data = self.inner.data.write();
        if data.get(name).map(|vv| &vv.value) != expected {
            trace!(target: "reprise::store", name = %name, "compare_and_swap mismatch");
            return None;
        }
        let version = self.next_version();
        trace!(target: "reprise::store", name = %name, version, "compare_and_swap");
        data.insert(
            name.to_string(),
            VersionedValue {
                value: new,
                version,
            },
        );
        Some(version)
    }

    /// Atomically add `delta` to an integer only if it currently equals
    /// `expected`, treating an unset name as 0
    ///
    /// Returns `Ok(Some(new))` on success and `Ok(None)` on a mismatch.
    /// Fails with `TypeMismatch` (and writes nothing) if the name holds a
    /// non-integer.
    pub fn fetch_add_if(&self, name: &str, expected: i64, delta: i64) -> RepriseResult<Option<i64>> {
        let mut data = self.inner.data.write();
        let current = match data.get(name).map(|vv| &vv.value) {
            None => 0,
            Some(Value::Int(i)) => *i,
            Some(other) => {
                return Err(RepriseError::type_mismatch(name, "Int", other.type_name()))
            }
        };
        if current != expected {
            trace!(target: "reprise::store", name = %name, current, expected, "fetch_add_if mismatch");
            return Ok(None);
        }
        let next = current.wrapping_add(delta);
        let version = self.next_version();
        trace!(target: "reprise::store", name = %name, version, value = next, "fetch_add_if");
        data.insert(
            name.to_string(),
            VersionedValue {
                value: Value::Int(next),
                version,
            },
        );
        Ok(Some(next))
    }

    /// Remove a name, returning its last value
    pub fn remove(&self, name: &str) -> Option<Value> {
        let mut data = self.inner.data.write();
        let removed = data.remove(name)?;
        let version = self.next_version();
        trace!(target: "reprise::store", name = %name, version, "remove");
        Some(removed.value)
    }

    /// Check whether a name is set
    pub fn contains(&self, name: &str) -> bool {
        self.inner.data.read().contains_key(name)
    }

    /// Number of names set
    pub fn len(&self) -> usize {
        self.inner.data.read().len()
    }

    /// True if no names are set
    pub fn is_empty(&self) -> bool {
        self.inner.data.read().is_empty()
    }

    /// All names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.data.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Take a frozen copy of the current contents
    pub fn checkpoint(&self) -> StoreImage {
        // Read lock before version so the image and its version agree.
        let data = self.inner.data.read();
        let version = self.version();
        StoreImage::new(version, data.clone())
    }

    /// Replace the whole contents with an image
    ///
    /// The restore is a single write: every restored name is stamped with
    /// the one new version, which is returned.
    pub fn restore(&self, image: &StoreImage) -> u64 {
        let mut data = self.inner.data.write();
        let version = self.next_version();
        data.clear();
        for (name, vv) in image.entries() {
            data.insert(
                name.clone(),
                VersionedValue {
                    value: vv.value.clone(),
                    version,
                },
            );
        }
        trace!(target: "reprise::store", version, names = data.len(), "restore");
        version
    }

    /// True if both handles refer to the same store
    pub fn ptr_eq(&self, other: &SharedStore) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
