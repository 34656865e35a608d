//! Typed object registry.
//!
//! Objects are filed under a *type name* and an *instance name*:
//!
//! ```text
//! "agent"  → { "speaker": …, "listener": … }
//! "prior"  → { "uniform": … }
//! ```
//!
//! A type bucket exists only once something has been stored under it, and
//! entries are never removed. Lookups hand back the stored value itself, not
//! a copy; for shared handles such as [`Value`] objects every holder
//! observes later mutation.
//!
//! [`Registry`] is the typed store for Rust callers. [`LiveRegistry`] holds
//! host [`Value`]s and keeps each bucket as a host object, so the bucket
//! handed out by [`LiveRegistry::get_all`] is the registry's own storage.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::value::{Object, ObjectKind, ObjectRef, Value};

/// Errors returned by registry lookups.
///
/// The two messages are distinct so that callers matching on message text can
/// tell "nothing of this type was ever stored" from "this name is unknown".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No object of this type has ever been stored.
    #[error("no objects of type {0}")]
    TypeNotFound(String),

    /// The type bucket exists but holds no entry under this name.
    #[error("no object of name {name}")]
    NameNotFound { type_name: String, name: String },
}

/// All instances of one type, keyed by instance name.
pub type Bucket<T> = HashMap<String, T>;

/// A two-level mapping from (type name, instance name) to `T`.
///
/// `T` is opaque to the registry; no copies are made on lookup.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    buckets: HashMap<String, Bucket<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }
}

impl<T> Registry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `(type_name, name)`, creating the bucket if needed.
    ///
    /// An existing entry is replaced (last write wins) and returned.
    pub fn store(
        &mut self,
        type_name: impl Into<String>,
        name: impl Into<String>,
        value: T,
    ) -> Option<T> {
        let type_name = type_name.into();
        let name = name.into();
        let bucket = self.buckets.entry(type_name.clone()).or_default();
        let previous = bucket.insert(name.clone(), value);
        if previous.is_some() {
            tracing::debug!(%type_name, %name, "registry entry overwritten");
        } else {
            tracing::trace!(%type_name, %name, "registry entry stored");
        }
        previous
    }

    /// Retrieve the value stored under `(type_name, name)`.
    pub fn get(&self, type_name: &str, name: &str) -> Result<&T, RegistryError> {
        self.bucket(type_name)?
            .get(name)
            .ok_or_else(|| name_not_found(type_name, name))
    }

    /// Mutable access to the value stored under `(type_name, name)`.
    pub fn get_mut(&mut self, type_name: &str, name: &str) -> Result<&mut T, RegistryError> {
        self.buckets
            .get_mut(type_name)
            .ok_or_else(|| RegistryError::TypeNotFound(type_name.to_string()))?
            .get_mut(name)
            .ok_or_else(|| name_not_found(type_name, name))
    }

    /// The whole bucket for `type_name`.
    ///
    /// A type that was never stored is an error, not an empty bucket.
    pub fn get_all(&self, type_name: &str) -> Result<&Bucket<T>, RegistryError> {
        self.bucket(type_name)
    }

    /// `true` once at least one object of `type_name` has been stored.
    pub fn contains_type(&self, type_name: &str) -> bool {
        self.buckets.contains_key(type_name)
    }

    /// Iterate over the type names that have buckets, in unspecified order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Total number of stored objects across all types.
    pub fn len(&self) -> usize {
        self.buckets.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn bucket(&self, type_name: &str) -> Result<&Bucket<T>, RegistryError> {
        self.buckets
            .get(type_name)
            .ok_or_else(|| RegistryError::TypeNotFound(type_name.to_string()))
    }
}

// ── LiveRegistry ──────────────────────────────────────────────────────────────

/// A registry of host values whose buckets are plain host objects.
///
/// [`get_all`](Self::get_all) returns the bucket object itself: later
/// [`store`](Self::store) calls show up through it, and properties set on
/// it are found by [`get`](Self::get).
#[derive(Debug, Default)]
pub struct LiveRegistry {
    buckets: HashMap<String, ObjectRef>,
}

impl LiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `(type_name, name)`, creating the bucket object if
    /// needed. An existing entry is replaced and returned.
    pub fn store(
        &mut self,
        type_name: impl Into<String>,
        name: impl Into<String>,
        value: Value,
    ) -> Option<Value> {
        let type_name = type_name.into();
        let name = name.into();
        let bucket = self
            .buckets
            .entry(type_name.clone())
            .or_insert_with(|| Rc::new(RefCell::new(Object::new(ObjectKind::Plain))));
        let previous = bucket.borrow_mut().props.insert(name.clone(), value);
        if previous.is_some() {
            tracing::debug!(%type_name, %name, "registry entry overwritten");
        } else {
            tracing::trace!(%type_name, %name, "registry entry stored");
        }
        previous
    }

    /// The value stored under `(type_name, name)`. Objects come back as the
    /// same handle.
    pub fn get(&self, type_name: &str, name: &str) -> Result<Value, RegistryError> {
        self.bucket(type_name)?
            .borrow()
            .props
            .get(name)
            .cloned()
            .ok_or_else(|| name_not_found(type_name, name))
    }

    /// The live bucket object for `type_name`.
    pub fn get_all(&self, type_name: &str) -> Result<Value, RegistryError> {
        self.bucket(type_name)
            .map(|bucket| Value::Object(Rc::clone(bucket)))
    }

    pub fn contains_type(&self, type_name: &str) -> bool {
        self.buckets.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Total number of entries across all buckets, including any set
    /// directly on a bucket object.
    pub fn len(&self) -> usize {
        self.buckets.values().map(|b| b.borrow().props.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn bucket(&self, type_name: &str) -> Result<&ObjectRef, RegistryError> {
        self.buckets
            .get(type_name)
            .ok_or_else(|| RegistryError::TypeNotFound(type_name.to_string()))
    }
}

fn name_not_found(type_name: &str, name: &str) -> RegistryError {
    RegistryError::NameNotFound {
        type_name: type_name.to_string(),
        name: name.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
