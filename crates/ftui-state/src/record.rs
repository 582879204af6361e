#![forbid(unsafe_code)]

//! Keyed record values and shallow merge.
//!
//! `update` on a container needs to merge a partial value into the current
//! one. [`Record`] captures that capability. Types that are not records
//! simply do not implement it, so `update` on them does not compile. The
//! dynamic `serde_json::Value` implementation checks at runtime instead.
//!
//! # Invariants
//!
//! 1. `merge` never mutates `self`; it returns a new value.
//! 2. Keys present in the patch override; every other key of `self` is
//!    retained unchanged.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use serde_json::{Map, Value};

use crate::error::{StateError, StateResult};

/// A value made of named fields that supports shallow merge.
pub trait Record: Clone + 'static {
    /// Partial value accepted by [`Record::merge`].
    type Patch: 'static;

    /// Return `self` with every field in `patch` overwritten.
    ///
    /// # Errors
    ///
    /// Implementations with runtime-checked shape return
    /// [`StateError::NotARecord`] or [`StateError::InvalidPatch`].
    fn merge(&self, patch: Self::Patch) -> StateResult<Self>;
}

/// Short name of a JSON value's kind, for error messages.
#[must_use]
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Record for Value {
    type Patch = Value;

    fn merge(&self, patch: Value) -> StateResult<Self> {
        let Value::Object(current) = self else {
            return Err(StateError::NotARecord {
                found: json_kind(self),
            });
        };
        let patch = match patch {
            Value::Object(patch) => patch,
            other => {
                return Err(StateError::InvalidPatch {
                    found: json_kind(&other),
                });
            }
        };
        let mut next: Map<String, Value> = current.clone();
        next.extend(patch);
        Ok(Value::Object(next))
    }
}

impl<K, V> Record for BTreeMap<K, V>
where
    K: Ord + Clone + 'static,
    V: Clone + 'static,
{
    type Patch = BTreeMap<K, V>;

    fn merge(&self, patch: Self::Patch) -> StateResult<Self> {
        let mut next = self.clone();
        next.extend(patch);
        Ok(next)
    }
}

impl<K, V> Record for HashMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    type Patch = HashMap<K, V>;

    fn merge(&self, patch: Self::Patch) -> StateResult<Self> {
        let mut next = self.clone();
        next.extend(patch);
        Ok(next)
    }
}
