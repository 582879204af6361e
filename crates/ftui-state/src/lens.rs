#![forbid(unsafe_code)]

//! Named property accessors.
//!
//! A [`Lens`] identifies one property of a record: a string `key` (used to
//! group child bindings), a projection `get`, and a `patch` builder that
//! produces the partial value writing that property back. A lens may also
//! report whether the property is present at all, so that an absent key and
//! a key holding the projected fallback are told apart.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::record::Record;

/// Accessor for one property of a [`Record`].
pub struct Lens<T: Record, C> {
    key: Rc<str>,
    get: Rc<dyn Fn(&T) -> C>,
    patch: Rc<dyn Fn(C) -> T::Patch>,
    present: Rc<dyn Fn(&T) -> bool>,
}

impl<T: Record, C> Clone for Lens<T, C> {
    fn clone(&self) -> Self {
        Self {
            key: Rc::clone(&self.key),
            get: Rc::clone(&self.get),
            patch: Rc::clone(&self.patch),
            present: Rc::clone(&self.present),
        }
    }
}

impl<T: Record, C> fmt::Debug for Lens<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lens").field("key", &self.key).finish()
    }
}

impl<T: Record, C: 'static> Lens<T, C> {
    /// Build a lens from a key, a projection and a patch builder.
    ///
    /// `patch(get(r))` merged into `r` must leave `r` unchanged. The
    /// property is treated as always present.
    pub fn new(
        key: impl Into<Rc<str>>,
        get: impl Fn(&T) -> C + 'static,
        patch: impl Fn(C) -> T::Patch + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            get: Rc::new(get),
            patch: Rc::new(patch),
            present: Rc::new(|_: &T| true),
        }
    }

    /// Replace the presence test. A record for which `present` returns
    /// `false` never compares equal to a projected value.
    #[must_use]
    pub fn with_presence(mut self, present: impl Fn(&T) -> bool + 'static) -> Self {
        self.present = Rc::new(present);
        self
    }

    /// Property name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn key_rc(&self) -> Rc<str> {
        Rc::clone(&self.key)
    }

    /// Project the property out of `record`.
    pub fn get(&self, record: &T) -> C {
        (self.get)(record)
    }

    /// Whether `record` holds the property.
    pub fn is_present(&self, record: &T) -> bool {
        (self.present)(record)
    }

    /// Partial value that sets the property to `value`.
    pub fn patch(&self, value: C) -> T::Patch {
        (self.patch)(value)
    }

    pub(crate) fn getter(&self) -> Rc<dyn Fn(&T) -> C> {
        Rc::clone(&self.get)
    }

    pub(crate) fn presence(&self) -> Rc<dyn Fn(&T) -> bool> {
        Rc::clone(&self.present)
    }
}

impl Lens<Value, Value> {
    /// Lens onto `key` of a JSON object. A missing key (or a non-object
    /// record) projects to `null` but is reported absent, so it differs
    /// from a key explicitly set to `null`.
    #[must_use]
    pub fn json(key: &str) -> Self {
        let read_key = key.to_string();
        let write_key = key.to_string();
        let has_key = key.to_string();
        Self::new(
            key,
            move |record: &Value| record.get(&read_key).cloned().unwrap_or(Value::Null),
            move |value: Value| {
                let mut patch = Map::new();
                patch.insert(write_key.clone(), value);
                Value::Object(patch)
            },
        )
        .with_presence(move |record: &Value| record.get(&has_key).is_some())
    }
}

impl<V: Clone + Default + 'static> Lens<BTreeMap<String, V>, V> {
    /// Lens onto one entry of a string-keyed map. A missing entry projects
    /// to `V::default()` and counts as present.
    #[must_use]
    pub fn entry(key: &str) -> Self {
        let read_key = key.to_string();
        let write_key = key.to_string();
        Self::new(
            key,
            move |record: &BTreeMap<String, V>| record.get(&read_key).cloned().unwrap_or_default(),
            move |value: V| BTreeMap::from([(write_key.clone(), value)]),
        )
    }
}
