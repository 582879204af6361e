#![forbid(unsafe_code)]

//! Named actions.
//!
//! An action is a pure function from the current value and caller-supplied
//! arguments to a partial value. The container keeps actions in an ordered
//! table; lookup returns the first entry with a matching name, so a later
//! registration under an existing name stays shadowed until the earlier one
//! is removed.

use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StateResult;
use crate::record::Record;

/// Arguments passed to an action by `call`.
#[derive(Debug, Clone, Copy)]
pub struct ActionArgs<'a> {
    values: &'a [Value],
}

impl<'a> ActionArgs<'a> {
    /// Wrap a slice of JSON arguments.
    #[must_use]
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no arguments were passed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw argument at `index`.
    #[must_use]
    pub fn raw(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    /// Argument at `index` decoded as `A`. `None` if absent or of the wrong
    /// shape.
    #[must_use]
    pub fn get<A: DeserializeOwned>(&self, index: usize) -> Option<A> {
        self.raw(index).and_then(|value| A::deserialize(value).ok())
    }

    /// All arguments.
    #[must_use]
    pub fn as_slice(&self) -> &'a [Value] {
        self.values
    }
}

/// Type-erased action: computes the merged next value.
pub(crate) type Reducer<T> = Rc<dyn Fn(&T, &ActionArgs<'_>) -> StateResult<T>>;

/// One entry of a container's action table.
pub(crate) struct Action<T> {
    pub(crate) name: String,
    pub(crate) reduce: Reducer<T>,
}

impl<T> fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("name", &self.name).finish()
    }
}

impl<T: Record> Action<T> {
    /// Wrap a user function returning a partial value into a reducer that
    /// performs the merge.
    pub(crate) fn new(
        name: impl Into<String>,
        f: impl Fn(&T, &ActionArgs<'_>) -> T::Patch + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            reduce: Rc::new(move |state: &T, args: &ActionArgs<'_>| state.merge(f(state, args))),
        }
    }
}

/// First action named `name`, if any.
pub(crate) fn find<'t, T>(table: &'t [Action<T>], name: &str) -> Option<&'t Action<T>> {
    table.iter().find(|action| action.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn args_typed_access() {
        let raw = [json!(3), json!("x"), json!({"k": true})];
        let args = ActionArgs::new(&raw);
        assert_eq!(args.len(), 3);
        assert_eq!(args.get::<i64>(0), Some(3));
        assert_eq!(args.get::<String>(1), Some("x".to_string()));
        assert_eq!(args.get::<i64>(1), None);
        assert_eq!(args.get::<i64>(9), None);
        assert_eq!(args.raw(2), Some(&json!({"k": true})));
    }

    #[test]
    fn empty_args() {
        let args = ActionArgs::new(&[]);
        assert!(args.is_empty());
        assert!(args.as_slice().is_empty());
    }

    #[test]
    fn reducer_merges_partial() {
        let action: Action<Value> = Action::new("inc", |state: &Value, args: &ActionArgs<'_>| {
            let by = args.get::<i64>(0).unwrap_or(1);
            json!({"count": state["count"].as_i64().unwrap_or(0) + by})
        });
        let raw = [json!(4)];
        let next = (action.reduce)(&json!({"count": 1, "other": "kept"}), &ActionArgs::new(&raw))
            .unwrap();
        assert_eq!(next, json!({"count": 5, "other": "kept"}));
    }

    #[test]
    fn find_returns_first_match() {
        let table: Vec<Action<Value>> = vec![
            Action::new("set", |_: &Value, _: &ActionArgs<'_>| json!({"v": 1})),
            Action::new("set", |_: &Value, _: &ActionArgs<'_>| json!({"v": 2})),
        ];
        let first = find(&table, "set").unwrap();
        let next = (first.reduce)(&json!({}), &ActionArgs::new(&[])).unwrap();
        assert_eq!(next, json!({"v": 1}));
        assert!(find(&table, "missing").is_none());
    }
}
