#![forbid(unsafe_code)]

//! State container with named actions and bound child containers.
//!
//! # Design
//!
//! [`StateContainer<T>`] owns a replay-latest [`Subject<T>`] holding the
//! current value, an ordered action table and an ordered list of child
//! bindings. Handles are cheap to clone and share the same container.
//!
//! A child created with [`StateContainer::create_child`] is an independent
//! container linked to one property of the parent by two one-directional
//! subscriptions:
//!
//! ```text
//!            update(lens.patch(v))           property(lens) -> set(v)
//!   child ─────────────────────────▶ parent ─────────────────────────▶ child
//!          skipped if parent already          skipped if child already
//!          holds v under the key              holds v (Bidirectional)
//! ```
//!
//! Both handles are recorded in the parent under the lens key, and are
//! released by [`StateContainer::remove_child`],
//! [`StateContainer::remove_all_children`], or when the parent is dropped.
//!
//! # Invariants
//!
//! 1. `value()` always equals the last value delivered to subscribers.
//! 2. `set` publishes unconditionally; only derived property streams
//!    deduplicate.
//! 3. Every `create_child` adds exactly two bindings under the lens key.
//! 4. With [`LoopGuard::Bidirectional`], one originating `set` on a bound
//!    container causes exactly one publish on each side of the binding.
//! 5. The parent→child binding holds the child strongly; the child→parent
//!    binding holds the parent weakly. No reference cycle is formed.
//!
//! # Failure Modes
//!
//! - **Rejected merge**: `update` returns the error and publishes nothing.
//!   A rejected merge during child→parent propagation is logged at `warn`.
//! - **Leaked binding**: a parent that is never unbound keeps forwarding
//!   into its children for as long as the parent lives.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::action::{self, Action, ActionArgs};
use crate::config::{LoopGuard, StateConfig};
use crate::error::{StateError, StateResult};
use crate::lens::Lens;
use crate::reactive::{Distinct, Map, Stream, StreamExt, Subject, Subscription};
use crate::record::Record;

/// Derived stream returned by [`StateContainer::property`].
///
/// Deduplication runs over `(present, value)`, so a property appearing with
/// the value it projected to while absent is still delivered.
pub type PropertyStream<T, C> = Map<Distinct<Map<Subject<T>, (bool, C)>>, C>;

/// Direction of one child binding subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Parent property changes flow into the child.
    ParentToChild,
    /// Child publishes flow into the parent property.
    ChildToParent,
}

struct Binding {
    property: Rc<str>,
    direction: Direction,
    handle: Subscription,
}

struct Shared<T> {
    subject: Subject<T>,
    initial: T,
    actions: RefCell<Vec<Action<T>>>,
    bindings: RefCell<Vec<Binding>>,
    config: StateConfig,
}

/// A reactive container for a single value.
///
/// Cloning produces another handle to the **same** container.
pub struct StateContainer<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for StateContainer<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for StateContainer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions: Vec<String> = self
            .shared
            .actions
            .borrow()
            .iter()
            .map(|a| a.name.clone())
            .collect();
        f.debug_struct("StateContainer")
            .field("label", &self.shared.config.label)
            .field("subject", &self.shared.subject)
            .field("actions", &actions)
            .field("bindings", &self.shared.bindings.borrow().len())
            .finish()
    }
}

impl<T: Clone + 'static> StateContainer<T> {
    /// Create a container holding `initial`, with default configuration.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self::with_config(initial, StateConfig::default())
    }

    /// Create a container holding `initial`.
    #[must_use]
    pub fn with_config(initial: T, config: StateConfig) -> Self {
        Self {
            shared: Rc::new(Shared {
                subject: Subject::new(initial.clone()),
                initial,
                actions: RefCell::new(Vec::new()),
                bindings: RefCell::new(Vec::new()),
                config,
            }),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn value(&self) -> T {
        self.shared.subject.get()
    }

    /// Borrow the current value.
    ///
    /// # Panics
    ///
    /// Panics if `f` publishes to this container.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.shared.subject.with(f)
    }

    /// The value this container was created with.
    #[must_use]
    pub fn initial(&self) -> &T {
        &self.shared.initial
    }

    /// Configuration this container was created with.
    #[must_use]
    pub fn config(&self) -> &StateConfig {
        &self.shared.config
    }

    /// Observe the value. `observer` receives the current value immediately,
    /// then every published value, until the returned handle is released.
    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) -> Subscription {
        self.shared.subject.subscribe_with(Rc::new(observer))
    }

    /// Replace the value and notify every subscriber, even if `value` equals
    /// the current one.
    pub fn set(&self, value: T) {
        trace!(
            label = self.shared.config.label_or_default(),
            version = self.shared.subject.version() + 1,
            "state published"
        );
        self.shared.subject.publish(value);
    }

    /// Restore the construction value.
    pub fn reset(&self) {
        self.set(self.shared.initial.clone());
    }

    /// Number of publishes since construction.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.shared.subject.version()
    }

    /// Invoke the first action registered under `name` with `args`.
    ///
    /// An unknown name is silently ignored.
    ///
    /// # Errors
    ///
    /// Propagates a rejected merge of the action's partial value.
    pub fn call(&self, name: &str, args: &[Value]) -> StateResult {
        match self.dispatch(name, args) {
            Some(result) => result,
            None => {
                debug!(
                    label = self.shared.config.label_or_default(),
                    action = name,
                    "unknown action ignored"
                );
                Ok(())
            }
        }
    }

    /// Like [`StateContainer::call`], but an unknown name is an error.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnknownAction`] if no action is registered under
    /// `name`, or propagates a rejected merge.
    pub fn try_call(&self, name: &str, args: &[Value]) -> StateResult {
        self.dispatch(name, args).unwrap_or_else(|| {
            Err(StateError::UnknownAction {
                name: name.to_string(),
            })
        })
    }

    fn dispatch(&self, name: &str, args: &[Value]) -> Option<StateResult> {
        // Release the table borrow before running user code.
        let reduce = action::find(&self.shared.actions.borrow(), name)
            .map(|action| Rc::clone(&action.reduce))?;
        let current = self.value();
        Some(reduce(&current, &ActionArgs::new(args)).map(|next| self.set(next)))
    }

    /// Remove every action registered under `name`.
    pub fn remove_action(&self, name: &str) {
        self.shared
            .actions
            .borrow_mut()
            .retain(|action| action.name != name);
    }

    /// Whether an action is registered under `name`.
    #[must_use]
    pub fn has_action(&self, name: &str) -> bool {
        action::find(&self.shared.actions.borrow(), name).is_some()
    }

    /// Registered action names in table order, duplicates included.
    #[must_use]
    pub fn action_names(&self) -> Vec<String> {
        self.shared
            .actions
            .borrow()
            .iter()
            .map(|action| action.name.clone())
            .collect()
    }

    /// Release both bindings of every child bound under `key`.
    ///
    /// The children keep working as standalone containers. Removing a key
    /// with no bindings is a no-op.
    pub fn remove_child(&self, key: &str) {
        let removed: Vec<Binding> = {
            let mut bindings = self.shared.bindings.borrow_mut();
            let (removed, kept): (Vec<Binding>, Vec<Binding>) = std::mem::take(&mut *bindings)
                .into_iter()
                .partition(|binding| &*binding.property == key);
            *bindings = kept;
            removed
        };
        debug!(
            label = self.shared.config.label_or_default(),
            key,
            released = removed.len(),
            "child unbound"
        );
        release(removed);
    }

    /// Release every child binding.
    pub fn remove_all_children(&self) {
        let removed = std::mem::take(&mut *self.shared.bindings.borrow_mut());
        debug!(
            label = self.shared.config.label_or_default(),
            released = removed.len(),
            "all children unbound"
        );
        release(removed);
    }

    /// Number of live binding subscriptions (two per bound child).
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.shared.bindings.borrow().len()
    }

    /// Keys with live bindings, in binding order, without duplicates.
    #[must_use]
    pub fn child_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for binding in self.shared.bindings.borrow().iter() {
            if !keys.iter().any(|k| **k == *binding.property) {
                keys.push(binding.property.to_string());
            }
        }
        keys
    }

    /// Binding directions recorded under `key`, in binding order.
    #[must_use]
    pub fn bindings_for(&self, key: &str) -> Vec<Direction> {
        self.shared
            .bindings
            .borrow()
            .iter()
            .filter(|binding| &*binding.property == key)
            .map(|binding| binding.direction)
            .collect()
    }
}

impl<T: Record> StateContainer<T> {
    /// Shallow-merge `patch` into the current value and publish the result.
    ///
    /// # Errors
    ///
    /// Returns the merge error if the value or patch is not a record. The
    /// current value is left untouched and nothing is published.
    pub fn update(&self, patch: T::Patch) -> StateResult {
        let next = self.with(|current| current.merge(patch))?;
        self.set(next);
        Ok(())
    }

    /// Derived stream of one property: every value projected through
    /// `lens`, with consecutive duplicates removed.
    ///
    /// The stream is lazy and can be subscribed any number of times; each
    /// subscription starts with the current projected value.
    pub fn property<C>(&self, lens: &Lens<T, C>) -> PropertyStream<T, C>
    where
        C: Clone + PartialEq + 'static,
    {
        let get = lens.getter();
        let present = lens.presence();
        Map::new(
            self.shared.subject.clone(),
            Rc::new(move |record: &T| (present(record), get(record))),
        )
        .distinct()
        .map(|(_, value): &(bool, C)| value.clone())
    }

    /// Append an action. `f` receives the current value and the call
    /// arguments and returns a partial value to merge.
    ///
    /// Registering never invokes `f`. If `name` is already registered, the
    /// earlier entry keeps winning until it is removed.
    pub fn create_action(
        &self,
        name: impl Into<String>,
        f: impl Fn(&T, &ActionArgs<'_>) -> T::Patch + 'static,
    ) {
        self.shared.actions.borrow_mut().push(Action::new(name, f));
    }

    /// Create a child container bound to the property named by `lens`.
    ///
    /// The child starts with the parent's current property value and
    /// inherits the parent's configuration. The caller owns the child; the
    /// parent owns only the two bindings, recorded under `lens.key()`.
    pub fn create_child<C>(&self, lens: &Lens<T, C>) -> StateContainer<C>
    where
        C: Clone + PartialEq + 'static,
    {
        let key = lens.key_rc();
        let config = &self.shared.config;
        let child = StateContainer::with_config(self.with(|v| lens.get(v)), config.for_child(&key));

        let parent: Weak<Shared<T>> = Rc::downgrade(&self.shared);
        let up_lens = lens.clone();
        let up = child.subscribe(move |value: &C| {
            let Some(shared) = parent.upgrade() else {
                return;
            };
            let parent = StateContainer { shared };
            if parent.with(|current| {
                up_lens.is_present(current) && up_lens.get(current) == *value
            }) {
                return;
            }
            if let Err(err) = parent.update(up_lens.patch(value.clone())) {
                warn!(
                    label = parent.shared.config.label_or_default(),
                    key = up_lens.key(),
                    error = %err,
                    "child value rejected by parent"
                );
            }
        });

        let guard = config.loop_guard;
        let down_child = child.clone();
        let down = self.property(lens).subscribe(move |value: &C| {
            if guard == LoopGuard::Bidirectional && down_child.with(|current| current == value) {
                return;
            }
            down_child.set(value.clone());
        });

        {
            let mut bindings = self.shared.bindings.borrow_mut();
            bindings.push(Binding {
                property: Rc::clone(&key),
                direction: Direction::ChildToParent,
                handle: up,
            });
            bindings.push(Binding {
                property: Rc::clone(&key),
                direction: Direction::ParentToChild,
                handle: down,
            });
        }
        debug!(
            label = config.label_or_default(),
            key = &*key,
            loop_guard = %guard,
            "child bound"
        );
        child
    }
}

impl StateContainer<Value> {
    /// [`StateContainer::property`] for a key of a JSON object.
    pub fn property_by_key(&self, key: &str) -> PropertyStream<Value, Value> {
        self.property(&Lens::json(key))
    }
}

impl<T: Clone + 'static> Stream for StateContainer<T> {
    type Item = T;

    fn subscribe_with(&self, observer: Rc<dyn Fn(&T)>) -> Subscription {
        self.shared.subject.subscribe_with(observer)
    }
}

fn release(bindings: Vec<Binding>) {
    for mut binding in bindings {
        binding.handle.unsubscribe();
    }
}
