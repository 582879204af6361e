#![forbid(unsafe_code)]

//! Replay-latest broadcast cell.
//!
//! # Design
//!
//! [`Subject<T>`] wraps a value of type `T` in shared, reference-counted
//! storage (`Rc<RefCell<..>>`). Every [`Subject::publish`] replaces the value
//! and notifies all live subscribers in registration order. Unlike a
//! change-tracking cell there is no equality check: publishing the same value
//! twice notifies twice. Duplicate suppression is a separate operator
//! ([`Distinct`](super::Distinct)).
//!
//! New subscribers immediately receive the current value.
//!
//! # Performance
//!
//! | Operation     | Complexity                 |
//! |---------------|----------------------------|
//! | `get()`       | O(1) + clone               |
//! | `publish()`   | O(S) where S = subscribers |
//! | `subscribe()` | O(1) amortized + replay    |
//!
//! # Failure Modes
//!
//! - **Re-entrant publish**: a subscriber may publish to the same subject
//!   from inside its callback. No borrow is held while callbacks run, so this
//!   does not panic. The nested round supersedes the outer one: subscribers
//!   later in the list receive only the newer value, never the stale one
//!   after it.
//! - **Subscriber leak**: if [`Subscription`] guards are stored indefinitely,
//!   callbacks accumulate. Dead weak references are pruned lazily during
//!   `publish()`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::stream::Stream;
use super::subscription::Subscription;

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

struct SubjectInner<T> {
    value: T,
    /// Number of publishes since construction.
    version: u64,
    /// Subscribers stored as weak references. Dead entries are pruned on publish.
    subscribers: Vec<CallbackWeak<T>>,
}

/// A shared broadcast cell that replays its latest value to new subscribers.
///
/// Cloning a `Subject` creates a new handle to the **same** inner state.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on every `publish`.
/// 2. Subscribers are notified in registration order.
/// 3. A subscriber's first delivery is the value current at subscribe time.
/// 4. A released subscriber is skipped even if released mid-delivery.
/// 5. Every subscriber observes values in publish order. A round interrupted
///    by a nested publish stops delivering.
pub struct Subject<T> {
    inner: Rc<RefCell<SubjectInner<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Subject")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + 'static> Subject<T> {
    /// Create a subject holding `value`, version 0, no subscribers.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SubjectInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if `f` publishes to this subject.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value and notify every live subscriber, unconditionally.
    pub fn publish(&self, value: T) {
        let (round, subscribers): (u64, Vec<CallbackWeak<T>>) = {
            let mut inner = self.inner.borrow_mut();
            inner.value = value.clone();
            inner.version += 1;
            inner.subscribers.retain(|w| w.strong_count() > 0);
            (inner.version, inner.subscribers.clone())
        };

        // Upgrade per call so a subscriber released by an earlier callback
        // in this same round is not invoked.
        for weak in &subscribers {
            if self.inner.borrow().version != round {
                // A nested publish already delivered a newer value.
                break;
            }
            if let Some(cb) = weak.upgrade() {
                cb(&value);
            }
        }
    }

    /// Number of publishes since construction.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of registered subscribers, including released ones not yet
    /// pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

impl<T: Clone + 'static> Stream for Subject<T> {
    type Item = T;

    fn subscribe_with(&self, observer: Rc<dyn Fn(&T)>) -> Subscription {
        let strong: CallbackRc<T> = observer;
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        let current = self.get();
        strong(&current);
        Subscription::new(Box::new(strong))
    }
}
