#![forbid(unsafe_code)]

//! Release-once subscription handle.
//!
//! A [`Subscription`] owns the only strong reference to an observer
//! callback. The stream it came from keeps a `Weak` to the same callback, so
//! releasing the handle (explicitly via [`Subscription::unsubscribe`] or
//! implicitly on drop) makes the callback unreachable before the next
//! delivery.

use std::any::Any;
use std::fmt;

/// RAII guard for an observer callback.
///
/// # Invariants
///
/// 1. After `unsubscribe()` returns, the callback is never invoked again.
/// 2. `unsubscribe()` may be called any number of times; only the first
///    call has an effect.
/// 3. Dropping an active subscription is equivalent to `unsubscribe()`.
pub struct Subscription {
    /// Type-erased strong reference keeping the callback `Rc` alive.
    /// `None` once released.
    guard: Option<Box<dyn Any>>,
}

impl Subscription {
    pub(crate) fn new(guard: Box<dyn Any>) -> Self {
        Self { guard: Some(guard) }
    }

    /// Stop delivery to this subscription's observer.
    ///
    /// Releasing an already released subscription is a no-op.
    pub fn unsubscribe(&mut self) {
        self.guard.take();
    }

    /// Whether the observer can still receive values.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.guard.is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
