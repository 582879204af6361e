#![forbid(unsafe_code)]

//! Composable, lazy streams over a replay-latest source.
//!
//! A [`Stream`] does nothing until subscribed. Operators ([`Map`],
//! [`Distinct`]) wrap an upstream stream and install their logic per
//! subscription, so every subscriber gets fresh operator state: a stream
//! value can be subscribed many times ("restartable").

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::subscription::Subscription;

/// A source of values that can be observed.
pub trait Stream {
    /// Type of the delivered values.
    type Item: 'static;

    /// Register `observer`. Replay-latest sources deliver the current value
    /// before returning.
    fn subscribe_with(&self, observer: Rc<dyn Fn(&Self::Item)>) -> Subscription;
}

/// Combinators available on every [`Stream`].
pub trait StreamExt: Stream + Sized {
    /// Subscribe with a closure.
    fn subscribe(&self, observer: impl Fn(&Self::Item) + 'static) -> Subscription {
        self.subscribe_with(Rc::new(observer))
    }

    /// Project every value through `f`.
    fn map<U: 'static>(self, f: impl Fn(&Self::Item) -> U + 'static) -> Map<Self, U> {
        Map::new(self, Rc::new(f))
    }

    /// Suppress values equal to the immediately preceding delivered value.
    fn distinct(self) -> Distinct<Self>
    where
        Self::Item: Clone + PartialEq,
    {
        Distinct { source: self }
    }
}

impl<S: Stream> StreamExt for S {}

/// Projection operator. See [`StreamExt::map`].
pub struct Map<S: Stream, U> {
    source: S,
    f: Rc<dyn Fn(&S::Item) -> U>,
}

impl<S: Stream, U> Map<S, U> {
    pub(crate) fn new(source: S, f: Rc<dyn Fn(&S::Item) -> U>) -> Self {
        Self { source, f }
    }
}

impl<S: Stream + Clone, U> Clone for Map<S, U> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            f: Rc::clone(&self.f),
        }
    }
}

impl<S: Stream, U> fmt::Debug for Map<S, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map").finish_non_exhaustive()
    }
}

impl<S: Stream, U: 'static> Stream for Map<S, U> {
    type Item = U;

    fn subscribe_with(&self, observer: Rc<dyn Fn(&U)>) -> Subscription {
        let f = Rc::clone(&self.f);
        self.source
            .subscribe_with(Rc::new(move |value: &S::Item| observer(&f(value))))
    }
}

/// Consecutive-duplicate filter. See [`StreamExt::distinct`].
///
/// Equality is structural (`PartialEq`). The "last delivered" slot lives in
/// the subscription, not in the operator.
#[derive(Clone)]
pub struct Distinct<S> {
    source: S,
}

impl<S> fmt::Debug for Distinct<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Distinct").finish_non_exhaustive()
    }
}

impl<S> Stream for Distinct<S>
where
    S: Stream,
    S::Item: Clone + PartialEq,
{
    type Item = S::Item;

    fn subscribe_with(&self, observer: Rc<dyn Fn(&S::Item)>) -> Subscription {
        let last: RefCell<Option<S::Item>> = RefCell::new(None);
        self.source.subscribe_with(Rc::new(move |value: &S::Item| {
            {
                let mut last = last.borrow_mut();
                if last.as_ref() == Some(value) {
                    return;
                }
                *last = Some(value.clone());
            }
            observer(value);
        }))
    }
}
