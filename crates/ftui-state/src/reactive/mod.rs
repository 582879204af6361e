#![forbid(unsafe_code)]

//! Publish/subscribe building blocks for state containers.
//!
//! - [`Subject`]: a shared broadcast cell that replays its latest value to
//!   new subscribers and republishes on every `publish`.
//! - [`Stream`] / [`StreamExt`]: lazy, restartable streams with [`Map`]
//!   (projection) and [`Distinct`] (consecutive duplicate suppression).
//! - [`Subscription`]: release-once handle; releasing twice is a no-op and
//!   dropping releases.
//!
//! # Architecture
//!
//! `Subject<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and cleaned up lazily
//! during publish. The strong side lives in the [`Subscription`].
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. A new subscriber's first value is the subject's current value.
//! 3. Delivery is synchronous: `publish` returns after every live subscriber
//!    (and everything they trigger) has run.
//! 4. A released [`Subscription`] never observes another value.

pub mod stream;
pub mod subject;
pub mod subscription;

pub use stream::{Distinct, Map, Stream, StreamExt};
pub use subject::Subject;
pub use subscription::Subscription;
