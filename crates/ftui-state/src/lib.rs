#![forbid(unsafe_code)]

//! Reactive state containers for FrankenTUI.
//!
//! # Role in FrankenTUI
//! `ftui-state` holds application state outside the widget tree. A
//! [`StateContainer`] keeps one value, publishes every change to its
//! subscribers, dispatches named actions, and can be decomposed into child
//! containers that stay synchronized with one property of their parent.
//!
//! # Primary responsibilities
//! - **StateContainer**: get/set/update/reset, replay-latest subscription,
//!   derived property streams.
//! - **Actions**: an ordered name → reducer table with silent-miss dispatch
//!   (`call`) and a strict variant (`try_call`).
//! - **Child bindings**: two revocable one-directional subscriptions per
//!   child, guarded against feedback loops by structural equality.
//! - **reactive**: the replay-latest [`Subject`](reactive::Subject), stream
//!   operators and [`Subscription`] handles the rest of the crate builds on.
//!
//! # Example
//!
//! ```
//! use ftui_state::{ActionArgs, Lens, StateContainer};
//! use serde_json::{json, Value};
//!
//! let state = StateContainer::new(json!({"count": 0, "title": "clicks"}));
//! state.create_action("inc", |s: &Value, args: &ActionArgs<'_>| {
//!     let by = args.get::<i64>(0).unwrap_or(1);
//!     json!({"count": s["count"].as_i64().unwrap_or(0) + by})
//! });
//! state.call("inc", &[json!(2)]).unwrap();
//!
//! let count = state.create_child(&Lens::json("count"));
//! assert_eq!(count.value(), json!(2));
//!
//! count.set(json!(10));
//! assert_eq!(state.value(), json!({"count": 10, "title": "clicks"}));
//!
//! state.remove_child("count");
//! ```

pub mod action;
pub mod config;
pub mod container;
pub mod error;
pub mod lens;
pub mod reactive;
pub mod record;

pub use action::ActionArgs;
pub use config::{LOOP_GUARD_ENV, LoopGuard, StateConfig};
pub use container::{Direction, PropertyStream, StateContainer};
pub use error::{StateError, StateResult};
pub use lens::Lens;
pub use reactive::{Stream, StreamExt, Subscription};
pub use record::Record;
