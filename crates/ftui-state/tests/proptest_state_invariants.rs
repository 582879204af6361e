//! Property-based invariant tests for state containers.
//!
//! 1. Replay-latest: a new subscriber's first value is the current value.
//! 2. Update merge law: `update(p)` yields `r` with `p`'s keys overridden.
//! 3. Reset law: `reset()` restores the construction value after any sets.
//! 4. Derived-property dedup: a property stream emits exactly the
//!    consecutive-distinct projection of the published sequence.
//! 5. Convergence: after any interleaving of child sets and parent updates,
//!    the parent's property equals the child's value, and each originating
//!    call causes exactly two publishes.
//! 6. Unbinding: after `remove_child`, neither side affects the other.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use ftui_state::{Lens, StateContainer, StreamExt};
use proptest::prelude::*;

type Rec = BTreeMap<String, i64>;

// ── Strategies ────────────────────────────────────────────────────────────

fn key_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(str::to_string)
}

fn record_strategy() -> impl Strategy<Value = Rec> {
    proptest::collection::btree_map(key_strategy(), -5i64..=5, 0..=4)
}

#[derive(Debug, Clone)]
enum Op {
    ChildSet(i64),
    ParentUpdate(String, i64),
    ParentSet(Rec),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-3i64..=3).prop_map(Op::ChildSet),
        (key_strategy(), -3i64..=3).prop_map(|(k, v)| Op::ParentUpdate(k, v)),
        record_strategy().prop_map(Op::ParentSet),
    ]
}

fn dedup_consecutive(values: &[i64]) -> Vec<i64> {
    let mut out: Vec<i64> = Vec::new();
    for v in values {
        if out.last() != Some(v) {
            out.push(*v);
        }
    }
    out
}

proptest! {
    #[test]
    fn replay_latest(initial in record_strategy(), sets in proptest::collection::vec(record_strategy(), 0..6)) {
        let state = StateContainer::new(initial);
        for value in &sets {
            state.set(value.clone());
        }
        let first: Rc<RefCell<Option<Rec>>> = Rc::new(RefCell::new(None));
        let first_clone = Rc::clone(&first);
        let _sub = state.subscribe(move |v: &Rec| {
            first_clone.borrow_mut().get_or_insert_with(|| v.clone());
        });
        prop_assert_eq!(first.borrow().clone(), Some(state.value()));
    }

    #[test]
    fn update_merge_law(current in record_strategy(), patch in record_strategy()) {
        let state = StateContainer::new(current.clone());
        state.update(patch.clone()).unwrap();
        let next = state.value();
        for (k, v) in &current {
            if !patch.contains_key(k) {
                prop_assert_eq!(next.get(k), Some(v));
            }
        }
        for (k, v) in &patch {
            prop_assert_eq!(next.get(k), Some(v));
        }
        prop_assert_eq!(next.len(), current.keys().chain(patch.keys()).collect::<std::collections::BTreeSet<_>>().len());
    }

    #[test]
    fn reset_law(initial in record_strategy(), sets in proptest::collection::vec(record_strategy(), 0..8)) {
        let state = StateContainer::new(initial.clone());
        for value in sets {
            state.set(value);
        }
        state.set(initial.clone());
        state.reset();
        prop_assert_eq!(state.value(), initial);
    }

    #[test]
    fn property_dedup(initial in record_strategy(), sets in proptest::collection::vec(record_strategy(), 0..10)) {
        let lens: Lens<Rec, i64> = Lens::entry("a");
        let state = StateContainer::new(initial.clone());
        let emitted = Rc::new(RefCell::new(Vec::new()));
        let emitted_clone = Rc::clone(&emitted);
        let _sub = state
            .property(&lens)
            .subscribe(move |v: &i64| emitted_clone.borrow_mut().push(*v));

        let mut projected = vec![lens.get(&initial)];
        for value in sets {
            projected.push(lens.get(&value));
            state.set(value);
        }
        prop_assert_eq!(emitted.borrow().clone(), dedup_consecutive(&projected));
    }

    #[test]
    fn parent_child_convergence(initial in record_strategy(), ops in proptest::collection::vec(op_strategy(), 1..20)) {
        let lens: Lens<Rec, i64> = Lens::entry("a");
        let parent = StateContainer::new(initial);
        let child = parent.create_child(&lens);

        for op in ops {
            let before = parent.version() + child.version();
            let (expect_parent_change, expect_child_change) = match &op {
                Op::ChildSet(v) => (parent.with(|p| lens.get(p)) != *v, true),
                Op::ParentUpdate(k, v) => (true, k == "a" && child.value() != *v),
                Op::ParentSet(r) => (true, child.value() != lens.get(r)),
            };
            match op {
                Op::ChildSet(v) => child.set(v),
                Op::ParentUpdate(k, v) => parent.update(BTreeMap::from([(k, v)])).unwrap(),
                Op::ParentSet(r) => parent.set(r),
            }
            let expected = u64::from(expect_parent_change) + u64::from(expect_child_change);
            prop_assert_eq!(parent.version() + child.version() - before, expected);
            prop_assert_eq!(parent.with(|p| lens.get(p)), child.value());
        }
    }

    #[test]
    fn unbinding_isolates(initial in record_strategy(), child_value in -9i64..=9, parent_value in -9i64..=9) {
        let lens: Lens<Rec, i64> = Lens::entry("a");
        let parent = StateContainer::new(initial.clone());
        let child = parent.create_child(&lens);
        parent.remove_child("a");
        prop_assert_eq!(parent.binding_count(), 0);

        let parent_before = parent.value();
        child.set(child_value);
        prop_assert_eq!(parent.value(), parent_before);

        let child_before = child.value();
        parent.update(BTreeMap::from([("a".to_string(), parent_value)])).unwrap();
        prop_assert_eq!(child.value(), child_before);
    }
}
