//! Property-based invariants for observables, tracking and the weak table.
//!
//! **Observable:**
//! 1. Subscribers run once per write that changes the value, never otherwise.
//! 2. The version counts exactly the changing writes.
//! 3. Dropping a subscription stops its notifications.
//!
//! **Tracking:**
//! 4. Dependencies are deduplicated: repeated reads of one observable count once.
//! 5. `peek` and `untracked` reads are never recorded.
//!
//! **WeakKeyTable:**
//! 6. Live length equals the number of keys still held.
//! 7. After `prune`, length equals live length.
//!
//! **Value:**
//! 8. `resolve` leaves no observable anywhere in the result.

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;
use webcomp_runtime::reactive::{track, untracked};
use webcomp_runtime::{Observable, Value, WeakKeyTable};

// ── Strategies ────────────────────────────────────────────────────────────

fn writes_strategy() -> impl Strategy<Value = Vec<i32>> {
    proptest::collection::vec(-3i32..=3, 0..40)
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Undefined),
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i32..1000).prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            proptest::collection::vec(("[a-z]{1,3}", inner.clone()), 0..4)
                .prop_map(|entries| Value::object(entries)),
            inner.prop_map(Value::observable),
        ]
    })
}

fn contains_observable(value: &Value) -> bool {
    match value {
        Value::Observable(_) => true,
        Value::Array(items) => items.iter().any(contains_observable),
        Value::Object(map) => map.values().any(contains_observable),
        _ => false,
    }
}

// ── Observable ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn notifications_match_changing_writes(writes in writes_strategy()) {
        let obs = Observable::new(0i32);
        let calls = Rc::new(Cell::new(0u64));
        let counter = Rc::clone(&calls);
        let _sub = obs.subscribe(move |_| counter.set(counter.get() + 1));

        let mut current = 0;
        let mut changes = 0u64;
        for w in writes {
            if w != current {
                changes += 1;
                current = w;
            }
            obs.set(w);
        }
        prop_assert_eq!(calls.get(), changes);
        prop_assert_eq!(obs.version(), changes);
        prop_assert_eq!(obs.peek(), current);
    }

    #[test]
    fn dropped_subscription_is_silent(writes in writes_strategy(), cut in 0usize..40) {
        let obs = Observable::new(0i32);
        let calls = Rc::new(Cell::new(0u64));
        let counter = Rc::clone(&calls);
        let sub = obs.subscribe(move |_| counter.set(counter.get() + 1));
        let cut = cut.min(writes.len());

        for w in &writes[..cut] {
            obs.set(*w);
        }
        let before = calls.get();
        drop(sub);
        for w in &writes[cut..] {
            obs.set(*w);
        }
        prop_assert_eq!(calls.get(), before);
        prop_assert_eq!(obs.subscriber_count(), 0);
    }
}

// ── Tracking ──────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn dependencies_are_deduplicated(reads in proptest::collection::vec(0usize..5, 0..30)) {
        let pool: Vec<Observable<i32>> = (0..5).map(Observable::new).collect();
        let ((), deps) = track(|| {
            for &i in &reads {
                let _ = pool[i].get();
                let _ = pool[i].peek();
            }
        });
        let mut distinct = reads.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(deps.len(), distinct.len());
    }

    #[test]
    fn untracked_reads_are_not_recorded(reads in proptest::collection::vec(0usize..5, 0..30)) {
        let pool: Vec<Observable<i32>> = (0..5).map(Observable::new).collect();
        let ((), deps) = track(|| {
            untracked(|| {
                for &i in &reads {
                    let _ = pool[i].get();
                }
            });
        });
        prop_assert!(deps.is_empty());
    }
}

// ── WeakKeyTable ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn live_length_tracks_held_keys(keep in proptest::collection::vec(any::<bool>(), 0..24)) {
        let mut table: WeakKeyTable<u32, usize> = WeakKeyTable::new();
        let keys: Vec<Rc<u32>> = (0..keep.len() as u32).map(Rc::new).collect();
        for (i, key) in keys.iter().enumerate() {
            table.insert(key, i);
        }
        let held: Vec<Rc<u32>> = keys
            .into_iter()
            .zip(&keep)
            .filter_map(|(key, &k)| k.then_some(key))
            .collect();

        prop_assert_eq!(table.live_len(), held.len());
        for key in &held {
            prop_assert!(table.contains(key));
        }
        table.prune();
        prop_assert_eq!(table.len(), held.len());
    }
}

// ── Value ─────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn resolve_removes_every_observable(value in value_strategy()) {
        let resolved = value.resolve();
        prop_assert!(!contains_observable(&resolved));
        prop_assert_eq!(resolved.resolve(), resolved.clone());
    }
}
