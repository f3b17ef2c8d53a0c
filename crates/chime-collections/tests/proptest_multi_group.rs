//! Property-based invariant tests for `MultiGroupMap`.
//!
//! 1. Every present key maps to a non-empty group.
//! 2. Per-key groups keep insertion order.
//! 3. `total_len` equals the number of values added minus those removed.
//! 4. `get` fails exactly when `try_get` is `None`.

use std::collections::HashMap;

use chime_collections::MultiGroupMap;
use chime_core::Error;
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Add(u8, u16),
    AddAll(u8, Vec<u16>),
    Remove(u8),
    RemoveValue(u8, u16),
    Replace(u8, Vec<u16>),
}

fn arb_op() -> impl Strategy<Value = Op> {
    let key = 0u8..6;
    let value = 0u16..8;
    prop_oneof![
        5 => (key.clone(), value.clone()).prop_map(|(k, v)| Op::Add(k, v)),
        2 => (key.clone(), proptest::collection::vec(value.clone(), 0..4))
            .prop_map(|(k, vs)| Op::AddAll(k, vs)),
        1 => key.clone().prop_map(Op::Remove),
        2 => (key.clone(), value.clone()).prop_map(|(k, v)| Op::RemoveValue(k, v)),
        1 => (key, proptest::collection::vec(value, 0..4)).prop_map(|(k, vs)| Op::Replace(k, vs)),
    ]
}

fn apply_model(model: &mut HashMap<u8, Vec<u16>>, op: &Op) {
    match op {
        Op::Add(k, v) => model.entry(*k).or_default().push(*v),
        Op::AddAll(k, vs) => {
            if !vs.is_empty() {
                model.entry(*k).or_default().extend(vs.iter().copied());
            }
        }
        Op::Remove(k) => {
            model.remove(k);
        }
        Op::RemoveValue(k, v) => {
            if let Some(group) = model.get_mut(k) {
                if let Some(i) = group.iter().position(|x| x == v) {
                    group.remove(i);
                }
                if group.is_empty() {
                    model.remove(k);
                }
            }
        }
        Op::Replace(k, vs) => {
            if vs.is_empty() {
                model.remove(k);
            } else {
                model.insert(*k, vs.clone());
            }
        }
    }
}

fn apply_map(map: &mut MultiGroupMap<u8, u16>, op: &Op) {
    match op {
        Op::Add(k, v) => map.add(*k, *v),
        Op::AddAll(k, vs) => map.add_all(*k, vs.iter().copied()),
        Op::Remove(k) => {
            map.remove(k);
        }
        Op::RemoveValue(k, v) => {
            map.remove_value(k, v);
        }
        Op::Replace(k, vs) => {
            map.replace(*k, vs.clone());
        }
    }
}

// ── Properties ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn matches_model_and_never_holds_empty_groups(ops in proptest::collection::vec(arb_op(), 0..60)) {
        let mut map = MultiGroupMap::new();
        let mut model = HashMap::new();

        for op in &ops {
            apply_map(&mut map, op);
            apply_model(&mut model, op);

            prop_assert!(map.values().all(|group| !group.is_empty()));
            prop_assert_eq!(map.len(), model.len());
            prop_assert_eq!(map.total_len(), model.values().map(Vec::len).sum::<usize>());
        }

        for key in 0u8..6 {
            prop_assert_eq!(map.try_get(&key), model.get(&key).map(Vec::as_slice));
            match map.get(&key) {
                Ok(group) => prop_assert_eq!(Some(group), map.try_get(&key)),
                Err(err) => {
                    prop_assert_eq!(err, Error::KeyNotFound);
                    prop_assert!(map.try_get(&key).is_none());
                }
            }
        }
    }

    #[test]
    fn adds_keep_insertion_order(values in proptest::collection::vec(any::<u32>(), 1..32)) {
        let mut map = MultiGroupMap::new();
        for v in &values {
            map.add("k", *v);
        }
        prop_assert_eq!(map.get_or_empty("k"), values.as_slice());
    }
}
