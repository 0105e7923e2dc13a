use proptest::prelude::*;
use rcu_idmap::{Key, RcuMap, Snapshot, LOAD_FACTOR};
use std::collections::HashMap;

// Model operations on RcuMap and assert loads match a HashMap; snapshots taken
// along the way must keep matching the model as it was when they were taken.
proptest! {
    #[test]
    fn prop_rcu_map_matches_model(
        keys in 1usize..=40,
        ops in proptest::collection::vec((0u8..=3u8, 0usize..1000usize, any::<i16>()), 1..150)
    ) {
        let m: RcuMap<i16> = RcuMap::with_capacity(2);
        let mut model: HashMap<usize, i16> = HashMap::new();
        let mut pinned: Vec<(Snapshot<i16>, HashMap<usize, i16>)> = Vec::new();

        for (op, raw_k, v) in ops {
            // Spread keys over a few probe clusters.
            let raw = (raw_k % keys) * 16 + 1;
            let key = Key::new(raw).unwrap();
            match op {
                0 => {
                    let prev = m.store(key, v);
                    prop_assert_eq!(prev, model.insert(raw, v));
                }
                1 => {
                    let (got, loaded) = m.load_or_store(key, v);
                    match model.get(&raw) {
                        Some(&existing) => {
                            prop_assert!(loaded);
                            prop_assert_eq!(got, existing);
                        }
                        None => {
                            prop_assert!(!loaded);
                            prop_assert_eq!(got, v);
                            model.insert(raw, v);
                        }
                    }
                }
                2 => {
                    prop_assert_eq!(m.load(key), model.get(&raw).copied());
                }
                3 => {
                    if pinned.len() < 8 {
                        pinned.push((m.snapshot(), model.clone()));
                    }
                }
                _ => unreachable!(),
            }

            prop_assert_eq!(m.len(), model.len());
            prop_assert!(m.capacity().is_power_of_two());
            prop_assert!(m.len() as f64 / m.capacity() as f64 <= LOAD_FACTOR);
        }

        for (snap, then) in &pinned {
            prop_assert_eq!(snap.len(), then.len());
            for (&raw, v) in then {
                prop_assert_eq!(snap.get(Key::new(raw).unwrap()), Some(v));
            }
        }
    }
}
