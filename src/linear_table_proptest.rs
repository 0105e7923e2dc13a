#![cfg(test)]

// Property tests for LinearTable kept inside the crate so they do not
// require feature gates to access the table layer.

use crate::key::Key;
use crate::linear_table::{LinearTable, LOAD_FACTOR};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Add(usize, i32),
    Get(usize),
    GetRaw(usize),
    Rehash,
}

const MAX_REHASH_CAPACITY: usize = 8192;

fn key(raw: usize) -> Key {
    Key::new(raw).expect("pool keys are non-zero")
}

fn arb_scenario(
    pool: impl Strategy<Value = Vec<usize>>,
) -> impl Strategy<Value = (Vec<usize>, Vec<OpI>)> {
    pool.prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Add(i, v)),
            2 => idx.clone().prop_map(OpI::Get),
            1 => (1usize..512).prop_map(OpI::GetRaw),
            1 => Just(OpI::Rehash),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_against_model(pool: &[usize], ops: Vec<OpI>) -> Result<(), TestCaseError> {
    let mut sut: LinearTable<i32> = LinearTable::with_capacity(2);
    let mut model: HashMap<usize, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Add(i, v) => {
                let raw = pool[i];
                let before_len = sut.len();
                let before_cap = sut.capacity();
                let (next, prev) = sut.add(key(raw), v);
                prop_assert_eq!(prev, model.insert(raw, v));
                // The source table is never modified by `add`.
                prop_assert_eq!(sut.len(), before_len);
                prop_assert_eq!(sut.capacity(), before_cap);
                prop_assert!(next.capacity() == before_cap || next.capacity() == before_cap * 2);
                sut = next;
            }
            OpI::Get(i) => {
                let raw = pool[i];
                prop_assert_eq!(sut.get(key(raw)), model.get(&raw));
                prop_assert_eq!(sut.contains_key(key(raw)), model.contains_key(&raw));
            }
            OpI::GetRaw(raw) => {
                prop_assert_eq!(sut.get(key(raw)), model.get(&raw));
            }
            // Bounded so repeated rehashes cannot blow up memory.
            OpI::Rehash if sut.capacity() < MAX_REHASH_CAPACITY => {
                let grown = sut.rehash();
                prop_assert_eq!(grown.capacity(), sut.capacity() * 2);
                prop_assert_eq!(grown.len(), sut.len());
                sut = grown;
            }
            OpI::Rehash => {}
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.capacity().is_power_of_two());
        prop_assert!(sut.load_factor() <= LOAD_FACTOR);
    }

    // Every model entry is reachable with its latest value.
    for (&raw, v) in &model {
        prop_assert_eq!(sut.get(key(raw)), Some(v));
    }
    let present: BTreeSet<usize> = pool
        .iter()
        .copied()
        .filter(|&raw| sut.contains_key(key(raw)))
        .collect();
    let expected: BTreeSet<usize> = model.keys().copied().collect();
    prop_assert_eq!(present, expected);
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `add` returns the replaced value exactly when the model had the key.
// - `add` leaves its source untouched and at most doubles capacity.
// - `get`/`contains_key` agree with the model for pooled and arbitrary keys.
// - Occupancy stays within LOAD_FACTOR and capacity stays a power of two.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(proptest::collection::vec(1usize..512, 1..=24))) {
        run_against_model(&pool, ops)?;
    }
}

// Property: Same invariants when every pooled key shares its ideal slot at
// every capacity the table reaches (all keys are 1 mod 8192). This stresses
// long probe runs and wraparound.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions(
        (pool, ops) in arb_scenario(proptest::collection::vec((0usize..64).prop_map(|n| n * MAX_REHASH_CAPACITY + 1), 1..=24))
    ) {
        run_against_model(&pool, ops)?;
    }
}
