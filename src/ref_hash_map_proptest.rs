#![cfg(test)]

// Property tests for RefHashMap kept inside the crate so they do not
// require feature gates to access internal modules.

use crate::ref_hash_map::RefHashMap;
use crate::reclaim::RefStrength;
use proptest::prelude::*;
use std::collections::HashMap;
use std::convert::Infallible;
use std::hash::{BuildHasher, Hasher};
use std::sync::Arc;

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys and op lists shrink in length. Value liveness is driven explicitly
// through the `held` table: DropValue releases the last strong ref, after
// which the entry must read as absent.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Compute(usize, i32),
    ComputeNone(usize),
    DropValue(usize),
    Purge,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<OpI>)> {
    (1..=8usize).prop_flat_map(|pool_len| {
        let idx = 0..pool_len;
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            idx.clone().prop_map(OpI::Remove),
            idx.clone().prop_map(OpI::Get),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Compute(i, v)),
            idx.clone().prop_map(OpI::ComputeNone),
            idx.clone().prop_map(OpI::DropValue),
            Just(OpI::Purge),
            Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool_len, ops))
    })
}

// Shared state-machine body: drives `sut` through `ops` and checks it
// against a plain HashMap model after every operation.
fn run_scenario<S: BuildHasher>(
    sut: RefHashMap<String, i32, S>,
    pool_len: usize,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let pool: Vec<Arc<String>> = (0..pool_len).map(|i| Arc::new(format!("k{i}"))).collect();
    let mut model: HashMap<usize, i32> = HashMap::new();
    // The strong refs keeping weakly held values alive.
    let mut held: HashMap<usize, Arc<i32>> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let value = Arc::new(v);
                let old = sut.insert(Arc::clone(&pool[i]), Arc::clone(&value));
                prop_assert_eq!(old.as_deref(), model.get(&i));
                held.insert(i, value);
                model.insert(i, v);
            }
            OpI::Remove(i) => {
                let removed = sut.remove(&pool[i]);
                prop_assert_eq!(removed.as_deref(), model.get(&i));
                held.remove(&i);
                model.remove(&i);
            }
            OpI::Get(i) => {
                let got = sut.get(&pool[i]);
                prop_assert_eq!(got.as_deref(), model.get(&i));
            }
            OpI::Compute(i, v) => {
                let mut ran = false;
                let out = sut
                    .compute_if_absent::<Infallible, _>(Arc::clone(&pool[i]), |_| {
                        ran = true;
                        Ok(Some(Arc::new(v)))
                    })
                    .unwrap()
                    .unwrap();
                match model.get(&i) {
                    Some(existing) => {
                        // Present key: supplier must not run, existing wins.
                        prop_assert!(!ran);
                        prop_assert_eq!(&*out, existing);
                    }
                    None => {
                        prop_assert!(ran);
                        prop_assert_eq!(*out, v);
                        held.insert(i, out);
                        model.insert(i, v);
                    }
                }
            }
            OpI::ComputeNone(i) => {
                let mut ran = false;
                let out = sut
                    .compute_if_absent::<Infallible, _>(Arc::clone(&pool[i]), |_| {
                        ran = true;
                        Ok(None)
                    })
                    .unwrap();
                match model.get(&i) {
                    Some(existing) => {
                        prop_assert!(!ran);
                        prop_assert_eq!(out.as_deref(), Some(existing));
                    }
                    None => {
                        // Declined computation leaves the key absent.
                        prop_assert!(ran);
                        prop_assert!(out.is_none());
                    }
                }
            }
            OpI::DropValue(i) => {
                held.remove(&i);
                model.remove(&i);
            }
            OpI::Purge => {
                sut.purge();
            }
            OpI::Clear => {
                sut.clear();
                held.clear();
                model.clear();
            }
        }

        // Post-conditions after each op:
        // 1) Per-key read parity, dead values included (a dropped value
        //    must read as absent immediately, swept or not).
        for (i, key) in pool.iter().enumerate() {
            let got = sut.get(key);
            prop_assert_eq!(got.as_deref(), model.get(&i));
            prop_assert_eq!(sut.contains_key(key), model.contains_key(&i));
        }
        // 2) Size parity: len sweeps eagerly, so dead entries are gone.
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap
// under explicit value-liveness control. Invariants exercised:
// - insert/remove/get parity with the model, dead values invisible.
// - compute_if_absent runs the supplier iff the key is absent and adopts
//   the existing value otherwise; Ok(None) leaves the key absent.
// - purge and eager sweeps converge len on the model's size.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool_len, ops) in arb_scenario()) {
        let sut: RefHashMap<String, i32> = RefHashMap::new();
        run_scenario(sut, pool_len, ops)?;
    }
}

// Collision variant using a constant hasher: every key wrapper stores the
// same hash, so lookups are decided purely by liveness-gated equality.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: same invariants as above under worst-case collision behavior.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool_len, ops) in arb_scenario()) {
        let sut = RefHashMap::<String, i32, _>::with_strength_and_hasher(
            RefStrength::Weak,
            RefStrength::Weak,
            ConstBuildHasher,
        );
        run_scenario(sut, pool_len, ops)?;
    }
}
