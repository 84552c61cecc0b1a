//! Deduplicating pool keyed by a caller-supplied equivalence predicate.
//!
//! The pool canonicalizes values: the first `intern` of an equivalence class
//! registers the candidate as the class representative, and every later
//! `intern` of an equivalent value returns that same `Arc`. Equivalence is
//! the caller's predicate, not `T`'s own `Eq`; hashing is `T`'s own `Hash`.
//! The caller must keep the two consistent (predicate-equal values must hash
//! equal), or equivalent values silently land in different buckets and
//! pooling loses effectiveness. Correctness is unaffected either way.
//!
//! Entries are held weakly: a representative stays pooled exactly as long as
//! some caller still owns its `Arc`, and becomes reclaimable afterwards. The
//! pool never keeps an otherwise-unreferenced value alive.

use std::collections::hash_map::RandomState;
use std::convert::Infallible;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::{Arc, Weak};

use crate::ref_hash_map::RefHashMap;
use crate::reclaim::RefStrength;
use crate::stats::{PoolCounters, PoolStatistics};

/// Equivalence predicate for pooling. A plain function value: predicates are
/// stateless comparisons, and a function pointer keeps keys `Copy`-cheap and
/// comparable across intern calls.
pub type EquivalenceFn<T> = fn(&T, &T) -> bool;

/// Pool table key: a weak handle on the candidate, its hash captured at
/// intern time, and the predicate that defines its equivalence class.
///
/// The weak handle ties key liveness to the pooled value itself: both track
/// the same `Arc`, so the entry dies exactly when the representative does.
pub(crate) struct PoolKey<T> {
    candidate: Weak<T>,
    hash: u64,
    eq: EquivalenceFn<T>,
}

impl<T> PoolKey<T> {
    fn new(candidate: &Arc<T>, hash: u64, eq: EquivalenceFn<T>) -> Self {
        Self {
            candidate: Arc::downgrade(candidate),
            hash,
            eq,
        }
    }
}

impl<T> Hash for PoolKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl<T> PartialEq for PoolKey<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self.candidate.upgrade(), other.candidate.upgrade()) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a, &b) || (self.eq)(&a, &b),
            // A reclaimed candidate belongs to no equivalence class.
            _ => false,
        }
    }
}

impl<T> Eq for PoolKey<T> {}

/// A concurrent interning pool over values of one type.
pub struct InternPool<T> {
    entries: RefHashMap<PoolKey<T>, T>,
    hasher: RandomState,
    counters: PoolCounters,
}

impl<T: Hash> InternPool<T> {
    pub fn new() -> Self {
        Self {
            entries: RefHashMap::with_strength(RefStrength::Hard, RefStrength::Weak),
            hasher: RandomState::new(),
            counters: PoolCounters::default(),
        }
    }

    fn key_for(&self, candidate: &Arc<T>, eq: EquivalenceFn<T>) -> Arc<PoolKey<T>> {
        let hash = self.hasher.hash_one(&**candidate);
        Arc::new(PoolKey::new(candidate, hash, eq))
    }

    /// Return the pooled representative of `candidate`'s equivalence class,
    /// registering `candidate` itself if the class is new.
    ///
    /// The returned `Arc` is the representative; callers should use it in
    /// place of `candidate` from here on.
    pub fn intern(&self, candidate: Arc<T>, eq: EquivalenceFn<T>) -> Arc<T> {
        debug_assert!(
            eq(&candidate, &candidate),
            "equivalence predicate must be reflexive"
        );
        self.counters.record_intern();

        let key = self.key_for(&candidate, eq);
        let mut installed = false;
        let result = self.entries.compute_if_absent::<Infallible, _>(key, |_| {
            installed = true;
            Ok(Some(Arc::clone(&candidate)))
        });
        let canonical = match result {
            Ok(Some(representative)) => representative,
            // The supplier above always yields a value.
            Ok(None) => candidate,
            Err(never) => match never {},
        };
        if !installed {
            self.counters.record_hit();
        }
        canonical
    }

    /// The pooled representative of `candidate`'s class, if one is currently
    /// registered. Never registers anything and never counts as an intern.
    pub fn get_if_present(&self, candidate: &Arc<T>, eq: EquivalenceFn<T>) -> Option<Arc<T>> {
        let key = self.key_for(candidate, eq);
        self.entries.get(&key)
    }

    /// Live representative count after a cleanup pass.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Force removal of entries whose representatives have been reclaimed.
    pub fn purge(&self) {
        self.entries.purge();
    }

    /// Drop every entry and reset all statistics, eviction counts included.
    pub fn clear(&self) {
        self.entries.clear();
        self.entries.reset_eviction_counts();
        self.counters.reset();
    }

    /// Snapshot of the pool's statistics. Counters are not synchronized
    /// with table mutations, so the snapshot can lag concurrent interns.
    pub fn statistics(&self) -> PoolStatistics {
        use std::sync::atomic::Ordering;
        PoolStatistics {
            size: self.entries.len(),
            interns: self.counters.interns.load(Ordering::Relaxed),
            hits: self.counters.hits.load(Ordering::Relaxed),
            key_evictions: self.entries.key_evictions(),
            value_evictions: self.entries.value_evictions(),
        }
    }
}

impl<T: Hash> Default for InternPool<T> {
    fn default() -> Self {
        Self::new()
    }
}
