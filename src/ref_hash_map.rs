//! A concurrent map whose keys and values are reclaimable references.
//!
//! Entries hold their key and value through [`Slot`]s of configurable
//! strength. Once a weakly held referent is dropped by all outside owners,
//! the entry is logically gone: no operation ever returns it, and it is
//! physically removed either inline (when an operation observes the dead
//! referent) or by a cleanup sweep. Sweeps run eagerly before structural
//! operations, are amortized over hot-path operations, and can be forced
//! with [`RefHashMap::purge`]. Correctness never depends on sweep timing;
//! only memory footprint does.
//!
//! The map's one non-trivial primitive is [`RefHashMap::compute_if_absent`]:
//! per key generation at most one caller runs the supplier, the supplier
//! runs outside all table locks, and losers busy-wait on a pending
//! placeholder. Because the supplier runs outside the locks it may use the
//! map freely, with one exception: it must not compute the same key it is
//! being invoked for, or two computations for one generation become
//! possible.
//!
//! Bulk views (key/value/entry iteration handles) are deliberately not part
//! of the API; [`RefHashMap::remove_where`] covers the one bulk mutation the
//! callers need.
//!
//! [`Slot`]: crate::reclaim::Slot

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::reclaim::{KeyRef, RefStrength, ValueRef};

/// Hot-path operations trigger a full cleanup sweep once per this many
/// operations.
const SWEEP_INTERVAL: usize = 64;

/// A concurrent hash map with reclaimable keys and values.
///
/// Keys compare by intrinsic equality while alive; a reclaimed key or value
/// makes the whole entry invisible. Values may also be pending placeholders
/// installed by an in-flight [`compute_if_absent`](Self::compute_if_absent);
/// placeholders are invisible to every read operation.
pub struct RefHashMap<K, V, S = RandomState> {
    entries: DashMap<KeyRef<K>, ValueRef<V>>,
    key_hasher: S,
    key_strength: RefStrength,
    value_strength: RefStrength,
    /// Source of per-wrapper ids; replaces reference identity for
    /// compare-and-remove / compare-and-replace of one exact mapping.
    next_id: AtomicU64,
    ops_since_sweep: AtomicUsize,
    key_evictions: AtomicU64,
    value_evictions: AtomicU64,
}

impl<K: Eq + Hash, V> RefHashMap<K, V> {
    /// A map holding both keys and values weakly.
    pub fn new() -> Self {
        Self::with_strength(RefStrength::Weak, RefStrength::Weak)
    }

    /// A map that never reclaims anything.
    pub fn hard() -> Self {
        Self::with_strength(RefStrength::Hard, RefStrength::Hard)
    }

    pub fn with_strength(key_strength: RefStrength, value_strength: RefStrength) -> Self {
        Self::with_strength_and_hasher(key_strength, value_strength, RandomState::new())
    }
}

impl<K: Eq + Hash, V> Default for RefHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V, S> RefHashMap<K, V, S> {
    pub fn with_strength_and_hasher(
        key_strength: RefStrength,
        value_strength: RefStrength,
        key_hasher: S,
    ) -> Self {
        Self {
            entries: DashMap::new(),
            key_hasher,
            key_strength,
            value_strength,
            next_id: AtomicU64::new(0),
            ops_since_sweep: AtomicUsize::new(0),
            key_evictions: AtomicU64::new(0),
            value_evictions: AtomicU64::new(0),
        }
    }
}

impl<K, V, S> RefHashMap<K, V, S> {
    /// Entries removed so far because their key referent was reclaimed.
    pub fn key_evictions(&self) -> u64 {
        self.key_evictions.load(Ordering::Relaxed)
    }

    /// Entries removed so far because their value referent was reclaimed.
    pub fn value_evictions(&self) -> u64 {
        self.value_evictions.load(Ordering::Relaxed)
    }

    pub(crate) fn reset_eviction_counts(&self) {
        self.key_evictions.store(0, Ordering::Relaxed);
        self.value_evictions.store(0, Ordering::Relaxed);
    }

    fn fresh_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl<K, V, S> RefHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn hash_key(&self, key: &K) -> u64 {
        self.key_hasher.hash_one(key)
    }

    /// A probe key for lookups. Probes are always hard: they live on the
    /// caller's stack for the duration of one operation.
    fn probe(&self, key: &Arc<K>) -> KeyRef<K> {
        KeyRef::new(key, RefStrength::Hard, self.hash_key(key))
    }

    /// A key wrapper for storage, at the map's configured strength.
    fn stored_key(&self, key: &Arc<K>) -> KeyRef<K> {
        KeyRef::new(key, self.key_strength, self.hash_key(key))
    }

    /// Remove every entry whose key or value referent has been reclaimed,
    /// updating the eviction counters.
    fn sweep(&self) {
        self.ops_since_sweep.store(0, Ordering::Relaxed);
        self.entries.retain(|key, value| {
            if key.is_dead() {
                self.key_evictions.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            if value.is_dead() {
                self.value_evictions.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            true
        });
    }

    /// Amortized sweep for hot-path operations.
    fn sweep_if_due(&self) {
        if self.ops_since_sweep.fetch_add(1, Ordering::Relaxed) + 1 >= SWEEP_INTERVAL {
            self.sweep();
        }
    }

    /// Force a cleanup sweep now.
    pub fn purge(&self) {
        self.sweep();
    }

    /// The value mapped to `key`, if present, resolved, and alive.
    ///
    /// A pending placeholder reads as absent. An entry observed with a dead
    /// value referent is removed inline.
    pub fn get(&self, key: &Arc<K>) -> Option<Arc<V>> {
        self.sweep_if_due();
        let probe = self.probe(key);
        let entry = self.entries.get(&probe)?;
        if entry.is_pending() {
            return None;
        }
        if let Some(value) = entry.payload() {
            return Some(value);
        }
        // Dead value: remove exactly this mapping, not whatever a racing
        // writer may have installed since.
        let stale_id = entry.id();
        drop(entry);
        if self
            .entries
            .remove_if(&probe, |_, current| current.id() == stale_id)
            .is_some()
        {
            self.value_evictions.fetch_add(1, Ordering::Relaxed);
        }
        None
    }

    /// Insert a mapping, returning the previous live value if one existed.
    pub fn insert(&self, key: Arc<K>, value: Arc<V>) -> Option<Arc<V>> {
        self.sweep();
        let stored = self.stored_key(&key);
        let resolved = ValueRef::resolved(self.fresh_id(), &value, self.value_strength);
        self.entries
            .insert(stored, resolved)
            .and_then(|old| old.payload())
    }

    /// Remove the mapping for `key`, returning its live value if it had one.
    pub fn remove(&self, key: &Arc<K>) -> Option<Arc<V>> {
        self.sweep();
        let probe = self.probe(key);
        self.entries
            .remove(&probe)
            .and_then(|(_, value)| value.payload())
    }

    pub fn contains_key(&self, key: &Arc<K>) -> bool {
        self.get(key).is_some()
    }

    /// True if some live entry maps to a value equal to `value`.
    pub fn contains_value(&self, value: &Arc<V>) -> bool
    where
        V: PartialEq,
    {
        self.sweep();
        self.entries.iter().any(|entry| {
            entry
                .value()
                .payload()
                .is_some_and(|v| Arc::ptr_eq(&v, value) || *v == **value)
        })
    }

    /// Number of entries after an eager sweep.
    ///
    /// May still over-report by entries whose referents die concurrently
    /// with the count; it never under-reports live entries.
    pub fn len(&self) -> usize {
        self.sweep();
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Eviction counters are left alone: they track
    /// reclamation, not explicit removal.
    pub fn clear(&self) {
        self.ops_since_sweep.store(0, Ordering::Relaxed);
        self.entries.clear();
    }

    /// Remove every live, resolved entry matching `filter`. Dead entries and
    /// pending placeholders are not offered to the filter.
    pub fn remove_where<F>(&self, mut filter: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.sweep();
        self.entries
            .retain(|key, value| match (key.get(), value.payload()) {
                (Some(k), Some(v)) => !filter(&k, &v),
                _ => true,
            });
    }

    /// Return the value for `key`, computing and installing it if absent.
    ///
    /// Exactly one caller per key generation runs `supplier`; concurrent
    /// callers wait on a pending placeholder and then adopt the winner's
    /// value. The supplier runs outside all table locks. `Ok(Some(v))`
    /// installs and returns `v`; `Ok(None)` installs nothing and leaves the
    /// key absent; `Err` (and panic) install nothing and surface to the one
    /// caller whose supplier ran. An entry observed with a dead value
    /// referent is removed and the computation restarts.
    ///
    /// The supplier must not compute the same key reentrantly.
    pub fn compute_if_absent<E, F>(&self, key: Arc<K>, mut supplier: F) -> Result<Option<Arc<V>>, E>
    where
        F: FnMut(&K) -> Result<Option<Arc<V>>, E>,
    {
        let probe = self.probe(&key);
        loop {
            self.sweep_if_due();

            // Fast path: read-only probe before taking a writable entry.
            if let Some(entry) = self.entries.get(&probe) {
                if entry.is_pending() {
                    drop(entry);
                    thread::yield_now();
                    continue;
                }
                if let Some(value) = entry.payload() {
                    return Ok(Some(value));
                }
                let stale_id = entry.id();
                drop(entry);
                if self
                    .entries
                    .remove_if(&probe, |_, current| current.id() == stale_id)
                    .is_some()
                {
                    self.value_evictions.fetch_add(1, Ordering::Relaxed);
                }
                continue;
            }

            let pending_id = self.fresh_id();
            match self.entries.entry(self.stored_key(&key)) {
                Entry::Occupied(occupied) => {
                    // Lost the race since the probe above.
                    if occupied.get().is_pending() {
                        drop(occupied);
                        thread::yield_now();
                        continue;
                    }
                    if let Some(value) = occupied.get().payload() {
                        return Ok(Some(value));
                    }
                    occupied.remove();
                    self.value_evictions.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(ValueRef::pending(pending_id));
                    // Shard lock released here; the supplier runs unlocked.
                }
            }

            // If the supplier unwinds or errors, the guard takes the
            // placeholder back out so waiters can claim the key.
            let guard = PendingGuard {
                entries: &self.entries,
                probe: &probe,
                pending_id,
            };
            let computed = supplier(&key)?;
            match computed {
                Some(value) => {
                    guard.disarm();
                    let resolved =
                        ValueRef::resolved(self.fresh_id(), &value, self.value_strength);
                    if let Some(mut slot) = self.entries.get_mut(&probe) {
                        // Replace only our own placeholder. If it was
                        // cleared or clobbered meanwhile, the computed
                        // value is still the right answer for this caller.
                        if slot.id() == pending_id {
                            *slot = resolved;
                        }
                    }
                    return Ok(Some(value));
                }
                None => {
                    drop(guard);
                    return Ok(None);
                }
            }
        }
    }
}

/// Removes the pending placeholder it was armed with, unless disarmed.
struct PendingGuard<'a, K: Eq, V> {
    entries: &'a DashMap<KeyRef<K>, ValueRef<V>>,
    probe: &'a KeyRef<K>,
    pending_id: u64,
}

impl<K: Eq, V> PendingGuard<'_, K, V> {
    fn disarm(self) {
        std::mem::forget(self);
    }
}

impl<K: Eq, V> Drop for PendingGuard<'_, K, V> {
    fn drop(&mut self) {
        self.entries
            .remove_if(self.probe, |_, current| current.id() == self.pending_id);
    }
}
