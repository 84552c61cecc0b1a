//! Reclaimable reference wrappers: the basic unit of memory-sensitive
//! indirection used by `RefHashMap`.
//!
//! A key wrapper captures its referent's hash once at construction, so it
//! stays usable as a table key after the referent is gone. Equality is only
//! meaningful while both referents are alive; a wrapper whose referent has
//! been reclaimed compares unequal to everything, so it can never masquerade
//! as live data and is reaped by the next cleanup pass instead.

use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// Storage strength for one side (keys or values) of a `RefHashMap`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RefStrength {
    /// Entries hold the referent strongly; the map never reclaims it.
    Hard,
    /// Entries hold the referent weakly; it becomes reclaimable as soon as
    /// the last outside `Arc` is dropped.
    Weak,
}

/// Hard or weak storage for a single referent.
pub(crate) enum Slot<T> {
    Hard(Arc<T>),
    Weak(Weak<T>),
}

impl<T> Slot<T> {
    pub(crate) fn new(referent: &Arc<T>, strength: RefStrength) -> Self {
        match strength {
            RefStrength::Hard => Slot::Hard(Arc::clone(referent)),
            RefStrength::Weak => Slot::Weak(Arc::downgrade(referent)),
        }
    }

    /// The referent, or `None` once it has been reclaimed.
    pub(crate) fn get(&self) -> Option<Arc<T>> {
        match self {
            Slot::Hard(strong) => Some(Arc::clone(strong)),
            Slot::Weak(weak) => weak.upgrade(),
        }
    }

    pub(crate) fn is_dead(&self) -> bool {
        match self {
            Slot::Hard(_) => false,
            Slot::Weak(weak) => weak.strong_count() == 0,
        }
    }
}

// Manual Clone: the derive would demand T: Clone, but only the handles are
// cloned, never the referent.
impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        match self {
            Slot::Hard(strong) => Slot::Hard(Arc::clone(strong)),
            Slot::Weak(weak) => Slot::Weak(Weak::clone(weak)),
        }
    }
}

/// Key wrapper: a [`Slot`] plus the key's hash captured at construction.
pub(crate) struct KeyRef<K> {
    hash: u64,
    slot: Slot<K>,
}

impl<K> KeyRef<K> {
    pub(crate) fn new(key: &Arc<K>, strength: RefStrength, hash: u64) -> Self {
        Self {
            hash,
            slot: Slot::new(key, strength),
        }
    }

    pub(crate) fn get(&self) -> Option<Arc<K>> {
        self.slot.get()
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.slot.is_dead()
    }
}

impl<K> Clone for KeyRef<K> {
    fn clone(&self) -> Self {
        Self {
            hash: self.hash,
            slot: self.slot.clone(),
        }
    }
}

impl<K> Hash for KeyRef<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl<K: Eq> PartialEq for KeyRef<K> {
    fn eq(&self, other: &Self) -> bool {
        match (self.slot.get(), other.slot.get()) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a, &b) || *a == *b,
            // Either referent reclaimed: conservatively unequal, so a stale
            // wrapper never matches a live probe.
            _ => false,
        }
    }
}

impl<K: Eq> Eq for KeyRef<K> {}

/// Value wrapper: a pending placeholder or a resolved payload.
///
/// The `id` is unique per wrapper instance within its map and stands in for
/// reference identity: compare-and-remove and compare-and-replace target one
/// exact mapping, never whatever happens to occupy the key at the time.
pub(crate) struct ValueRef<V> {
    id: u64,
    state: ValueState<V>,
}

enum ValueState<V> {
    /// Placeholder marking an in-flight computation for this entry
    /// generation. Carries no payload.
    Pending,
    Resolved(Slot<V>),
}

impl<V> ValueRef<V> {
    pub(crate) fn pending(id: u64) -> Self {
        Self {
            id,
            state: ValueState::Pending,
        }
    }

    pub(crate) fn resolved(id: u64, value: &Arc<V>, strength: RefStrength) -> Self {
        Self {
            id,
            state: ValueState::Resolved(Slot::new(value, strength)),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn is_pending(&self) -> bool {
        matches!(self.state, ValueState::Pending)
    }

    /// Live payload of a resolved wrapper; `None` when pending or reclaimed.
    pub(crate) fn payload(&self) -> Option<Arc<V>> {
        match &self.state {
            ValueState::Pending => None,
            ValueState::Resolved(slot) => slot.get(),
        }
    }

    /// True for a resolved wrapper whose payload has been reclaimed.
    /// Pending placeholders are never dead; they belong to an in-flight
    /// caller.
    pub(crate) fn is_dead(&self) -> bool {
        match &self.state {
            ValueState::Pending => false,
            ValueState::Resolved(slot) => slot.is_dead(),
        }
    }
}

impl<V> Clone for ValueRef<V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            state: match &self.state {
                ValueState::Pending => ValueState::Pending,
                ValueState::Resolved(slot) => ValueState::Resolved(slot.clone()),
            },
        }
    }
}
