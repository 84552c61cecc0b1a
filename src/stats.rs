//! Pool statistics: independent atomic counters plus a read-time snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

/// Intern/hit counters for one pool.
///
/// Counters are updated without cross-synchronization to table mutations, so
/// they can be momentarily inconsistent with table state under heavy
/// concurrency. Accepted trade-off for low-overhead observability.
#[derive(Default)]
pub(crate) struct PoolCounters {
    pub(crate) interns: AtomicU64,
    pub(crate) hits: AtomicU64,
}

impl PoolCounters {
    pub(crate) fn record_intern(&self) {
        self.interns.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.interns.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time view of a pool's statistics.
///
/// Counters are scoped "since creation or the last clear". Ratios are
/// derived on read and never stored.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PoolStatistics {
    /// Live entry count at snapshot time.
    pub size: usize,
    /// Total intern calls.
    pub interns: u64,
    /// Intern calls that returned a pre-existing representative.
    pub hits: u64,
    /// Entries dropped because their key referent was reclaimed.
    pub key_evictions: u64,
    /// Entries dropped because their value referent was reclaimed.
    pub value_evictions: u64,
}

impl PoolStatistics {
    /// Fraction of intern calls that were hits; 0.0 before any interning.
    pub fn hit_ratio(&self) -> f64 {
        if self.interns == 0 {
            0.0
        } else {
            self.hits as f64 / self.interns as f64
        }
    }

    pub fn total_evictions(&self) -> u64 {
        self.key_evictions + self.value_evictions
    }
}
