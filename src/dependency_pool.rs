//! Process-wide dependency pool.
//!
//! One lazily initialized [`InternPool`] shared by everything in the
//! process that canonicalizes dependency records. The host is expected to
//! call [`DependencyPool::log_statistics`] once at normal shutdown; the
//! report is observability only and is skipped entirely for a process that
//! never interned.

use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::info;

use crate::dependency::{dependency_equals, Dependency};
use crate::intern_pool::InternPool;
use crate::stats::PoolStatistics;

static POOL: Lazy<InternPool<Dependency>> = Lazy::new(InternPool::new);

/// Facade over the process-wide `InternPool<Dependency>`.
pub struct DependencyPool;

impl DependencyPool {
    /// Canonicalize a dependency record against the process-wide pool.
    pub fn intern(dependency: Arc<Dependency>) -> Arc<Dependency> {
        POOL.intern(dependency, dependency_equals)
    }

    /// Representatives currently pooled.
    pub fn size() -> usize {
        POOL.len()
    }

    pub fn is_empty() -> bool {
        POOL.is_empty()
    }

    /// Force a reclamation pass over the pool.
    pub fn purge() {
        POOL.purge();
    }

    /// Drop every pooled representative and reset all statistics.
    pub fn clear() {
        POOL.clear();
    }

    pub fn statistics() -> PoolStatistics {
        POOL.statistics()
    }

    /// Emit the shutdown diagnostic: one line with size, interns, hits, and
    /// hit ratio. Silent when the pool was never used.
    pub fn log_statistics() {
        let stats = Self::statistics();
        if stats.interns == 0 {
            return;
        }
        info!(
            size = stats.size,
            interns = stats.interns,
            hits = stats.hits,
            hit_ratio = stats.hit_ratio(),
            "dependency pool statistics"
        );
    }
}
