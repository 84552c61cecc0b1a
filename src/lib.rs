//! intern-pool: A concurrent interning pool whose entries are reclaimable,
//! weakly referenced values.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: canonicalize equal-by-predicate values so the process holds one
//!   representative per equivalence class, without ever keeping an
//!   otherwise-unreferenced value alive.
//! - Layers:
//!   - reclaim: `Slot`/`KeyRef`/`ValueRef` wrappers with hard or weak
//!     storage, the hash captured at construction, liveness-gated
//!     equality, and a per-wrapper id standing in for reference identity.
//!   - RefHashMap<K, V, S>: concurrent map over the wrappers; dead
//!     referents make entries invisible immediately and reclaimable by
//!     sweep; `compute_if_absent` guarantees one supplier run per entry
//!     generation.
//!   - InternPool<T>: public pooling API keyed by a caller-supplied
//!     equivalence predicate, with statistics on the side.
//!   - DependencyPool / registry: the process-wide concrete pool for build
//!     dependency records, and the pluggable provider seam hosts consume.
//!
//! Constraints
//! - Thread-safe throughout: `&self` operations, sharded locking in the
//!   table, atomics for counters; no global lock.
//! - Suppliers run outside all table locks and must not compute the same
//!   key reentrantly.
//! - Pooling equivalence is the caller's predicate; hashing is the value's
//!   intrinsic `Hash`. Predicate-equal values must hash equal or merges
//!   are missed (never wrong).
//!
//! Reclamation
//! - Weakly held referents become invisible the moment their last outside
//!   `Arc` drops. Physical removal happens inline when an operation
//!   observes a dead referent, amortized on hot paths, eagerly on
//!   structural operations, or on demand via `purge`. No operation ever
//!   returns reclaimed data regardless of sweep timing.
//! - The pool stores its keys hard and its values weak; each key weakly
//!   tracks the pooled value itself, so entry liveness equals "some caller
//!   still owns the representative".
//!
//! Hasher invariants
//! - Key wrappers store a precomputed `u64` hash and indexing always uses
//!   the stored hash; `K: Hash` is never invoked after wrapper
//!   construction, so a reclaimed key still indexes correctly until swept.
//!
//! Notes and non-goals
//! - No cross-process or persistent caching; no LRU/LFU/TTL policies;
//!   eviction is reference reclamation and nothing else.
//! - No bulk key/value/entry views on the map: no consistent snapshot
//!   exists over a concurrently invalidated structure.
//! - Statistics counters are not synchronized with table mutations;
//!   snapshots can lag under concurrency.

mod dependency;
mod dependency_pool;
mod intern_pool;
pub mod ref_hash_map;
mod ref_hash_map_proptest;
mod reclaim;
pub mod registry;
mod stats;

// Public surface
pub use dependency::{
    dependency_equals, Dependency, DependencyBuilder, DependencyError, DependencyScope, Exclusion,
    SourceLocation,
};
pub use dependency_pool::DependencyPool;
pub use intern_pool::{EquivalenceFn, InternPool};
pub use ref_hash_map::RefHashMap;
pub use reclaim::RefStrength;
pub use stats::PoolStatistics;
