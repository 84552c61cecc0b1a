// Integration tests for InternPool: canonicalization under concurrency,
// statistics accuracy, reclamation safety, and clear semantics.

use std::sync::{Arc, Barrier};
use std::thread;

use intern_pool::InternPool;

fn text_equals(a: &String, b: &String) -> bool {
    a == b
}

// Interning the same value class repeatedly is idempotent: every call
// returns the exact Arc the first call registered.
#[test]
fn interning_is_idempotent() {
    let pool = InternPool::new();
    let canonical = pool.intern(Arc::new("canon".to_owned()), text_equals);
    for _ in 0..5 {
        let again = pool.intern(Arc::new("canon".to_owned()), text_equals);
        assert!(Arc::ptr_eq(&canonical, &again));
    }
    assert_eq!(pool.len(), 1);
}

// N threads intern equivalent values concurrently: exactly one
// representative survives, every thread holds the same Arc, and the
// statistics record one miss and N-1 hits.
#[test]
fn concurrent_interning_converges_on_one_representative() {
    const THREADS: usize = 8;
    let pool: InternPool<String> = InternPool::new();
    let barrier = Barrier::new(THREADS);

    let results: Vec<Arc<String>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let pool = &pool;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    pool.intern(Arc::new("shared".to_owned()), text_equals)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let first = &results[0];
    assert!(results.iter().all(|r| Arc::ptr_eq(r, first)));
    assert_eq!(pool.len(), 1);

    let stats = pool.statistics();
    assert_eq!(stats.interns, THREADS as u64);
    assert_eq!(stats.hits, THREADS as u64 - 1);
}

// Statistics accuracy, single-threaded: K interns with H hits yield
// total == K, hits == H, ratio == H/K; the empty pool reports 0.0.
#[test]
fn statistics_are_exact_single_threaded() {
    let pool = InternPool::new();
    assert_eq!(pool.statistics().hit_ratio(), 0.0);

    let kept: Vec<Arc<String>> = ["a", "b", "a", "c", "a", "b"]
        .iter()
        .map(|s| pool.intern(Arc::new((*s).to_owned()), text_equals))
        .collect();

    let stats = pool.statistics();
    assert_eq!(stats.interns, 6);
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.size, 3);
    assert_eq!(stats.hit_ratio(), 0.5);
    drop(kept);
}

// Reclamation safety: once every strong ref to a representative is gone,
// a later lookup never returns the old instance, and re-interning
// registers the new candidate as a fresh representative.
#[test]
fn reclaimed_representative_is_never_returned() {
    let pool = InternPool::new();
    let first = pool.intern(Arc::new("fleeting".to_owned()), text_equals);
    drop(first);
    pool.purge();

    // The class is gone, not merely hidden.
    assert!(pool
        .get_if_present(&Arc::new("fleeting".to_owned()), text_equals)
        .is_none());
    assert!(pool.is_empty());
    assert!(pool.statistics().total_evictions() >= 1);

    // Re-interning registers the new candidate as the representative: the
    // next probe finds it, and it counts as a miss, not a hit.
    let hits_before = pool.statistics().hits;
    let second = pool.intern(Arc::new("fleeting".to_owned()), text_equals);
    assert_eq!(pool.len(), 1);
    assert_eq!(pool.statistics().hits, hits_before);
    let found = pool.get_if_present(&Arc::new("fleeting".to_owned()), text_equals);
    assert!(found.is_some_and(|f| Arc::ptr_eq(&f, &second)));
}

// clear drops every entry and resets every counter, eviction counts
// included.
#[test]
fn clear_resets_everything() {
    let pool = InternPool::new();
    let kept = pool.intern(Arc::new("kept".to_owned()), text_equals);
    let _hit = pool.intern(Arc::new("kept".to_owned()), text_equals);
    let dropped = pool.intern(Arc::new("dropped".to_owned()), text_equals);
    drop(dropped);
    pool.purge();

    pool.clear();
    let stats = pool.statistics();
    assert_eq!(stats.size, 0);
    assert!(pool.is_empty());
    assert_eq!(stats.interns, 0);
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.total_evictions(), 0);

    // The pool is immediately usable again.
    let fresh = pool.intern(Arc::new("kept".to_owned()), text_equals);
    assert!(!Arc::ptr_eq(&kept, &fresh));
    assert_eq!(pool.statistics().interns, 1);
}
