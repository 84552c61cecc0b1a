// Lifecycle test for the process-wide dependency pool. The pool is a
// process singleton, so everything that touches it lives in one test
// function of one binary; splitting it across tests would make the
// assertions depend on execution order.

use std::sync::Arc;

use intern_pool::{Dependency, DependencyPool, DependencyScope, SourceLocation};

fn guava(version: &str) -> Arc<Dependency> {
    Arc::new(
        Dependency::builder()
            .group_id("com.google.guava")
            .artifact_id("guava")
            .version(version)
            .build()
            .unwrap(),
    )
}

#[test]
fn dependency_pool_lifecycle() {
    // Route the shutdown diagnostic somewhere harmless; the report itself
    // must not panic whether or not a subscriber is installed.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    assert!(DependencyPool::is_empty());
    DependencyPool::log_statistics(); // unused pool: silent, no panic

    // Two identical declarations collapse onto one instance.
    let d1 = DependencyPool::intern(guava("33.0.0"));
    let d2 = DependencyPool::intern(guava("33.0.0"));
    assert!(Arc::ptr_eq(&d1, &d2));

    // A different version is a different equivalence class.
    let d3 = DependencyPool::intern(guava("32.1.0"));
    assert!(!Arc::ptr_eq(&d1, &d3));
    assert_eq!(DependencyPool::size(), 2);

    // Provenance participates in equality: the same coordinates declared
    // at a different location stay distinct.
    let located = DependencyPool::intern(Arc::new(
        Dependency::builder()
            .group_id("com.google.guava")
            .artifact_id("guava")
            .version("33.0.0")
            .declared_at(SourceLocation::new("pom.xml", 12, 5))
            .build()
            .unwrap(),
    ));
    assert!(!Arc::ptr_eq(&d1, &located));
    assert_eq!(DependencyPool::size(), 3);

    let stats = DependencyPool::statistics();
    assert_eq!(stats.interns, 4);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.hit_ratio(), 0.25);

    // Scope and type still matter even though they are not in the
    // management key.
    let test_scoped = DependencyPool::intern(Arc::new(
        Dependency::builder()
            .group_id("com.google.guava")
            .artifact_id("guava")
            .version("33.0.0")
            .scope(DependencyScope::Test)
            .build()
            .unwrap(),
    ));
    assert!(!Arc::ptr_eq(&d1, &test_scoped));
    assert_eq!(test_scoped.management_key(), d1.management_key());

    // Dropping the only holders makes entries reclaimable.
    drop(d3);
    DependencyPool::purge();
    assert_eq!(DependencyPool::size(), 3);
    assert!(DependencyPool::statistics().total_evictions() >= 1);

    // The used pool emits its one-line report without panicking.
    DependencyPool::log_statistics();

    // clear empties the pool and zeroes the statistics.
    DependencyPool::clear();
    assert!(DependencyPool::is_empty());
    let cleared = DependencyPool::statistics();
    assert_eq!(cleared.interns, 0);
    assert_eq!(cleared.hits, 0);
    assert_eq!(cleared.total_evictions(), 0);

    drop((d1, d2, located, test_scoped));
}
