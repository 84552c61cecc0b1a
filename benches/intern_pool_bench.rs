use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use intern_pool::{InternPool, RefHashMap};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn text_equals(a: &String, b: &String) -> bool {
    a == b
}

fn bench_intern_miss(c: &mut Criterion) {
    c.bench_function("intern_pool_intern_miss_10k", |b| {
        b.iter_batched(
            InternPool::<String>::new,
            |pool| {
                // Hold the representatives so weakly held entries survive
                // the loop.
                let mut held = Vec::with_capacity(10_000);
                for x in lcg(1).take(10_000) {
                    held.push(pool.intern(Arc::new(key(x)), text_equals));
                }
                black_box((pool, held))
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_intern_hit(c: &mut Criterion) {
    c.bench_function("intern_pool_intern_hit", |b| {
        let pool = InternPool::new();
        let held: Vec<_> = lcg(7)
            .take(20_000)
            .map(|x| pool.intern(Arc::new(key(x)), text_equals))
            .collect();
        let mut it = lcg(7).take(20_000).collect::<Vec<_>>().into_iter().cycle();
        b.iter(|| {
            let candidate = Arc::new(key(it.next().unwrap()));
            black_box(pool.intern(candidate, text_equals));
        });
        drop(held);
    });
}

fn bench_get_if_present_miss(c: &mut Criterion) {
    c.bench_function("intern_pool_probe_miss", |b| {
        let pool = InternPool::new();
        let _held: Vec<_> = lcg(11)
            .take(10_000)
            .map(|x| pool.intern(Arc::new(key(x)), text_equals))
            .collect();
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            // keys unlikely to be pooled
            let probe = Arc::new(key(miss.next().unwrap()));
            black_box(pool.get_if_present(&probe, text_equals));
        })
    });
}

fn bench_compute_if_absent_hit(c: &mut Criterion) {
    c.bench_function("ref_hash_map_compute_hit", |b| {
        let map: RefHashMap<String, u64> = RefHashMap::new();
        let keys: Vec<Arc<String>> = lcg(13).take(20_000).map(|x| Arc::new(key(x))).collect();
        let _held: Vec<_> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| {
                map.compute_if_absent::<Infallible, _>(Arc::clone(k), |_| {
                    Ok(Some(Arc::new(i as u64)))
                })
                .unwrap()
                .unwrap()
            })
            .collect();
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            let v = map
                .compute_if_absent::<Infallible, _>(Arc::clone(k), |_| Ok(Some(Arc::new(0))))
                .unwrap();
            black_box(v);
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_intern_miss, bench_intern_hit, bench_get_if_present_miss, bench_compute_if_absent_hit
}
criterion_main!(benches);
