use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use flurry::{
    BasicGenerator, IdGenerator, Layout, LockGenerator, NodeId, PoolGenerator, SystemClock,
    TWITTER_EPOCH, TimeSource,
};
use std::{sync::Barrier, thread::scope, time::Instant};

#[derive(Clone)]
struct FixedMockTime {
    millis: u64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

// Number of IDs generated per benchmark iteration (per-thread for
// multi-threaded). Matches one full 12-bit sequence space.
const TOTAL_IDS: usize = 4096;

fn fixed_time() -> FixedMockTime {
    FixedMockTime {
        millis: TWITTER_EPOCH.as_millis() as u64 + 1,
    }
}

/// Benchmarks the sequencer alone, never crossing a millisecond.
fn bench_basic(c: &mut Criterion) {
    let mut group = c.benchmark_group("basic/fixed");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                let mut generator = BasicGenerator::new(
                    Layout::TWITTER,
                    TWITTER_EPOCH,
                    NodeId::flat(0),
                    fixed_time(),
                )
                .unwrap();
                for _ in 0..TOTAL_IDS {
                    black_box(generator.next_id().unwrap());
                }
            }
            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks a shared generator on the wall clock from a single thread.
fn bench_shared<G>(c: &mut Criterion, group_name: &str, generator_factory: impl Fn() -> G)
where
    G: IdGenerator,
{
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                let generator = generator_factory();
                for _ in 0..TOTAL_IDS {
                    black_box(generator.next_id().unwrap());
                }
            }
            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks a shared generator under contention from several threads.
fn bench_threaded<G>(
    c: &mut Criterion,
    group_name: &str,
    threads: usize,
    generator_factory: impl Fn() -> G,
) where
    G: IdGenerator + Sync,
{
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements((TOTAL_IDS * threads) as u64));

    group.bench_function(format!("threads/{threads}/elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let mut elapsed = core::time::Duration::ZERO;
            for _ in 0..iters {
                let generator = generator_factory();
                let barrier = Barrier::new(threads + 1);
                let start = scope(|s| {
                    for _ in 0..threads {
                        s.spawn(|| {
                            barrier.wait();
                            for _ in 0..TOTAL_IDS {
                                black_box(generator.next_id().unwrap());
                            }
                        });
                    }
                    barrier.wait();
                    Instant::now()
                });
                elapsed += start.elapsed();
            }
            elapsed
        });
    });

    group.finish();
}

fn benchmarks(c: &mut Criterion) {
    bench_basic(c);

    bench_shared(c, "lock/wall", || {
        LockGenerator::new(Layout::TWITTER, TWITTER_EPOCH, NodeId::flat(0), SystemClock).unwrap()
    });
    bench_shared(c, "pool/wall", || {
        PoolGenerator::new(Layout::TWITTER, TWITTER_EPOCH, NodeId::flat(0), 1, SystemClock)
            .unwrap()
    });

    for threads in [2, 8] {
        bench_threaded(c, "lock/contended", threads, || {
            LockGenerator::new(Layout::TWITTER, TWITTER_EPOCH, NodeId::flat(0), SystemClock)
                .unwrap()
        });
        bench_threaded(c, "pool/contended", threads, || {
            PoolGenerator::new(
                Layout::TWITTER,
                TWITTER_EPOCH,
                NodeId::flat(0),
                threads,
                SystemClock,
            )
            .unwrap()
        });
    }
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
