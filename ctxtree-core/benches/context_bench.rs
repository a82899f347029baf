use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use ctxtree_core::prelude::*;
use std::sync::Arc;

fn chain(depth: usize) -> Ctx {
    (0..depth).fold(Ctx::background().with_value("root", 0_usize), |ctx, i| {
        ctx.with_value(format!("k{}", i), i)
    })
}

fn bench_derive(c: &mut Criterion) {
    let root = Ctx::background();
    c.bench_function("with_value", |b| {
        b.iter(|| black_box(root.with_value("key", 1_u32)))
    });

    let (parent, _cancel) = root.with_cancel();
    c.bench_function("with_cancel_registered", |b| {
        b.iter(|| black_box(parent.with_cancel()))
    });
}

fn bench_value_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_lookup");
    let key = Key::from("root");
    for depth in [1, 16, 256] {
        let ctx = chain(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &ctx, |b, ctx| {
            b.iter(|| black_box(ctx.value(&key)))
        });
    }
    group.finish();
}

fn bench_logger_resolution(c: &mut Criterion) {
    let app = Application::new(AppConfig::default());
    let registry = AppRegistry::with_application(app);
    let base = Ctx::background_with(registry).with_logger(TracingLogger::shared());

    // First call walks and caches, later calls hit the node's own slot
    let ctx = (0..64).fold(base, |ctx, i| ctx.with_value("depth", i));
    c.bench_function("logger_cached", |b| b.iter(|| black_box(ctx.logger())));
}

fn bench_cancel_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancel_fanout");
    for children in [10, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(children),
            &children,
            |b, &n| {
                b.iter_batched(
                    || {
                        let (parent, cancel) = Ctx::background().with_cancel();
                        let kids: Vec<_> = (0..n).map(|_| parent.with_cancel()).collect();
                        (cancel, kids)
                    },
                    |(cancel, kids)| {
                        cancel.cancel();
                        black_box(kids)
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }
    group.finish();
}

fn bench_fetch(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let ctx = Ctx::background().with_cache(MemoryCache::shared(16));
    c.bench_function("fetch_hit", |b| {
        b.to_async(&runtime).iter(|| async {
            let value = ctx
                .fetch("hot", deferred(async { Ok(Arc::new(1_u64) as Value) }))
                .await;
            black_box(value.is_ok())
        })
    });
}

criterion_group!(
    benches,
    bench_derive,
    bench_value_lookup,
    bench_logger_resolution,
    bench_cancel_fanout,
    bench_fetch
);
criterion_main!(benches);
