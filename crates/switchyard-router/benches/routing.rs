//! Lookup benchmarks.
//!
//! Run with: `cargo bench -p switchyard-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use switchyard_router::Router;

fn build_router(num_routes: usize) -> Router<usize> {
    let mut router = Router::new();
    let per_kind = num_routes / 3;

    for i in 0..per_kind {
        router
            .add(Method::GET, &format!("/api/v1/resource{i}"), i)
            .unwrap();
        router
            .add(Method::GET, &format!("/api/v1/resource{i}/:id"), per_kind + i)
            .unwrap();
        router
            .add(
                Method::GET,
                &format!("/api/v1/org/:org/resource{i}/:id"),
                2 * per_kind + i,
            )
            .unwrap();
    }
    router.add(Method::GET, "/static/*path", num_routes).unwrap();

    router
}

fn bench_static_lookup(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("static_lookup", |b| {
        b.iter(|| black_box(router.lookup(&Method::GET, black_box("/api/v1/resource20"))));
    });
}

fn bench_param_lookup(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("param_lookup", |b| {
        b.iter(|| black_box(router.lookup(&Method::GET, black_box("/api/v1/resource25/12345"))));
    });
}

fn bench_nested_param_lookup(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("nested_param_lookup", |b| {
        b.iter(|| {
            black_box(router.lookup(
                &Method::GET,
                black_box("/api/v1/org/acme-corp/resource10/12345"),
            ))
        });
    });
}

fn bench_catch_all_lookup(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("catch_all_lookup", |b| {
        b.iter(|| {
            black_box(router.lookup(&Method::GET, black_box("/static/css/vendor/site.min.css")))
        });
    });
}

fn bench_miss(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("miss", |b| {
        b.iter(|| black_box(router.lookup(&Method::GET, black_box("/api/v2/nothing/here"))));
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for num_routes in [30, 300, 3000] {
        let router = build_router(num_routes);
        let path = format!("/api/v1/resource{}/12345", num_routes / 6);

        group.bench_with_input(BenchmarkId::new("param_lookup", num_routes), &path, |b, p| {
            b.iter(|| black_box(router.lookup(&Method::GET, p)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_static_lookup,
    bench_param_lookup,
    bench_nested_param_lookup,
    bench_catch_all_lookup,
    bench_miss,
    bench_scaling
);
criterion_main!(benches);
