use criterion::{black_box, criterion_group, criterion_main, Criterion};
use laneflow::backend::generic as reference;
use laneflow::prelude::*;

// Enough work per iteration that loop overhead does not dominate.
const ITERATIONS: usize = 1024;

fn bench_arithmetic(c: &mut Criterion) {
    let a = F32x4::new(1.5, -2.25, 3.0, 0.5);
    let b = F32x4::splat(1.0001);

    c.bench_function("f32x4_mul_add_active", |bench| {
        bench.iter(|| {
            let mut acc = black_box(a);
            for _ in 0..ITERATIONS {
                acc = acc * black_box(b) + black_box(a);
            }
            black_box(acc)
        })
    });

    let ra = reference::F32x4::new(1.5, -2.25, 3.0, 0.5);
    let rb = reference::F32x4::splat(1.0001);
    c.bench_function("f32x4_mul_add_generic", |bench| {
        bench.iter(|| {
            let mut acc = black_box(ra);
            for _ in 0..ITERATIONS {
                acc = acc * black_box(rb) + black_box(ra);
            }
            black_box(acc)
        })
    });
}

fn bench_shuffle(c: &mut Criterion) {
    let v = I32x4::new(3, 2, 1, 0);

    c.bench_function("i32x4_shuffle_reverse", |bench| {
        bench.iter(|| {
            let mut acc = black_box(v);
            for _ in 0..ITERATIONS {
                acc = shuffle!(acc, [3, 2, 1, 0]);
            }
            black_box(acc)
        })
    });

    // No single NEON lane move does this one.
    c.bench_function("i32x4_shuffle_rotate_dup", |bench| {
        bench.iter(|| {
            let mut acc = black_box(v);
            for _ in 0..ITERATIONS {
                acc = shuffle!(acc, [2, 0, 3, 0]);
            }
            black_box(acc)
        })
    });
}

fn bench_select(c: &mut Criterion) {
    let x = F32x4::new(4.0, -3.0, 2.0, -1.0);
    let zero = F32x4::default();

    c.bench_function("f32x4_select", |bench| {
        bench.iter(|| {
            let v = black_box(x);
            F32x4::select(v.cmp_gt(zero), v, -v)
        })
    });

    c.bench_function("f32x4_select_or_zero", |bench| {
        bench.iter(|| {
            let v = black_box(x);
            F32x4::select_or_zero(v.cmp_gt(zero), v)
        })
    });
}

fn bench_conversion(c: &mut Criterion) {
    let x = F32x4::new(2.5, -2.7, 1.0e10, -0.5);

    c.bench_function("f32x4_round_nearest_even", |bench| {
        bench.iter(|| black_box(x).round_nearest_even())
    });

    c.bench_function("f32x4_floor", |bench| bench.iter(|| black_box(x).floor()));
}

criterion_group!(
    benches,
    bench_arithmetic,
    bench_shuffle,
    bench_select,
    bench_conversion
);
criterion_main!(benches);
