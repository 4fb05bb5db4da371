use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mitos_core::cache::ChainGeometryCache;
use mitos_core::geometry::{apply_twist, parallel_transport, sample_bezier, TwistProfile};
use mitos_core::geometry::tube::{build_tube, TubeStyle};
use mitos_core::math::Vec3;
use mitos_core::strand::{AttachmentSide, DirtyPropagator, StrandSet};

fn bench_geometry(c: &mut Criterion) {
    let control = [
        Vec3::ZERO,
        Vec3::new(1.0, 2.0, 0.0),
        Vec3::new(3.0, -1.0, 1.0),
        Vec3::new(4.0, 0.0, 0.0),
    ];
    // Roughly one three-strand chain at editor resolution.
    let points = sample_bezier(&control, 168).expect("cubic control polygon");
    let frames = parallel_transport(&points);
    let style = TubeStyle::default();
    let twist = TwistProfile {
        start: 0.0,
        cp1: 45.0,
        cp2: 90.0,
        end: 180.0,
    };

    let mut group = c.benchmark_group("Tube Geometry");

    group.bench_function("Bezier sampling (56 segments)", |b| {
        b.iter(|| black_box(sample_bezier(black_box(&control), 56).expect("cubic")));
    });

    group.bench_function("Parallel transport (169 samples)", |b| {
        b.iter(|| black_box(parallel_transport(black_box(&points))));
    });

    group.bench_function("Twist application (169 samples)", |b| {
        b.iter(|| {
            let mut twisted = frames.clone();
            apply_twist(&mut twisted, &points, &twist);
            black_box(twisted);
        });
    });

    group.bench_function("Tube meshing (40 ring segments)", |b| {
        b.iter(|| black_box(build_tube(&points, &frames, &style, 40)));
    });

    group.finish();
}

fn bench_chain_cache(c: &mut Criterion) {
    let mut set = StrandSet::new();
    let root = set.add(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
    let middle = set
        .attach(root, AttachmentSide::End, Some(Vec3::new(4.0, 1.0, 0.0)), true)
        .expect("root exists");
    set.attach(middle, AttachmentSide::End, Some(Vec3::new(6.0, 0.0, 0.0)), true)
        .expect("middle exists");
    let propagator = DirtyPropagator::default();

    let mut group = c.benchmark_group("Chain Cache");

    group.bench_function("Edit and rebuild (3 strands, 56 segments)", |b| {
        let mut cache = ChainGeometryCache::new();
        b.iter(|| {
            propagator.touch(&mut set, middle);
            black_box(cache.get_or_build(&mut set, root, 56));
        });
    });

    group.bench_function("Warm hit (3 strands)", |b| {
        let mut cache = ChainGeometryCache::new();
        cache.get_or_build(&mut set, root, 56);
        b.iter(|| black_box(cache.get_or_build(&mut set, root, 56)));
    });

    group.finish();
}

criterion_group!(benches, bench_geometry, bench_chain_cache);
criterion_main!(benches);
