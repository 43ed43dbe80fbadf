use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use strata::merge::MergedGeometry;
use strata::options::MergeOptions;
use strata::scene::{Appearance, Geometry, ModelId, NewPart, PartRegistry};

/// A 24-vertex box per part, laid out on a grid.
fn scene(parts: usize) -> (PartRegistry, ModelId) {
    let model = ModelId::new(1);
    let new_parts = (0..parts)
        .map(|i| {
            let offset = Vec3::new((i % 100) as f32, (i / 100) as f32, 0.0);
            let positions = (0..24)
                .map(|v| offset + Vec3::new((v % 2) as f32, ((v / 2) % 2) as f32, (v / 4) as f32) * 0.5)
                .collect();
            let indices = (0..12u32).flat_map(|t| [t, t + 1, t + 2]).collect();
            NewPart {
                name: format!("part-{i}"),
                geometry: Arc::new(Geometry::new(positions, indices)),
                base: Appearance::default(),
            }
        })
        .collect();
    let mut registry = PartRegistry::new();
    let _ = registry
        .insert_model(model, "bench".to_owned(), "bench".to_owned(), new_parts)
        .unwrap();
    (registry, model)
}

fn patch_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch_100_dirty");
    let highlight = Appearance::opaque([255, 170, 0]);

    for count in [1_000, 10_000, 50_000].iter() {
        let (registry, model) = scene(*count);
        let mut merged = MergedGeometry::new(MergeOptions::default());
        merged.add_model(model, &registry, |_, part| part.base);
        let dirty: Vec<_> = registry.parts_of(model).iter().copied().take(100).collect();

        group.bench_function(format!("{}_parts", count), |b| {
            b.iter(|| black_box(merged.patch(black_box(&dirty), |_| Some(highlight))))
        });
    }
    group.finish();
}

fn rebuild_benchmark(c: &mut Criterion) {
    let (registry, _) = scene(10_000);
    let mut merged = MergedGeometry::new(MergeOptions::default());
    c.bench_function("rebuild_10000_parts", |b| {
        b.iter(|| merged.rebuild(black_box(&registry), |_, part| part.base))
    });
}

criterion_group!(benches, patch_benchmark, rebuild_benchmark);
criterion_main!(benches);
