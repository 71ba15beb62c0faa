//! Benchmarks for the frontier-growth hot path.

use std::path::PathBuf;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use voxfs_core::{Bounds, Coordinate, FileHandle, Mapping};
use voxfs_procedural::{SynthesisConfig, SynthesisTuning, Synthesizer, TerrainRng};

fn bench_growth(c: &mut Criterion) {
    let files: Vec<FileHandle> = (0..5_000)
        .map(|i| FileHandle::new(PathBuf::from(format!("/scan/a/f{i}")), 10, 2))
        .collect();
    let config = SynthesisConfig {
        world_bounds: Bounds::new(Coordinate::new(0, 0, 0), Coordinate::new(256, 64, 256)),
        group_depth: 1,
        debug_palette: false,
        tuning: SynthesisTuning::default(),
    };

    c.bench_function("synthesize_5000_files", |b| {
        b.iter(|| {
            let mut mapping = Mapping::new();
            let mut rng = TerrainRng::from_seed(42);
            let report =
                Synthesizer::new(&mut mapping, &config, &mut rng).run(black_box(files.clone()));
            black_box(report.placed)
        });
    });
}

criterion_group!(benches, bench_growth);
criterion_main!(benches);
