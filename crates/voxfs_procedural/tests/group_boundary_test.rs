//! # Group Boundary Test
//!
//! A file list whose short parent changes every 3 entries with depth 1 must
//! close exactly one feature-resolution cycle per boundary crossing, and
//! the mapped group index must increment by exactly 1 each time.

use std::collections::HashSet;
use std::path::PathBuf;

use voxfs_core::{Bounds, Coordinate, FileHandle, Mapping};
use voxfs_procedural::{SynthesisConfig, SynthesisTuning, Synthesizer, TerrainRng};

fn grouped_files(groups: usize, per_group: usize) -> Vec<FileHandle> {
    let mut files = Vec::new();
    for group in 0..groups {
        for i in 0..per_group {
            files.push(FileHandle::new(
                PathBuf::from(format!("/scan/g{group}/f{i}")),
                10,
                2,
            ));
        }
    }
    files
}

fn config() -> SynthesisConfig {
    SynthesisConfig {
        world_bounds: Bounds::new(Coordinate::new(0, 0, 0), Coordinate::new(64, 64, 64)),
        group_depth: 1,
        debug_palette: true,
        // Boundary counting wants pure growth; features are tested apart.
        tuning: SynthesisTuning {
            pond_seed_odds: 0.0,
            tree_seed_odds: 0.0,
            ..SynthesisTuning::default()
        },
    }
}

#[test]
fn test_one_resolution_cycle_per_boundary() {
    let mut mapping = Mapping::new();
    let mut rng = TerrainRng::from_seed(11);
    let config = config();

    let report = Synthesizer::new(&mut mapping, &config, &mut rng).run(grouped_files(3, 3));

    // 3 parents = 2 boundary crossings; the final group closes with the run.
    assert_eq!(report.groups_closed, 2);
    assert_eq!(report.placed, 9);
    assert_eq!(report.unallocated.len(), 0);
}

#[test]
fn test_group_index_increments_by_one() {
    let mut mapping = Mapping::new();
    let mut rng = TerrainRng::from_seed(12);
    let config = config();

    let _ = Synthesizer::new(&mut mapping, &config, &mut rng).run(grouped_files(4, 3));

    // Debug palette keys the wool color by group index: four consecutive
    // groups produce exactly the first four colors.
    let colors: HashSet<String> = mapping
        .entries()
        .map(|entry| entry.block.name().to_owned())
        .collect();
    let expected: HashSet<String> = ["white_wool", "orange_wool", "magenta_wool", "light_blue_wool"]
        .into_iter()
        .map(str::to_owned)
        .collect();
    assert_eq!(colors, expected);

    // Each group colors exactly 3 entries.
    for color in &expected {
        let count = mapping
            .entries()
            .filter(|entry| entry.block.name() == color)
            .count();
        assert_eq!(count, 3, "group {color} has the wrong size");
    }
}

#[test]
fn test_single_parent_closes_no_groups() {
    let mut mapping = Mapping::new();
    let mut rng = TerrainRng::from_seed(13);
    let config = config();

    let report = Synthesizer::new(&mut mapping, &config, &mut rng).run(grouped_files(1, 9));
    assert_eq!(report.groups_closed, 0);
    assert_eq!(report.placed, 9);
}
