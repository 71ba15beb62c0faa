//! # Ore Vein Confinement Test
//!
//! Veins random-walk through mapped stone but must never convert a block
//! outside the chunk being decorated, even when the mapping continues
//! seamlessly into the neighboring chunk.

use std::path::PathBuf;

use voxfs_core::{BlockSpec, Bounds, ChunkCoord, Coordinate, FileHandle, Mapping, MappingEntry};
use voxfs_procedural::{decorate_chunk, SynthesisTuning, TerrainRng};

fn stone_at(mapping: &mut Mapping, position: Coordinate) {
    mapping
        .insert(MappingEntry {
            position,
            block: BlockSpec::stone(),
            file: FileHandle::new(
                PathBuf::from(format!(
                    "/scan/a/f_{}_{}_{}",
                    position.x, position.y, position.z
                )),
                5,
                2,
            ),
        })
        .unwrap();
}

#[test]
fn test_veins_stay_inside_the_decorated_chunk() {
    let mut mapping = Mapping::new();

    // Chunk (0,0): two full 16x16 stone layers = 512 entries, enough for
    // two veins at the default 250 entries per vein.
    for y in [10, 11] {
        for z in 0..16 {
            for x in 0..16 {
                stone_at(&mut mapping, Coordinate::new(x, y, z));
            }
        }
    }
    // Chunk (1,0): a mapped stone strip continuing across the border, so a
    // wandering vein could escape were it not clamped to chunk bounds.
    for y in [10, 11] {
        for z in 0..16 {
            for x in 16..20 {
                stone_at(&mut mapping, Coordinate::new(x, y, z));
            }
        }
    }

    let chunk = ChunkCoord::new(0, 0);
    let bounds = Bounds::of_chunk(chunk, 0, 64);
    let tuning = SynthesisTuning {
        ore_size_factor: 0.9,
        ..SynthesisTuning::default()
    };
    let mut rng = TerrainRng::from_seed(77);
    decorate_chunk(&mut mapping, chunk, &bounds, &tuning, &mut rng);

    let mut ores_inside = 0;
    for entry in mapping.entries() {
        if entry.block.name().ends_with("_ore") {
            assert!(
                bounds.contains(entry.position),
                "ore at {} escaped the chunk",
                entry.position
            );
            ores_inside += 1;
        }
    }
    // Both veins convert at least their starting block.
    assert!(ores_inside >= 1, "expected at least one ore conversion");

    // The neighboring chunk is untouched stone.
    for entry in mapping.entries() {
        if entry.position.x >= 16 {
            assert_eq!(entry.block, BlockSpec::stone());
        }
    }
}

#[test]
fn test_small_chunks_get_no_veins() {
    let mut mapping = Mapping::new();
    for x in 0..10 {
        stone_at(&mut mapping, Coordinate::new(x, 10, 0));
    }
    let chunk = ChunkCoord::new(0, 0);
    let bounds = Bounds::of_chunk(chunk, 0, 64);
    let mut rng = TerrainRng::from_seed(1);
    decorate_chunk(
        &mut mapping,
        chunk,
        &bounds,
        &SynthesisTuning::default(),
        &mut rng,
    );

    // 10 entries / 250 rounds down to zero veins.
    assert!(mapping
        .entries()
        .all(|entry| entry.block == BlockSpec::stone()));
}
