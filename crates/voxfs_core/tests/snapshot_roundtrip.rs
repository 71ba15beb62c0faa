//! # Snapshot Round-Trip Test
//!
//! Proves the mapping survives a save/load cycle bit-for-bit and that
//! malformed snapshots fail loudly at startup instead of loading garbage.

use std::path::PathBuf;

use voxfs_core::{BlockSpec, Coordinate, CoreError, FileHandle, Mapping, MappingEntry};

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("voxfs_core_{}_{name}", std::process::id()))
}

fn sample_mapping() -> Mapping {
    let mut mapping = Mapping::new();
    let blocks = [
        BlockSpec::grass_block(),
        BlockSpec::dirt(),
        BlockSpec::water(),
        BlockSpec::oak_log().with_property("axis", "y"),
    ];
    for (i, block) in blocks.iter().enumerate() {
        let i = i as i32;
        mapping
            .insert(MappingEntry {
                position: Coordinate::new(i * 3, 10 + i, -i),
                block: block.clone(),
                file: FileHandle::new(PathBuf::from(format!("/scan/root/g/{i}.bin")), 100, 2),
            })
            .unwrap();
    }
    mapping
}

#[test]
fn test_snapshot_roundtrip_preserves_entries_and_bounds() {
    let path = scratch_path("roundtrip.snapshot");
    let original = sample_mapping();
    original.save_snapshot(&path).unwrap();

    let restored = Mapping::load_snapshot(&path).unwrap();
    assert_eq!(restored.len(), original.len());
    for entry in original.entries() {
        assert_eq!(restored.get(entry.position), Some(entry));
    }
    // Bounds are recomputed on load, not persisted.
    assert_eq!(restored.terrain_bounds(), original.terrain_bounds());

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_malformed_snapshot_is_a_fatal_error() {
    let path = scratch_path("garbage.snapshot");
    std::fs::write(&path, b"this is not a snapshot").unwrap();

    let result = Mapping::load_snapshot(&path);
    assert!(matches!(result, Err(CoreError::MalformedSnapshot(_))));

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_missing_snapshot_surfaces_io_error() {
    let path = scratch_path("does_not_exist.snapshot");
    let result = Mapping::load_snapshot(&path);
    assert!(matches!(result, Err(CoreError::Io(_))));
}
