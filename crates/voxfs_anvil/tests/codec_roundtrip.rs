//! # Codec Round-Trip Tests
//!
//! Proves an encode/decode cycle through a region buffer reproduces every
//! block spec exactly, that the hash short-circuit never touches the output
//! volume, and that corrupted or oversized chunks degrade to warnings.

use voxfs_anvil::{DecodeOutcome, EncodeOutcome, RegionBuffer};
use voxfs_core::{BlockSpec, BlockVolume, ChunkCoord, Coordinate, RegionCoord};

const MIN_Y: i32 = 0;
const MAX_Y: i32 = 64;

/// Distinct specs for palettes of any size up to 16: a few named blocks,
/// the rest property-varied leaves.
fn spec_set(count: usize) -> Vec<BlockSpec> {
    let named = [
        BlockSpec::grass_block(),
        BlockSpec::dirt(),
        BlockSpec::stone(),
        BlockSpec::water(),
        BlockSpec::oak_log().with_property("axis", "y"),
    ];
    (0..count)
        .map(|i| {
            named.get(i).cloned().unwrap_or_else(|| {
                BlockSpec::oak_leaves().with_property("distance", &(i - 4).to_string())
            })
        })
        .collect()
}

#[test]
fn test_roundtrip_every_palette_size_up_to_sixteen() {
    // Palette = air + up to 15 distinct specs; cover the full 4-bit range.
    for distinct in 1..=15usize {
        let mut buffer = RegionBuffer::formatted(RegionCoord::new(0, 0), 2, 0);
        let chunk = ChunkCoord::new(4, 4);
        let specs = spec_set(distinct);

        let mut volume = BlockVolume::new(chunk, MIN_Y, MAX_Y);
        let mut expected = Vec::new();
        for (i, spec) in specs.iter().enumerate() {
            let i = i as i32;
            let position = Coordinate::new(chunk.origin_x() + i, 10 + i, chunk.origin_z() + i);
            assert!(volume.set(position, spec.clone()));
            expected.push((position, spec.clone()));
        }

        assert_eq!(buffer.encode_chunk(chunk, &volume), EncodeOutcome::Written);

        let mut decoded = BlockVolume::new(chunk, MIN_Y, MAX_Y);
        let outcome = buffer.decode_chunk(chunk, &mut decoded, None);
        assert!(
            matches!(outcome, DecodeOutcome::Decoded { .. }),
            "palette size {} failed to decode",
            distinct + 1
        );

        for (position, spec) in &expected {
            assert_eq!(
                decoded.get(*position),
                Some(spec),
                "palette size {}: mismatch at {position}",
                distinct + 1
            );
        }
        assert_eq!(decoded.occupied(), expected.len());
    }
}

#[test]
fn test_state_properties_survive_roundtrip() {
    let mut buffer = RegionBuffer::formatted(RegionCoord::new(0, 0), 2, 0);
    let chunk = ChunkCoord::new(0, 0);
    let spec = BlockSpec::oak_leaves()
        .with_property("persistent", "true")
        .with_property("distance", "3");

    let mut volume = BlockVolume::new(chunk, MIN_Y, MAX_Y);
    let position = Coordinate::new(5, 20, 5);
    volume.set(position, spec.clone());
    assert_eq!(buffer.encode_chunk(chunk, &volume), EncodeOutcome::Written);

    let mut decoded = BlockVolume::new(chunk, MIN_Y, MAX_Y);
    assert!(matches!(
        buffer.decode_chunk(chunk, &mut decoded, None),
        DecodeOutcome::Decoded { .. }
    ));
    assert_eq!(decoded.get(position), Some(&spec));
}

#[test]
fn test_hash_short_circuit_skips_decompression() {
    let mut buffer = RegionBuffer::formatted(RegionCoord::new(0, 0), 2, 0);
    let chunk = ChunkCoord::new(1, 1);

    let mut volume = BlockVolume::new(chunk, MIN_Y, MAX_Y);
    volume.set(Coordinate::new(20, 5, 20), BlockSpec::stone());
    assert_eq!(buffer.encode_chunk(chunk, &volume), EncodeOutcome::Written);

    let mut first = BlockVolume::new(chunk, MIN_Y, MAX_Y);
    let DecodeOutcome::Decoded { hash } = buffer.decode_chunk(chunk, &mut first, None) else {
        panic!("first decode must produce a hash");
    };

    // Same bytes + matching expected hash: sentinel, volume untouched.
    let mut second = BlockVolume::new(chunk, MIN_Y, MAX_Y);
    assert_eq!(
        buffer.decode_chunk(chunk, &mut second, Some(hash)),
        DecodeOutcome::Unchanged
    );
    assert_eq!(second.occupied(), 0);

    // A stale hash decodes normally again.
    let mut third = BlockVolume::new(chunk, MIN_Y, MAX_Y);
    assert!(matches!(
        buffer.decode_chunk(chunk, &mut third, Some(hash.wrapping_add(1))),
        DecodeOutcome::Decoded { .. }
    ));
    assert_eq!(third.occupied(), 1);
}

#[test]
fn test_corrupted_chunk_returns_sentinel() {
    let buffer = RegionBuffer::formatted(RegionCoord::new(0, 0), 1, 0);
    let chunk = ChunkCoord::new(2, 2);

    // Garble the chunk's compressed payload in place.
    let mut bytes = buffer.bytes().to_vec();
    let entry = chunk.header_index() * 4;
    let sector = ((bytes[entry] as usize) << 16)
        | ((bytes[entry + 1] as usize) << 8)
        | (bytes[entry + 2] as usize);
    let offset = sector * 4096;
    for byte in &mut bytes[offset + 5..offset + 40] {
        *byte = 0xAB;
    }
    let corrupted = RegionBuffer::from_bytes(RegionCoord::new(0, 0), bytes).unwrap();

    let mut volume = BlockVolume::new(chunk, MIN_Y, MAX_Y);
    assert_eq!(
        corrupted.decode_chunk(chunk, &mut volume, None),
        DecodeOutcome::Unchanged
    );
    // Neighboring chunks still decode.
    let other = ChunkCoord::new(3, 3);
    let mut other_volume = BlockVolume::new(other, MIN_Y, MAX_Y);
    assert!(matches!(
        corrupted.decode_chunk(other, &mut other_volume, None),
        DecodeOutcome::Decoded { .. }
    ));
}

#[test]
fn test_oversized_payload_keeps_prior_bytes() {
    // One sector per chunk and a worst-case section: 4096 cells with a
    // large, incompressible palette cannot fit in 4096 bytes.
    let mut buffer = RegionBuffer::formatted(RegionCoord::new(0, 0), 1, 0);
    let chunk = ChunkCoord::new(5, 5);

    let mut volume = BlockVolume::new(chunk, MIN_Y, MAX_Y);
    let mut n = 0u32;
    for y in MIN_Y..MAX_Y {
        for z in 0..16 {
            for x in 0..16 {
                n = n.wrapping_mul(0x9E37_79B9).wrapping_add(0x85EB_CA6B);
                let spec = BlockSpec::stone().with_property("v", &format!("{n:08x}"));
                volume.set(
                    Coordinate::new(chunk.origin_x() + x, y, chunk.origin_z() + z),
                    spec,
                );
            }
        }
    }

    let before = buffer.bytes().to_vec();
    assert_eq!(buffer.encode_chunk(chunk, &volume), EncodeOutcome::Oversized);
    assert_eq!(buffer.bytes(), before.as_slice(), "prior bytes must survive");

    // The chunk still decodes to its prior (empty) content.
    let mut decoded = BlockVolume::new(chunk, MIN_Y, MAX_Y);
    assert!(matches!(
        buffer.decode_chunk(chunk, &mut decoded, None),
        DecodeOutcome::Decoded { .. }
    ));
    assert_eq!(decoded.occupied(), 0);
}

#[test]
fn test_missing_chunk_slot() {
    // A zeroed header entry means the chunk was never allocated.
    let mut bytes = RegionBuffer::formatted(RegionCoord::new(0, 0), 1, 0)
        .bytes()
        .to_vec();
    let chunk = ChunkCoord::new(9, 9);
    let entry = chunk.header_index() * 4;
    bytes[entry..entry + 4].fill(0);
    let buffer = RegionBuffer::from_bytes(RegionCoord::new(0, 0), bytes).unwrap();

    let mut volume = BlockVolume::new(chunk, MIN_Y, MAX_Y);
    assert_eq!(
        buffer.decode_chunk(chunk, &mut volume, None),
        DecodeOutcome::Missing
    );
}

#[test]
fn test_encode_updates_content_hash() {
    let mut buffer = RegionBuffer::formatted(RegionCoord::new(0, 0), 2, 0);
    let chunk = ChunkCoord::new(7, 7);
    let before = buffer.content_hash();

    let mut volume = BlockVolume::new(chunk, MIN_Y, MAX_Y);
    volume.set(Coordinate::new(7 * 16, 1, 7 * 16), BlockSpec::dirt());
    assert_eq!(buffer.encode_chunk(chunk, &volume), EncodeOutcome::Written);

    assert_ne!(buffer.content_hash(), before);
    assert_eq!(buffer.content_hash(), crc32fast::hash(buffer.bytes()));
}
