//! # Smoothing Pass
//!
//! Relocates "lonely" ground blocks toward better-connected cells so the
//! terrain stops looking like scattered single-voxel stubs. One call is one
//! pass; the caller repeats until a pass makes zero swaps.
//!
//! Moves never cross the chunk's horizontal bounds or the world's vertical
//! bounds, never land on occupied cells, and abort outright when a candidate
//! touches water - that conservatism is deliberate and includes discarding
//! non-water candidates already found for the entry.

use voxfs_core::{BlockSpec, Bounds, ChunkCoord, Coordinate, Direction, Mapping, MappingEntry};

/// Runs one smoothing pass over a chunk and returns the swap count.
///
/// `bounds` must be the chunk's box over the world's vertical range.
/// Only ground-classified blocks participate; trees, leaves, water, and
/// vegetation cover are exempt.
pub fn smooth_chunk(mapping: &mut Mapping, chunk: ChunkCoord, bounds: &Bounds) -> usize {
    let positions: Vec<Coordinate> = mapping
        .entries_in_chunk(chunk)
        .map(|entry| entry.position)
        .collect();

    let mut swaps = 0;
    for position in positions {
        let Some(entry) = mapping.get(position) else {
            // Already relocated out from under us this pass.
            continue;
        };
        if !entry.block.is_ground() {
            continue;
        }

        let original_count = neighbor_count(mapping, position);

        // Vacate so candidate counting never sees the entry itself.
        let Some(vacated) = mapping.remove(position) else {
            continue;
        };

        let mut best: Option<(Coordinate, usize)> = None;
        let mut water_stop = false;
        for direction in Direction::ALL {
            let candidate = position.shifted(direction);
            if !bounds.contains(candidate) {
                continue;
            }
            if mapping.contains(candidate) {
                continue;
            }
            if touches_water(mapping, candidate) {
                water_stop = true;
                break;
            }
            let count = neighbor_count(mapping, candidate);
            let threshold = best.map_or(original_count, |(_, best_count)| best_count);
            if count > threshold {
                best = Some((candidate, count));
            }
        }

        if water_stop {
            put_back(mapping, vacated);
            continue;
        }

        match best {
            Some((target, _)) => {
                let mut moved = vacated;
                moved.position = target;
                put_back(mapping, moved);
                swaps += 1;
            }
            None => {
                put_back(mapping, vacated);
                // A stub with one neighbor resting on grass becomes
                // vegetation cover instead of a full block.
                if original_count == 1
                    && mapping.block_at(position.shifted(Direction::Down))
                        == Some(&BlockSpec::grass_block())
                {
                    mapping.reclassify(position, BlockSpec::short_grass());
                }
            }
        }
    }
    swaps
}

/// Mapped neighbors among the 6 axis directions.
fn neighbor_count(mapping: &Mapping, position: Coordinate) -> usize {
    Direction::ALL
        .iter()
        .filter(|direction| mapping.contains(position.shifted(**direction)))
        .count()
}

/// True if any of the 6 neighbors is water.
fn touches_water(mapping: &Mapping, position: Coordinate) -> bool {
    Direction::ALL.iter().any(|direction| {
        mapping
            .block_at(position.shifted(*direction))
            .is_some_and(BlockSpec::is_water)
    })
}

/// Reinserts an entry into a slot that was just vacated.
fn put_back(mapping: &mut Mapping, entry: MappingEntry) {
    if mapping.insert(entry).is_err() {
        debug_assert!(false, "vacated slot was occupied");
    }
}
