//! # Chunk Iteration
//!
//! Visits every distinct chunk present in the mapping exactly once, yielding
//! a dense volume plus the chunk's entries. The mapping may grow (tree and
//! pond resolution) or shrink (divergence reconciliation) *during* a pass,
//! so the walk keeps an explicit pending set of position keys - decoupled
//! from the entries themselves - and re-prunes it after every callback.

use std::collections::HashSet;

use crate::bounds::Bounds;
use crate::coord::{ChunkCoord, Coordinate, RegionCoord};
use crate::error::CoreResult;
use crate::mapping::Mapping;
use crate::volume::BlockVolume;

/// One chunk's worth of work, as yielded by the walk.
#[derive(Debug)]
pub struct ChunkView {
    /// Dense air-filled rendering of the chunk's current entries.
    pub volume: BlockVolume,
    /// Positions of the entries belonging to this chunk at visit time.
    pub positions: Vec<Coordinate>,
    /// The chunk's identity.
    pub chunk: ChunkCoord,
    /// Absolute bounds of the chunk over the walked Y range.
    pub bounds: Bounds,
}

/// A resumable two-phase walk over the mapping's chunks.
///
/// Construction marks every eligible position as pending; each
/// [`Self::next_chunk`] call fixes a chunk from any still-pending position,
/// un-marks that chunk's positions, and renders the chunk. Callers that
/// mutate the mapping between calls get consistent behavior because the
/// pending set is pruned against the live mapping on every call.
#[derive(Debug)]
pub struct ChunkWalk {
    pending: HashSet<Coordinate>,
    min_y: i32,
    max_y: i32,
}

impl ChunkWalk {
    /// Marks every mapped position as pending, optionally restricted to one
    /// region.
    #[must_use]
    pub fn new(mapping: &Mapping, min_y: i32, max_y: i32, region: Option<RegionCoord>) -> Self {
        let pending = mapping
            .positions()
            .filter(|position| match region {
                Some(region) => region.contains_chunk(ChunkCoord::from_position(*position)),
                None => true,
            })
            .collect();
        Self {
            pending,
            min_y,
            max_y,
        }
    }

    /// Number of positions still awaiting a visit.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Produces the next unvisited chunk, or `None` when the walk is done.
    pub fn next_chunk(&mut self, mapping: &Mapping) -> Option<ChunkView> {
        // Entries removed since the last call must not resurrect a chunk.
        self.pending.retain(|position| mapping.contains(*position));

        let seed = self.pending.iter().next().copied()?;
        let chunk = ChunkCoord::from_position(seed);
        self.pending
            .retain(|position| ChunkCoord::from_position(*position) != chunk);

        let mut volume = BlockVolume::new(chunk, self.min_y, self.max_y);
        let mut positions = Vec::new();
        for entry in mapping.entries_in_chunk(chunk) {
            volume.set(entry.position, entry.block.clone());
            positions.push(entry.position);
        }

        Some(ChunkView {
            volume,
            positions,
            chunk,
            bounds: Bounds::of_chunk(chunk, self.min_y, self.max_y),
        })
    }
}

/// Runs a full walk, invoking the callback once per chunk.
///
/// # Errors
///
/// Stops at and propagates the first callback error.
pub fn for_each_chunk<F>(
    mapping: &mut Mapping,
    min_y: i32,
    max_y: i32,
    region: Option<RegionCoord>,
    mut callback: F,
) -> CoreResult<()>
where
    F: FnMut(&mut Mapping, ChunkView) -> CoreResult<()>,
{
    let mut walk = ChunkWalk::new(mapping, min_y, max_y, region);
    while let Some(view) = walk.next_chunk(mapping) {
        callback(mapping, view)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockSpec;
    use crate::file::FileHandle;
    use crate::mapping::MappingEntry;
    use std::path::PathBuf;

    fn entry(x: i32, y: i32, z: i32) -> MappingEntry {
        MappingEntry {
            position: Coordinate::new(x, y, z),
            block: BlockSpec::grass_block(),
            file: FileHandle::new(PathBuf::from(format!("/data/f_{x}_{y}_{z}")), 7, 1),
        }
    }

    #[test]
    fn test_each_chunk_visited_exactly_once() {
        let mut mapping = Mapping::new();
        mapping.insert(entry(0, 5, 0)).unwrap();
        mapping.insert(entry(3, 5, 3)).unwrap();
        mapping.insert(entry(20, 5, 0)).unwrap();
        mapping.insert(entry(-1, 5, -1)).unwrap();

        let mut seen = Vec::new();
        for_each_chunk(&mut mapping, 0, 64, None, |_, view| {
            seen.push(view.chunk);
            Ok(())
        })
        .unwrap();

        seen.sort_by_key(|chunk| (chunk.x, chunk.z));
        assert_eq!(
            seen,
            vec![
                ChunkCoord::new(-1, -1),
                ChunkCoord::new(0, 0),
                ChunkCoord::new(1, 0)
            ]
        );
    }

    #[test]
    fn test_region_restriction() {
        let mut mapping = Mapping::new();
        mapping.insert(entry(0, 5, 0)).unwrap();
        mapping.insert(entry(-1, 5, 0)).unwrap();

        let mut seen = Vec::new();
        for_each_chunk(
            &mut mapping,
            0,
            64,
            Some(RegionCoord::new(0, 0)),
            |_, view| {
                seen.push(view.chunk);
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(seen, vec![ChunkCoord::new(0, 0)]);
    }

    #[test]
    fn test_volume_reflects_entries() {
        let mut mapping = Mapping::new();
        mapping.insert(entry(2, 9, 2)).unwrap();
        for_each_chunk(&mut mapping, 0, 64, None, |_, view| {
            assert_eq!(
                view.volume.get(Coordinate::new(2, 9, 2)),
                Some(&BlockSpec::grass_block())
            );
            assert_eq!(view.positions, vec![Coordinate::new(2, 9, 2)]);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_mutation_during_walk_is_tolerated() {
        let mut mapping = Mapping::new();
        mapping.insert(entry(0, 5, 0)).unwrap();
        mapping.insert(entry(40, 5, 40)).unwrap();

        // The callback removes the *other* chunk's entry on the first visit;
        // the walk must not visit the now-empty chunk.
        let mut visits = 0;
        for_each_chunk(&mut mapping, 0, 64, None, |mapping, view| {
            visits += 1;
            let other = if view.chunk == ChunkCoord::new(0, 0) {
                Coordinate::new(40, 5, 40)
            } else {
                Coordinate::new(0, 5, 0)
            };
            mapping.remove(other);
            Ok(())
        })
        .unwrap();
        assert_eq!(visits, 1);
        assert_eq!(mapping.len(), 1);
    }
}
