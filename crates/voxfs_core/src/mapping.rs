//! # The Mapping
//!
//! The authoritative position -> (block, file) table. Everything else in the
//! system either fills this table (synthesis), renders it (codec), or prunes
//! it (the sync loop).
//!
//! ## Invariants
//!
//! 1. At most one entry per position, enforced on insert
//! 2. The terrain bound always contains every mapped position
//! 3. Entries move or reclassify *through* this type, never by aliasing
//!
//! ## Persistence
//!
//! The whole table round-trips through an LZ4-compressed JSON snapshot so a
//! run can resume where the previous one stopped. Terrain bounds are
//! recomputed on load rather than persisted.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use serde::{Deserialize, Serialize};

use crate::block::BlockSpec;
use crate::bounds::Bounds;
use crate::coord::{ChunkCoord, Coordinate};
use crate::error::{CoreError, CoreResult};
use crate::file::FileHandle;

/// The central record: one file pinned to one voxel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Where the block lives.
    pub position: Coordinate,
    /// What the block is expected to be on disk.
    pub block: BlockSpec,
    /// The filesystem entry this block stands for.
    pub file: FileHandle,
}

/// The position -> entry table plus its live terrain bound.
#[derive(Debug, Default)]
pub struct Mapping {
    entries: HashMap<Coordinate, MappingEntry>,
    terrain: Option<Bounds>,
}

impl Mapping {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mapped positions.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is mapped.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the position is mapped.
    #[inline]
    #[must_use]
    pub fn contains(&self, position: Coordinate) -> bool {
        self.entries.contains_key(&position)
    }

    /// Looks up the entry at a position.
    #[inline]
    #[must_use]
    pub fn get(&self, position: Coordinate) -> Option<&MappingEntry> {
        self.entries.get(&position)
    }

    /// The block at a position, if any.
    #[inline]
    #[must_use]
    pub fn block_at(&self, position: Coordinate) -> Option<&BlockSpec> {
        self.entries.get(&position).map(|entry| &entry.block)
    }

    /// Smallest box containing every mapped position, if any.
    #[inline]
    #[must_use]
    pub fn terrain_bounds(&self) -> Option<&Bounds> {
        self.terrain.as_ref()
    }

    /// Inserts a new entry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicatePosition`] if the position is already
    /// mapped; the existing entry is left untouched.
    pub fn insert(&mut self, entry: MappingEntry) -> CoreResult<()> {
        let position = entry.position;
        match self.entries.entry(position) {
            Entry::Occupied(_) => Err(CoreError::DuplicatePosition(position)),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                self.grow_bounds(position);
                Ok(())
            }
        }
    }

    /// Removes and returns the entry at a position.
    ///
    /// The terrain bound is deliberately not shrunk; it only ever grows
    /// within a run and is recomputed on snapshot load.
    pub fn remove(&mut self, position: Coordinate) -> Option<MappingEntry> {
        self.entries.remove(&position)
    }

    /// Replaces the block of an existing entry in place.
    ///
    /// Returns false if the position is unmapped.
    pub fn reclassify(&mut self, position: Coordinate, block: BlockSpec) -> bool {
        match self.entries.get_mut(&position) {
            Some(entry) => {
                entry.block = block;
                true
            }
            None => false,
        }
    }

    /// Moves an entry to a new position, updating key and position field
    /// together.
    ///
    /// # Errors
    ///
    /// [`CoreError::MissingEntry`] if `from` is unmapped,
    /// [`CoreError::OccupiedTarget`] if `to` already holds an entry.
    pub fn relocate(&mut self, from: Coordinate, to: Coordinate) -> CoreResult<()> {
        if self.entries.contains_key(&to) {
            return Err(CoreError::OccupiedTarget(to));
        }
        let mut entry = self
            .entries
            .remove(&from)
            .ok_or(CoreError::MissingEntry(from))?;
        entry.position = to;
        self.entries.insert(to, entry);
        self.grow_bounds(to);
        Ok(())
    }

    /// Highest mapped Y in the column at `(x, z)`, the feature anchor.
    #[must_use]
    pub fn column_top(&self, x: i32, z: i32) -> Option<i32> {
        self.entries
            .keys()
            .filter(|position| position.x == x && position.z == z)
            .map(|position| position.y)
            .max()
    }

    /// Iterates all mapped positions.
    pub fn positions(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.entries.keys().copied()
    }

    /// Iterates all entries.
    pub fn entries(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.values()
    }

    /// Iterates the entries of one chunk.
    pub fn entries_in_chunk(&self, chunk: ChunkCoord) -> impl Iterator<Item = &MappingEntry> {
        self.entries
            .values()
            .filter(move |entry| ChunkCoord::from_position(entry.position) == chunk)
    }

    /// Recomputes the terrain bound from scratch.
    pub fn recompute_bounds(&mut self) {
        self.terrain = None;
        let positions: Vec<Coordinate> = self.entries.keys().copied().collect();
        for position in positions {
            self.grow_bounds(position);
        }
    }

    /// Writes the whole table as an LZ4-compressed JSON snapshot.
    ///
    /// # Errors
    ///
    /// Propagates serialization and file I/O failures.
    pub fn save_snapshot(&self, path: &Path) -> CoreResult<()> {
        let entries: Vec<&MappingEntry> = self.entries.values().collect();
        let json = serde_json::to_vec(&entries)
            .map_err(|error| CoreError::MalformedSnapshot(error.to_string()))?;
        let compressed = compress_prepend_size(&json);
        fs::write(path, compressed)?;
        Ok(())
    }

    /// Restores a mapping from a snapshot written by [`Self::save_snapshot`].
    ///
    /// Terrain bounds are recomputed from the loaded positions.
    ///
    /// # Errors
    ///
    /// [`CoreError::MalformedSnapshot`] for undecodable or duplicate-bearing
    /// snapshots; I/O errors for unreadable files. Both are fatal at startup.
    pub fn load_snapshot(path: &Path) -> CoreResult<Self> {
        let compressed = fs::read(path)?;
        let json = decompress_size_prepended(&compressed)
            .map_err(|error| CoreError::MalformedSnapshot(error.to_string()))?;
        let entries: Vec<MappingEntry> = serde_json::from_slice(&json)
            .map_err(|error| CoreError::MalformedSnapshot(error.to_string()))?;

        let mut mapping = Self::new();
        for entry in entries {
            mapping.insert(entry).map_err(|error| {
                CoreError::MalformedSnapshot(format!("snapshot violates uniqueness: {error}"))
            })?;
        }
        Ok(mapping)
    }

    fn grow_bounds(&mut self, position: Coordinate) {
        self.terrain = Some(match self.terrain {
            Some(bounds) => bounds.expanded(position),
            None => Bounds::point(position),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(x: i32, y: i32, z: i32) -> MappingEntry {
        MappingEntry {
            position: Coordinate::new(x, y, z),
            block: BlockSpec::grass_block(),
            file: FileHandle::new(PathBuf::from(format!("/data/f_{x}_{y}_{z}")), 42, 1),
        }
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut mapping = Mapping::new();
        mapping.insert(entry(1, 2, 3)).unwrap();
        let result = mapping.insert(entry(1, 2, 3));
        assert!(matches!(result, Err(CoreError::DuplicatePosition(_))));
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn test_terrain_bounds_grow_with_inserts() {
        let mut mapping = Mapping::new();
        mapping.insert(entry(0, 10, 0)).unwrap();
        mapping.insert(entry(5, 12, -3)).unwrap();
        let bounds = *mapping.terrain_bounds().unwrap();
        assert!(bounds.contains(Coordinate::new(0, 10, 0)));
        assert!(bounds.contains(Coordinate::new(5, 12, -3)));
        assert_eq!(bounds.min, Coordinate::new(0, 10, -3));
        assert_eq!(bounds.max, Coordinate::new(6, 13, 1));
    }

    #[test]
    fn test_relocate_moves_key_and_field() {
        let mut mapping = Mapping::new();
        mapping.insert(entry(0, 0, 0)).unwrap();
        mapping
            .relocate(Coordinate::new(0, 0, 0), Coordinate::new(1, 0, 0))
            .unwrap();
        assert!(!mapping.contains(Coordinate::new(0, 0, 0)));
        let moved = mapping.get(Coordinate::new(1, 0, 0)).unwrap();
        assert_eq!(moved.position, Coordinate::new(1, 0, 0));
    }

    #[test]
    fn test_relocate_refuses_occupied_target() {
        let mut mapping = Mapping::new();
        mapping.insert(entry(0, 0, 0)).unwrap();
        mapping.insert(entry(1, 0, 0)).unwrap();
        let result = mapping.relocate(Coordinate::new(0, 0, 0), Coordinate::new(1, 0, 0));
        assert!(matches!(result, Err(CoreError::OccupiedTarget(_))));
        assert!(mapping.contains(Coordinate::new(0, 0, 0)));
    }

    #[test]
    fn test_column_top() {
        let mut mapping = Mapping::new();
        mapping.insert(entry(4, 10, 4)).unwrap();
        mapping.insert(entry(4, 14, 4)).unwrap();
        mapping.insert(entry(4, 12, 5)).unwrap();
        assert_eq!(mapping.column_top(4, 4), Some(14));
        assert_eq!(mapping.column_top(4, 5), Some(12));
        assert_eq!(mapping.column_top(9, 9), None);
    }

    #[test]
    fn test_reclassify_in_place() {
        let mut mapping = Mapping::new();
        mapping.insert(entry(0, 0, 0)).unwrap();
        assert!(mapping.reclassify(Coordinate::new(0, 0, 0), BlockSpec::dirt()));
        assert_eq!(
            mapping.block_at(Coordinate::new(0, 0, 0)),
            Some(&BlockSpec::dirt())
        );
        assert!(!mapping.reclassify(Coordinate::new(9, 9, 9), BlockSpec::dirt()));
    }
}
