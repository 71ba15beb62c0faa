//! # Coordinate Model
//!
//! Block positions, the 6 axis-aligned unit shifts, and the chunk/region
//! arithmetic everything else is built on.
//!
//! ## Grid Hierarchy
//!
//! - A **chunk** is a 16x16 horizontal column of full world height.
//! - A **region** is a 32x32 grid of chunks, one `.mca` file on disk.
//!
//! Conversions use `div_euclid` so negative coordinates land in the correct
//! chunk (block -1 is in chunk -1, not chunk 0).

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Chunk width/depth in blocks.
pub const CHUNK_SIZE: i32 = 16;

/// Region width/depth in chunks.
pub const REGION_CHUNKS: i32 = 32;

/// A block position in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// World X (east positive).
    pub x: i32,
    /// World Y (up positive).
    pub y: i32,
    /// World Z (south positive).
    pub z: i32,
}

impl Coordinate {
    /// Creates a new coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns this coordinate shifted one block in the given direction.
    #[inline]
    #[must_use]
    pub const fn shifted(self, direction: Direction) -> Self {
        let (dx, dy, dz) = direction.offset();
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// Converts to a chunk-relative coordinate given the owning chunk.
    ///
    /// The result has `x` and `z` in `0..16`; `y` is unchanged.
    #[inline]
    #[must_use]
    pub const fn relative_to(self, chunk: ChunkCoord) -> Self {
        Self {
            x: self.x - chunk.origin_x(),
            y: self.y,
            z: self.z - chunk.origin_z(),
        }
    }

    /// Reconstructs an absolute coordinate from a chunk-relative one.
    #[inline]
    #[must_use]
    pub const fn from_relative(chunk: ChunkCoord, relative: Self) -> Self {
        Self {
            x: chunk.origin_x() + relative.x,
            y: relative.y,
            z: chunk.origin_z() + relative.z,
        }
    }

    /// Canonical display key, `"x y z"`.
    ///
    /// Used for logs and progress lines only; in-memory lookups hash the
    /// integer triple directly.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{} {} {}", self.x, self.y, self.z)
    }
}

impl Add for Coordinate {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

/// The 6 axis-aligned unit shifts, indexed 0-5.
///
/// The order is fixed everywhere: east, west, south, north, up, down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// +X.
    East = 0,
    /// -X.
    West = 1,
    /// +Z.
    South = 2,
    /// -Z.
    North = 3,
    /// +Y.
    Up = 4,
    /// -Y.
    Down = 5,
}

impl Direction {
    /// All 6 directions in index order.
    pub const ALL: [Self; 6] = [
        Self::East,
        Self::West,
        Self::South,
        Self::North,
        Self::Up,
        Self::Down,
    ];

    /// The 4 horizontal directions in index order.
    pub const HORIZONTAL: [Self; 4] = [Self::East, Self::West, Self::South, Self::North];

    /// Unit offset of this direction.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Self::East => (1, 0, 0),
            Self::West => (-1, 0, 0),
            Self::South => (0, 0, 1),
            Self::North => (0, 0, -1),
            Self::Up => (0, 1, 0),
            Self::Down => (0, -1, 0),
        }
    }
}

/// A chunk coordinate (in chunks, not blocks).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// X coordinate in chunks.
    pub x: i32,
    /// Z coordinate in chunks.
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Returns the chunk containing a block position.
    #[inline]
    #[must_use]
    pub const fn from_position(position: Coordinate) -> Self {
        Self {
            x: position.x.div_euclid(CHUNK_SIZE),
            z: position.z.div_euclid(CHUNK_SIZE),
        }
    }

    /// World X of the chunk's origin corner.
    #[inline]
    #[must_use]
    pub const fn origin_x(self) -> i32 {
        self.x * CHUNK_SIZE
    }

    /// World Z of the chunk's origin corner.
    #[inline]
    #[must_use]
    pub const fn origin_z(self) -> i32 {
        self.z * CHUNK_SIZE
    }

    /// Returns the region this chunk belongs to.
    #[inline]
    #[must_use]
    pub const fn region(self) -> RegionCoord {
        RegionCoord {
            x: self.x.div_euclid(REGION_CHUNKS),
            z: self.z.div_euclid(REGION_CHUNKS),
        }
    }

    /// Index of this chunk within its region's 1024-entry header table.
    #[inline]
    #[must_use]
    pub const fn header_index(self) -> usize {
        let lx = self.x.rem_euclid(REGION_CHUNKS);
        let lz = self.z.rem_euclid(REGION_CHUNKS);
        (lx + lz * REGION_CHUNKS) as usize
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.z)
    }
}

/// A region coordinate (in regions, not chunks or blocks).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RegionCoord {
    /// X coordinate in regions.
    pub x: i32,
    /// Z coordinate in regions.
    pub z: i32,
}

impl RegionCoord {
    /// Creates a new region coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk X of the region's first chunk.
    #[inline]
    #[must_use]
    pub const fn origin_chunk_x(self) -> i32 {
        self.x * REGION_CHUNKS
    }

    /// Chunk Z of the region's first chunk.
    #[inline]
    #[must_use]
    pub const fn origin_chunk_z(self) -> i32 {
        self.z * REGION_CHUNKS
    }

    /// Returns true if the given chunk lies inside this region.
    #[inline]
    #[must_use]
    pub const fn contains_chunk(self, chunk: ChunkCoord) -> bool {
        chunk.x.div_euclid(REGION_CHUNKS) == self.x && chunk.z.div_euclid(REGION_CHUNKS) == self.z
    }

    /// On-disk file name, `r.{x}.{z}.mca`.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("r.{}.{}.mca", self.x, self.z)
    }
}

impl fmt::Display for RegionCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.z)
    }
}
