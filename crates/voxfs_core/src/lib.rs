//! # VOXFS Core
//!
//! The spatial model and the mapping: every file the scanner finds is pinned
//! to exactly one voxel position, and this crate owns that table.
//!
//! ## Design Principles
//!
//! 1. **One entry per position**: the mapping rejects duplicate positions
//! 2. **Integer keys**: positions are hashed as `(x, y, z)` triples, never as
//!    formatted strings
//! 3. **Restorable**: the whole mapping round-trips through a compressed
//!    snapshot across runs
//!
//! ## Core Components
//!
//! - `Coordinate` / `Direction`: block positions and the 6 axis shifts
//! - `BlockSpec`: canonical block names plus sorted state properties
//! - `Mapping`: the position -> (block, file) table with live terrain bounds
//! - `BlockVolume`: a dense, air-filled chunk-footprint grid
//! - `ChunkWalk`: the two-phase chunk iterator that tolerates mutation

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod block;
pub mod bounds;
pub mod chunks;
pub mod coord;
pub mod error;
pub mod file;
pub mod mapping;
pub mod volume;

pub use block::BlockSpec;
pub use bounds::Bounds;
pub use chunks::{for_each_chunk, ChunkView, ChunkWalk};
pub use coord::{ChunkCoord, Coordinate, Direction, RegionCoord, CHUNK_SIZE, REGION_CHUNKS};
pub use error::{CoreError, CoreResult};
pub use file::FileHandle;
pub use mapping::{Mapping, MappingEntry};
pub use volume::BlockVolume;
