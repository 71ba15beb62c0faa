//! # VOXFS Anvil Codec
//!
//! Reads and rewrites the chunked, palette-compressed voxel storage format:
//! 1024-entry header table, 4 KiB-aligned sectors, zlib-compressed NBT chunk
//! payloads, 16x16x16 sections with packed block-state indices.
//!
//! ## Design Principles
//!
//! 1. **In-place**: encoding splices payloads into the sectors a chunk
//!    already owns; offsets and counts are never rewritten
//! 2. **Hash-gated**: decoding short-circuits when the still-compressed
//!    payload hashes to the caller's expected value
//! 3. **Tolerant**: corrupted chunks and oversized payloads are warnings,
//!    not errors - the run continues with prior bytes intact
//!
//! ## Core Components
//!
//! - `Tag`: minimal NBT tag tree with big-endian wire form
//! - `RegionBuffer`: one region file's raw bytes plus content hash
//! - `RegionCache`: filename-keyed buffer store shared across the run

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod nbt;
pub mod region;

pub use error::{AnvilError, AnvilResult};
pub use nbt::Tag;
pub use region::{
    pack_indices, unpack_indices, DecodeOutcome, EncodeOutcome, RegionBuffer, RegionCache,
    COMPRESSION_ZLIB, HEADER_BYTES, HEADER_ENTRIES, SECTOR_BYTES,
};
