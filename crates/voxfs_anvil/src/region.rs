//! # Region File Codec
//!
//! A region file is a 1024-entry header table of (3-byte sector offset,
//! 1-byte sector count) pairs followed by 4 KiB-aligned chunk payloads. Each
//! payload is a 4-byte big-endian length, a 1-byte compression marker, and a
//! zlib stream holding the chunk's NBT tag tree.
//!
//! ## Sections and palettes
//!
//! Block data lives in 16x16x16 sections. Each section carries a palette of
//! distinct block specifications and, when the palette holds more than one
//! entry, a packed array of fixed-width indices: width = bits needed to
//! address the palette (minimum 4), `64 / width` indices per 64-bit word,
//! never straddling words. Index 0 is the implied sole occupant when the
//! array is absent.
//!
//! ## Rewrite discipline
//!
//! Encoding splices into the sectors the chunk already owns. A payload that
//! no longer fits is dropped with a warning and the prior bytes stay - stale
//! but never corrupt. Offsets and counts are never rewritten.

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use tracing::warn;

use voxfs_core::{
    BlockSpec, BlockVolume, ChunkCoord, Coordinate, RegionCoord, CHUNK_SIZE, REGION_CHUNKS,
};

use crate::error::{AnvilError, AnvilResult};
use crate::nbt::Tag;

/// Bytes per sector; payloads are aligned and padded to this.
pub const SECTOR_BYTES: usize = 4096;

/// Entries in the header's location table, one per chunk.
pub const HEADER_ENTRIES: usize = 1024;

/// Header size: location table plus timestamp table.
pub const HEADER_BYTES: usize = 2 * SECTOR_BYTES;

/// Compression scheme marker for zlib, the only scheme written.
pub const COMPRESSION_ZLIB: u8 = 2;

/// Blocks per section edge and cells per section.
const SECTION_CELLS: usize = 4096;

/// Minimum packed-index width in bits.
const MIN_INDEX_BITS: u32 = 4;

/// Data version stamped into freshly formatted chunks.
const FORMAT_DATA_VERSION: i32 = 3465;

/// Outcome of a chunk decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// The compressed payload matched the caller's expected hash, or the
    /// chunk was corrupted; the output volume was not (usably) touched.
    Unchanged,
    /// The header allocates no sectors for this chunk.
    Missing,
    /// The volume was filled; `hash` covers the still-compressed payload.
    Decoded {
        /// crc32 of the chunk's compressed bytes, for the next early exit.
        hash: u32,
    },
}

/// Outcome of a chunk encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// New payload spliced into the chunk's sectors.
    Written,
    /// New payload would overflow the allocated sectors; prior bytes kept.
    Oversized,
    /// No allocated sectors or unparseable prior payload; nothing written.
    Skipped,
}

/// One region file's raw bytes, content-hashed.
#[derive(Debug)]
pub struct RegionBuffer {
    region: RegionCoord,
    bytes: Vec<u8>,
    hash: u32,
    dirty: bool,
}

impl RegionBuffer {
    /// Wraps bytes read from disk.
    ///
    /// # Errors
    ///
    /// [`AnvilError::Truncated`] if the bytes cannot hold the header table.
    pub fn from_bytes(region: RegionCoord, bytes: Vec<u8>) -> AnvilResult<Self> {
        if bytes.len() < HEADER_BYTES {
            return Err(AnvilError::Truncated {
                len: bytes.len(),
                expected: HEADER_BYTES,
            });
        }
        let hash = crc32fast::hash(&bytes);
        Ok(Self {
            region,
            bytes,
            hash,
            dirty: false,
        })
    }

    /// Builds a fresh, fully allocated region image.
    ///
    /// Every chunk gets `sectors_per_chunk` sectors holding a minimal
    /// payload with an empty section list, so later encodes always find a
    /// pre-allocated slot. `min_section_y` is the lowest section index the
    /// format version stores.
    #[must_use]
    pub fn formatted(region: RegionCoord, sectors_per_chunk: u8, min_section_y: i32) -> Self {
        let per_chunk = sectors_per_chunk.max(1) as usize;
        let mut bytes = vec![0u8; HEADER_BYTES + HEADER_ENTRIES * per_chunk * SECTOR_BYTES];

        for index in 0..HEADER_ENTRIES {
            let chunk_x = region.origin_chunk_x() + (index as i32 % REGION_CHUNKS);
            let chunk_z = region.origin_chunk_z() + (index as i32 / REGION_CHUNKS);
            let payload = deflate(&empty_chunk_tree(chunk_x, chunk_z, min_section_y));

            let sector = 2 + index * per_chunk;
            let entry = index * 4;
            bytes[entry] = ((sector >> 16) & 0xFF) as u8;
            bytes[entry + 1] = ((sector >> 8) & 0xFF) as u8;
            bytes[entry + 2] = (sector & 0xFF) as u8;
            bytes[entry + 3] = sectors_per_chunk.max(1);

            let offset = sector * SECTOR_BYTES;
            splice_payload(&mut bytes, offset, &payload);
        }

        let hash = crc32fast::hash(&bytes);
        Self {
            region,
            bytes,
            hash,
            dirty: true,
        }
    }

    /// The region this buffer images.
    #[inline]
    #[must_use]
    pub const fn region(&self) -> RegionCoord {
        self.region
    }

    /// The raw file image.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// crc32 of the current file image.
    #[inline]
    #[must_use]
    pub const fn content_hash(&self) -> u32 {
        self.hash
    }

    /// True if the buffer has mutations not yet flushed to disk.
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the buffer flushed.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Decodes one chunk into the volume.
    ///
    /// When `expected_hash` matches the crc32 of the chunk's still-compressed
    /// bytes, decompression is skipped entirely and [`DecodeOutcome::Unchanged`]
    /// is returned without touching the volume. A corrupted chunk logs a
    /// warning and also returns `Unchanged` - never an error.
    #[must_use]
    pub fn decode_chunk(
        &self,
        chunk: ChunkCoord,
        volume: &mut BlockVolume,
        expected_hash: Option<u32>,
    ) -> DecodeOutcome {
        if !self.region.contains_chunk(chunk) {
            return DecodeOutcome::Missing;
        }
        let Some((offset, _sectors)) = self.slot(chunk) else {
            return DecodeOutcome::Missing;
        };
        let Some((compressed, marker)) = self.payload_at(offset) else {
            warn!("chunk ({chunk}) has a malformed payload header, skipping");
            return DecodeOutcome::Unchanged;
        };

        let hash = crc32fast::hash(compressed);
        if expected_hash == Some(hash) {
            return DecodeOutcome::Unchanged;
        }
        if marker != COMPRESSION_ZLIB {
            warn!("chunk ({chunk}) uses unsupported compression {marker}, skipping");
            return DecodeOutcome::Unchanged;
        }

        let raw = match inflate(compressed) {
            Ok(raw) => raw,
            Err(error) => {
                warn!("chunk ({chunk}) failed to decompress: {error}, skipping");
                return DecodeOutcome::Unchanged;
            }
        };
        let root = match Tag::read_root(&raw) {
            Ok(root) => root,
            Err(error) => {
                warn!("chunk ({chunk}) has a corrupt tag tree: {error}, skipping");
                return DecodeOutcome::Unchanged;
            }
        };

        match fill_volume_from_chunk(&root, chunk, volume) {
            Ok(()) => DecodeOutcome::Decoded { hash },
            Err(error) => {
                warn!("chunk ({chunk}) has corrupt section data: {error}, skipping");
                DecodeOutcome::Unchanged
            }
        }
    }

    /// Re-encodes one chunk from the volume, splicing in place.
    ///
    /// Sections intersecting the volume's Y range are rebuilt from scratch;
    /// any other sections in the prior payload are preserved. A payload that
    /// would overflow the chunk's allocated sectors is dropped with a
    /// warning, leaving the prior bytes untouched.
    pub fn encode_chunk(&mut self, chunk: ChunkCoord, volume: &BlockVolume) -> EncodeOutcome {
        if !self.region.contains_chunk(chunk) {
            warn!("chunk ({chunk}) does not belong to region ({})", self.region);
            return EncodeOutcome::Skipped;
        }
        let Some((offset, sectors)) = self.slot(chunk) else {
            warn!("chunk ({chunk}) has no allocated sectors, cannot encode");
            return EncodeOutcome::Skipped;
        };
        let Some((compressed, _marker)) = self.payload_at(offset) else {
            warn!("chunk ({chunk}) has a malformed payload header, cannot encode");
            return EncodeOutcome::Skipped;
        };

        let mut root = match inflate(compressed).and_then(|raw| Tag::read_root(&raw)) {
            Ok(root) => root,
            Err(error) => {
                warn!("chunk ({chunk}) prior payload unreadable: {error}, cannot encode");
                return EncodeOutcome::Skipped;
            }
        };

        rebuild_sections(&mut root, chunk, volume);

        let mut raw = Vec::new();
        if let Err(error) = root.write_root(&mut raw) {
            warn!("chunk ({chunk}) failed to serialize: {error}");
            return EncodeOutcome::Skipped;
        }
        let payload = deflate(&raw);

        let allocated = sectors * SECTOR_BYTES;
        if 5 + payload.len() > allocated {
            warn!(
                "chunk ({chunk}) payload {} bytes exceeds its {} allocated bytes, keeping prior data",
                5 + payload.len(),
                allocated
            );
            return EncodeOutcome::Oversized;
        }

        splice_payload(&mut self.bytes, offset, &payload);
        // Zero the slack so stale trailing bytes never resurface.
        let written = offset + 5 + payload.len();
        self.bytes[written..offset + allocated].fill(0);

        self.hash = crc32fast::hash(&self.bytes);
        self.dirty = true;
        EncodeOutcome::Written
    }

    /// Header slot of a chunk: byte offset and allocated sector count.
    fn slot(&self, chunk: ChunkCoord) -> Option<(usize, usize)> {
        let entry = chunk.header_index() * 4;
        let table = &self.bytes[..HEADER_BYTES / 2];
        let offset_sectors = ((table[entry] as usize) << 16)
            | ((table[entry + 1] as usize) << 8)
            | (table[entry + 2] as usize);
        let sectors = table[entry + 3] as usize;
        if offset_sectors < 2 || sectors == 0 {
            return None;
        }
        let offset = offset_sectors * SECTOR_BYTES;
        // A slot whose allocation runs past the file is header corruption.
        if offset + sectors * SECTOR_BYTES > self.bytes.len() {
            return None;
        }
        Some((offset, sectors))
    }

    /// The still-compressed payload and compression marker at a byte offset.
    fn payload_at(&self, offset: usize) -> Option<(&[u8], u8)> {
        if offset + 5 > self.bytes.len() {
            return None;
        }
        let length = u32::from_be_bytes([
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
            self.bytes[offset + 3],
        ]) as usize;
        if length <= 1 {
            return None;
        }
        let marker = self.bytes[offset + 4];
        let start = offset + 5;
        let end = offset + 4 + length;
        if end > self.bytes.len() {
            return None;
        }
        Some((&self.bytes[start..end], marker))
    }
}

/// Filename-keyed store of region buffers, shared across the whole run.
///
/// Mutation of any one buffer is serialized behind the lock, which is the
/// contract the in-place encoder relies on.
#[derive(Debug)]
pub struct RegionCache {
    region_dir: PathBuf,
    buffers: Mutex<HashMap<RegionCoord, RegionBuffer>>,
}

impl RegionCache {
    /// Creates a cache rooted at a world's `region/` directory.
    #[must_use]
    pub fn new(region_dir: PathBuf) -> Self {
        Self {
            region_dir,
            buffers: Mutex::new(HashMap::new()),
        }
    }

    /// On-disk path of a region.
    #[must_use]
    pub fn path_of(&self, region: RegionCoord) -> PathBuf {
        self.region_dir.join(region.file_name())
    }

    /// Loads a region file into the cache if not already present.
    ///
    /// # Errors
    ///
    /// Missing or unreadable files propagate - the run cannot proceed
    /// without the underlying world directory.
    pub fn load(&self, region: RegionCoord) -> AnvilResult<()> {
        let mut buffers = self.buffers.lock();
        if buffers.contains_key(&region) {
            return Ok(());
        }
        let bytes = fs::read(self.path_of(region))?;
        buffers.insert(region, RegionBuffer::from_bytes(region, bytes)?);
        Ok(())
    }

    /// Loads a region, formatting a fresh image when no file exists yet.
    ///
    /// # Errors
    ///
    /// Propagates read failures other than `NotFound`.
    pub fn load_or_format(
        &self,
        region: RegionCoord,
        sectors_per_chunk: u8,
        min_section_y: i32,
    ) -> AnvilResult<()> {
        let mut buffers = self.buffers.lock();
        if buffers.contains_key(&region) {
            return Ok(());
        }
        match fs::read(self.path_of(region)) {
            Ok(bytes) => {
                buffers.insert(region, RegionBuffer::from_bytes(region, bytes)?);
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                buffers.insert(
                    region,
                    RegionBuffer::formatted(region, sectors_per_chunk, min_section_y),
                );
            }
            Err(error) => return Err(error.into()),
        }
        Ok(())
    }

    /// Re-reads a region file and replaces the cached buffer if its content
    /// hash differs from the last-seen value.
    ///
    /// Returns true when the buffer changed (including first sight).
    ///
    /// # Errors
    ///
    /// Missing or unreadable files propagate.
    pub fn refresh_from_disk(&self, region: RegionCoord) -> AnvilResult<bool> {
        let bytes = fs::read(self.path_of(region))?;
        let fresh = RegionBuffer::from_bytes(region, bytes)?;
        let mut buffers = self.buffers.lock();
        match buffers.get(&region) {
            Some(cached) if cached.content_hash() == fresh.content_hash() => Ok(false),
            _ => {
                buffers.insert(region, fresh);
                Ok(true)
            }
        }
    }

    /// Runs a closure against one cached buffer.
    ///
    /// # Errors
    ///
    /// [`AnvilError::NotLoaded`] if the region was never loaded.
    pub fn with_buffer<R>(
        &self,
        region: RegionCoord,
        operation: impl FnOnce(&mut RegionBuffer) -> R,
    ) -> AnvilResult<R> {
        let mut buffers = self.buffers.lock();
        let buffer = buffers
            .get_mut(&region)
            .ok_or(AnvilError::NotLoaded(region))?;
        Ok(operation(buffer))
    }

    /// Snapshots every dirty buffer for flushing and marks them clean.
    ///
    /// Returns `(path, bytes)` pairs; the caller owns writing them out (and
    /// may do so concurrently across distinct files).
    #[must_use]
    pub fn take_dirty(&self) -> Vec<(PathBuf, Vec<u8>)> {
        let mut buffers = self.buffers.lock();
        let mut dirty = Vec::new();
        for (region, buffer) in buffers.iter_mut() {
            if buffer.is_dirty() {
                dirty.push((self.path_of(*region), buffer.bytes().to_vec()));
                buffer.mark_clean();
            }
        }
        dirty
    }
}

/// Unpacks fixed-width palette indices from packed 64-bit words.
///
/// Width is the bits needed to address `palette_len` entries, minimum 4;
/// `64 / width` indices per word, none straddling a word boundary.
#[must_use]
pub fn unpack_indices(packed: &[i64], palette_len: usize) -> Vec<usize> {
    let bits = index_bits(palette_len);
    let per_word = (64 / bits) as usize;
    let mask = (1u64 << bits) - 1;

    let mut indices = Vec::with_capacity(SECTION_CELLS);
    'outer: for word in packed {
        let word = *word as u64;
        for slot in 0..per_word {
            if indices.len() >= SECTION_CELLS {
                break 'outer;
            }
            indices.push(((word >> (slot as u32 * bits)) & mask) as usize);
        }
    }
    indices.resize(SECTION_CELLS, 0);
    indices
}

/// Packs section indices into 64-bit words, the inverse of
/// [`unpack_indices`]. Returns an empty vector for single-entry palettes,
/// whose packed array is omitted on disk.
#[must_use]
pub fn pack_indices(indices: &[usize], palette_len: usize) -> Vec<i64> {
    if palette_len <= 1 {
        return Vec::new();
    }
    let bits = index_bits(palette_len);
    let per_word = (64 / bits) as usize;
    let words = SECTION_CELLS.div_ceil(per_word);
    let mask = (1u64 << bits) - 1;

    let mut packed = vec![0i64; words];
    for (cell, index) in indices.iter().enumerate().take(SECTION_CELLS) {
        let word = cell / per_word;
        let shift = (cell % per_word) as u32 * bits;
        packed[word] |= (((*index as u64) & mask) << shift) as i64;
    }
    packed
}

/// Bits needed to address a palette, floored at the format minimum.
fn index_bits(palette_len: usize) -> u32 {
    let needed = usize::BITS - palette_len.saturating_sub(1).leading_zeros();
    needed.max(MIN_INDEX_BITS)
}

fn inflate(compressed: &[u8]) -> AnvilResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut raw = Vec::new();
    decoder.read_to_end(&mut raw)?;
    Ok(raw)
}

fn deflate(raw: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    // Writing into a Vec cannot fail.
    if encoder.write_all(raw).is_err() {
        return Vec::new();
    }
    encoder.finish().unwrap_or_default()
}

/// Writes length, marker, and compressed payload at a byte offset.
fn splice_payload(bytes: &mut [u8], offset: usize, payload: &[u8]) {
    let length = (payload.len() + 1) as u32;
    bytes[offset..offset + 4].copy_from_slice(&length.to_be_bytes());
    bytes[offset + 4] = COMPRESSION_ZLIB;
    bytes[offset + 5..offset + 5 + payload.len()].copy_from_slice(payload);
}

/// Minimal tag tree for a freshly formatted chunk.
fn empty_chunk_tree(chunk_x: i32, chunk_z: i32, min_section_y: i32) -> Vec<u8> {
    let mut root = std::collections::BTreeMap::new();
    root.insert("DataVersion".to_owned(), Tag::Int(FORMAT_DATA_VERSION));
    root.insert("xPos".to_owned(), Tag::Int(chunk_x));
    root.insert("zPos".to_owned(), Tag::Int(chunk_z));
    root.insert("yPos".to_owned(), Tag::Int(min_section_y));
    root.insert("Status".to_owned(), Tag::String("minecraft:full".to_owned()));
    root.insert("sections".to_owned(), Tag::List(Vec::new()));

    let mut raw = Vec::new();
    // Writing a fresh compound into a Vec cannot fail.
    Tag::Compound(root).write_root(&mut raw).unwrap_or_default();
    raw
}

/// Reads every section intersecting the volume's Y range into the volume.
fn fill_volume_from_chunk(
    root: &Tag,
    chunk: ChunkCoord,
    volume: &mut BlockVolume,
) -> AnvilResult<()> {
    let Some(sections) = root
        .as_compound()
        .and_then(|children| children.get("sections"))
        .and_then(Tag::as_list)
    else {
        // No section list means an all-air chunk.
        return Ok(());
    };

    for section in sections {
        let Some(children) = section.as_compound() else {
            continue;
        };
        let Some(section_y) = children.get("Y").and_then(Tag::as_i64) else {
            continue;
        };
        let base_y = i32::try_from(section_y)
            .map_err(|_| AnvilError::Nbt(format!("section Y {section_y} out of range")))?
            * CHUNK_SIZE;
        if base_y + CHUNK_SIZE <= volume.min_y() || base_y >= volume.max_y() {
            continue;
        }

        let Some(block_states) = children.get("block_states").and_then(Tag::as_compound) else {
            // Absent block_states: an all-air section.
            continue;
        };

        let palette = read_palette(block_states)?;
        let indices = match block_states.get("data").and_then(Tag::as_long_array) {
            Some(packed) => unpack_indices(packed, palette.len()),
            // Index 0 is the implied sole occupant.
            None => vec![0; SECTION_CELLS],
        };

        for (cell, palette_index) in indices.iter().enumerate() {
            let block = palette.get(*palette_index).ok_or_else(|| {
                AnvilError::Nbt(format!(
                    "palette index {palette_index} out of range ({} entries)",
                    palette.len()
                ))
            })?;
            if block.is_air() {
                continue;
            }
            let local_x = (cell % 16) as i32;
            let local_z = ((cell / 16) % 16) as i32;
            let local_y = (cell / 256) as i32;
            let position = Coordinate::new(
                chunk.origin_x() + local_x,
                base_y + local_y,
                chunk.origin_z() + local_z,
            );
            volume.set(position, block.clone());
        }
    }
    Ok(())
}

/// Parses a section's palette list into block specs.
fn read_palette(block_states: &std::collections::BTreeMap<String, Tag>) -> AnvilResult<Vec<BlockSpec>> {
    let Some(entries) = block_states.get("palette").and_then(Tag::as_list) else {
        return Ok(vec![BlockSpec::air()]);
    };
    let mut palette = Vec::with_capacity(entries.len());
    for entry in entries {
        let children = entry
            .as_compound()
            .ok_or_else(|| AnvilError::Nbt("palette entry is not a compound".into()))?;
        let name = children
            .get("Name")
            .and_then(Tag::as_str)
            .ok_or_else(|| AnvilError::Nbt("palette entry has no Name".into()))?;
        let mut spec = BlockSpec::new(name);
        if let Some(properties) = children.get("Properties").and_then(Tag::as_compound) {
            for (key, value) in properties {
                if let Some(value) = value.as_str() {
                    spec = spec.with_property(key, value);
                }
            }
        }
        palette.push(spec);
    }
    if palette.is_empty() {
        palette.push(BlockSpec::air());
    }
    Ok(palette)
}

/// Rebuilds every section intersecting the volume's Y range inside the
/// chunk's tag tree, preserving sections outside it.
fn rebuild_sections(root: &mut Tag, chunk: ChunkCoord, volume: &BlockVolume) {
    let Some(children) = root.as_compound_mut() else {
        return;
    };
    let sections = children
        .entry("sections".to_owned())
        .or_insert_with(|| Tag::List(Vec::new()));
    let Some(sections) = sections.as_list_mut() else {
        return;
    };

    let first_section = volume.min_y().div_euclid(CHUNK_SIZE);
    let last_section = (volume.max_y() - 1).div_euclid(CHUNK_SIZE);

    for section_y in first_section..=last_section {
        let rebuilt = build_section(chunk, volume, section_y);
        let existing = sections.iter_mut().find(|section| {
            section
                .as_compound()
                .and_then(|children| children.get("Y"))
                .and_then(Tag::as_i64)
                == Some(i64::from(section_y))
        });
        match existing {
            Some(section) => *section = rebuilt,
            None => sections.push(rebuilt),
        }
    }

    sections.sort_by_key(|section| {
        section
            .as_compound()
            .and_then(|children| children.get("Y"))
            .and_then(Tag::as_i64)
            .unwrap_or(i64::MAX)
    });
}

/// Builds one section compound from the volume.
///
/// The palette is freshly derived from the distinct specs present; air is
/// always index 0 and covers every cell the volume leaves empty. The packed
/// array is omitted when air is the palette's only member.
fn build_section(chunk: ChunkCoord, volume: &BlockVolume, section_y: i32) -> Tag {
    let base_y = section_y * CHUNK_SIZE;
    let mut palette = vec![BlockSpec::air()];
    let mut palette_index: HashMap<BlockSpec, usize> = HashMap::new();
    palette_index.insert(BlockSpec::air(), 0);

    let mut indices = vec![0usize; SECTION_CELLS];
    for (cell, index) in indices.iter_mut().enumerate() {
        let local_x = (cell % 16) as i32;
        let local_z = ((cell / 16) % 16) as i32;
        let local_y = (cell / 256) as i32;
        let position = Coordinate::new(
            chunk.origin_x() + local_x,
            base_y + local_y,
            chunk.origin_z() + local_z,
        );
        let Some(block) = volume.get(position) else {
            continue;
        };
        *index = match palette_index.get(block) {
            Some(existing) => *existing,
            None => {
                palette.push(block.clone());
                palette_index.insert(block.clone(), palette.len() - 1);
                palette.len() - 1
            }
        };
    }

    let palette_tags: Vec<Tag> = palette.iter().map(palette_entry).collect();
    let mut block_states = std::collections::BTreeMap::new();
    block_states.insert("palette".to_owned(), Tag::List(palette_tags));
    let packed = pack_indices(&indices, palette.len());
    if !packed.is_empty() {
        block_states.insert("data".to_owned(), Tag::LongArray(packed));
    }

    let mut section = std::collections::BTreeMap::new();
    section.insert("Y".to_owned(), Tag::Byte(section_y as i8));
    section.insert("block_states".to_owned(), Tag::Compound(block_states));
    Tag::Compound(section)
}

/// Serializes one palette entry, restoring the namespace prefix.
fn palette_entry(block: &BlockSpec) -> Tag {
    let mut children = std::collections::BTreeMap::new();
    children.insert(
        "Name".to_owned(),
        Tag::String(format!("minecraft:{}", block.name())),
    );
    if !block.properties().is_empty() {
        let mut properties = std::collections::BTreeMap::new();
        for (key, value) in block.properties() {
            properties.insert(key.clone(), Tag::String(value.clone()));
        }
        children.insert("Properties".to_owned(), Tag::Compound(properties));
    }
    Tag::Compound(children)
}
