//! # Feature Placement
//!
//! Trees, ponds, and ore veins. Trees and ponds are recorded as *pending*
//! during growth and resolve when their generation group closes, anchored to
//! the highest mapped column at their X/Z. Ore veins are injected per chunk
//! during decoration finishing.

use std::collections::{HashSet, VecDeque};

use voxfs_core::{
    BlockSpec, Bounds, ChunkCoord, Coordinate, Direction, FileHandle, Mapping, MappingEntry,
};

use crate::rng::TerrainRng;
use crate::synthesis::SynthesisTuning;

/// Blocks in the fixed tree shape: a 5-block trunk, two 5x5 corner-skipped
/// leaf rings, a 3x3 cap, a corner-skipped 3x3, and a crown block.
pub const TREE_BLOCK_COUNT: usize = 62;

/// The weighted ore table: name, selection weight, per-step continuation
/// probability. Rarer ores run shorter veins.
const ORE_TABLE: [(&str, f64, f64); 6] = [
    ("diamond_ore", 0.10, 0.30),
    ("lapis_ore", 0.10, 0.35),
    ("gold_ore", 0.15, 0.40),
    ("redstone_ore", 0.15, 0.45),
    ("iron_ore", 0.20, 0.50),
    ("coal_ore", 0.30, 0.55),
];

/// A tree candidate held until its generation group closes.
#[derive(Debug)]
pub struct PendingTree {
    position: Coordinate,
    pool: Vec<FileHandle>,
}

impl PendingTree {
    /// Reserves a candidate location with its file pool.
    #[must_use]
    pub fn new(position: Coordinate, pool: Vec<FileHandle>) -> Self {
        Self { position, pool }
    }

    /// The candidate location.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Coordinate {
        self.position
    }
}

/// Horizontal Chebyshev distance between two positions.
#[inline]
#[must_use]
pub(crate) fn chebyshev_xz(a: Coordinate, b: Coordinate) -> i32 {
    (a.x - b.x).abs().max((a.z - b.z).abs())
}

/// The fixed tree shape as offsets from the base (one block above the
/// anchor column), paired with the block each cell holds.
///
/// Emission order is trunk first, then leaves bottom-up, so handle
/// consumption is deterministic.
#[must_use]
pub fn tree_blocks() -> Vec<(Coordinate, BlockSpec)> {
    let mut blocks = Vec::with_capacity(TREE_BLOCK_COUNT);
    for dy in 0..5 {
        blocks.push((Coordinate::new(0, dy, 0), BlockSpec::oak_log()));
    }
    // Two wide rings, corners skipped.
    for dy in [5, 6] {
        for dz in -2..=2i32 {
            for dx in -2..=2i32 {
                if dx.abs() == 2 && dz.abs() == 2 {
                    continue;
                }
                blocks.push((Coordinate::new(dx, dy, dz), BlockSpec::oak_leaves()));
            }
        }
    }
    // Narrow cap, then a corner-skipped layer, then the crown.
    for dz in -1..=1 {
        for dx in -1..=1 {
            blocks.push((Coordinate::new(dx, 7, dz), BlockSpec::oak_leaves()));
        }
    }
    for dz in -1..=1i32 {
        for dx in -1..=1i32 {
            if dx.abs() == 1 && dz.abs() == 1 {
                continue;
            }
            blocks.push((Coordinate::new(dx, 8, dz), BlockSpec::oak_leaves()));
        }
    }
    blocks.push((Coordinate::new(0, 9, 0), BlockSpec::oak_leaves()));
    blocks
}

/// Resolves a pending tree against the finished ground height.
///
/// Each placed block consumes one reserved handle. A block proposed at an
/// already-occupied or out-of-world position is a collision: its handle is
/// returned instead of placed. Returns every unconsumed handle, in pool
/// order, for the caller to push back to the head of the unallocated list.
pub(crate) fn resolve_tree(
    mapping: &mut Mapping,
    tree: PendingTree,
    world_bounds: &Bounds,
    placed: &mut usize,
) -> Vec<FileHandle> {
    let PendingTree { position, pool } = tree;
    let mut pool = VecDeque::from(pool);
    let mut returned = Vec::new();

    let Some(top) = mapping.column_top(position.x, position.z) else {
        return pool.into();
    };
    let base = Coordinate::new(position.x, top + 1, position.z);

    for (offset, block) in tree_blocks() {
        let Some(file) = pool.pop_front() else {
            break;
        };
        let target = base + offset;
        if !world_bounds.contains(target) || mapping.contains(target) {
            returned.push(file);
            continue;
        }
        match mapping.insert(MappingEntry {
            position: target,
            block,
            file,
        }) {
            Ok(()) => *placed += 1,
            Err(_) => {}
        }
    }

    // A short shape or an over-provisioned pool leaves handles unconsumed.
    returned.extend(pool);
    returned
}

/// Resolves a pending pond with a randomized flood-fill from the highest
/// mapped column at the seed's X/Z.
///
/// A node converts to water only while it is mapped ground, clear of
/// pending trees, not capped by solid ground, and walled in horizontally;
/// nodes not yet adjacent to water convert reluctantly. The iteration cap
/// guarantees termination - growth is not monotonic.
pub(crate) fn resolve_pond(
    mapping: &mut Mapping,
    seed: Coordinate,
    pending_trees: &[PendingTree],
    world_bounds: &Bounds,
    tuning: &SynthesisTuning,
    rng: &mut TerrainRng,
) {
    let Some(top) = mapping.column_top(seed.x, seed.z) else {
        return;
    };
    let anchor = Coordinate::new(seed.x, top, seed.z);

    let mut queue = VecDeque::from([anchor]);
    let mut visited: HashSet<Coordinate> = HashSet::new();
    let mut iterations = 0u32;

    while let Some(node) = queue.pop_front() {
        iterations += 1;
        if iterations > tuning.pond_iteration_cap {
            break;
        }
        if !visited.insert(node) {
            continue;
        }
        if !pond_node_converts(mapping, node, pending_trees, tuning, rng) {
            continue;
        }
        mapping.reclassify(node, BlockSpec::water());

        for direction in Direction::HORIZONTAL {
            queue.push_back(node.shifted(direction));
        }
        for direction in [Direction::Up, Direction::Down] {
            if rng.chance(tuning.pond_vertical_odds) {
                let neighbor = node.shifted(direction);
                if world_bounds.contains(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
    }
}

fn pond_node_converts(
    mapping: &Mapping,
    node: Coordinate,
    pending_trees: &[PendingTree],
    tuning: &SynthesisTuning,
    rng: &mut TerrainRng,
) -> bool {
    let Some(block) = mapping.block_at(node) else {
        return false;
    };
    if !block.is_ground() {
        return false;
    }
    if pending_trees
        .iter()
        .any(|tree| chebyshev_xz(tree.position(), node) <= tuning.pond_tree_clearance)
    {
        return false;
    }
    // A solid lid means this is subsurface, not a pond floor.
    if mapping
        .block_at(node.shifted(Direction::Up))
        .is_some_and(BlockSpec::is_ground)
    {
        return false;
    }
    // Open-air spillage guard: all four horizontal neighbors must be mapped.
    if Direction::HORIZONTAL
        .iter()
        .any(|direction| !mapping.contains(node.shifted(*direction)))
    {
        return false;
    }
    let adjacent_to_water = Direction::ALL.iter().any(|direction| {
        mapping
            .block_at(node.shifted(*direction))
            .is_some_and(BlockSpec::is_water)
    });
    if !adjacent_to_water && !rng.chance(tuning.pond_reluctant_odds) {
        return false;
    }
    true
}

/// Decoration finishing for one chunk, run after smoothing.
///
/// 1. Buried grass converts to dirt; deeply buried dirt-to-be converts on
///    to stone.
/// 2. Blocks walled in by water on all four sides and at least five of six
///    neighbors become water themselves.
/// 3. Ore veins random-walk through the chunk's stone, one vein per
///    `ore_entries_per_vein` mapped entries.
pub fn decorate_chunk(
    mapping: &mut Mapping,
    chunk: ChunkCoord,
    chunk_bounds: &Bounds,
    tuning: &SynthesisTuning,
    rng: &mut TerrainRng,
) {
    let positions: Vec<Coordinate> = mapping
        .entries_in_chunk(chunk)
        .map(|entry| entry.position)
        .collect();

    // Pass 1: burial.
    for position in &positions {
        if mapping.block_at(*position) != Some(&BlockSpec::grass_block()) {
            continue;
        }
        if !mapping
            .block_at(position.shifted(Direction::Up))
            .is_some_and(BlockSpec::is_heavy)
        {
            continue;
        }
        let submerged = (2..=4).all(|dy| {
            mapping
                .block_at(Coordinate::new(position.x, position.y + dy, position.z))
                .is_some_and(BlockSpec::is_ground)
        });
        let replacement = if submerged {
            BlockSpec::stone()
        } else {
            BlockSpec::dirt()
        };
        mapping.reclassify(*position, replacement);
    }

    // Pass 2: water envelopment. All four horizontal neighbors are
    // required, not merely counted.
    for position in &positions {
        let Some(block) = mapping.block_at(*position) else {
            continue;
        };
        if block.is_water() {
            continue;
        }
        let water_at = |direction: Direction| {
            mapping
                .block_at(position.shifted(direction))
                .is_some_and(BlockSpec::is_water)
        };
        if !Direction::HORIZONTAL.iter().all(|direction| water_at(*direction)) {
            continue;
        }
        let total = Direction::ALL
            .iter()
            .filter(|direction| water_at(**direction))
            .count();
        if total >= 5 {
            mapping.reclassify(*position, BlockSpec::water());
        }
    }

    // Pass 3: ore veins, proportional to how much the chunk holds.
    let entry_count = mapping.entries_in_chunk(chunk).count();
    let veins = entry_count / tuning.ore_entries_per_vein.max(1);
    for _ in 0..veins {
        let stones: Vec<Coordinate> = mapping
            .entries_in_chunk(chunk)
            .filter(|entry| entry.block == BlockSpec::stone())
            .map(|entry| entry.position)
            .collect();
        if stones.is_empty() {
            break;
        }
        let start = stones[rng.index(stones.len())];
        let (ore, continuation) = pick_ore(rng);
        run_vein(
            mapping,
            chunk_bounds,
            start,
            &ore,
            continuation * tuning.ore_size_factor,
            rng,
        );
    }
}

/// Draws an ore from the weighted table.
fn pick_ore(rng: &mut TerrainRng) -> (BlockSpec, f64) {
    let roll = rng.unit();
    let mut cumulative = 0.0;
    for (name, weight, continuation) in ORE_TABLE {
        cumulative += weight;
        if roll < cumulative {
            return (BlockSpec::new(name), continuation);
        }
    }
    let (name, _, continuation) = ORE_TABLE[ORE_TABLE.len() - 1];
    (BlockSpec::new(name), continuation)
}

/// Random-walks from a stone block, converting stone to ore at each step.
///
/// The walk stops when it exits the chunk bounds, lands on an unmapped
/// cell, or loses the continuation coin flip.
fn run_vein(
    mapping: &mut Mapping,
    chunk_bounds: &Bounds,
    start: Coordinate,
    ore: &BlockSpec,
    continuation: f64,
    rng: &mut TerrainRng,
) {
    let mut current = start;
    loop {
        if mapping.block_at(current) == Some(&BlockSpec::stone()) {
            mapping.reclassify(current, ore.clone());
        }
        let direction = Direction::ALL[rng.index(Direction::ALL.len())];
        let next = current.shifted(direction);
        if !chunk_bounds.contains(next) {
            break;
        }
        if !mapping.contains(next) {
            break;
        }
        if !rng.chance(continuation) {
            break;
        }
        current = next;
    }
}
