//! # Frontier-Growth Synthesis
//!
//! Claims one voxel per file handle by growing a BFS frontier from a seed
//! coordinate. Plain BFS grows diamonds, so a randomized suppression cycle
//! periodically skips one horizontal expansion direction; small vertical
//! expansion odds give the terrain relief.
//!
//! ## Groups
//!
//! Files are consumed in scan order. When a handle's short parent path
//! differs from its predecessor's, the group boundary clears the frontier
//! (the next group regrows from a single seed), bumps the group counter, and
//! resolves the closing group's pending ponds and trees - ponds first.
//!
//! ## Termination
//!
//! The mapping itself is the closed set, so no position is claimed twice.
//! The loop ends when the files run out, or when the frontier dies and a
//! bounded number of random restarts inside the live terrain bound all land
//! on claimed positions - at that point the world is saturated and the
//! remaining handles are reported back unallocated.

use std::collections::VecDeque;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use voxfs_core::{BlockSpec, Bounds, Coordinate, Direction, FileHandle, Mapping, MappingEntry};

use crate::features::{chebyshev_xz, resolve_pond, resolve_tree, PendingTree};
use crate::rng::TerrainRng;

/// Empirically tuned knobs for synthesis and decoration.
///
/// The defaults are the tuned values; nothing depends on their exact
/// distribution, so a config file may override any of them.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisTuning {
    /// Odds of pushing each vertical neighbor while expanding.
    pub vertical_expansion_odds: f64,
    /// Odds per placed block of recording a pending pond seed.
    pub pond_seed_odds: f64,
    /// Odds per placed block of reserving a pending tree.
    pub tree_seed_odds: f64,
    /// File handles reserved per pending tree; the tree shape consumes one
    /// per placed block.
    pub tree_pool_size: usize,
    /// Minimum horizontal (Chebyshev) distance between pending trees.
    pub tree_spacing: i32,
    /// Horizontal clearance a pond keeps from pending trees.
    pub pond_tree_clearance: i32,
    /// Hard iteration cap on the pond flood-fill; growth is not monotonic,
    /// so the cap is what guarantees termination.
    pub pond_iteration_cap: u32,
    /// Odds a pond node not yet adjacent to water converts anyway.
    pub pond_reluctant_odds: f64,
    /// Odds of pushing each vertical neighbor during the pond fill.
    pub pond_vertical_odds: f64,
    /// Divisor in the suppression duration formula
    /// `unit() * queue_len / divisor`.
    pub suppression_divisor: f64,
    /// Minimum pops between suppression resamples.
    pub suppression_interval_min: u32,
    /// Maximum pops between suppression resamples.
    pub suppression_interval_max: u32,
    /// Random-restart attempts before the world counts as saturated.
    pub restart_attempts: u32,
    /// Mapped entries per injected ore vein in a chunk.
    pub ore_entries_per_vein: usize,
    /// Multiplier on every ore's per-step continuation probability.
    pub ore_size_factor: f64,
}

impl Default for SynthesisTuning {
    fn default() -> Self {
        Self {
            vertical_expansion_odds: 0.05,
            pond_seed_odds: 1.0 / 10_000.0,
            tree_seed_odds: 1.0 / 5_000.0,
            tree_pool_size: 62,
            tree_spacing: 5,
            pond_tree_clearance: 3,
            pond_iteration_cap: 2_000,
            pond_reluctant_odds: 0.10,
            pond_vertical_odds: 0.05,
            suppression_divisor: 5.0,
            suppression_interval_min: 64,
            suppression_interval_max: 256,
            restart_attempts: 1_000,
            ore_entries_per_vein: 250,
            ore_size_factor: 1.0,
        }
    }
}

/// What a synthesis run needs to know.
#[derive(Clone, Debug)]
pub struct SynthesisConfig {
    /// Hard world bound; growth never proposes positions outside it.
    pub world_bounds: Bounds,
    /// Short-parent truncation depth for grouping.
    pub group_depth: usize,
    /// Color blocks by group index instead of grass.
    pub debug_palette: bool,
    /// The tuned knobs.
    pub tuning: SynthesisTuning,
}

/// What a synthesis run reports back.
#[derive(Debug)]
pub struct SynthesisReport {
    /// Handles assigned to a position (terrain and tree blocks alike).
    pub placed: usize,
    /// Group boundaries crossed; each one ran a feature-resolution cycle.
    pub groups_closed: u32,
    /// Handles the world had no room for, in consumption order.
    pub unallocated: Vec<FileHandle>,
}

/// An active suppression cycle: one horizontal expansion skipped.
struct Suppression {
    direction: Direction,
    remaining: u32,
}

/// The frontier-growth engine. One instance per run; owns the mapping
/// exclusively while running.
pub struct Synthesizer<'a> {
    mapping: &'a mut Mapping,
    config: &'a SynthesisConfig,
    rng: &'a mut TerrainRng,
    open: VecDeque<Coordinate>,
    files: VecDeque<FileHandle>,
    pending_ponds: Vec<Coordinate>,
    pending_trees: Vec<PendingTree>,
    group_index: u32,
    groups_closed: u32,
    group_size: usize,
    last_parent: Option<PathBuf>,
    suppressed: Option<Suppression>,
    pops_until_resample: u32,
    placed: usize,
}

impl<'a> Synthesizer<'a> {
    /// Creates an engine over the mapping.
    #[must_use]
    pub fn new(
        mapping: &'a mut Mapping,
        config: &'a SynthesisConfig,
        rng: &'a mut TerrainRng,
    ) -> Self {
        Self {
            mapping,
            config,
            rng,
            open: VecDeque::new(),
            files: VecDeque::new(),
            pending_ponds: Vec::new(),
            pending_trees: Vec::new(),
            group_index: 0,
            groups_closed: 0,
            group_size: 0,
            last_parent: None,
            suppressed: None,
            pops_until_resample: 0,
            placed: 0,
        }
    }

    /// Runs the growth loop until the files are consumed or the world bound
    /// is saturated.
    #[must_use]
    pub fn run(mut self, files: Vec<FileHandle>) -> SynthesisReport {
        self.files = files.into();
        self.pops_until_resample = self.sample_interval();

        let seed = interior_seed(&self.config.world_bounds);
        self.open.push_back(seed);

        while !self.files.is_empty() {
            let Some(position) = self.open.pop_front() else {
                match self.random_restart() {
                    Some(restart) => {
                        self.open.push_back(restart);
                        continue;
                    }
                    None => break,
                }
            };

            if self.mapping.contains(position) || !self.config.world_bounds.contains(position) {
                if self.open.is_empty() {
                    match self.random_restart() {
                        Some(restart) => self.open.push_back(restart),
                        None => break,
                    }
                }
                continue;
            }

            self.tick_suppression();

            let Some(file) = self.files.pop_front() else {
                break;
            };
            let parent = file.short_parent(self.config.group_depth);
            if self
                .last_parent
                .as_ref()
                .is_some_and(|last| *last != parent)
            {
                self.close_group();
            }
            self.last_parent = Some(parent);

            let block = if self.config.debug_palette {
                BlockSpec::debug_wool(self.group_index)
            } else {
                BlockSpec::grass_block()
            };
            match self.mapping.insert(MappingEntry {
                position,
                block,
                file,
            }) {
                Ok(()) => {}
                // The pop above rejects mapped positions.
                Err(_) => continue,
            }
            self.placed += 1;
            self.group_size += 1;

            self.expand(position);
            self.consider_features(position);
        }

        // The final group closes with the run.
        self.resolve_pending_features();
        info!(
            "synthesis complete: {} placed, {} groups closed, {} unallocated",
            self.placed,
            self.groups_closed,
            self.files.len()
        );

        SynthesisReport {
            placed: self.placed,
            groups_closed: self.groups_closed,
            unallocated: self.files.into(),
        }
    }

    /// Pushes the surviving horizontal neighbors plus, with small odds, the
    /// vertical ones.
    fn expand(&mut self, position: Coordinate) {
        let suppressed = self.suppressed.as_ref().map(|cycle| cycle.direction);
        for direction in Direction::HORIZONTAL {
            if Some(direction) == suppressed {
                continue;
            }
            let neighbor = position.shifted(direction);
            if self.config.world_bounds.contains(neighbor) {
                self.open.push_back(neighbor);
            }
        }
        for direction in [Direction::Up, Direction::Down] {
            if self.rng.chance(self.config.tuning.vertical_expansion_odds) {
                let neighbor = position.shifted(direction);
                if self.config.world_bounds.contains(neighbor) {
                    self.open.push_back(neighbor);
                }
            }
        }
    }

    /// Rolls for a pending pond seed and a pending tree reservation.
    fn consider_features(&mut self, position: Coordinate) {
        let tuning = &self.config.tuning;
        if self.rng.chance(tuning.pond_seed_odds) {
            self.pending_ponds.push(position);
        }
        if self.rng.chance(tuning.tree_seed_odds)
            && self.files.len() >= tuning.tree_pool_size
            && !self.tree_nearby(position)
        {
            let pool: Vec<FileHandle> = self
                .files
                .drain(..tuning.tree_pool_size)
                .collect();
            self.pending_trees.push(PendingTree::new(position, pool));
        }
    }

    fn tree_nearby(&self, position: Coordinate) -> bool {
        self.pending_trees.iter().any(|tree| {
            chebyshev_xz(tree.position(), position) <= self.config.tuning.tree_spacing
        })
    }

    /// Advances the suppression cycle: ages out the active suppression and
    /// periodically (every N pops, N itself resampled per cycle) starts a
    /// fresh one with a random direction and duration.
    fn tick_suppression(&mut self) {
        if let Some(cycle) = &mut self.suppressed {
            cycle.remaining -= 1;
            if cycle.remaining == 0 {
                self.suppressed = None;
            }
        }
        if self.pops_until_resample == 0 {
            self.pops_until_resample = self.sample_interval();
            let direction = Direction::HORIZONTAL[self.rng.index(Direction::HORIZONTAL.len())];
            let duration = (self.rng.unit() * self.open.len() as f64
                / self.config.tuning.suppression_divisor) as u32;
            if duration > 0 {
                self.suppressed = Some(Suppression {
                    direction,
                    remaining: duration,
                });
            }
        } else {
            self.pops_until_resample -= 1;
        }
    }

    fn sample_interval(&mut self) -> u32 {
        let tuning = &self.config.tuning;
        let low = tuning.suppression_interval_min.max(1) as i32;
        let high = (tuning.suppression_interval_max.max(tuning.suppression_interval_min) + 1) as i32;
        self.rng.range_i32(low..high) as u32
    }

    /// A group boundary: the frontier clears so the next group regrows from
    /// a single seed, and the closing group's features resolve - ponds
    /// before trees.
    fn close_group(&mut self) {
        self.open.clear();
        self.resolve_pending_features();
        info!(
            "generation group {} closed: {} blocks",
            self.group_index, self.group_size
        );
        self.group_index += 1;
        self.groups_closed += 1;
        self.group_size = 0;
    }

    fn resolve_pending_features(&mut self) {
        let ponds = std::mem::take(&mut self.pending_ponds);
        for seed in ponds {
            resolve_pond(
                self.mapping,
                seed,
                &self.pending_trees,
                &self.config.world_bounds,
                &self.config.tuning,
                self.rng,
            );
        }
        let trees = std::mem::take(&mut self.pending_trees);
        for tree in trees {
            let returned = resolve_tree(
                self.mapping,
                tree,
                &self.config.world_bounds,
                &mut self.placed,
            );
            // Collision handles go back to the head of the unallocated list.
            for file in returned.into_iter().rev() {
                self.files.push_front(file);
            }
        }
    }

    /// Picks a uniformly random unmapped position to regrow from: X/Z from
    /// the live terrain bound's span, Y from the world's bounded range.
    /// `None` once the attempts run dry - the world is saturated.
    fn random_restart(&mut self) -> Option<Coordinate> {
        let world = self.config.world_bounds;
        let bounds = self.mapping.terrain_bounds().copied().unwrap_or(world);
        for _ in 0..self.config.tuning.restart_attempts {
            let candidate = Coordinate::new(
                self.rng.range_i32(bounds.min.x..bounds.max.x),
                self.rng.range_i32(world.min.y..world.max.y),
                self.rng.range_i32(bounds.min.z..bounds.max.z),
            );
            if self.config.world_bounds.contains(candidate) && !self.mapping.contains(candidate) {
                return Some(candidate);
            }
        }
        debug!("world bound saturated, {} handles unallocated", self.files.len());
        None
    }
}

/// The single interior coordinate growth starts from.
fn interior_seed(bounds: &Bounds) -> Coordinate {
    Coordinate::new(
        (bounds.min.x + bounds.max.x) / 2,
        (bounds.min.y + bounds.max.y) / 2,
        (bounds.min.z + bounds.max.z) / 2,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn files_in(dir: &str, count: usize) -> Vec<FileHandle> {
        (0..count)
            .map(|i| FileHandle::new(PathBuf::from(format!("/scan/{dir}/f{i}")), 10, 2))
            .collect()
    }

    fn config() -> SynthesisConfig {
        SynthesisConfig {
            world_bounds: Bounds::new(Coordinate::new(0, 0, 0), Coordinate::new(64, 64, 64)),
            group_depth: 1,
            debug_palette: false,
            // Features have their own tests; exact-count assertions here
            // want pure growth.
            tuning: SynthesisTuning {
                pond_seed_odds: 0.0,
                tree_seed_odds: 0.0,
                ..SynthesisTuning::default()
            },
        }
    }

    #[test]
    fn test_every_file_lands_on_a_unique_position() {
        let mut mapping = Mapping::new();
        let mut rng = TerrainRng::from_seed(1);
        let config = config();
        let report =
            Synthesizer::new(&mut mapping, &config, &mut rng).run(files_in("a", 200));
        assert_eq!(report.placed, 200);
        assert_eq!(report.unallocated.len(), 0);
        assert_eq!(mapping.len(), 200);
    }

    #[test]
    fn test_same_seed_same_terrain() {
        let config = config();
        let mut first = Mapping::new();
        let mut rng = TerrainRng::from_seed(42);
        let _ = Synthesizer::new(&mut first, &config, &mut rng).run(files_in("a", 300));

        let mut second = Mapping::new();
        let mut rng = TerrainRng::from_seed(42);
        let _ = Synthesizer::new(&mut second, &config, &mut rng).run(files_in("a", 300));

        assert_eq!(first.len(), second.len());
        for entry in first.entries() {
            assert_eq!(second.get(entry.position), Some(entry));
        }
    }

    #[test]
    fn test_saturated_world_returns_leftovers() {
        let mut mapping = Mapping::new();
        let mut rng = TerrainRng::from_seed(3);
        let mut config = config();
        // A 2x2x2 world holds at most 8 blocks.
        config.world_bounds =
            Bounds::new(Coordinate::new(0, 0, 0), Coordinate::new(2, 2, 2));
        let report = Synthesizer::new(&mut mapping, &config, &mut rng).run(files_in("a", 20));
        assert_eq!(mapping.len(), 8);
        assert_eq!(report.placed, 8);
        assert_eq!(report.unallocated.len(), 12);
    }

    #[test]
    fn test_debug_palette_colors_by_group() {
        let mut mapping = Mapping::new();
        let mut rng = TerrainRng::from_seed(5);
        let mut config = config();
        config.debug_palette = true;

        let mut files = files_in("a", 3);
        files.extend(files_in("b", 3));
        let _ = Synthesizer::new(&mut mapping, &config, &mut rng).run(files);

        let mut colors: Vec<String> = mapping
            .entries()
            .map(|entry| entry.block.name().to_owned())
            .collect();
        colors.sort();
        colors.dedup();
        assert_eq!(colors, vec!["orange_wool".to_owned(), "white_wool".to_owned()]);
    }
}
