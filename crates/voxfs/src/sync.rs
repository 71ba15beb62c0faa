//! # Change-Detection Loop
//!
//! Periodically re-reads every region the terrain bound touches and
//! reconciles the mapping against what the world actually stores. Three
//! hash gates keep the work proportional to what changed:
//!
//! 1. Whole-region content hash - unchanged regions are skipped outright
//! 2. Per-chunk compressed-payload hash - unchanged chunks skip inflation
//! 3. Per-entry block comparison - only real divergences mutate the mapping
//!
//! Each chunk's reconcile yields afterwards so snapshot ticks interleave.
//! A corrupted chunk simply is not revisited until the next interval.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info};

use voxfs_anvil::{DecodeOutcome, RegionCache};
use voxfs_core::{BlockSpec, BlockVolume, ChunkCoord, ChunkView, ChunkWalk, Coordinate, Mapping, RegionCoord};

use crate::config::WorldConfig;
use crate::error::AppResult;
use crate::notify::{DivergenceEvent, FileLifecycle};

/// The synchronization loop. One instance owns the mapping's write side for
/// the rest of the run.
pub struct SyncLoop<'a> {
    config: &'a WorldConfig,
    cache: &'a RegionCache,
    mapping: Arc<RwLock<Mapping>>,
    notifier: Box<dyn FileLifecycle>,
    chunk_hashes: HashMap<ChunkCoord, u32>,
}

impl<'a> SyncLoop<'a> {
    /// Creates the loop.
    #[must_use]
    pub fn new(
        config: &'a WorldConfig,
        cache: &'a RegionCache,
        mapping: Arc<RwLock<Mapping>>,
        notifier: Box<dyn FileLifecycle>,
    ) -> Self {
        Self {
            config,
            cache,
            mapping,
            notifier,
            chunk_hashes: HashMap::new(),
        }
    }

    /// Runs until Ctrl-C; takes a final snapshot and flushes regions on the
    /// way out.
    ///
    /// # Errors
    ///
    /// Propagates unreadable region files and snapshot I/O failures.
    pub async fn run(mut self) -> AppResult<()> {
        let mut sync_tick =
            tokio::time::interval(Duration::from_secs(self.config.sync_interval_secs.max(1)));
        let mut snapshot_tick = tokio::time::interval(Duration::from_secs(
            self.config.snapshot_interval_secs.max(1),
        ));
        info!(
            "watching for changes every {}s",
            self.config.sync_interval_secs.max(1)
        );

        loop {
            tokio::select! {
                _ = sync_tick.tick() => {
                    self.sync_once().await?;
                }
                _ = snapshot_tick.tick() => {
                    self.snapshot()?;
                }
                result = tokio::signal::ctrl_c() => {
                    result?;
                    info!("shutting down");
                    self.snapshot()?;
                    crate::builder::flush_regions(self.cache).await?;
                    return Ok(());
                }
            }
        }
    }

    /// Runs one synchronization tick over every touched region.
    ///
    /// # Errors
    ///
    /// A missing or unreadable region file is fatal - the world directory
    /// is gone from under us.
    pub async fn sync_once(&mut self) -> AppResult<()> {
        for region in self.touched_regions() {
            let changed = self.cache.refresh_from_disk(region)?;
            if !changed {
                debug!("region ({region}) unchanged, skipping");
                continue;
            }
            self.reconcile_region(region).await?;
        }
        Ok(())
    }

    /// Every region intersecting the current terrain bound.
    fn touched_regions(&self) -> Vec<RegionCoord> {
        let mapping = self.mapping.read();
        let Some(bounds) = mapping.terrain_bounds() else {
            return Vec::new();
        };
        let min = ChunkCoord::from_position(bounds.min).region();
        let max = ChunkCoord::from_position(Coordinate::new(
            bounds.max.x - 1,
            bounds.max.y - 1,
            bounds.max.z - 1,
        ))
        .region();

        let mut regions = Vec::new();
        for x in min.x..=max.x {
            for z in min.z..=max.z {
                regions.push(RegionCoord::new(x, z));
            }
        }
        regions
    }

    /// Walks the region's chunks, yielding after each one so other pending
    /// ticks can interleave.
    async fn reconcile_region(&mut self, region: RegionCoord) -> AppResult<()> {
        let min_y = self.config.world_min[1];
        let max_y = self.config.world_max[1];
        let mut walk = {
            let mapping = self.mapping.read();
            ChunkWalk::new(&mapping, min_y, max_y, Some(region))
        };
        loop {
            let view = {
                let mapping = self.mapping.read();
                walk.next_chunk(&mapping)
            };
            let Some(view) = view else {
                break;
            };
            self.reconcile_chunk(region, &view)?;
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    /// Decodes one chunk (hash-gated) and removes every entry whose decoded
    /// block no longer matches its recorded block.
    fn reconcile_chunk(&mut self, region: RegionCoord, view: &ChunkView) -> AppResult<()> {
        let chunk = view.chunk;
        let mut observed = BlockVolume::new(chunk, self.config.world_min[1], self.config.world_max[1]);
        let expected_hash = self.chunk_hashes.get(&chunk).copied();
        let outcome = self
            .cache
            .with_buffer(region, |buffer| {
                buffer.decode_chunk(chunk, &mut observed, expected_hash)
            })?;
        let hash = match outcome {
            DecodeOutcome::Unchanged | DecodeOutcome::Missing => return Ok(()),
            DecodeOutcome::Decoded { hash } => hash,
        };
        self.chunk_hashes.insert(chunk, hash);

        let mut mapping = self.mapping.write();
        for position in &view.positions {
            let Some(entry) = mapping.get(*position) else {
                continue;
            };
            if observed.get(*position) == Some(&entry.block) {
                continue;
            }
            let observed_block = observed
                .get(*position)
                .cloned()
                .unwrap_or_else(BlockSpec::air);
            let Some(removed) = mapping.remove(*position) else {
                continue;
            };
            self.notifier.on_divergence(&DivergenceEvent {
                position: *position,
                expected: removed.block,
                observed: observed_block,
                file: removed.file,
            });
        }
        Ok(())
    }

    /// Persists the mapping snapshot.
    fn snapshot(&self) -> AppResult<()> {
        let mapping = self.mapping.read();
        mapping.save_snapshot(&self.config.snapshot_path)?;
        debug!("snapshot saved: {} entries", mapping.len());
        Ok(())
    }
}
