//! # World Builder
//!
//! Drives the whole build: one backup of the world directory before the
//! first mutation, frontier-growth synthesis, then per chunk a smoothing
//! pass to its fixed point, decoration finishing, and an in-place region
//! encode. Region buffers stay cached for the sync loop; dirty buffers
//! flush to disk concurrently, one task per file.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use voxfs_anvil::{EncodeOutcome, RegionCache};
use voxfs_core::{BlockVolume, ChunkWalk, FileHandle, Mapping};
use voxfs_procedural::{decorate_chunk, smooth_chunk, Synthesizer, TerrainRng};

use crate::config::WorldConfig;
use crate::error::{AppError, AppResult};

/// What a build produced.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Handles assigned to positions.
    pub placed: usize,
    /// Generation group boundaries crossed.
    pub groups_closed: u32,
    /// Handles the world bound had no room for.
    pub unallocated: usize,
    /// Chunks rendered and encoded.
    pub chunks: usize,
    /// Chunks whose payload no longer fit its allocated sectors.
    pub oversized: usize,
}

/// The build pipeline. Borrows the region cache so the sync loop keeps the
/// same buffers afterwards.
pub struct WorldBuilder<'a> {
    config: &'a WorldConfig,
    cache: &'a RegionCache,
}

impl<'a> WorldBuilder<'a> {
    /// Creates a builder over a config and a region cache.
    #[must_use]
    pub const fn new(config: &'a WorldConfig, cache: &'a RegionCache) -> Self {
        Self { config, cache }
    }

    /// Runs synthesis and renders every touched chunk into its region
    /// buffer.
    ///
    /// # Errors
    ///
    /// Propagates backup I/O failures and unreadable region files.
    pub fn build(
        &self,
        mapping: &mut Mapping,
        files: Vec<FileHandle>,
        rng: &mut TerrainRng,
    ) -> AppResult<BuildReport> {
        self.backup_world()?;

        let file_count = files.len();
        info!("synthesizing terrain for {file_count} files");
        let synthesis_config = self.config.synthesis();
        let synthesis = Synthesizer::new(mapping, &synthesis_config, rng).run(files);

        let mut report = BuildReport {
            placed: synthesis.placed,
            groups_closed: synthesis.groups_closed,
            unallocated: synthesis.unallocated.len(),
            ..BuildReport::default()
        };

        let min_y = self.config.world_min[1];
        let max_y = self.config.world_max[1];
        let mut walk = ChunkWalk::new(mapping, min_y, max_y, None);
        while let Some(view) = walk.next_chunk(mapping) {
            let chunk = view.chunk;
            info!("building chunk ({chunk}): {} blocks", view.positions.len());

            // Smooth to a fixed point, then decorate.
            while smooth_chunk(mapping, chunk, &view.bounds) > 0 {}
            decorate_chunk(mapping, chunk, &view.bounds, &self.config.tuning, rng);

            // Re-render after mutation; the yielded volume is stale.
            let mut volume = BlockVolume::new(chunk, min_y, max_y);
            for entry in mapping.entries_in_chunk(chunk) {
                volume.set(entry.position, entry.block.clone());
            }

            let region = chunk.region();
            self.cache.load_or_format(
                region,
                self.config.sectors_per_chunk,
                self.config.format_min_section_y,
            )?;
            let outcome = self
                .cache
                .with_buffer(region, |buffer| buffer.encode_chunk(chunk, &volume))?;
            if outcome == EncodeOutcome::Oversized {
                report.oversized += 1;
            }
            report.chunks += 1;
        }

        info!(
            "build complete: {} chunks, {} oversized, {} unallocated",
            report.chunks, report.oversized, report.unallocated
        );
        Ok(report)
    }

    /// Copies the world directory aside once, before anything mutates it.
    /// An existing backup is never overwritten.
    fn backup_world(&self) -> AppResult<()> {
        let world = &self.config.world_dir;
        if !world.exists() {
            fs::create_dir_all(self.config.region_dir())?;
            return Ok(());
        }
        let name = world
            .file_name()
            .map_or_else(|| "world".to_owned(), |name| name.to_string_lossy().into_owned());
        let backup = world
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(format!("{name}_backup"));
        if backup.exists() {
            info!("backup already present at {}", backup.display());
            return Ok(());
        }
        info!("backing up {} to {}", world.display(), backup.display());
        copy_recursive(world, &backup)?;
        fs::create_dir_all(self.config.region_dir())?;
        Ok(())
    }
}

/// Writes every dirty region buffer to disk, one task per file, awaited
/// jointly. Returns the number of files written.
///
/// # Errors
///
/// Propagates the first write or join failure.
pub async fn flush_regions(cache: &RegionCache) -> AppResult<usize> {
    let dirty = cache.take_dirty();
    let count = dirty.len();

    let mut tasks = Vec::with_capacity(count);
    for (path, bytes) in dirty {
        tasks.push(tokio::spawn(async move {
            tokio::fs::write(&path, &bytes).await
        }));
    }
    for task in tasks {
        task.await.map_err(|error| AppError::Task(error.to_string()))??;
    }
    if count > 0 {
        info!("flushed {count} region files");
    }
    Ok(count)
}

fn copy_recursive(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.metadata()?.is_dir() {
            copy_recursive(&entry.path(), &target)?;
        } else if fs::copy(entry.path(), &target).is_err() {
            warn!("could not back up {}", entry.path().display());
        }
    }
    Ok(())
}
