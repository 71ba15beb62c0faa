//! # World Configuration
//!
//! Loaded once at startup from a TOML file; every field has a tuned
//! default, so an empty file (or none at all) is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use voxfs_core::{Bounds, Coordinate};
use voxfs_procedural::{SynthesisConfig, SynthesisTuning};

use crate::error::{AppError, AppResult};

/// The complete run configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Directory tree to scan for files.
    pub scan_root: PathBuf,
    /// World save directory (holds `region/`).
    pub world_dir: PathBuf,
    /// Where the compressed mapping snapshot lives.
    pub snapshot_path: PathBuf,
    /// Pin the terrain seed; absent means seed from the clock.
    pub seed: Option<u64>,
    /// Short-parent truncation depth for generation groups.
    pub group_depth: usize,
    /// Color terrain by group index instead of grass.
    pub debug_palette: bool,
    /// Inclusive minimum corner of the hard world bound.
    pub world_min: [i32; 3],
    /// Exclusive maximum corner of the hard world bound.
    pub world_max: [i32; 3],
    /// Lowest section index the storage format version carries.
    pub format_min_section_y: i32,
    /// Sectors allocated per chunk when formatting a fresh region.
    pub sectors_per_chunk: u8,
    /// Seconds between change-detection ticks.
    pub sync_interval_secs: u64,
    /// Seconds between mapping snapshots.
    pub snapshot_interval_secs: u64,
    /// Synthesis and decoration knobs.
    pub tuning: SynthesisTuning,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            scan_root: PathBuf::from("files"),
            world_dir: PathBuf::from("world"),
            snapshot_path: PathBuf::from("world/voxfs_mapping.snapshot"),
            seed: None,
            group_depth: 1,
            debug_palette: false,
            world_min: [-256, 0, -256],
            world_max: [256, 64, 256],
            format_min_section_y: -4,
            sectors_per_chunk: 2,
            sync_interval_secs: 10,
            snapshot_interval_secs: 60,
            tuning: SynthesisTuning::default(),
        }
    }
}

impl WorldConfig {
    /// Loads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Unreadable or malformed files are fatal startup errors.
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = fs::read_to_string(path).map_err(|error| {
            AppError::Config(format!("cannot read {}: {error}", path.display()))
        })?;
        toml::from_str(&text).map_err(|error| {
            AppError::Config(format!("cannot parse {}: {error}", path.display()))
        })
    }

    /// The hard world bound.
    #[must_use]
    pub fn world_bounds(&self) -> Bounds {
        Bounds::new(
            Coordinate::new(self.world_min[0], self.world_min[1], self.world_min[2]),
            Coordinate::new(self.world_max[0], self.world_max[1], self.world_max[2]),
        )
    }

    /// The synthesis view of this configuration.
    #[must_use]
    pub fn synthesis(&self) -> SynthesisConfig {
        SynthesisConfig {
            world_bounds: self.world_bounds(),
            group_depth: self.group_depth,
            debug_palette: self.debug_palette,
            tuning: self.tuning.clone(),
        }
    }

    /// The world's `region/` directory.
    #[must_use]
    pub fn region_dir(&self) -> PathBuf {
        self.world_dir.join("region")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = WorldConfig::default();
        let bounds = config.world_bounds();
        assert!(bounds.contains(Coordinate::new(0, 32, 0)));
        assert_eq!(config.group_depth, 1);
        assert_eq!(config.tuning.tree_pool_size, 62);
        assert_eq!(config.region_dir(), PathBuf::from("world/region"));
    }

    #[test]
    fn test_partial_toml_overlays_defaults() {
        let parsed: WorldConfig = toml::from_str(
            r#"
            scan_root = "/data/projects"
            seed = 42
            debug_palette = true

            [tuning]
            pond_iteration_cap = 500
            "#,
        )
        .unwrap();
        assert_eq!(parsed.scan_root, PathBuf::from("/data/projects"));
        assert_eq!(parsed.seed, Some(42));
        assert!(parsed.debug_palette);
        assert_eq!(parsed.tuning.pond_iteration_cap, 500);
        // Untouched fields keep their defaults.
        assert_eq!(parsed.tuning.tree_pool_size, 62);
        assert_eq!(parsed.sync_interval_secs, 10);
    }

    #[test]
    fn test_malformed_toml_is_fatal() {
        let result = WorldConfig::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
