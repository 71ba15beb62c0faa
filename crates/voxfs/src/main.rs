//! # VOXFS Binary
//!
//! Scan a directory tree, grow it into terrain, write it into an
//! Anvil-format world, then watch the world for mining until Ctrl-C.
//!
//! ```bash
//! # Run with the defaults (./files -> ./world)
//! ./voxfs
//!
//! # Run with a config file
//! ./voxfs voxfs.toml
//! ```

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing_subscriber::EnvFilter;

use voxfs::{
    flush_regions, scan_files, AppResult, LoggingLifecycle, SyncLoop, WorldBuilder, WorldConfig,
};
use voxfs_anvil::RegionCache;
use voxfs_core::Mapping;
use voxfs_procedural::TerrainRng;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("fatal: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("                           VOXFS v0.1.0");
    println!("                 your filesystem, as a world");
    println!("═══════════════════════════════════════════════════════════════════");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => WorldConfig::load(Path::new(&path))?,
        None => WorldConfig::default(),
    };
    println!("  scan root : {}", config.scan_root.display());
    println!("  world dir : {}", config.world_dir.display());

    let files = scan_files(&config.scan_root)?;
    println!("  files     : {}", files.len());

    let mut mapping = if config.snapshot_path.exists() {
        let restored = Mapping::load_snapshot(&config.snapshot_path)?;
        println!("  restored  : {} mapped positions", restored.len());
        restored
    } else {
        Mapping::new()
    };

    let cache = RegionCache::new(config.region_dir());
    let mut rng = config
        .seed
        .map_or_else(TerrainRng::from_time, TerrainRng::from_seed);

    let builder = WorldBuilder::new(&config, &cache);
    let report = builder.build(&mut mapping, files, &mut rng)?;
    flush_regions(&cache).await?;
    println!(
        "  built     : {} blocks in {} chunks ({} groups, {} oversized, {} unallocated)",
        report.placed, report.chunks, report.groups_closed, report.oversized, report.unallocated
    );

    mapping.save_snapshot(&config.snapshot_path)?;

    let mapping = Arc::new(RwLock::new(mapping));
    let sync = SyncLoop::new(
        &config,
        &cache,
        Arc::clone(&mapping),
        Box::new(LoggingLifecycle {
            group_depth: config.group_depth,
        }),
    );
    sync.run().await
}
