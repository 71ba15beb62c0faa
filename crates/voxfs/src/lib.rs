//! # VOXFS
//!
//! Maps every file under a scan root onto a voxel position in a persistent
//! Anvil-format world, then keeps the mapping synchronized as the world's
//! stored bytes change: mine a block in-game and the file it stands for is
//! reported gone.
//!
//! ## Pipeline
//!
//! 1. **Scan**: walk the filesystem into an ordered handle list
//! 2. **Build**: frontier-growth synthesis, smoothing, decoration, region
//!    encode (one backup of the world directory before the first mutation)
//! 3. **Sync**: hash-gated change detection, divergence reporting, snapshot
//!    persistence - until Ctrl-C
//!
//! ## Core Components
//!
//! - `WorldConfig`: TOML-backed configuration with tuned defaults
//! - `WorldBuilder`: the build pipeline
//! - `SyncLoop`: the change-detection loop
//! - `raycast`: first-hit lookup for pointer queries

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod builder;
pub mod config;
pub mod error;
pub mod notify;
pub mod raycast;
pub mod scanner;
pub mod sync;

pub use builder::{flush_regions, BuildReport, WorldBuilder};
pub use config::WorldConfig;
pub use error::{AppError, AppResult};
pub use notify::{DivergenceEvent, FileLifecycle, LoggingLifecycle};
pub use raycast::raycast;
pub use scanner::scan_files;
pub use sync::SyncLoop;
