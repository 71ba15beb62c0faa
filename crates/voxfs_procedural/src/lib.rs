//! # VOXFS Procedural Synthesis
//!
//! Assigns every scanned file to a voxel position with a randomized
//! frontier-growth algorithm, then makes the result look like terrain:
//! smoothing, trees, ponds, ore veins.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: same seed always produces the same terrain
//! 2. **Mapping-driven**: the mapping is the closed set; membership tests
//!    are O(1) and no position is claimed twice
//! 3. **Tunable**: every empirically tuned constant is a `SynthesisTuning`
//!    field, not a hard invariant
//!
//! ## Core Components
//!
//! - `TerrainRng`: the single seedable randomness facade
//! - `Synthesizer`: frontier growth with grouping and pending features
//! - `smooth_chunk`: fixed-point lonely-block relocation
//! - `decorate_chunk`: burial/submersion rules and ore-vein injection

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod features;
pub mod rng;
pub mod smoothing;
pub mod synthesis;

pub use features::{decorate_chunk, tree_blocks, TREE_BLOCK_COUNT};
pub use rng::TerrainRng;
pub use smoothing::smooth_chunk;
pub use synthesis::{SynthesisConfig, SynthesisReport, SynthesisTuning, Synthesizer};
