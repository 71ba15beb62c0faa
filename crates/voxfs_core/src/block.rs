//! # Block Specifications
//!
//! A block is a normalized lowercase identifier plus an ordered set of state
//! properties. `"air"` denotes emptiness; the absence of an entry anywhere in
//! the system is equivalent to air.
//!
//! Property keys live in a `BTreeMap`, which *is* the canonical alphabetical
//! order the serialized form requires - no separate sort step exists.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Names the synthesis engine classifies as ground terrain.
const GROUND_NAMES: [&str; 3] = ["grass_block", "dirt", "stone"];

/// The debug palette: one wool color per generation group, cycling.
const WOOL_COLORS: [&str; 16] = [
    "white", "orange", "magenta", "light_blue", "yellow", "lime", "pink", "gray", "light_gray",
    "cyan", "purple", "blue", "brown", "green", "red", "black",
];

/// A normalized block specification.
///
/// Names are lowercase with any namespace prefix stripped, so
/// `"minecraft:Grass_Block"` and `"grass_block"` compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockSpec {
    /// Normalized block name.
    name: String,
    /// State properties, alphabetically ordered by key.
    properties: BTreeMap<String, String>,
}

impl BlockSpec {
    /// Creates a spec from a raw name, normalizing case and namespace.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let name = raw
            .rsplit_once(':')
            .map_or(raw, |(_, bare)| bare)
            .to_ascii_lowercase();
        Self {
            name,
            properties: BTreeMap::new(),
        }
    }

    /// Adds one state property, returning the modified spec.
    #[must_use]
    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_owned(), value.to_owned());
        self
    }

    /// The normalized block name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The state properties in canonical (alphabetical) order.
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// The empty block.
    #[must_use]
    pub fn air() -> Self {
        Self::new("air")
    }

    /// Default terrain surface block.
    #[must_use]
    pub fn grass_block() -> Self {
        Self::new("grass_block")
    }

    /// Subsurface block.
    #[must_use]
    pub fn dirt() -> Self {
        Self::new("dirt")
    }

    /// Deep terrain block, the ore-vein substrate.
    #[must_use]
    pub fn stone() -> Self {
        Self::new("stone")
    }

    /// Pond block.
    #[must_use]
    pub fn water() -> Self {
        Self::new("water")
    }

    /// Tree trunk block.
    #[must_use]
    pub fn oak_log() -> Self {
        Self::new("oak_log")
    }

    /// Tree canopy block.
    #[must_use]
    pub fn oak_leaves() -> Self {
        Self::new("oak_leaves")
    }

    /// Vegetation cover produced by the smoothing pass.
    #[must_use]
    pub fn short_grass() -> Self {
        Self::new("short_grass")
    }

    /// Debug palette block for a generation group, cycling 16 wool colors.
    #[must_use]
    pub fn debug_wool(group: u32) -> Self {
        let color = WOOL_COLORS[(group as usize) % WOOL_COLORS.len()];
        Self::new(&format!("{color}_wool"))
    }

    /// Returns true for the empty block.
    #[inline]
    #[must_use]
    pub fn is_air(&self) -> bool {
        self.name == "air"
    }

    /// Returns true for water.
    #[inline]
    #[must_use]
    pub fn is_water(&self) -> bool {
        self.name == "water"
    }

    /// Returns true for ground-classified terrain.
    ///
    /// Ground is what the smoothing pass may relocate and what anchors
    /// features: grass, dirt, stone, ores, and the debug wools.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        GROUND_NAMES.contains(&self.name.as_str())
            || self.name.ends_with("_ore")
            || self.name.ends_with("_wool")
    }

    /// Returns true for "heavy" blocks: ground, logs, and water.
    ///
    /// A grass block buried under a heavy block converts to dirt.
    #[must_use]
    pub fn is_heavy(&self) -> bool {
        self.is_ground() || self.is_water() || self.name.ends_with("_log")
    }

    /// Canonical serialized form: `name[key=value,key=value]`.
    #[must_use]
    pub fn canonical(&self) -> String {
        if self.properties.is_empty() {
            return self.name.clone();
        }
        let props: Vec<String> = self
            .properties
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        format!("{}[{}]", self.name, props.join(","))
    }
}

impl fmt::Display for BlockSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}
