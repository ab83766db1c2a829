//! Parsed navigation graph document.
//!
//! Mirrors the on-disk layout:
//!
//! ```text
//! { "levels": { "<name>": {
//!     "vertices": [[x, y, {"name": "...", "is_charger": true}], ...],
//!     "lanes":    [[start, end, {"speed_limit": 0.5}], ...] } } }
//! ```
//!
//! The engine consumes a [`NavGraphDocument`] that has already been parsed;
//! [`NavGraphDocument::load`] is a convenience for hosts reading JSON files.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// All levels of a navigation graph, keyed by level name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NavGraphDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_name: Option<String>,
    pub levels: BTreeMap<String, LevelDocument>,
}

/// Raw vertex and lane lists of one level.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelDocument {
    #[serde(default)]
    pub vertices: Vec<VertexRecord>,
    #[serde(default)]
    pub lanes: Vec<LaneRecord>,
}

/// `[x, y, attributes]`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord(pub f32, pub f32, #[serde(default)] pub VertexAttributes);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexAttributes {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_charger: bool,
}

/// `[start_idx, end_idx, attributes]`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneRecord(pub usize, pub usize, #[serde(default)] pub LaneAttributes);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneAttributes {
    #[serde(default)]
    pub speed_limit: f32,
}

impl NavGraphDocument {
    /// Parse a document from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Document holding a single level.
    pub fn single_level(name: impl Into<String>, level: LevelDocument) -> Self {
        let mut levels = BTreeMap::new();
        levels.insert(name.into(), level);
        Self {
            building_name: None,
            levels,
        }
    }

    /// Add or replace a level.
    pub fn with_level(mut self, name: impl Into<String>, level: LevelDocument) -> Self {
        self.levels.insert(name.into(), level);
        self
    }

    /// Combine per-level documents into one. Levels in `other` replace
    /// same-named levels here.
    pub fn merge(mut self, other: NavGraphDocument) -> Self {
        if self.building_name.is_none() {
            self.building_name = other.building_name;
        }
        self.levels.extend(other.levels);
        self
    }
}

impl LevelDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an unnamed, non-charger vertex.
    pub fn vertex(mut self, x: f32, y: f32) -> Self {
        self.vertices
            .push(VertexRecord(x, y, VertexAttributes::default()));
        self
    }

    /// Append a named vertex.
    pub fn named_vertex(mut self, x: f32, y: f32, name: &str) -> Self {
        self.vertices.push(VertexRecord(
            x,
            y,
            VertexAttributes {
                name: name.to_string(),
                is_charger: false,
            },
        ));
        self
    }

    /// Append a charger vertex.
    pub fn charger(mut self, x: f32, y: f32) -> Self {
        self.vertices.push(VertexRecord(
            x,
            y,
            VertexAttributes {
                name: String::new(),
                is_charger: true,
            },
        ));
        self
    }

    /// Append a lane between two vertex indices.
    pub fn lane(mut self, start: usize, end: usize) -> Self {
        self.lanes
            .push(LaneRecord(start, end, LaneAttributes::default()));
        self
    }
}
