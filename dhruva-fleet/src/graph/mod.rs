//! Navigation graph: levels, vertices, lanes and shortest paths.
//!
//! - Parsed document model of the multi-level graph file
//! - Arena-style vertex indices and direction-free lane keys
//! - Unit-cost Dijkstra over the loaded level

mod document;
mod nav_graph;
mod search;
mod types;

pub use document::{
    LaneAttributes, LaneRecord, LevelDocument, NavGraphDocument, VertexAttributes, VertexRecord,
};
pub use nav_graph::NavGraph;
pub use types::{DirectedLane, Lane, LaneKey, Vertex, VertexIdx};
