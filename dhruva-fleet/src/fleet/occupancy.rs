//! Per-tick vertex and lane occupancy.

use std::collections::HashMap;

use crate::graph::{LaneKey, VertexIdx};
use crate::robot::RobotId;

/// Which robots sit on each vertex and which robot holds each lane.
///
/// Rebuilt from the robots every tick; the robots are authoritative.
#[derive(Clone, Debug, Default)]
pub struct OccupancyTable {
    vertices: Vec<Vec<RobotId>>,
    lanes: HashMap<LaneKey, RobotId>,
}

impl OccupancyTable {
    pub fn new(vertex_count: usize) -> Self {
        let mut table = Self::default();
        table.reset(vertex_count);
        table
    }

    /// Clear everything and size the vertex table for the loaded level.
    pub fn reset(&mut self, vertex_count: usize) {
        self.vertices.clear();
        self.vertices.resize(vertex_count, Vec::new());
        self.lanes.clear();
    }

    /// Record `robot` on `vertex`. Returns false if the vertex is out of range.
    pub fn occupy_vertex(&mut self, vertex: VertexIdx, robot: RobotId) -> bool {
        match self.vertices.get_mut(vertex.index()) {
            Some(occupants) => {
                if !occupants.contains(&robot) {
                    occupants.push(robot);
                }
                true
            }
            None => false,
        }
    }

    /// Give `lane` to `robot` unless another robot already holds it.
    ///
    /// Returns true when `robot` holds the lane afterwards.
    pub fn claim_lane(&mut self, lane: LaneKey, robot: RobotId) -> bool {
        *self.lanes.entry(lane).or_insert(robot) == robot
    }

    /// Robots on `vertex` (empty for out-of-range indices).
    pub fn occupants(&self, vertex: VertexIdx) -> &[RobotId] {
        self.vertices
            .get(vertex.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn lane_holder(&self, lane: LaneKey) -> Option<RobotId> {
        self.lanes.get(&lane).copied()
    }

    /// Number of vertices with at least one robot.
    pub fn occupied_vertex_count(&self) -> usize {
        self.vertices.iter().filter(|o| !o.is_empty()).count()
    }

    pub fn held_lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty() && self.vertices.iter().all(Vec::is_empty)
    }
}
