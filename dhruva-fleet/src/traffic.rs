//! Whole-route lane and intersection reservations.
//!
//! An optional layer on top of the reactive coordinator: a robot reserves
//! every lane of its route and queues at every intermediate vertex before it
//! starts moving. Requests are all-or-nothing.

use std::collections::HashMap;

use thiserror::Error;

use crate::graph::{LaneKey, VertexIdx};
use crate::robot::RobotId;

/// Why a reservation request was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReservationError {
    #[error("Cannot reserve an empty path")]
    EmptyPath,

    #[error("Lane {lane} is reserved by robot {holder}")]
    LaneReserved { lane: LaneKey, holder: RobotId },

    #[error("Vertex {vertex} has robot {holder} queued")]
    IntersectionQueued { vertex: VertexIdx, holder: RobotId },
}

/// Lane reservations and per-vertex intersection queues.
#[derive(Clone, Debug, Default)]
pub struct TrafficReservation {
    lanes: HashMap<LaneKey, RobotId>,
    intersections: HashMap<VertexIdx, Vec<RobotId>>,
}

impl TrafficReservation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve every lane along `path` and queue `robot` at each interior
    /// vertex.
    ///
    /// Lanes already held by `robot` are accepted. Nothing is reserved
    /// unless the whole request succeeds.
    pub fn request_path(
        &mut self,
        robot: RobotId,
        path: &[VertexIdx],
    ) -> Result<(), ReservationError> {
        if path.is_empty() {
            return Err(ReservationError::EmptyPath);
        }

        for pair in path.windows(2) {
            let lane = LaneKey::new(pair[0], pair[1]);
            if let Some(&holder) = self.lanes.get(&lane)
                && holder != robot
            {
                return Err(ReservationError::LaneReserved { lane, holder });
            }
        }

        for &vertex in interior(path) {
            let mut queued = self.intersections.get(&vertex).into_iter().flatten();
            if let Some(&holder) = queued.find(|&&r| r != robot) {
                return Err(ReservationError::IntersectionQueued { vertex, holder });
            }
        }

        for pair in path.windows(2) {
            self.lanes.insert(LaneKey::new(pair[0], pair[1]), robot);
        }
        for &vertex in interior(path) {
            let queue = self.intersections.entry(vertex).or_default();
            if !queue.contains(&robot) {
                queue.push(robot);
            }
        }

        tracing::debug!("Robot {} reserved {} vertices", robot, path.len());
        Ok(())
    }

    /// Undo the reservations `robot` holds along `path`.
    ///
    /// Entries owned by other robots are left alone.
    pub fn release_path(&mut self, robot: RobotId, path: &[VertexIdx]) {
        for pair in path.windows(2) {
            let lane = LaneKey::new(pair[0], pair[1]);
            if self.lanes.get(&lane) == Some(&robot) {
                self.lanes.remove(&lane);
            }
        }
        for vertex in interior(path) {
            if let Some(queue) = self.intersections.get_mut(vertex) {
                queue.retain(|&r| r != robot);
                if queue.is_empty() {
                    self.intersections.remove(vertex);
                }
            }
        }
    }

    pub fn lane_holder(&self, lane: LaneKey) -> Option<RobotId> {
        self.lanes.get(&lane).copied()
    }

    /// Robots queued at `vertex`, in request order.
    pub fn queue(&self, vertex: VertexIdx) -> &[RobotId] {
        self.intersections
            .get(&vertex)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty() && self.intersections.is_empty()
    }

    pub fn clear(&mut self) {
        self.lanes.clear();
        self.intersections.clear();
    }
}

/// Vertices of `path` excluding both ends.
fn interior(path: &[VertexIdx]) -> &[VertexIdx] {
    if path.len() > 2 {
        &path[1..path.len() - 1]
    } else {
        &[]
    }
}
