//! Vertex, lane and index types for the navigation graph.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::WorldPoint;

/// Index of a vertex in the currently loaded level.
///
/// Indices are only meaningful for the level they were obtained from; a
/// level switch invalidates every index held elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexIdx(usize);

impl VertexIdx {
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for VertexIdx {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for VertexIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical, direction-free identifier of a lane: `(min, max)` of its
/// endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LaneKey {
    lo: VertexIdx,
    hi: VertexIdx,
}

impl LaneKey {
    /// Build the key for a lane between `a` and `b`, in either order.
    #[inline]
    pub fn new(a: VertexIdx, b: VertexIdx) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    #[inline]
    pub fn lo(self) -> VertexIdx {
        self.lo
    }

    #[inline]
    pub fn hi(self) -> VertexIdx {
        self.hi
    }
}

impl fmt::Display for LaneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lo, self.hi)
    }
}

/// A navigable point in the facility graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    /// Position in map coordinates
    pub position: WorldPoint,
    /// Display name (None when the document leaves it empty)
    pub name: Option<String>,
    /// Chargers are exempt from the single-occupant rule
    pub is_charger: bool,
}

impl Vertex {
    pub fn new(position: WorldPoint) -> Self {
        Self {
            position,
            name: None,
            is_charger: false,
        }
    }

    /// Name for log output, empty when unnamed.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// An undirected traversable edge between two vertices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lane {
    pub start: VertexIdx,
    pub end: VertexIdx,
    /// Reserved; lane traversal time does not depend on it yet.
    pub speed_limit: f32,
}

impl Lane {
    #[inline]
    pub fn key(&self) -> LaneKey {
        LaneKey::new(self.start, self.end)
    }

    /// The endpoint opposite `from`, if `from` is an endpoint of this lane.
    #[inline]
    pub fn other_end(&self, from: VertexIdx) -> Option<VertexIdx> {
        if self.start == from {
            Some(self.end)
        } else if self.end == from {
            Some(self.start)
        } else {
            None
        }
    }

    #[inline]
    pub fn connects(&self, a: VertexIdx, b: VertexIdx) -> bool {
        self.key() == LaneKey::new(a, b)
    }
}

/// A lane being traversed in a specific direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirectedLane {
    pub from: VertexIdx,
    pub to: VertexIdx,
}

impl DirectedLane {
    #[inline]
    pub fn new(from: VertexIdx, to: VertexIdx) -> Self {
        Self { from, to }
    }

    #[inline]
    pub fn key(&self) -> LaneKey {
        LaneKey::new(self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> VertexIdx {
        VertexIdx::new(i)
    }

    #[test]
    fn test_lane_key_is_direction_free() {
        assert_eq!(LaneKey::new(v(1), v(2)), LaneKey::new(v(2), v(1)));
        let key = LaneKey::new(v(5), v(3));
        assert_eq!(key.lo(), v(3));
        assert_eq!(key.hi(), v(5));
        assert_eq!(key.to_string(), "(3, 5)");
    }

    #[test]
    fn test_lane_other_end() {
        let lane = Lane {
            start: v(0),
            end: v(4),
            speed_limit: 0.0,
        };
        assert_eq!(lane.other_end(v(0)), Some(v(4)));
        assert_eq!(lane.other_end(v(4)), Some(v(0)));
        assert_eq!(lane.other_end(v(2)), None);
        assert!(lane.connects(v(4), v(0)));
        assert!(!lane.connects(v(4), v(1)));
    }

    #[test]
    fn test_directed_lane_key() {
        let forward = DirectedLane::new(v(1), v(2));
        let backward = DirectedLane::new(v(2), v(1));
        assert_ne!(forward, backward);
        assert_eq!(forward.key(), backward.key());
    }

    #[test]
    fn test_vertex_label() {
        let mut vertex = Vertex::new(WorldPoint::ZERO);
        assert_eq!(vertex.label(), "");
        vertex.name = Some("dock".to_string());
        assert_eq!(vertex.label(), "dock");
    }
}
