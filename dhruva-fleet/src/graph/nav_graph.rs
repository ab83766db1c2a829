//! Navigation graph of the currently loaded level.

use std::collections::BTreeMap;

use crate::error::{FleetError, Result};
use crate::utils::{WorldPoint, polyline_length};

use super::document::{LevelDocument, NavGraphDocument};
use super::search;
use super::types::{Lane, Vertex, VertexIdx};

/// Multi-level navigation graph with one level loaded at a time.
///
/// Vertices and lanes of the loaded level are immutable until the next
/// [`NavGraph::load_level`], which replaces them wholesale.
#[derive(Clone, Debug, Default)]
pub struct NavGraph {
    levels: BTreeMap<String, LevelDocument>,
    current_level: Option<String>,
    vertices: Vec<Vertex>,
    lanes: Vec<Lane>,
    /// Neighbours of each vertex in lane-declaration order
    adjacency: Vec<Vec<VertexIdx>>,
}

impl NavGraph {
    /// Create a graph over `document` with no level loaded.
    pub fn new(document: NavGraphDocument) -> Self {
        Self {
            levels: document.levels,
            ..Default::default()
        }
    }

    /// Create a graph and load `level` immediately.
    pub fn with_level(document: NavGraphDocument, level: &str) -> Result<Self> {
        let mut graph = Self::new(document);
        graph.load_level(level)?;
        Ok(graph)
    }

    /// Replace the loaded vertices and lanes with those of level `name`.
    ///
    /// Lanes are validated before anything is swapped in: on error the
    /// previously loaded level stays intact.
    pub fn load_level(&mut self, name: &str) -> Result<()> {
        let level = self
            .levels
            .get(name)
            .ok_or_else(|| FleetError::LevelNotFound(name.to_string()))?;

        let vertices: Vec<Vertex> = level
            .vertices
            .iter()
            .map(|record| Vertex {
                position: WorldPoint::new(record.0, record.1),
                name: (!record.2.name.is_empty()).then(|| record.2.name.clone()),
                is_charger: record.2.is_charger,
            })
            .collect();

        let vertex_count = vertices.len();
        let mut lanes = Vec::with_capacity(level.lanes.len());
        let mut adjacency = vec![Vec::new(); vertex_count];

        for (lane_idx, record) in level.lanes.iter().enumerate() {
            for endpoint in [record.0, record.1] {
                if endpoint >= vertex_count {
                    return Err(FleetError::CorruptGraph {
                        lane: lane_idx,
                        endpoint,
                        vertex_count,
                    });
                }
            }

            let lane = Lane {
                start: VertexIdx::new(record.0),
                end: VertexIdx::new(record.1),
                speed_limit: record.2.speed_limit,
            };
            // Parallel and reversed duplicate lanes add no new neighbour
            if !adjacency[record.0].contains(&lane.end) {
                adjacency[record.0].push(lane.end);
            }
            if !adjacency[record.1].contains(&lane.start) {
                adjacency[record.1].push(lane.start);
            }
            lanes.push(lane);
        }

        tracing::info!(
            "Loaded level '{}': {} vertices, {} lanes, {} chargers",
            name,
            vertex_count,
            lanes.len(),
            vertices.iter().filter(|v| v.is_charger).count()
        );

        self.vertices = vertices;
        self.lanes = lanes;
        self.adjacency = adjacency;
        self.current_level = Some(name.to_string());
        Ok(())
    }

    /// Name of the loaded level.
    pub fn current_level(&self) -> Option<&str> {
        self.current_level.as_deref()
    }

    /// Names of all levels in the document.
    pub fn level_names(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(String::as_str)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// Vertex at `idx`, if it exists in the loaded level.
    #[inline]
    pub fn vertex(&self, idx: VertexIdx) -> Option<&Vertex> {
        self.vertices.get(idx.index())
    }

    #[inline]
    pub fn contains(&self, idx: VertexIdx) -> bool {
        idx.index() < self.vertices.len()
    }

    /// Whether `idx` is a charger vertex (false when out of range).
    #[inline]
    pub fn is_charger(&self, idx: VertexIdx) -> bool {
        self.vertex(idx).is_some_and(|v| v.is_charger)
    }

    /// First vertex whose display name equals `name`.
    pub fn vertex_by_name(&self, name: &str) -> Option<VertexIdx> {
        self.vertices
            .iter()
            .position(|v| v.name.as_deref() == Some(name))
            .map(VertexIdx::new)
    }

    /// Vertices reachable from `idx` over one lane, in lane-declaration order.
    pub fn adjacent_vertices(&self, idx: VertexIdx) -> &[VertexIdx] {
        self.adjacency
            .get(idx.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First declared lane connecting `a` and `b` in either direction.
    pub fn lane_between(&self, a: VertexIdx, b: VertexIdx) -> Option<&Lane> {
        self.lanes.iter().find(|lane| lane.connects(a, b))
    }

    /// Fewest-hop path from `start` to `end`, both inclusive.
    ///
    /// Empty when no path exists; `[start]` when `start == end`.
    pub fn shortest_path(&self, start: VertexIdx, end: VertexIdx) -> Vec<VertexIdx> {
        search::shortest_path(&self.adjacency, start, end)
    }

    /// Indices of all charger vertices.
    pub fn chargers(&self) -> impl Iterator<Item = VertexIdx> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_charger)
            .map(|(i, _)| VertexIdx::new(i))
    }

    /// Charger with the smallest straight-line distance to `point`.
    pub fn nearest_charger(&self, point: WorldPoint) -> Option<VertexIdx> {
        self.chargers().min_by(|a, b| {
            let da = self.vertices[a.index()].position.distance(point);
            let db = self.vertices[b.index()].position.distance(point);
            da.total_cmp(&db)
        })
    }

    /// Geometric length of a vertex path (out-of-range vertices are skipped).
    pub fn path_length(&self, path: &[VertexIdx]) -> f32 {
        let points: Vec<WorldPoint> = path
            .iter()
            .filter_map(|&idx| self.vertex(idx).map(|v| v.position))
            .collect();
        polyline_length(&points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn v(i: usize) -> VertexIdx {
        VertexIdx::new(i)
    }

    fn line_level() -> LevelDocument {
        // 0 --- 1 --- 2     3 (isolated charger)
        LevelDocument::new()
            .named_vertex(0.0, 0.0, "start")
            .vertex(1.0, 0.0)
            .named_vertex(2.0, 0.0, "end")
            .charger(10.0, 10.0)
            .lane(0, 1)
            .lane(1, 2)
    }

    fn make_graph() -> NavGraph {
        let doc = NavGraphDocument::single_level("level1", line_level())
            .with_level("level2", LevelDocument::new().vertex(0.0, 0.0));
        NavGraph::with_level(doc, "level1").unwrap()
    }

    #[test]
    fn test_load_level() {
        let graph = make_graph();
        assert_eq!(graph.current_level(), Some("level1"));
        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.lane_count(), 2);
        assert_eq!(graph.vertex(v(0)).unwrap().name.as_deref(), Some("start"));
        assert_eq!(graph.vertex(v(1)).unwrap().name, None);
        assert!(graph.vertex(v(4)).is_none());
        assert_eq!(graph.level_names().collect::<Vec<_>>(), vec!["level1", "level2"]);
    }

    #[test]
    fn test_load_unknown_level_keeps_state() {
        let mut graph = make_graph();
        let err = graph.load_level("missing").unwrap_err();
        assert!(matches!(err, FleetError::LevelNotFound(ref name) if name == "missing"));
        assert_eq!(graph.current_level(), Some("level1"));
        assert_eq!(graph.vertex_count(), 4);
    }

    #[test]
    fn test_corrupt_lane_rejected_at_load() {
        let doc = NavGraphDocument::single_level("good", line_level()).with_level(
            "bad",
            LevelDocument::new().vertex(0.0, 0.0).vertex(1.0, 0.0).lane(0, 5),
        );
        let mut graph = NavGraph::with_level(doc, "good").unwrap();

        let err = graph.load_level("bad").unwrap_err();
        assert!(matches!(
            err,
            FleetError::CorruptGraph {
                lane: 0,
                endpoint: 5,
                vertex_count: 2
            }
        ));
        // Prior level untouched
        assert_eq!(graph.current_level(), Some("good"));
        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.shortest_path(v(0), v(2)).len(), 3);
    }

    #[test]
    fn test_level_switch_replaces_everything() {
        let mut graph = make_graph();
        graph.load_level("level2").unwrap();
        assert_eq!(graph.vertex_count(), 1);
        assert_eq!(graph.lane_count(), 0);
        assert!(graph.adjacent_vertices(v(0)).is_empty());
        assert!(graph.chargers().next().is_none());
    }

    #[test]
    fn test_adjacent_vertices_in_lane_order() {
        let doc = NavGraphDocument::single_level(
            "l",
            LevelDocument::new()
                .vertex(0.0, 0.0)
                .vertex(1.0, 0.0)
                .vertex(0.0, 1.0)
                .vertex(1.0, 1.0)
                .lane(0, 3)
                .lane(1, 0)
                .lane(0, 2),
        );
        let graph = NavGraph::with_level(doc, "l").unwrap();
        assert_eq!(graph.adjacent_vertices(v(0)), &[v(3), v(1), v(2)]);
        assert_eq!(graph.adjacent_vertices(v(1)), &[v(0)]);
        assert!(graph.adjacent_vertices(v(99)).is_empty());
    }

    #[test]
    fn test_duplicate_lanes_list_neighbour_once() {
        let doc = NavGraphDocument::single_level(
            "l",
            LevelDocument::new()
                .vertex(0.0, 0.0)
                .vertex(1.0, 0.0)
                .vertex(2.0, 0.0)
                .lane(0, 1)
                .lane(1, 0)
                .lane(0, 1)
                .lane(1, 2)
                .lane(2, 2),
        );
        let graph = NavGraph::with_level(doc, "l").unwrap();
        assert_eq!(graph.lane_count(), 5);
        assert_eq!(graph.adjacent_vertices(v(0)), &[v(1)]);
        assert_eq!(graph.adjacent_vertices(v(1)), &[v(0), v(2)]);
        assert_eq!(graph.adjacent_vertices(v(2)), &[v(1), v(2)]);
        assert_eq!(graph.shortest_path(v(0), v(2)), vec![v(0), v(1), v(2)]);
    }

    #[test]
    fn test_shortest_path() {
        let graph = make_graph();
        assert_eq!(graph.shortest_path(v(0), v(2)), vec![v(0), v(1), v(2)]);
        assert_eq!(graph.shortest_path(v(2), v(0)), vec![v(2), v(1), v(0)]);
        assert_eq!(graph.shortest_path(v(1), v(1)), vec![v(1)]);
        // Disconnected charger
        assert!(graph.shortest_path(v(0), v(3)).is_empty());
    }

    #[test]
    fn test_lookup_helpers() {
        let graph = make_graph();
        assert_eq!(graph.vertex_by_name("end"), Some(v(2)));
        assert_eq!(graph.vertex_by_name("nowhere"), None);
        assert!(graph.lane_between(v(2), v(1)).is_some());
        assert!(graph.lane_between(v(0), v(2)).is_none());
        assert!(graph.is_charger(v(3)));
        assert!(!graph.is_charger(v(0)));
        assert!(!graph.is_charger(v(50)));
    }

    #[test]
    fn test_nearest_charger() {
        let doc = NavGraphDocument::single_level(
            "l",
            LevelDocument::new()
                .charger(0.0, 0.0)
                .vertex(5.0, 0.0)
                .charger(8.0, 0.0),
        );
        let graph = NavGraph::with_level(doc, "l").unwrap();
        assert_eq!(graph.nearest_charger(WorldPoint::new(3.0, 0.0)), Some(v(0)));
        assert_eq!(graph.nearest_charger(WorldPoint::new(6.0, 0.0)), Some(v(2)));

        let graph = make_graph();
        assert_eq!(graph.chargers().collect::<Vec<_>>(), vec![v(3)]);
    }

    #[test]
    fn test_path_length() {
        let graph = make_graph();
        assert_relative_eq!(graph.path_length(&[v(0), v(1), v(2)]), 2.0);
        assert_eq!(graph.path_length(&[v(1)]), 0.0);
    }
}
