//! Shared helpers for integration tests.
#![allow(dead_code)]

use dhruva_fleet::{
    FleetConfig, FleetCoordinator, FleetEvent, LevelDocument, NavGraph, NavGraphDocument,
    VertexIdx,
};

pub fn v(i: usize) -> VertexIdx {
    VertexIdx::new(i)
}

/// `n` vertices one unit apart on the x axis, joined in order.
pub fn line_level(n: usize) -> LevelDocument {
    let mut level = LevelDocument::new();
    for i in 0..n {
        level = level.vertex(i as f32, 0.0);
    }
    for i in 1..n {
        level = level.lane(i - 1, i);
    }
    level
}

/// `width` x `height` grid with 4-connected lanes and chargers in the
/// four corners. Vertex index is `y * width + x`.
pub fn grid_level(width: usize, height: usize) -> LevelDocument {
    let corners = [0, width - 1, (height - 1) * width, height * width - 1];
    let mut level = LevelDocument::new();
    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            level = if corners.contains(&idx) {
                level.charger(x as f32, y as f32)
            } else {
                level.vertex(x as f32, y as f32)
            };
        }
    }
    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            if x + 1 < width {
                level = level.lane(idx, idx + 1);
            }
            if y + 1 < height {
                level = level.lane(idx, idx + width);
            }
        }
    }
    level
}

pub fn graph(level: LevelDocument) -> NavGraph {
    NavGraph::with_level(NavGraphDocument::single_level("level1", level), "level1").unwrap()
}

pub fn fleet(level: LevelDocument) -> FleetCoordinator {
    FleetCoordinator::new(graph(level), &FleetConfig::default())
}

pub fn fleet_with(level: LevelDocument, config: &FleetConfig) -> FleetCoordinator {
    FleetCoordinator::new(graph(level), config)
}

/// Run `ticks` ticks and collect every event.
pub fn run(fleet: &mut FleetCoordinator, ticks: usize) -> Vec<FleetEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        events.extend(fleet.tick());
    }
    events
}
