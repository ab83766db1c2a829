use serde::Serialize;

use crate::graph::VertexIdx;

use super::{Robot, RobotId, RobotStatus};

/// Point-in-time view of one robot.
///
/// `x`/`y` are null for a robot that has been detached from the graph.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RobotSnapshot {
    pub id: RobotId,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub status: RobotStatus,
    pub battery: f32,
    pub destination_vertex_idx: Option<VertexIdx>,
    pub current_vertex_idx: Option<VertexIdx>,
}

impl From<&Robot> for RobotSnapshot {
    fn from(robot: &Robot) -> Self {
        let position = robot.position();
        Self {
            id: robot.id(),
            x: position.map(|p| p.x),
            y: position.map(|p| p.y),
            status: robot.status(),
            battery: robot.battery(),
            destination_vertex_idx: robot.destination(),
            current_vertex_idx: robot.current_vertex(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RobotConfig;
    use crate::utils::WorldPoint;

    #[test]
    fn test_snapshot_json() {
        let robot = Robot::new(
            RobotId(3),
            VertexIdx::new(2),
            WorldPoint::new(1.5, -2.0),
            RobotConfig::default(),
        );
        let snapshot = RobotSnapshot::from(&robot);
        assert_eq!(snapshot.x, Some(1.5));
        assert_eq!(snapshot.current_vertex_idx, Some(VertexIdx::new(2)));

        let json: serde_json::Value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["status"], "IDLE");
        assert_eq!(json["battery"], 100.0);
        assert_eq!(json["current_vertex_idx"], 2);
        assert!(json["destination_vertex_idx"].is_null());
    }
}
