//! Fleet event records.

use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::graph::{LaneKey, VertexIdx};
use crate::robot::RobotId;

/// Local time format of the event log file, e.g. `2024-03-01 14:05:09.250`.
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// What happened.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    LevelLoaded {
        level: String,
        vertices: usize,
        lanes: usize,
    },
    Spawned {
        vertex: VertexIdx,
        name: String,
    },
    TaskAssigned {
        destination: VertexIdx,
    },
    TaskCompleted {
        vertex: VertexIdx,
    },
    ChargingStarted {
        vertex: VertexIdx,
    },
    ChargingFinished {
        battery: f32,
    },
    LowBatteryReroute {
        charger: VertexIdx,
    },
    /// No charger could be reached; logged once per low-battery episode
    RerouteFailed,
    Waiting {
        lane: LaneKey,
    },
    Resumed {
        waited_ticks: u32,
    },
    WaitTimedOut {
        vertex: Option<VertexIdx>,
        waited_ticks: u32,
    },
    /// The robot's vertex no longer exists in the loaded level
    Detached {
        vertex: VertexIdx,
    },
}

/// One event, stamped with the tick that produced it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FleetEvent {
    pub tick: u64,
    /// Wall-clock time in milliseconds since the Unix epoch
    pub timestamp_ms: u64,
    /// None for fleet-wide events
    pub robot: Option<RobotId>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl FleetEvent {
    pub fn new(tick: u64, timestamp_ms: u64, robot: Option<RobotId>, kind: EventKind) -> Self {
        Self {
            tick,
            timestamp_ms,
            robot,
            kind,
        }
    }

    /// `"<local time> - <message>"`, the event log file line format.
    pub fn log_line(&self) -> String {
        match i64::try_from(self.timestamp_ms)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
        {
            Some(utc) => format!(
                "{} - {}",
                utc.with_timezone(&Local).format(LOG_TIME_FORMAT),
                self
            ),
            None => format!("{} - {}", self.timestamp_ms, self),
        }
    }
}

struct Subject(Option<RobotId>);

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(id) => write!(f, "Robot {}", id),
            None => f.write_str("Fleet"),
        }
    }
}

impl fmt::Display for FleetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let who = Subject(self.robot);
        match &self.kind {
            EventKind::LevelLoaded {
                level,
                vertices,
                lanes,
            } => write!(
                f,
                "Loaded level {} with {} vertices and {} lanes",
                level, vertices, lanes
            ),
            EventKind::Spawned { vertex, name } => match self.robot {
                Some(id) => write!(f, "Spawned robot {} at vertex {} ({})", id, vertex, name),
                None => write!(f, "Spawned robot at vertex {} ({})", vertex, name),
            },
            EventKind::TaskAssigned { destination } => {
                write!(f, "{} assigned task to vertex {}", who, destination)
            }
            EventKind::TaskCompleted { vertex } => {
                write!(f, "{} completed task at vertex {}", who, vertex)
            }
            EventKind::ChargingStarted { vertex } => {
                write!(f, "{} started charging at vertex {}", who, vertex)
            }
            EventKind::ChargingFinished { battery } => {
                write!(f, "{} finished charging ({:.0}%)", who, battery)
            }
            EventKind::LowBatteryReroute { charger } => write!(
                f,
                "{} low battery, rerouting to charger at vertex {}",
                who, charger
            ),
            EventKind::RerouteFailed => {
                write!(f, "{} low battery, no reachable charger", who)
            }
            EventKind::Waiting { lane } => write!(f, "{} waiting at lane {}", who, lane),
            EventKind::Resumed { waited_ticks } => {
                write!(f, "{} resumed after {} ticks", who, waited_ticks)
            }
            EventKind::WaitTimedOut {
                vertex,
                waited_ticks,
            } => match vertex {
                Some(v) => write!(
                    f,
                    "{} gave up after waiting {} ticks, idle at vertex {}",
                    who, waited_ticks, v
                ),
                None => write!(f, "{} gave up after waiting {} ticks", who, waited_ticks),
            },
            EventKind::Detached { vertex } => write!(
                f,
                "{} detached: vertex {} is not in the loaded level",
                who, vertex
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(robot: Option<u32>, kind: EventKind) -> FleetEvent {
        FleetEvent::new(7, 1_700_000_000_000, robot.map(RobotId), kind)
    }

    #[test]
    fn test_event_messages() {
        let spawned = event(
            Some(1),
            EventKind::Spawned {
                vertex: VertexIdx::new(0),
                name: "dock".to_string(),
            },
        );
        assert_eq!(spawned.to_string(), "Spawned robot 1 at vertex 0 (dock)");

        let waiting = event(
            Some(2),
            EventKind::Waiting {
                lane: LaneKey::new(VertexIdx::new(2), VertexIdx::new(1)),
            },
        );
        assert_eq!(waiting.to_string(), "Robot 2 waiting at lane (1, 2)");

        let reroute = event(
            Some(4),
            EventKind::LowBatteryReroute {
                charger: VertexIdx::new(9),
            },
        );
        assert_eq!(
            reroute.to_string(),
            "Robot 4 low battery, rerouting to charger at vertex 9"
        );
    }

    #[test]
    fn test_log_line() {
        let done = event(
            Some(1),
            EventKind::TaskCompleted {
                vertex: VertexIdx::new(2),
            },
        );
        let line = done.log_line();
        let (time, message) = line.split_once(" - ").unwrap();
        assert_eq!(message, "Robot 1 completed task at vertex 2");

        let parsed = chrono::NaiveDateTime::parse_from_str(time, LOG_TIME_FORMAT).unwrap();
        let expected = DateTime::from_timestamp_millis(1_700_000_000_000)
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(parsed, expected);

        // Out of range timestamps fall back to raw milliseconds
        let far = FleetEvent::new(1, u64::MAX, None, EventKind::RerouteFailed);
        assert!(far.log_line().starts_with("18446744073709551615 - "));
    }

    #[test]
    fn test_event_json() {
        let json = serde_json::to_value(event(
            Some(5),
            EventKind::TaskAssigned {
                destination: VertexIdx::new(3),
            },
        ))
        .unwrap();
        assert_eq!(json["tick"], 7);
        assert_eq!(json["robot"], 5);
        assert_eq!(json["kind"], "task_assigned");
        assert_eq!(json["destination"], 3);

        let json = serde_json::to_value(event(
            None,
            EventKind::LevelLoaded {
                level: "level1".to_string(),
                vertices: 4,
                lanes: 3,
            },
        ))
        .unwrap();
        assert!(json["robot"].is_null());
        assert_eq!(json["level"], "level1");
    }
}
