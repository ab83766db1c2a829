use std::fmt;

use serde::Serialize;

/// Lifecycle state of a robot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RobotStatus {
    /// At rest on a vertex with no task
    #[default]
    Idle,
    /// Traversing a lane towards the destination
    Moving,
    /// Held back by the coordinator; retries every tick
    Waiting,
    /// Parked on a charger, battery rising
    Charging,
    /// Reached the destination of its last task
    TaskComplete,
}

impl RobotStatus {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Moving => "MOVING",
            Self::Waiting => "WAITING",
            Self::Charging => "CHARGING",
            Self::TaskComplete => "TASK_COMPLETE",
        }
    }

    /// Moving or waiting, i.e. a lane is committed.
    #[inline]
    pub fn is_travelling(self) -> bool {
        matches!(self, Self::Moving | Self::Waiting)
    }

    /// No work in progress; the robot will not change on its own.
    #[inline]
    pub fn is_at_rest(self) -> bool {
        matches!(self, Self::Idle | Self::TaskComplete)
    }
}

impl fmt::Display for RobotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_names() {
        assert_eq!(RobotStatus::default(), RobotStatus::Idle);
        assert_eq!(RobotStatus::TaskComplete.to_string(), "TASK_COMPLETE");
        assert_eq!(
            serde_json::to_string(&RobotStatus::Charging).unwrap(),
            "\"CHARGING\""
        );
    }

    #[test]
    fn test_status_groups() {
        assert!(RobotStatus::Waiting.is_travelling());
        assert!(!RobotStatus::Charging.is_travelling());
        assert!(RobotStatus::TaskComplete.is_at_rest());
        assert!(!RobotStatus::Charging.is_at_rest());
    }
}
