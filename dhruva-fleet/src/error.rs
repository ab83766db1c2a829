//! Error types for DhruvaFleet

use thiserror::Error;

use crate::graph::VertexIdx;
use crate::robot::RobotId;

/// DhruvaFleet error type
#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Level '{0}' not found in navigation graph")]
    LevelNotFound(String),

    #[error("Corrupt graph: lane {lane} references vertex {endpoint} but level has {vertex_count} vertices")]
    CorruptGraph {
        lane: usize,
        endpoint: usize,
        vertex_count: usize,
    },

    #[error("Invalid vertex {0}")]
    InvalidVertex(VertexIdx),

    #[error("Vertex {0} is already occupied")]
    VertexOccupied(VertexIdx),

    #[error("Robot {0} not found")]
    RobotNotFound(RobotId),

    #[error("Robot {0} is not positioned on the graph")]
    RobotUnpositioned(RobotId),

    #[error("Invalid destination vertex {0}")]
    InvalidDestination(VertexIdx),

    #[error("Destination vertex {0} is occupied")]
    DestinationOccupied(VertexIdx),

    #[error("Unknown vertex name '{0}'")]
    UnknownVertexName(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Graph document error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<toml::de::Error> for FleetError {
    fn from(e: toml::de::Error) -> Self {
        FleetError::Config(e.to_string())
    }
}

impl FleetError {
    /// Short error code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::LevelNotFound(_) => "LEVEL_NOT_FOUND",
            Self::CorruptGraph { .. } => "CORRUPT_GRAPH",
            Self::InvalidVertex(_) => "INVALID_VERTEX",
            Self::VertexOccupied(_) => "VERTEX_OCCUPIED",
            Self::RobotNotFound(_) => "ROBOT_NOT_FOUND",
            Self::RobotUnpositioned(_) => "ROBOT_UNPOSITIONED",
            Self::InvalidDestination(_) => "INVALID_DESTINATION",
            Self::DestinationOccupied(_) => "DESTINATION_OCCUPIED",
            Self::UnknownVertexName(_) => "UNKNOWN_VERTEX_NAME",
            Self::Config(_) => "CONFIG",
            Self::Io(_) => "IO",
            Self::Json(_) => "JSON",
        }
    }

    /// Whether the error was caused by another robot holding a resource.
    ///
    /// Occupancy conflicts are expected during normal operation and the
    /// caller may simply retry later.
    pub fn is_occupancy_conflict(&self) -> bool {
        matches!(
            self,
            Self::VertexOccupied(_) | Self::DestinationOccupied(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FleetError::VertexOccupied(VertexIdx::new(3));
        assert_eq!(err.to_string(), "Vertex 3 is already occupied");

        let err = FleetError::LevelNotFound("basement".to_string());
        assert_eq!(
            err.to_string(),
            "Level 'basement' not found in navigation graph"
        );
    }

    #[test]
    fn test_error_code() {
        assert_eq!(FleetError::RobotNotFound(RobotId(7)).code(), "ROBOT_NOT_FOUND");
        assert_eq!(
            FleetError::CorruptGraph {
                lane: 0,
                endpoint: 9,
                vertex_count: 2
            }
            .code(),
            "CORRUPT_GRAPH"
        );
    }

    #[test]
    fn test_occupancy_conflicts() {
        assert!(FleetError::DestinationOccupied(VertexIdx::new(1)).is_occupancy_conflict());
        assert!(!FleetError::InvalidVertex(VertexIdx::new(1)).is_occupancy_conflict());
    }

    #[test]
    fn test_from_toml_error() {
        let err: FleetError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert!(matches!(err, FleetError::Config(_)));
    }
}
