//! DhruvaFleet - discrete-tick fleet coordination on a navigation graph.
//!
//! Robots travel the lanes of a multi-level navigation graph. Each tick the
//! [`FleetCoordinator`] advances every robot, keeps non-charger vertices and
//! lanes to a single robot, and returns the events produced.
//!
//! ## Modules
//!
//! - [`graph`]: graph document, loaded level, shortest paths
//! - [`robot`]: robot state machine (motion, battery, charging)
//! - [`fleet`]: coordinator, occupancy table, events
//! - [`traffic`]: optional whole-route reservations
//! - [`runner`]: scenario playback, fixed-period loop, event sinks
//!
//! ## Example
//!
//! ```
//! use dhruva_fleet::{FleetConfig, FleetCoordinator, LevelDocument, NavGraph, NavGraphDocument, VertexIdx};
//!
//! let level = LevelDocument::new().vertex(0.0, 0.0).vertex(1.0, 0.0).lane(0, 1);
//! let graph = NavGraph::with_level(NavGraphDocument::single_level("level1", level), "level1").unwrap();
//! let mut fleet = FleetCoordinator::new(graph, &FleetConfig::default());
//!
//! let robot = fleet.spawn(VertexIdx::new(0)).unwrap();
//! assert!(fleet.assign_task(robot, VertexIdx::new(1)).unwrap());
//! for _ in 0..20 {
//!     fleet.tick();
//! }
//! assert!(fleet.is_idle());
//! ```

pub mod config;
pub mod error;
pub mod fleet;
pub mod graph;
pub mod robot;
pub mod runner;
pub mod traffic;
pub mod utils;

pub use config::FleetConfig;
pub use error::{FleetError, Result};
pub use fleet::{EventKind, FleetCoordinator, FleetEvent};
pub use graph::{LaneKey, LevelDocument, NavGraph, NavGraphDocument, VertexIdx};
pub use robot::{Robot, RobotId, RobotSnapshot, RobotStatus};
pub use runner::FleetRunner;
pub use traffic::{ReservationError, TrafficReservation};
pub use utils::WorldPoint;
