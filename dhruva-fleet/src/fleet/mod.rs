//! Fleet coordination: tick loop, conflict arbitration and events.

mod coordinator;
mod events;
mod occupancy;

pub use coordinator::FleetCoordinator;
pub use events::{EventKind, FleetEvent, LOG_TIME_FORMAT};
pub use occupancy::OccupancyTable;
